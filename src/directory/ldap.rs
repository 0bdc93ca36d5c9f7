use super::client::{AttributeMap, DirectoryClient, SearchScope};
use super::entry::LdapEntry;
use crate::schema::kind::{split_index, DefinitionKind};
use crate::SchemaError;
use ldap3::{LdapConn, LdapError, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use tracing::{debug, info};

// Socket slapd listens on for `ldapi:///` on Debian-based systems.
const DEFAULT_LDAPI_URI: &str = "ldapi://%2Fvar%2Frun%2Fslapd%2Fldapi";

#[derive(Debug, Clone, PartialEq)]
pub enum BindMethod {
    SaslExternal,
    Simple { dn: String, password: String },
}

impl From<LdapError> for SchemaError {
    fn from(err: LdapError) -> Self {
        match err {
            LdapError::LdapResult { result } => SchemaError::Directory {
                code: result.rc,
                message: if result.text.is_empty() {
                    format!("LDAP operation failed with result code {}", result.rc)
                } else {
                    result.text
                },
            },
            other => SchemaError::Protocol(other.to_string()),
        }
    }
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::BaseObject => Scope::Base,
            SearchScope::SingleLevel => Scope::OneLevel,
            SearchScope::WholeSubtree => Scope::Subtree,
        }
    }
}

/// Directory client talking to a real server through `ldap3`.
pub struct LdapDirectory {
    conn: LdapConn,
}

impl LdapDirectory {
    pub fn connect(uri: &str, bind: &BindMethod) -> crate::Result<Self> {
        let uri = normalize_uri(uri);
        debug!("Connecting to {}", uri);
        let mut conn = LdapConn::new(&uri)?;

        match bind {
            BindMethod::SaslExternal => {
                conn.sasl_external_bind()?.success()?;
                info!("Bound to {} with SASL EXTERNAL", uri);
            }
            BindMethod::Simple { dn, password } => {
                conn.simple_bind(dn, password)?.success()?;
                info!("Bound to {} as {:?}", uri, dn);
            }
        }

        Ok(Self { conn })
    }

    pub fn unbind(mut self) -> crate::Result<()> {
        self.conn.unbind()?;
        Ok(())
    }
}

impl DirectoryClient for LdapDirectory {
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> crate::Result<Vec<LdapEntry>> {
        debug!("Search base={} scope={:?} filter={}", base, scope, filter);
        let (entries, _result) = self
            .conn
            .search(base, scope.into(), filter, attributes.to_vec())?
            .success()?;
        Ok(entries
            .into_iter()
            .map(|raw| LdapEntry::from(SearchEntry::construct(raw)))
            .collect())
    }

    fn add(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        debug!("Add {}", dn);
        let attrs: Vec<(String, HashSet<String>)> = attributes
            .iter()
            .map(|(name, values)| (name.clone(), wire_values(name, values)))
            .collect();
        self.conn.add(dn, attrs)?.success()?;
        Ok(())
    }

    fn delete(&mut self, dn: &str) -> crate::Result<()> {
        debug!("Delete {}", dn);
        self.conn.delete(dn)?.success()?;
        Ok(())
    }

    fn modify_replace(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        debug!("Modify (replace) {}", dn);
        let mods: Vec<Mod<String>> = attributes
            .iter()
            .map(|(name, values)| Mod::Replace(name.clone(), wire_values(name, values)))
            .collect();
        self.conn.modify(dn, mods)?.success()?;
        Ok(())
    }

    fn modify_delete(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        debug!("Modify (delete) {}", dn);
        let mods: Vec<Mod<String>> = attributes
            .iter()
            .map(|(name, values)| Mod::Delete(name.clone(), values.iter().cloned().collect()))
            .collect();
        self.conn.modify(dn, mods)?.success()?;
        Ok(())
    }
}

fn normalize_uri(uri: &str) -> String {
    if uri == "ldapi:///" || uri == "ldapi://" {
        DEFAULT_LDAPI_URI.to_string()
    } else {
        uri.to_string()
    }
}

/// Values leave as a set, so schema definitions get an explicit `{i}`
/// ordering index unless they already carry one. Generated indexes skip the
/// ones already taken.
fn wire_values(attribute: &str, values: &[String]) -> HashSet<String> {
    if DefinitionKind::from_attribute(attribute).is_none() {
        return values.iter().cloned().collect();
    }
    let taken: HashSet<u32> = values
        .iter()
        .filter_map(|value| split_index(value).0)
        .collect();
    let mut next = 0;
    values
        .iter()
        .map(|value| match split_index(value) {
            (Some(_), _) => value.clone(),
            (None, rest) => {
                while taken.contains(&next) {
                    next += 1;
                }
                let indexed = format!("{{{}}}{}", next, rest);
                next += 1;
                indexed
            }
        })
        .collect()
}
