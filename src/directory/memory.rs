use super::client::{result_code, AttributeMap, DirectoryClient, SearchScope};
use super::entry::LdapEntry;
use super::filters::parse_ldap_filter;
use crate::SchemaError;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Directory held entirely in memory. Serves the same operations as a real
/// server so the schema commands can run without one.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entries: Arc<DashMap<String, LdapEntry>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&self, entry: LdapEntry) {
        self.entries.insert(entry.dn.to_lowercase(), entry);
    }

    pub fn get_entry(&self, dn: &str) -> Option<LdapEntry> {
        self.entries.get(&dn.to_lowercase()).map(|e| e.clone())
    }

    pub fn entry_exists(&self, dn: &str) -> bool {
        self.entries.contains_key(&dn.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn search_entries<F>(&self, base_dn: &str, scope: SearchScope, filter: F) -> Vec<LdapEntry>
    where
        F: Fn(&LdapEntry) -> bool,
    {
        let base_dn_lower = base_dn.to_lowercase();
        let mut results = Vec::new();

        for entry in self.entries.iter() {
            let entry_dn_lower = entry.key();

            let in_scope = match scope {
                SearchScope::BaseObject => *entry_dn_lower == base_dn_lower,
                SearchScope::SingleLevel => {
                    *entry_dn_lower != base_dn_lower
                        && is_direct_child(entry_dn_lower, &base_dn_lower)
                }
                SearchScope::WholeSubtree => {
                    *entry_dn_lower == base_dn_lower
                        || is_descendant(entry_dn_lower, &base_dn_lower)
                }
            };

            if in_scope && filter(&entry) {
                results.push(entry.clone());
            }
        }

        results.sort_by(|a, b| a.dn.cmp(&b.dn));
        results
    }

    fn no_such_object(dn: &str) -> SchemaError {
        SchemaError::Directory {
            code: result_code::NO_SUCH_OBJECT,
            message: format!("No such object: {}", dn),
        }
    }
}

impl DirectoryClient for MemoryDirectory {
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> crate::Result<Vec<LdapEntry>> {
        let ldap_filter = parse_ldap_filter(filter)?;
        debug!("Memory search base={} scope={:?} filter={}", base, scope, filter);

        // A search below a missing base fails like it would on a server.
        if !base.is_empty() && !self.entry_exists(base) {
            return Err(Self::no_such_object(base));
        }

        Ok(self
            .search_entries(base, scope, |entry| ldap_filter.matches(entry))
            .into_iter()
            .map(|entry| entry.select(attributes))
            .collect())
    }

    fn add(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        if self.entry_exists(dn) {
            return Err(SchemaError::Directory {
                code: result_code::ENTRY_ALREADY_EXISTS,
                message: format!("Already exists: {}", dn),
            });
        }
        let mut entry = LdapEntry::new(dn.to_string());
        for (name, values) in attributes {
            entry.add_attribute(name.clone(), values.clone());
        }
        self.add_entry(entry);
        Ok(())
    }

    fn delete(&mut self, dn: &str) -> crate::Result<()> {
        self.entries
            .remove(&dn.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| Self::no_such_object(dn))
    }

    fn modify_replace(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        let mut entry = self
            .entries
            .get_mut(&dn.to_lowercase())
            .ok_or_else(|| Self::no_such_object(dn))?;
        for (name, values) in attributes {
            if values.is_empty() {
                entry.remove_attribute(name);
            } else {
                entry.add_attribute(name.clone(), values.clone());
            }
        }
        Ok(())
    }

    fn modify_delete(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()> {
        let mut updated = self.get_entry(dn).ok_or_else(|| Self::no_such_object(dn))?;
        for (name, values) in attributes {
            let Some(attr) = updated.get_attribute(name).cloned() else {
                return Err(SchemaError::Directory {
                    code: result_code::NO_SUCH_ATTRIBUTE,
                    message: format!("No such attribute: {}", name),
                });
            };
            if values.is_empty() {
                updated.remove_attribute(name);
                continue;
            }
            let remaining: Vec<String> = attr
                .values
                .into_iter()
                .filter(|v| !values.contains(v))
                .collect();
            if remaining.is_empty() {
                updated.remove_attribute(name);
            } else {
                updated.add_attribute(attr.name, remaining);
            }
        }
        // All-or-nothing: the entry only changes once every deletion applied.
        self.add_entry(updated);
        Ok(())
    }
}

fn is_direct_child(child_dn: &str, parent_dn: &str) -> bool {
    if parent_dn.is_empty() {
        return !child_dn.is_empty() && !child_dn.contains(',');
    }
    if !child_dn.ends_with(parent_dn) {
        return false;
    }

    let prefix = &child_dn[..child_dn.len() - parent_dn.len()];
    if !prefix.ends_with(',') {
        return false;
    }

    let prefix = prefix.trim_end_matches(',');
    !prefix.is_empty() && !prefix.contains(',')
}

fn is_descendant(child_dn: &str, parent_dn: &str) -> bool {
    if parent_dn.is_empty() {
        return !child_dn.is_empty();
    }
    child_dn.len() > parent_dn.len()
        && child_dn.ends_with(parent_dn)
        && child_dn[..child_dn.len() - parent_dn.len()].ends_with(',')
}
