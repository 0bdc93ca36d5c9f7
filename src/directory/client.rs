use super::entry::LdapEntry;
use crate::SchemaError;
use std::collections::BTreeMap;

/// Attribute name to values, as handed to add and modify operations.
pub type AttributeMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchScope {
    BaseObject,
    SingleLevel,
    WholeSubtree,
}

/// The directory operations the schema tool relies on. Every call is a
/// single blocking round-trip; failures carry the server result code.
pub trait DirectoryClient {
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> crate::Result<Vec<LdapEntry>>;

    fn add(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()>;

    fn delete(&mut self, dn: &str) -> crate::Result<()>;

    /// Replace each listed attribute; an empty value list removes it.
    fn modify_replace(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()>;

    /// Delete the listed values; an empty value list deletes the whole attribute.
    fn modify_delete(&mut self, dn: &str, attributes: &AttributeMap) -> crate::Result<()>;

    fn root_dse(&mut self, attributes: &[&str]) -> crate::Result<LdapEntry> {
        self.search("", SearchScope::BaseObject, "(objectClass=*)", attributes)?
            .into_iter()
            .next()
            .ok_or_else(|| SchemaError::Protocol("Root DSE not returned".to_string()))
    }
}

/// LDAP result codes used when a directory refuses an operation.
pub mod result_code {
    pub const NO_SUCH_ATTRIBUTE: u32 = 16;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;
}
