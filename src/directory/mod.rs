pub mod client;
pub mod entry;
pub mod filters;
pub mod ldap;
pub mod memory;

pub use client::{AttributeMap, DirectoryClient, SearchScope};
pub use entry::{LdapAttribute, LdapEntry};
pub use filters::{escape_filter_value, parse_ldap_filter, LdapFilter, SubstringFilter};
pub use ldap::{BindMethod, LdapDirectory};
pub use memory::MemoryDirectory;
