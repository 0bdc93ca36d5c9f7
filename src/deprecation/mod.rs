pub mod ldif;
pub mod scanner;

pub use ldif::removal_ldif;
pub use scanner::{
    fetch_subschema, scan, scan_directory, select_obsolete, DeprecatedDefinition,
    DeprecationReport,
};
