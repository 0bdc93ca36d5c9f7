pub mod file;
pub mod kind;
pub mod operations;
pub mod record;

pub use file::{
    resolve_schema_path, schema_name_from_argument, schema_name_from_path, SchemaDefinitionFile,
};
pub use kind::{strip_index, DefinitionKind, SCHEMA_BASE_DN, SCHEMA_OBJECT_CLASS};
pub use operations::compute_dn;
pub use record::{SchemaElement, SchemaRecord};
