pub mod commands;
pub mod config;
pub mod definition;
pub mod deprecation;
pub mod directory;
pub mod schema;

pub use commands::SchemaTool;
pub use crate::config::Config;
pub use definition::{format_definition, parse_definition, ParsedDefinition};
pub use schema::{SchemaDefinitionFile, SchemaRecord};

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("Malformed definition: {0}")]
    MalformedDefinition(String),

    #[error("Invalid schema file name {0}, must end with .ldif or .schema")]
    InvalidSchemaFileName(String),

    #[error("Invalid schema file: {0}")]
    InvalidSchemaFile(String),

    #[error("Schema file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Found no schema named {0}")]
    SchemaNotFound(String),

    #[error("Several schemas found with name {name}")]
    AmbiguousSchemaName { name: String, count: usize },

    #[error("Schema {0} already inserted")]
    SchemaAlreadyExists(String),

    #[error("{message} ({code})")]
    Directory { code: u32, message: String },

    #[error("LDAP protocol error: {0}")]
    Protocol(String),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("LDIF error: {0}")]
    Ldif(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
