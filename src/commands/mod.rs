pub mod report;

use crate::config::Command;
use crate::deprecation::{removal_ldif, scan_directory, DeprecationReport};
use crate::directory::{escape_filter_value, DirectoryClient, SearchScope};
use crate::schema::{
    resolve_schema_path, schema_name_from_argument, schema_name_from_path, DefinitionKind,
    SchemaRecord, SCHEMA_BASE_DN, SCHEMA_OBJECT_CLASS,
};
use crate::SchemaError;
use regex::RegexBuilder;
use report::{definition_block, definition_sections, deprecated_line, summary_line};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA_SEARCH_ATTRIBUTES: &[&str] = &["*", "createTimestamp", "modifyTimestamp"];

#[derive(Debug, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
pub enum ShowFormat {
    #[default]
    Text,
    Yaml,
}

/// What an `empty` request ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyOutcome {
    Emptied(String),
    AlreadyEmpty,
}

/// The schema management commands, run against any directory client.
///
/// Commands taking several arguments handle them one by one: a failure is
/// reported on the output and the next argument is still processed.
pub struct SchemaTool<D: DirectoryClient> {
    client: D,
    schema_dir: PathBuf,
    base_dn: Option<String>,
}

impl<D: DirectoryClient> SchemaTool<D> {
    pub fn new(client: D, schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            schema_dir: schema_dir.into(),
            base_dn: None,
        }
    }

    /// Subtree searched for entries still using deprecated definitions.
    pub fn with_base_dn(mut self, base_dn: Option<String>) -> Self {
        self.base_dn = base_dn;
        self
    }

    pub fn into_client(self) -> D {
        self.client
    }

    pub fn run(&mut self, command: &Command, out: &mut impl Write) -> crate::Result<()> {
        match command {
            Command::List => self.list_schemas(out),
            Command::Show { names, format } => self.show_schemas(names, *format, out),
            Command::Insert { files } => self.insert_schemas(files, out),
            Command::Replace { files } => self.replace_schemas(files, out),
            Command::Empty { names } => self.empty_schemas(names, out),
            Command::Remove { names } => self.remove_schemas(names, out),
            Command::ShowAttribute { attributes } => self.show_attributes(attributes, out),
            Command::ListDeprecated => self.list_deprecated(out),
            Command::CheckDeprecated => self.check_deprecated(out),
            Command::LdifDeprecated => self.ldif_deprecated(out),
        }
    }

    /// Schemas installed under `cn=schema,cn=config`, optionally restricted
    /// to those named `name` whatever their ordering index.
    pub fn search_for_schemas(&mut self, name: Option<&str>) -> crate::Result<Vec<SchemaRecord>> {
        let filter = match name {
            Some(name) => format!(
                "(&(objectClass={})(cn={{*}}{}))",
                SCHEMA_OBJECT_CLASS,
                escape_filter_value(name)
            ),
            None => format!("(objectClass={})", SCHEMA_OBJECT_CLASS),
        };
        debug!("Searching schemas with {}", filter);

        let entries = self.client.search(
            SCHEMA_BASE_DN,
            SearchScope::SingleLevel,
            &filter,
            SCHEMA_SEARCH_ATTRIBUTES,
        )?;
        Ok(entries.iter().map(SchemaRecord::from_entry).collect())
    }

    /// The single installed schema with this name.
    pub fn find_schema(&mut self, name: &str) -> crate::Result<SchemaRecord> {
        let mut schemas = self.search_for_schemas(Some(name))?;
        match schemas.len() {
            0 => Err(SchemaError::SchemaNotFound(name.to_string())),
            1 => Ok(schemas.remove(0)),
            count => Err(SchemaError::AmbiguousSchemaName {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Add the schema read from `path`; returns the file used and the new DN.
    pub fn insert_schema(&mut self, path: &Path) -> crate::Result<(PathBuf, String)> {
        let name = schema_name_from_path(path)?;
        if !self.search_for_schemas(Some(&name))?.is_empty() {
            return Err(SchemaError::SchemaAlreadyExists(name));
        }

        let resolved = resolve_schema_path(path, &self.schema_dir)?;
        let record = SchemaRecord::load_file(&resolved, &self.schema_dir)?;
        self.client.add(&record.dn, &record.to_add_attributes())?;
        info!("Inserted schema {} as {}", record.name, record.dn);
        Ok((resolved, record.dn))
    }

    /// Overwrite the installed schema named after `path` with the file's
    /// definitions; returns the server DN and the file used.
    pub fn replace_schema(&mut self, path: &Path) -> crate::Result<(String, PathBuf)> {
        let name = schema_name_from_path(path)?;
        let existing = self.find_schema(&name)?;

        let resolved = resolve_schema_path(path, &self.schema_dir)?;
        let record = SchemaRecord::load_file(&resolved, &self.schema_dir)?;
        self.client
            .modify_replace(&existing.dn, &record.to_replace_attributes(&existing))?;
        info!("Replaced schema {} from {}", existing.dn, resolved.display());
        Ok((existing.dn, resolved))
    }

    /// Delete every definition of the named schema, keeping its entry.
    pub fn empty_schema(&mut self, name: &str) -> crate::Result<EmptyOutcome> {
        let existing = self.find_schema(name)?;
        self.empty_found(&existing)
    }

    fn empty_found(&mut self, existing: &SchemaRecord) -> crate::Result<EmptyOutcome> {
        let attributes = existing.empty_attributes();
        if attributes.is_empty() {
            return Ok(EmptyOutcome::AlreadyEmpty);
        }
        self.client.modify_delete(&existing.dn, &attributes)?;
        info!("Emptied schema {}", existing.dn);
        Ok(EmptyOutcome::Emptied(existing.dn.clone()))
    }

    /// Delete the named schema's entry (needs a server allowing it).
    pub fn remove_schema(&mut self, name: &str) -> crate::Result<String> {
        let existing = self.find_schema(name)?;
        self.remove_found(&existing)
    }

    fn remove_found(&mut self, existing: &SchemaRecord) -> crate::Result<String> {
        self.client.delete(&existing.dn)?;
        info!("Removed schema {}", existing.dn);
        Ok(existing.dn.clone())
    }

    pub fn list_schemas(&mut self, out: &mut impl Write) -> crate::Result<()> {
        let schemas = match self.search_for_schemas(None) {
            Ok(schemas) => schemas,
            Err(e) => {
                writeln!(out, "Search for schemas failed: {}", e)?;
                return Ok(());
            }
        };
        if !schemas.is_empty() {
            writeln!(out, "Schemas:")?;
        }
        for schema in &schemas {
            write!(out, "{}", summary_line(schema))?;
        }
        Ok(())
    }

    pub fn show_schemas(
        &mut self,
        names: &[String],
        format: ShowFormat,
        out: &mut impl Write,
    ) -> crate::Result<()> {
        for name in names {
            let schemas = match self.search_for_schemas(Some(name)) {
                Ok(schemas) => schemas,
                Err(e) => {
                    writeln!(out, "Search for schemas failed: {}", e)?;
                    continue;
                }
            };
            match format {
                ShowFormat::Text => {
                    for schema in &schemas {
                        write!(out, "{}", summary_line(schema))?;
                        write!(out, "{}", definition_sections(schema))?;
                    }
                }
                ShowFormat::Yaml => write_yaml(out, &schemas)?,
            }
        }
        Ok(())
    }

    pub fn insert_schemas(&mut self, paths: &[PathBuf], out: &mut impl Write) -> crate::Result<()> {
        for path in paths {
            match self.insert_schema(path) {
                Ok((file, dn)) => {
                    writeln!(out, "Schema {} inserted as {}", file.display(), dn)?
                }
                Err(e) => {
                    writeln!(out, "Insertion failed: {}", e)?;
                    writeln!(out, "Operation aborted")?;
                }
            }
        }
        Ok(())
    }

    pub fn replace_schemas(&mut self, paths: &[PathBuf], out: &mut impl Write) -> crate::Result<()> {
        for path in paths {
            match self.replace_schema(path) {
                Ok((dn, file)) => {
                    writeln!(out, "Schema {} replaced by {}", dn, file.display())?
                }
                Err(e) => {
                    writeln!(out, "Replace failed: {}", e)?;
                    writeln!(out, "Operation aborted")?;
                }
            }
        }
        Ok(())
    }

    pub fn empty_schemas(&mut self, arguments: &[String], out: &mut impl Write) -> crate::Result<()> {
        for argument in arguments {
            let name = schema_name_from_argument(argument);
            let existing = match self.find_schema(&name) {
                Ok(existing) => existing,
                Err(e) => {
                    write_lookup_failure(out, e)?;
                    continue;
                }
            };
            match self.empty_found(&existing) {
                Ok(EmptyOutcome::Emptied(_)) => writeln!(out, "Successfully emptied {}", name)?,
                Ok(EmptyOutcome::AlreadyEmpty) => {
                    writeln!(out, "Schema {} is already empty", name)?
                }
                Err(e) => writeln!(out, "Emptying schema \"{}\" failed: {}", name, e)?,
            }
        }
        Ok(())
    }

    pub fn remove_schemas(&mut self, arguments: &[String], out: &mut impl Write) -> crate::Result<()> {
        for argument in arguments {
            let name = schema_name_from_argument(argument);
            let existing = match self.find_schema(&name) {
                Ok(existing) => existing,
                Err(e) => {
                    write_lookup_failure(out, e)?;
                    continue;
                }
            };
            match self.remove_found(&existing) {
                Ok(_) => writeln!(out, "Successfully removed {}", name)?,
                Err(e) => writeln!(out, "Removing schema \"{}\" failed: {}", name, e)?,
            }
        }
        Ok(())
    }

    /// Print the schemas defining each attribute, followed by the matching
    /// attribute type definitions.
    pub fn show_attributes(&mut self, attributes: &[String], out: &mut impl Write) -> crate::Result<()> {
        for attribute in attributes {
            let filter = format!(
                "(&(objectClass={})(|({attr}=*{})({attr}=*{})))",
                SCHEMA_OBJECT_CLASS,
                escape_filter_value(&format!("NAME '{}'", attribute)),
                escape_filter_value(&format!("NAME ( '{}'", attribute)),
                attr = DefinitionKind::AttributeType.attribute(),
            );
            let entries = match self.client.search(
                SCHEMA_BASE_DN,
                SearchScope::WholeSubtree,
                &filter,
                &[
                    "cn",
                    "olcAttributeTypes",
                    "olcObjectClasses",
                    "createTimestamp",
                    "modifyTimestamp",
                ],
            ) {
                Ok(entries) => entries,
                Err(e) => {
                    writeln!(out, "Search for Attribute {} failed: {}", attribute, e)?;
                    continue;
                }
            };

            let names_attribute = RegexBuilder::new(&format!(
                r"^(\{{\d+\}})?\(\s*([\d\.a-zA-Z:]+)\s+NAME[\s\(]+'{}'",
                regex::escape(attribute)
            ))
            .case_insensitive(true)
            .build()
            .map_err(|e| SchemaError::Filter(e.to_string()))?;

            for schema in entries.iter().map(SchemaRecord::from_entry) {
                write!(out, "{}", summary_line(&schema))?;
                for element in schema.definitions(DefinitionKind::AttributeType) {
                    if names_attribute.is_match(&element.raw) {
                        write!(
                            out,
                            "{}",
                            definition_block(DefinitionKind::AttributeType, &element.raw)
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn deprecated(&mut self) -> crate::Result<DeprecationReport> {
        scan_directory(&mut self.client)
    }

    pub fn list_deprecated(&mut self, out: &mut impl Write) -> crate::Result<()> {
        let report = self.deprecated()?;

        writeln!(out, "Deprecated attributes:")?;
        for attribute in &report.attributes {
            write!(out, "{}", deprecated_line(attribute))?;
        }
        writeln!(out, "\nDeprecated objectClasses:")?;
        for class in &report.object_classes {
            write!(out, "{}", deprecated_line(class))?;
        }
        Ok(())
    }

    pub fn check_deprecated(&mut self, out: &mut impl Write) -> crate::Result<()> {
        let report = self.deprecated()?;
        let base = self.search_base()?;

        let using_attributes = match report.attribute_filter() {
            Some(filter) => self.client.search(
                &base,
                SearchScope::WholeSubtree,
                &filter.to_string(),
                &["dn"],
            )?,
            None => Vec::new(),
        };
        if using_attributes.is_empty() {
            writeln!(out, "There are no entries in the LDAP using obsolete attributes")?;
        }
        for entry in &using_attributes {
            writeln!(out, "{} contains an obsolete attribute", entry.dn)?;
        }

        let mut uses_obsolete_classes = false;
        for (name, filter) in report.object_class_filters() {
            let entries = self.client.search(
                &base,
                SearchScope::WholeSubtree,
                &filter.to_string(),
                &["dn"],
            )?;
            for entry in &entries {
                uses_obsolete_classes = true;
                writeln!(out, "{} uses the obsolete object class {}", entry.dn, name)?;
            }
        }
        if !uses_obsolete_classes {
            writeln!(out, "There are no entries in the LDAP using obsolete classes")?;
        }
        Ok(())
    }

    pub fn ldif_deprecated(&mut self, out: &mut impl Write) -> crate::Result<()> {
        let report = self.deprecated()?;
        let base = self.search_base()?;

        let holding = match report.attribute_filter() {
            Some(filter) => {
                self.client
                    .search(&base, SearchScope::WholeSubtree, &filter.to_string(), &["*"])?
            }
            None => Vec::new(),
        };
        if holding.is_empty() {
            writeln!(out, "# There are no entries in the LDAP using obsolete attributes")?;
        } else {
            write!(out, "{}", removal_ldif(&report, &holding))?;
        }

        let using_classes = match report.object_class_filter() {
            Some(filter) => self.client.search(
                &base,
                SearchScope::WholeSubtree,
                &filter.to_string(),
                &["dn"],
            )?,
            None => Vec::new(),
        };
        if using_classes.is_empty() {
            writeln!(out, "# There are no entries in the LDAP using obsolete classes")?;
        } else {
            writeln!(
                out,
                "# WARNING: There are entries in the LDAP using obsolete classes, you need to edit them manually"
            )?;
        }
        Ok(())
    }

    /// The configured base, or the first naming context the server announces.
    fn search_base(&mut self) -> crate::Result<String> {
        if let Some(base) = &self.base_dn {
            return Ok(base.clone());
        }
        let dse = self.client.root_dse(&["namingContexts"])?;
        let base = dse.first_value("namingContexts").ok_or_else(|| {
            SchemaError::Config("no base DN given and the server announces no naming context".to_string())
        })?;
        debug!("Using naming context {} as search base", base);
        Ok(base.to_string())
    }
}

fn write_lookup_failure(out: &mut impl Write, error: SchemaError) -> crate::Result<()> {
    match error {
        SchemaError::SchemaNotFound(_) | SchemaError::AmbiguousSchemaName { .. } => {
            writeln!(out, "Failed: {}", error)?
        }
        other => writeln!(out, "Search for schema failed: {}", other)?,
    }
    Ok(())
}

fn write_yaml(out: &mut impl Write, schemas: &[SchemaRecord]) -> crate::Result<()> {
    serde_yaml::to_writer(&mut *out, schemas)?;
    Ok(())
}
