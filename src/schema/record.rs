use super::file::{resolve_schema_path, schema_name_from_path, SchemaDefinitionFile};
use super::kind::{strip_index, DefinitionKind};
use super::operations::compute_dn;
use crate::definition::{parse_definition, ParsedDefinition};
use crate::directory::LdapEntry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// One definition as stored: the raw text, and its parsed form when the
/// text could be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaElement {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedDefinition>,
}

impl SchemaElement {
    pub fn new(raw: String) -> Self {
        let parsed = match parse_definition(&raw) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Keeping definition as opaque text: {}", e);
                None
            }
        };
        Self { raw, parsed }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRecord {
    pub name: String,
    pub dn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_timestamp: Option<String>,
    definitions: BTreeMap<DefinitionKind, Vec<SchemaElement>>,
}

impl SchemaRecord {
    pub fn from_file(name: &str, file: SchemaDefinitionFile) -> Self {
        let name = strip_index(name).to_string();
        let definitions = file
            .into_definitions()
            .into_iter()
            .filter(|(_, raws)| !raws.is_empty())
            .map(|(kind, raws)| (kind, raws.into_iter().map(SchemaElement::new).collect()))
            .collect();

        Self {
            dn: compute_dn(&name),
            name,
            create_timestamp: None,
            modify_timestamp: None,
            definitions,
        }
    }

    /// Locate the file (falling back to the default schema directory), read
    /// it, and name the schema after the file.
    pub fn load_file(path: &Path, schema_dir: &Path) -> crate::Result<Self> {
        let name = schema_name_from_path(path)?;
        let path = resolve_schema_path(path, schema_dir)?;
        let file = SchemaDefinitionFile::load(&path)?;
        Ok(Self::from_file(&name, file))
    }

    /// Build from an `olcSchemaConfig` search result. Values keep the
    /// ordering indices the server put on them.
    pub fn from_entry(entry: &LdapEntry) -> Self {
        let name = entry
            .first_value("cn")
            .map(strip_index)
            .map(str::to_string)
            .unwrap_or_else(|| name_from_dn(&entry.dn));

        let mut definitions = BTreeMap::new();
        for kind in DefinitionKind::ALL {
            let values = entry.values(kind.attribute());
            if !values.is_empty() {
                definitions.insert(
                    kind,
                    values.iter().cloned().map(SchemaElement::new).collect(),
                );
            }
        }

        Self {
            name,
            dn: entry.dn.clone(),
            create_timestamp: entry.first_value("createTimestamp").map(str::to_string),
            modify_timestamp: entry.first_value("modifyTimestamp").map(str::to_string),
            definitions,
        }
    }

    pub fn definitions(&self, kind: DefinitionKind) -> &[SchemaElement] {
        self.definitions
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn raw_definitions(&self, kind: DefinitionKind) -> Vec<String> {
        self.definitions(kind)
            .iter()
            .map(|element| element.raw.clone())
            .collect()
    }

    pub fn count(&self, kind: DefinitionKind) -> usize {
        self.definitions(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.values().all(Vec::is_empty)
    }
}

fn name_from_dn(dn: &str) -> String {
    let rdn = dn.split(',').next().unwrap_or(dn);
    let value = rdn.split_once('=').map_or(rdn, |(_, value)| value);
    strip_index(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Flag;

    fn core_entry() -> LdapEntry {
        let mut entry = LdapEntry::new("cn={0}core,cn=schema,cn=config".to_string());
        entry.add_attribute("objectClass".to_string(), vec!["olcSchemaConfig".to_string()]);
        entry.add_attribute("cn".to_string(), vec!["{0}core".to_string()]);
        entry.add_attribute(
            "olcObjectIdentifier".to_string(),
            vec!["{0}fdTestOID 1.3.6.1.4.1.10098".to_string()],
        );
        entry.add_attribute(
            "olcAttributeTypes".to_string(),
            vec![
                "{0}( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch )".to_string(),
                "{1}( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )".to_string(),
            ],
        );
        entry.add_attribute(
            "olcObjectClasses".to_string(),
            vec![
                "{0}( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )".to_string(),
                "{1}( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) )".to_string(),
                "{2}( 2.5.6.7 NAME 'organizationalPerson' SUP person STRUCTURAL )".to_string(),
            ],
        );
        entry.add_attribute("createTimestamp".to_string(), vec!["20200101120000Z".to_string()]);
        entry.add_attribute("modifyTimestamp".to_string(), vec!["20210304101010Z".to_string()]);
        entry
    }

    #[test]
    fn test_from_entry() {
        let record = SchemaRecord::from_entry(&core_entry());

        assert_eq!(record.name, "core");
        assert_eq!(record.dn, "cn={0}core,cn=schema,cn=config");
        assert_eq!(record.create_timestamp.as_deref(), Some("20200101120000Z"));
        assert_eq!(record.modify_timestamp.as_deref(), Some("20210304101010Z"));
        assert_eq!(record.count(DefinitionKind::ObjectIdentifier), 1);
        assert_eq!(record.count(DefinitionKind::AttributeType), 2);
        assert_eq!(record.count(DefinitionKind::ObjectClass), 3);
        assert_eq!(record.count(DefinitionKind::LdapSyntax), 0);

        let first = &record.definitions(DefinitionKind::AttributeType)[0];
        assert_eq!(first.raw, "{0}( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch )");
        assert_eq!(first.parsed.as_ref().unwrap().index, Some(0));

        // Object identifiers are not parenthesized and stay opaque.
        assert!(record.definitions(DefinitionKind::ObjectIdentifier)[0]
            .parsed
            .is_none());

        let top = record.definitions(DefinitionKind::ObjectClass)[0]
            .parsed
            .as_ref()
            .unwrap();
        assert!(top.has_flag(Flag::Abstract));
    }

    #[test]
    fn test_from_entry_without_cn() {
        let entry = LdapEntry::new("cn={3}nis,cn=schema,cn=config".to_string());
        let record = SchemaRecord::from_entry(&entry);
        assert_eq!(record.name, "nis");
        assert!(record.is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = SchemaDefinitionFile::new();
        file.push(
            DefinitionKind::AttributeType,
            "( 1.2.3 NAME 'fdTestAttr' )".to_string(),
        );
        let record = SchemaRecord::from_file("fdtest", file);

        assert_eq!(record.name, "fdtest");
        assert_eq!(record.dn, "cn=fdtest,cn=schema,cn=config");
        assert_eq!(
            record.raw_definitions(DefinitionKind::AttributeType),
            vec!["( 1.2.3 NAME 'fdTestAttr' )".to_string()]
        );
        assert!(record.create_timestamp.is_none());
    }

    #[test]
    fn test_load_file_names_schema_after_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("core.schema"),
            "attributetype ( 2.5.4.41 NAME 'name' )\n",
        )
        .unwrap();

        let record = SchemaRecord::load_file(Path::new("core.schema"), dir.path()).unwrap();
        assert_eq!(record.name, "core");
        assert_eq!(record.dn, "cn=core,cn=schema,cn=config");
        assert_eq!(record.count(DefinitionKind::AttributeType), 1);
    }
}
