use crate::definition::{parse_definition, Flag, ParsedDefinition};
use crate::directory::{DirectoryClient, LdapEntry, LdapFilter, SearchScope};
use crate::SchemaError;
use serde::Serialize;
use tracing::{debug, warn};

/// An obsolete attribute type or object class as announced by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeprecatedDefinition {
    pub oid: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub raw: String,
}

impl DeprecatedDefinition {
    fn from_parsed(raw: &str, parsed: &ParsedDefinition) -> Self {
        Self {
            oid: parsed.oid.clone(),
            name: parsed.name().map(str::to_string),
            description: parsed.description().map(str::to_string),
            raw: raw.to_string(),
        }
    }

    fn unparsed(raw: &str) -> Self {
        Self {
            oid: String::new(),
            name: None,
            description: None,
            raw: raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeprecationReport {
    pub attributes: Vec<DeprecatedDefinition>,
    pub object_classes: Vec<DeprecatedDefinition>,
}

impl DeprecationReport {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.object_classes.is_empty()
    }

    /// `(|(<NAME>=*)...)` over the deprecated attributes, or `None` when
    /// there is no named one to look for.
    pub fn attribute_filter(&self) -> Option<LdapFilter> {
        any_of(
            names(&self.attributes)
                .map(|name| LdapFilter::Present(name.to_string()))
                .collect(),
        )
    }

    /// `(|(objectClass=<NAME>)...)` over the deprecated object classes.
    pub fn object_class_filter(&self) -> Option<LdapFilter> {
        any_of(
            self.object_class_filters()
                .into_iter()
                .map(|(_, filter)| filter)
                .collect(),
        )
    }

    /// One `(objectClass=<NAME>)` filter per named deprecated class.
    pub fn object_class_filters(&self) -> Vec<(&str, LdapFilter)> {
        names(&self.object_classes)
            .map(|name| {
                (
                    name,
                    LdapFilter::Equality("objectClass".to_string(), name.to_string()),
                )
            })
            .collect()
    }
}

fn names(definitions: &[DeprecatedDefinition]) -> impl Iterator<Item = &str> {
    definitions.iter().filter_map(|d| d.name.as_deref())
}

fn any_of(filters: Vec<LdapFilter>) -> Option<LdapFilter> {
    if filters.is_empty() {
        None
    } else {
        Some(LdapFilter::Or(filters))
    }
}

/// Keep every definition mentioning `OBSOLETE`, parsed for reporting.
///
/// A definition that does not parse is still listed, with only its raw text.
pub fn select_obsolete<S: AsRef<str>>(definitions: &[S]) -> Vec<DeprecatedDefinition> {
    definitions
        .iter()
        .map(AsRef::as_ref)
        .filter(|raw| raw.contains(Flag::Obsolete.keyword()))
        .map(|raw| match parse_definition(raw) {
            Ok(parsed) => DeprecatedDefinition::from_parsed(raw, &parsed),
            Err(e) => {
                warn!("Listing unparsable deprecated definition: {}", e);
                DeprecatedDefinition::unparsed(raw)
            }
        })
        .collect()
}

pub fn scan<S: AsRef<str>>(attribute_types: &[S], object_classes: &[S]) -> DeprecationReport {
    DeprecationReport {
        attributes: select_obsolete(attribute_types),
        object_classes: select_obsolete(object_classes),
    }
}

/// Read the operational subschema entry named by the root DSE.
pub fn fetch_subschema<D: DirectoryClient>(client: &mut D) -> crate::Result<LdapEntry> {
    let dse = client.root_dse(&["subschemaSubentry"])?;
    let subentry = dse
        .first_value("subschemaSubentry")
        .ok_or_else(|| {
            SchemaError::Protocol("Root DSE does not announce a subschemaSubentry".to_string())
        })?
        .to_string();
    debug!("Reading subschema entry {}", subentry);

    client
        .search(
            &subentry,
            SearchScope::BaseObject,
            "(objectClass=*)",
            &["attributeTypes", "objectClasses"],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| SchemaError::Protocol(format!("Subschema entry {} not returned", subentry)))
}

pub fn scan_directory<D: DirectoryClient>(client: &mut D) -> crate::Result<DeprecationReport> {
    let subschema = fetch_subschema(client)?;
    let report = scan(
        subschema.values("attributeTypes"),
        subschema.values("objectClasses"),
    );
    debug!(
        "Found {} deprecated attributes and {} deprecated object classes",
        report.attributes.len(),
        report.object_classes.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;

    const ATTRIBUTE_TYPES: &[&str] = &[
        "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )",
        "( 1.3.6.1.4.1.10098.1.1.12.1 NAME 'gosaSubtreeACL' DESC 'GOsa acl' OBSOLETE SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
        "( 1.3.6.1.4.1.10098.1.1.12.2 NAME ( 'gosaUser' 'gosaUserAlias' ) OBSOLETE )",
        "( 1.3.6.1.4.1.10098.1.1.12.3 NAME 'fdNotes' DESC 'replaces the OBSOLETE notes attribute' )",
    ];

    const OBJECT_CLASSES: &[&str] = &[
        "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) )",
        "( 1.3.6.1.4.1.10098.1.2.1.19.1 NAME 'gosaObject' DESC 'Class for GOsa settings' OBSOLETE AUXILIARY )",
        "( 1.3.6.1.4.1.10098.1.2.1.19.2 OBSOLETE AUXILIARY )",
    ];

    #[test]
    fn test_select_obsolete() {
        let report = scan(ATTRIBUTE_TYPES, OBJECT_CLASSES);

        assert_eq!(report.attributes.len(), 3);
        assert_eq!(report.attributes[0].name.as_deref(), Some("gosaSubtreeACL"));
        assert_eq!(report.attributes[0].description.as_deref(), Some("GOsa acl"));
        assert_eq!(report.attributes[0].oid, "1.3.6.1.4.1.10098.1.1.12.1");
        assert_eq!(report.attributes[1].name.as_deref(), Some("gosaUser"));
        assert!(report.attributes[1].description.is_none());
        assert_eq!(report.attributes[2].name.as_deref(), Some("fdNotes"));

        assert_eq!(report.object_classes.len(), 2);
        assert!(report.object_classes[1].name.is_none());
    }

    #[test]
    fn test_keyword_anywhere_in_text_selects_definition() {
        let selected = select_obsolete(&ATTRIBUTE_TYPES[3..]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].oid, "1.3.6.1.4.1.10098.1.1.12.3");
    }

    #[test]
    fn test_unparsable_definition_is_listed_without_name() {
        let selected = select_obsolete(&["OBSOLETE 1.2.3 NAME 'broken'", "( 1.2.4 NAME 'ok' )"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].oid, "");
        assert!(selected[0].name.is_none());
        assert_eq!(selected[0].raw, "OBSOLETE 1.2.3 NAME 'broken'");

        let report = DeprecationReport {
            attributes: selected,
            object_classes: Vec::new(),
        };
        assert!(report.attribute_filter().is_none());
    }

    #[test]
    fn test_filters_use_first_name() {
        let report = scan(ATTRIBUTE_TYPES, OBJECT_CLASSES);
        assert_eq!(
            report.attribute_filter().unwrap().to_string(),
            "(|(gosaSubtreeACL=*)(gosaUser=*)(fdNotes=*))"
        );
        assert_eq!(
            report.object_class_filter().unwrap().to_string(),
            "(|(objectClass=gosaObject))"
        );
        let per_class = report.object_class_filters();
        assert_eq!(per_class.len(), 1);
        assert_eq!(per_class[0].0, "gosaObject");
    }

    #[test]
    fn test_no_filter_without_deprecated_definitions() {
        let report = scan(&ATTRIBUTE_TYPES[..1], &OBJECT_CLASSES[..1]);
        assert!(report.is_empty());
        assert!(report.attribute_filter().is_none());
        assert!(report.object_class_filter().is_none());
    }

    #[test]
    fn test_scan_directory() {
        let mut directory = MemoryDirectory::new();
        let mut dse = LdapEntry::new(String::new());
        dse.add_attribute("objectClass".to_string(), vec!["top".to_string()]);
        dse.add_attribute(
            "subschemaSubentry".to_string(),
            vec!["cn=Subschema".to_string()],
        );
        directory.add_entry(dse);

        let mut subschema = LdapEntry::new("cn=Subschema".to_string());
        subschema.add_attribute("objectClass".to_string(), vec!["subschema".to_string()]);
        subschema.add_attribute(
            "attributeTypes".to_string(),
            ATTRIBUTE_TYPES.iter().map(|s| s.to_string()).collect(),
        );
        subschema.add_attribute(
            "objectClasses".to_string(),
            OBJECT_CLASSES.iter().map(|s| s.to_string()).collect(),
        );
        directory.add_entry(subschema);

        let report = scan_directory(&mut directory).unwrap();
        assert_eq!(report.attributes.len(), 3);
        assert_eq!(report.object_classes.len(), 2);
    }

    #[test]
    fn test_scan_directory_without_subschema() {
        let mut directory = MemoryDirectory::new();
        let mut dse = LdapEntry::new(String::new());
        dse.add_attribute("objectClass".to_string(), vec!["top".to_string()]);
        directory.add_entry(dse);

        assert!(matches!(
            scan_directory(&mut directory),
            Err(SchemaError::Protocol(_))
        ));
    }
}
