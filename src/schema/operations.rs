use super::kind::{DefinitionKind, SCHEMA_BASE_DN, SCHEMA_OBJECT_CLASS};
use super::record::SchemaRecord;
use crate::directory::AttributeMap;

/// `cn=<name>,cn=schema,cn=config`
pub fn compute_dn(name: &str) -> String {
    format!("cn={},{}", name, SCHEMA_BASE_DN)
}

impl SchemaRecord {
    /// Attributes of a new `olcSchemaConfig` entry: raw definitions exactly
    /// as read, one attribute per non-empty kind.
    pub fn to_add_attributes(&self) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        attributes.insert(
            "objectClass".to_string(),
            vec![SCHEMA_OBJECT_CLASS.to_string()],
        );
        attributes.insert("cn".to_string(), vec![self.name.clone()]);
        attributes.extend(self.definition_attributes());
        attributes
    }

    /// Full overwrite of `existing`: every kind this record holds, plus an
    /// empty list for each kind only `existing` holds so the server clears it.
    pub fn to_replace_attributes(&self, existing: &SchemaRecord) -> AttributeMap {
        let mut attributes = self.definition_attributes();
        for kind in DefinitionKind::ALL {
            if existing.count(kind) > 0 {
                attributes.entry(kind.attribute().to_string()).or_default();
            }
        }
        attributes
    }

    /// Every populated kind mapped to an empty list, for a delete-all-values
    /// modification. Empty when there is nothing to clear.
    pub fn empty_attributes(&self) -> AttributeMap {
        DefinitionKind::ALL
            .into_iter()
            .filter(|kind| self.count(*kind) > 0)
            .map(|kind| (kind.attribute().to_string(), Vec::new()))
            .collect()
    }

    fn definition_attributes(&self) -> AttributeMap {
        DefinitionKind::ALL
            .into_iter()
            .filter(|kind| self.count(*kind) > 0)
            .map(|kind| (kind.attribute().to_string(), self.raw_definitions(kind)))
            .collect()
    }
}
