use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Subtree every installed schema lives under.
pub const SCHEMA_BASE_DN: &str = "cn=schema,cn=config";

/// Object class of a per-schema configuration entry.
pub const SCHEMA_OBJECT_CLASS: &str = "olcSchemaConfig";

/// The five kinds of definitions a schema entry can hold, in the order
/// slapd needs them (identifiers before the definitions that use them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DefinitionKind {
    ObjectIdentifier,
    LdapSyntax,
    AttributeType,
    ObjectClass,
    DitContentRule,
}

impl DefinitionKind {
    pub const ALL: [DefinitionKind; 5] = [
        DefinitionKind::ObjectIdentifier,
        DefinitionKind::LdapSyntax,
        DefinitionKind::AttributeType,
        DefinitionKind::ObjectClass,
        DefinitionKind::DitContentRule,
    ];

    /// Attribute of an `olcSchemaConfig` entry holding this kind.
    pub fn attribute(&self) -> &'static str {
        match self {
            DefinitionKind::ObjectIdentifier => "olcObjectIdentifier",
            DefinitionKind::LdapSyntax => "olcLdapSyntaxes",
            DefinitionKind::AttributeType => "olcAttributeTypes",
            DefinitionKind::ObjectClass => "olcObjectClasses",
            DefinitionKind::DitContentRule => "olcDitContentRules",
        }
    }

    /// Spelling used by the subschema subentry, if the kind appears there.
    pub fn subschema_attribute(&self) -> Option<&'static str> {
        match self {
            DefinitionKind::ObjectIdentifier => None,
            DefinitionKind::LdapSyntax => Some("ldapSyntaxes"),
            DefinitionKind::AttributeType => Some("attributeTypes"),
            DefinitionKind::ObjectClass => Some("objectClasses"),
            DefinitionKind::DitContentRule => Some("dITContentRules"),
        }
    }

    /// Keyword introducing a definition in a `.schema` file.
    pub fn directive(&self) -> &'static str {
        match self {
            DefinitionKind::ObjectIdentifier => "objectidentifier",
            DefinitionKind::LdapSyntax => "ldapsyntax",
            DefinitionKind::AttributeType => "attributetype",
            DefinitionKind::ObjectClass => "objectclass",
            DefinitionKind::DitContentRule => "ditcontentrule",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            DefinitionKind::ObjectIdentifier => "Object identifiers",
            DefinitionKind::LdapSyntax => "LDAP syntaxes",
            DefinitionKind::AttributeType => "Attributes",
            DefinitionKind::ObjectClass => "Object classes",
            DefinitionKind::DitContentRule => "DIT content rules",
        }
    }

    pub fn from_directive(word: &str) -> Option<DefinitionKind> {
        let word = word.to_lowercase();
        DefinitionKind::ALL.into_iter().find(|kind| {
            let directive = kind.directive();
            word.strip_prefix(directive)
                .is_some_and(|plural| matches!(plural, "" | "s" | "es"))
        })
    }

    pub fn from_attribute(name: &str) -> Option<DefinitionKind> {
        DefinitionKind::ALL.into_iter().find(|kind| {
            kind.attribute().eq_ignore_ascii_case(name)
                || kind
                    .subschema_attribute()
                    .is_some_and(|attr| attr.eq_ignore_ascii_case(name))
        })
    }
}

fn index_regex() -> &'static Regex {
    static INDEX: OnceLock<Regex> = OnceLock::new();
    INDEX.get_or_init(|| Regex::new(r"^\{(\d+)\}").expect("index pattern is valid"))
}

/// Split a leading `{N}` ordering index off a value.
pub fn split_index(value: &str) -> (Option<u32>, &str) {
    match index_regex().captures(value) {
        Some(caps) => {
            let index = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let end = caps.get(0).map_or(0, |m| m.end());
            (index, &value[end..])
        }
        None => (None, value),
    }
}

/// `{3}core` becomes `core`.
pub fn strip_index(value: &str) -> &str {
    split_index(value).1
}
