use crate::definition::format_definition;
use crate::deprecation::DeprecatedDefinition;
use crate::schema::{DefinitionKind, SchemaRecord};
use chrono::NaiveDateTime;

const GENERALIZED_TIME_FORMATS: &[&str] = &["%Y%m%d%H%M%SZ", "%Y%m%d%H%M%S%.fZ", "%Y%m%d%H%M%S%z"];

/// `20200101120000Z` becomes `2020-01-01`; anything unparsable is kept as is.
pub fn format_ldap_date(value: &str) -> String {
    GENERALIZED_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|time| time.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// One line per schema: name, insertion date, counts, modification date.
pub fn summary_line(record: &SchemaRecord) -> String {
    let mut line = format!(" {:<30}\t", format!("{}:", record.name));

    if let Some(created) = &record.create_timestamp {
        line.push_str(&format!("Added: {}", format_ldap_date(created)));
    }

    let attributes = record.count(DefinitionKind::AttributeType);
    let classes = record.count(DefinitionKind::ObjectClass);
    if attributes == 0 && classes == 0 {
        line.push_str(" - Empty");
    } else {
        line.push_str(&format!(
            " - Attributes:{:3}, ObjectClasses:{:3}",
            attributes, classes
        ));
    }

    if let Some(modified) = &record.modify_timestamp {
        if record.create_timestamp.as_ref() != Some(modified) {
            line.push_str(&format!(" (Modified: {})", format_ldap_date(modified)));
        }
    }

    line.push('\n');
    line
}

/// `<directive> ` followed by the multi-line layout of the definition.
pub fn definition_block(kind: DefinitionKind, raw: &str) -> String {
    format!("{} {}", kind.directive(), format_definition(raw))
}

/// Every populated kind under its `# <header>:` line.
pub fn definition_sections(record: &SchemaRecord) -> String {
    let mut text = String::new();
    for kind in DefinitionKind::ALL {
        let definitions = record.definitions(kind);
        if definitions.is_empty() {
            continue;
        }
        text.push_str(&format!("\n# {}:\n", kind.header()));
        for element in definitions {
            text.push_str(&definition_block(kind, &element.raw));
        }
    }
    text
}

pub fn deprecated_line(definition: &DeprecatedDefinition) -> String {
    format!(
        " {:<30}\t{:<60}\t- {}\n",
        definition.name.as_deref().unwrap_or_default(),
        format!("({})", definition.description.as_deref().unwrap_or_default()),
        definition.oid
    )
}
