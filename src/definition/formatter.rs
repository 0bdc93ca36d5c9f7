use super::keywords::Flag;
use super::parser::ParsedDefinition;
use super::tokenizer::{match_anchor, Words};

/// Render a raw definition over several lines, the way OpenLDAP's own tools
/// lay out schema elements: keyword/value pairs share a tab-indented line and
/// value-less keywords always start a fresh one.
///
/// Never fails. Text that does not start with `( <OID>` is returned as is.
pub fn format_definition(definition: &str) -> String {
    let Some(anchor) = match_anchor(definition) else {
        return format!("{}\n", definition);
    };

    let mut out = format!("( {}", anchor.oid);
    let mut breakline = true;
    let mut words = Words::new(definition, anchor.end);

    for word in words.by_ref() {
        if breakline {
            out.push_str("\n\t");
            breakline = false;
        } else {
            breakline = true;
        }
        out.push_str(word.text);
        if Flag::from_keyword(word.token).is_some() {
            breakline = true;
        }
    }

    if breakline {
        out.push('\n');
    }

    let offset = words.offset();
    if offset < definition.len() {
        out.push_str(&definition[offset..]);
        out.push('\n');
    }

    out
}

pub fn format_parsed(definition: &ParsedDefinition) -> String {
    format_definition(&definition.to_string())
}
