use super::keywords::{Field, Flag};
use super::tokenizer::{match_anchor, Words};
use crate::SchemaError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// `1.3.6.1.4.1.1466.115.121.1.15`, `top`, `userApplications`
    Token(String),
    /// `'some text'`, stored without the quotes
    Quoted(String),
    /// `( cn $ sn )`
    TokenList(Vec<String>),
    /// `( 'cn' 'commonName' )`
    QuotedList(Vec<String>),
}

impl Value {
    fn from_token(token: &str, multi_valued: bool) -> Value {
        if token.starts_with('(') && token.ends_with(')') {
            let inner = &token[1..token.len() - 1];
            return split_group(inner);
        }
        if let Some(quoted) = token
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            if multi_valued {
                return Value::QuotedList(vec![quoted.to_string()]);
            }
            return Value::Quoted(quoted.to_string());
        }
        if multi_valued {
            Value::TokenList(vec![token.to_string()])
        } else {
            Value::Token(token.to_string())
        }
    }

    /// First value of a list, or the scalar itself.
    pub fn first(&self) -> Option<&str> {
        match self {
            Value::Token(s) | Value::Quoted(s) => Some(s),
            Value::TokenList(values) | Value::QuotedList(values) => {
                values.first().map(String::as_str)
            }
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Value::Token(s) | Value::Quoted(s) => vec![s.as_str()],
            Value::TokenList(values) | Value::QuotedList(values) => {
                values.iter().map(String::as_str).collect()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Token(s) => write!(f, "{}", s),
            Value::Quoted(s) => write!(f, "'{}'", s),
            Value::TokenList(values) => write!(f, "( {} )", values.join(" $ ")),
            Value::QuotedList(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                write!(f, "( {} )", quoted.join(" "))
            }
        }
    }
}

fn split_group(inner: &str) -> Value {
    static ITEM: OnceLock<Regex> = OnceLock::new();
    let item = ITEM.get_or_init(|| Regex::new(r"'([^']*)'|([^\s$]+)").expect("item pattern is valid"));

    let mut quoted = Vec::new();
    let mut tokens = Vec::new();
    for caps in item.captures_iter(inner) {
        if let Some(q) = caps.get(1) {
            quoted.push(q.as_str().to_string());
        } else if let Some(t) = caps.get(2) {
            tokens.push(t.as_str().to_string());
        }
    }

    // Mixed groups do not occur in RFC4512; keep whichever kind dominates.
    if quoted.len() >= tokens.len() && !quoted.is_empty() {
        Value::QuotedList(quoted)
    } else {
        Value::TokenList(tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Field(Field, Value),
    Flag(Flag),
    /// Keyword/value pair outside the known set, such as `X-ORIGIN 'RFC 4519'`.
    Extension(String, Value),
    /// Text that could not be read as keyword/value, kept verbatim.
    RawTail(String),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Field(field, value) => write!(f, "{} {}", field.keyword(), value),
            Element::Flag(flag) => write!(f, "{}", flag.keyword()),
            Element::Extension(keyword, value) => write!(f, "{} {}", keyword, value),
            Element::RawTail(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub oid: String,
    pub elements: Vec<Element>,
}

impl ParsedDefinition {
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.elements.iter().find_map(|element| match element {
            Element::Field(f, value) if *f == field => Some(value),
            _ => None,
        })
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.elements
            .iter()
            .any(|element| matches!(element, Element::Flag(f) if *f == flag))
    }

    pub fn extension(&self, keyword: &str) -> Option<&Value> {
        self.elements.iter().find_map(|element| match element {
            Element::Extension(k, value) if k.eq_ignore_ascii_case(keyword) => Some(value),
            _ => None,
        })
    }

    /// First NAME, which is what filters and reports key on.
    pub fn name(&self) -> Option<&str> {
        self.get(Field::Name).and_then(Value::first)
    }

    pub fn names(&self) -> Vec<&str> {
        self.get(Field::Name).map(Value::values).unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.get(Field::Desc).and_then(Value::first)
    }

    pub fn is_obsolete(&self) -> bool {
        self.has_flag(Flag::Obsolete)
    }

    pub fn superiors(&self) -> Vec<&str> {
        self.get(Field::Sup).map(Value::values).unwrap_or_default()
    }
}

impl fmt::Display for ParsedDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.index {
            write!(f, "{{{}}}", index)?;
        }
        write!(f, "( {}", self.oid)?;
        for element in &self.elements {
            write!(f, " {}", element)?;
        }
        write!(f, " )")
    }
}

/// Parse one raw definition such as `( 2.5.4.3 NAME 'cn' SUP name )`.
///
/// Fails with [`SchemaError::MalformedDefinition`] when the opening
/// parenthesis and OID cannot be found; callers are expected to fall back to
/// showing the raw text.
pub fn parse_definition(definition: &str) -> crate::Result<ParsedDefinition> {
    let anchor = match_anchor(definition)
        .ok_or_else(|| SchemaError::MalformedDefinition(definition.to_string()))?;

    let mut words = Words::new(definition, anchor.end);
    let tokens: Vec<&str> = words.by_ref().map(|word| word.token).collect();
    let tail = trailing_text(&definition[words.offset()..]);

    let mut elements = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];

        if let Some(flag) = Flag::from_keyword(token) {
            elements.push(Element::Flag(flag));
            i += 1;
            continue;
        }

        let next = tokens.get(i + 1).copied();
        let looks_like_keyword = !token.starts_with('\'') && !token.starts_with('(');
        match next {
            Some(next) if looks_like_keyword && Flag::from_keyword(next).is_none() => {
                match Field::from_keyword(token) {
                    Some(field) => {
                        let value = Value::from_token(next, field.is_multi_valued());
                        elements.push(Element::Field(field, value));
                    }
                    None => {
                        elements.push(Element::Extension(
                            token.to_string(),
                            Value::from_token(next, false),
                        ));
                    }
                }
                i += 2;
            }
            _ => {
                elements.push(Element::RawTail(token.to_string()));
                i += 1;
            }
        }
    }

    if let Some(tail) = tail {
        elements.push(Element::RawTail(tail));
    }

    Ok(ParsedDefinition {
        index: anchor.index,
        oid: anchor.oid.to_string(),
        elements,
    })
}

// Whatever follows the last word, minus the closing parenthesis.
fn trailing_text(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = rest.strip_suffix(')').unwrap_or(rest).trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}
