use super::entry::LdapEntry;
use crate::SchemaError;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LdapFilter {
    Present(String),                    // (attr=*)
    Equality(String, String),           // (attr=value)
    Substring(String, SubstringFilter), // (attr=*value*)
    GreaterOrEqual(String, String),     // (attr>=value)
    LessOrEqual(String, String),        // (attr<=value)
    And(Vec<LdapFilter>),               // (&(filter1)(filter2))
    Or(Vec<LdapFilter>),                // (|(filter1)(filter2))
    Not(Box<LdapFilter>),               // (!(filter))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstringFilter {
    pub initial: Option<String>,
    pub any: Vec<String>,
    pub final_: Option<String>,
}

impl LdapFilter {
    pub fn matches(&self, entry: &LdapEntry) -> bool {
        match self {
            LdapFilter::Present(attr) => entry.has_attribute(attr),

            LdapFilter::Equality(attr, value) => entry
                .values(attr)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),

            LdapFilter::Substring(attr, substring) => {
                entry.values(attr).iter().any(|v| substring.matches(v))
            }

            LdapFilter::GreaterOrEqual(attr, value) => {
                entry.values(attr).iter().any(|v| v.as_str() >= value.as_str())
            }

            LdapFilter::LessOrEqual(attr, value) => {
                entry.values(attr).iter().any(|v| v.as_str() <= value.as_str())
            }

            LdapFilter::And(filters) => filters.iter().all(|f| f.matches(entry)),

            LdapFilter::Or(filters) => filters.iter().any(|f| f.matches(entry)),

            LdapFilter::Not(filter) => !filter.matches(entry),
        }
    }
}

impl fmt::Display for LdapFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LdapFilter::Present(attr) => write!(f, "({}=*)", attr),
            LdapFilter::Equality(attr, value) => {
                write!(f, "({}={})", attr, escape_filter_value(value))
            }
            LdapFilter::Substring(attr, substring) => write!(f, "({}={})", attr, substring),
            LdapFilter::GreaterOrEqual(attr, value) => {
                write!(f, "({}>={})", attr, escape_filter_value(value))
            }
            LdapFilter::LessOrEqual(attr, value) => {
                write!(f, "({}<={})", attr, escape_filter_value(value))
            }
            LdapFilter::And(filters) => {
                write!(f, "(&")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            LdapFilter::Or(filters) => {
                write!(f, "(|")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            LdapFilter::Not(filter) => write!(f, "(!{})", filter),
        }
    }
}

impl SubstringFilter {
    pub fn matches(&self, value: &str) -> bool {
        let mut pattern = String::new();

        if let Some(initial) = &self.initial {
            pattern.push_str(&regex::escape(initial));
        } else {
            pattern.push_str(".*");
        }

        for any in &self.any {
            pattern.push_str(".*");
            pattern.push_str(&regex::escape(any));
        }

        if let Some(final_) = &self.final_ {
            pattern.push_str(".*");
            pattern.push_str(&regex::escape(final_));
        } else {
            pattern.push_str(".*");
        }

        if let Ok(re) = Regex::new(&format!("(?is)^{}$", pattern)) {
            re.is_match(value)
        } else {
            false
        }
    }
}

impl fmt::Display for SubstringFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(initial) = &self.initial {
            write!(f, "{}", escape_filter_value(initial))?;
        }
        write!(f, "*")?;
        for any in &self.any {
            write!(f, "{}*", escape_filter_value(any))?;
        }
        if let Some(final_) = &self.final_ {
            write!(f, "{}", escape_filter_value(final_))?;
        }
        Ok(())
    }
}

/// Escape an assertion value for use inside a filter (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape_filter_value(value: &str) -> String {
    let mut result = String::new();
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let hex1 = chars.next();
            let hex2 = chars.next();

            if let (Some(h1), Some(h2)) = (hex1, hex2) {
                match u8::from_str_radix(&format!("{}{}", h1, h2), 16) {
                    Ok(byte) if byte.is_ascii() => result.push(byte as char),
                    _ => {
                        result.push('\\');
                        result.push(h1);
                        result.push(h2);
                    }
                }
            } else {
                result.push('\\');
                if let Some(h1) = hex1 {
                    result.push(h1);
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

pub fn parse_ldap_filter(filter_str: &str) -> crate::Result<LdapFilter> {
    let filter_str = filter_str.trim();

    if filter_str.is_empty() {
        return Err(SchemaError::Filter("Empty filter string".to_string()));
    }

    if !filter_str.starts_with('(') || !filter_str.ends_with(')') {
        return Err(SchemaError::Filter(format!(
            "Filter must be wrapped in parentheses: {}",
            filter_str
        )));
    }

    let inner = &filter_str[1..filter_str.len() - 1];

    if let Some(rest) = inner.strip_prefix('&') {
        return Ok(LdapFilter::And(parse_composite_filters(rest)?));
    } else if let Some(rest) = inner.strip_prefix('|') {
        return Ok(LdapFilter::Or(parse_composite_filters(rest)?));
    } else if let Some(rest) = inner.strip_prefix('!') {
        let filter = parse_ldap_filter(rest)?;
        return Ok(LdapFilter::Not(Box::new(filter)));
    }

    if let Some(attr_part) = inner.strip_suffix("=*") {
        return Ok(LdapFilter::Present(attr_part.to_string()));
    }

    if let Some(ge_pos) = inner.find(">=") {
        let attr = inner[..ge_pos].to_string();
        let value = unescape_filter_value(&inner[ge_pos + 2..]);
        return Ok(LdapFilter::GreaterOrEqual(attr, value));
    } else if let Some(le_pos) = inner.find("<=") {
        let attr = inner[..le_pos].to_string();
        let value = unescape_filter_value(&inner[le_pos + 2..]);
        return Ok(LdapFilter::LessOrEqual(attr, value));
    } else if let Some(eq_pos) = inner.find('=') {
        let attr = inner[..eq_pos].to_string();
        let value = &inner[eq_pos + 1..];

        if attr.is_empty() {
            return Err(SchemaError::Filter(format!(
                "Missing attribute in filter: {}",
                filter_str
            )));
        }

        if value.contains('*') {
            let parts: Vec<&str> = value.split('*').collect();
            let substring = SubstringFilter {
                initial: if parts[0].is_empty() {
                    None
                } else {
                    Some(unescape_filter_value(parts[0]))
                },
                any: parts[1..parts.len() - 1]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| unescape_filter_value(s))
                    .collect(),
                final_: if parts[parts.len() - 1].is_empty() {
                    None
                } else {
                    Some(unescape_filter_value(parts[parts.len() - 1]))
                },
            };
            return Ok(LdapFilter::Substring(attr, substring));
        }

        return Ok(LdapFilter::Equality(attr, unescape_filter_value(value)));
    }

    Err(SchemaError::Filter(format!(
        "Invalid filter format: {}",
        filter_str
    )))
}

fn parse_composite_filters(s: &str) -> crate::Result<Vec<LdapFilter>> {
    let mut filters = Vec::new();
    let mut depth = 0;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(SchemaError::Filter(
                        "Unbalanced parentheses in filter".to_string(),
                    ));
                }
                depth -= 1;
                if depth == 0 {
                    let end = i + ')'.len_utf8();
                    filters.push(parse_ldap_filter(&s[start..end])?);
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SchemaError::Filter(
            "Unbalanced parentheses in filter".to_string(),
        ));
    }

    Ok(filters)
}
