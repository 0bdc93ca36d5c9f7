use regex::Regex;
use std::sync::OnceLock;

// Optional `{N}` index, opening parenthesis, then the OID (numeric or symbolic).
const ANCHOR_PATTERN: &str = r"^(\{(\d+)\})?\(\s*([\d\.a-zA-Z:]+)\s+";

// A bare word, a quoted string or a parenthesized group, followed by
// whitespace or the closing parenthesis.
const WORD_PATTERN: &str = r"(([\w\.\{\}-]+|'[^']+'|\([^\)]+\))(\s+|\)))";

fn anchor_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| Regex::new(ANCHOR_PATTERN).expect("anchor pattern is valid"))
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(WORD_PATTERN).expect("word pattern is valid"))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anchor<'a> {
    pub index: Option<u32>,
    pub oid: &'a str,
    /// Byte offset right after the whitespace following the OID.
    pub end: usize,
}

pub(crate) fn match_anchor(definition: &str) -> Option<Anchor<'_>> {
    let caps = anchor_regex().captures(definition)?;
    let oid = caps.get(3)?.as_str();
    let index = caps.get(2).and_then(|m| m.as_str().parse().ok());
    let end = caps.get(0)?.end();
    Some(Anchor { index, oid, end })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Word<'a> {
    /// The whole match, terminator included.
    pub text: &'a str,
    /// The word itself without its terminator.
    pub token: &'a str,
}

/// Walks the words of a definition from a starting offset. Stops at the first
/// text the word grammar cannot read, so everything past `offset()` is left
/// for the caller to keep.
pub(crate) struct Words<'a> {
    definition: &'a str,
    offset: usize,
}

impl<'a> Words<'a> {
    pub fn new(definition: &'a str, offset: usize) -> Self {
        Self { definition, offset }
    }

    /// Offset just past the last consumed word.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Word<'a>;

    fn next(&mut self) -> Option<Word<'a>> {
        if self.offset >= self.definition.len() {
            return None;
        }
        let rest = &self.definition[self.offset..];
        let start = self.offset + (rest.len() - rest.trim_start().len());
        let caps = word_regex().captures_at(self.definition, start)?;
        let whole = caps.get(0)?;
        if whole.start() != start {
            return None;
        }
        let token = caps.get(2)?;
        self.offset = whole.end();
        Some(Word {
            text: whole.as_str(),
            token: token.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_numeric_oid() {
        let anchor = match_anchor("( 1.2.3.4 NAME 'x' )").unwrap();
        assert_eq!(anchor.oid, "1.2.3.4");
        assert_eq!(anchor.index, None);
        assert_eq!(anchor.end, "( 1.2.3.4 ".len());
    }

    #[test]
    fn test_anchor_with_index_and_symbolic_oid() {
        let anchor = match_anchor("{12}( fdOID:1.2 NAME 'x' )").unwrap();
        assert_eq!(anchor.oid, "fdOID:1.2");
        assert_eq!(anchor.index, Some(12));
    }

    #[test]
    fn test_anchor_rejects_missing_parenthesis() {
        assert!(match_anchor("1.2.3.4 NAME 'x'").is_none());
        assert!(match_anchor("fdOID 1.3.6.1.4.1").is_none());
        assert!(match_anchor("").is_none());
    }

    #[test]
    fn test_words_cover_quoted_and_grouped_values() {
        let definition = "( 1.2 NAME ( 'a' 'b' ) DESC 'Some text' MUST ( cn $ sn ) )";
        let anchor = match_anchor(definition).unwrap();
        let tokens: Vec<&str> = Words::new(definition, anchor.end).map(|w| w.token).collect();
        assert_eq!(
            tokens,
            vec![
                "NAME",
                "( 'a' 'b' )",
                "DESC",
                "'Some text'",
                "MUST",
                "( cn $ sn )"
            ]
        );
    }

    #[test]
    fn test_words_offset_stops_before_unmatched_tail() {
        let definition = "( 1.2 NAME 'a' )";
        let anchor = match_anchor(definition).unwrap();
        let mut words = Words::new(definition, anchor.end);
        while words.next().is_some() {}
        assert_eq!(&definition[words.offset()..], ")");
    }

    #[test]
    fn test_words_stop_at_unreadable_text() {
        let definition = "( 1.2 NAME 'x' X-VENDOR \"opaque\" DESC 'kept' )";
        let anchor = match_anchor(definition).unwrap();
        let mut words = Words::new(definition, anchor.end);
        let tokens: Vec<&str> = words.by_ref().map(|w| w.token).collect();
        assert_eq!(tokens, vec!["NAME", "'x'", "X-VENDOR"]);
        assert_eq!(&definition[words.offset()..], "\"opaque\" DESC 'kept' )");
    }

    #[test]
    fn test_words_skip_line_breaks_between_words() {
        let definition = "( 1.2\n\tNAME 'x' \n\tSINGLE-VALUE \n)";
        let anchor = match_anchor(definition).unwrap();
        let tokens: Vec<&str> = Words::new(definition, anchor.end).map(|w| w.token).collect();
        assert_eq!(tokens, vec!["NAME", "'x'", "SINGLE-VALUE"]);
    }
}
