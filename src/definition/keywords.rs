use serde::Serialize;

/// Keywords that carry no value: their presence alone is the information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Flag {
    SingleValue,
    Obsolete,
    Collective,
    NoUserModification,
    Structural,
    Auxiliary,
    Abstract,
}

impl Flag {
    pub const ALL: [Flag; 7] = [
        Flag::SingleValue,
        Flag::Obsolete,
        Flag::Collective,
        Flag::NoUserModification,
        Flag::Structural,
        Flag::Auxiliary,
        Flag::Abstract,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Flag::SingleValue => "SINGLE-VALUE",
            Flag::Obsolete => "OBSOLETE",
            Flag::Collective => "COLLECTIVE",
            Flag::NoUserModification => "NO-USER-MODIFICATION",
            Flag::Structural => "STRUCTURAL",
            Flag::Auxiliary => "AUXILIARY",
            Flag::Abstract => "ABSTRACT",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|flag| flag.keyword() == word)
    }
}

/// Keywords followed by a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    Name,
    Desc,
    Sup,
    Equality,
    Ordering,
    Substr,
    Syntax,
    Must,
    May,
    Usage,
    Aux,
    Not,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Name,
        Field::Desc,
        Field::Sup,
        Field::Equality,
        Field::Ordering,
        Field::Substr,
        Field::Syntax,
        Field::Must,
        Field::May,
        Field::Usage,
        Field::Aux,
        Field::Not,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Field::Name => "NAME",
            Field::Desc => "DESC",
            Field::Sup => "SUP",
            Field::Equality => "EQUALITY",
            Field::Ordering => "ORDERING",
            Field::Substr => "SUBSTR",
            Field::Syntax => "SYNTAX",
            Field::Must => "MUST",
            Field::May => "MAY",
            Field::Usage => "USAGE",
            Field::Aux => "AUX",
            Field::Not => "NOT",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.keyword() == word)
    }

    /// Attribute lists: a bare single value is still read as a one-element list.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Field::Must | Field::May | Field::Aux | Field::Not)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_keyword_lookup() {
        for flag in Flag::ALL {
            assert_eq!(Flag::from_keyword(flag.keyword()), Some(flag));
        }
        assert_eq!(Flag::from_keyword("single-value"), None);
        assert_eq!(Flag::from_keyword("NAME"), None);
    }

    #[test]
    fn test_field_keyword_lookup() {
        for field in Field::ALL {
            assert_eq!(Field::from_keyword(field.keyword()), Some(field));
        }
        assert_eq!(Field::from_keyword("X-ORIGIN"), None);
        assert_eq!(Field::from_keyword("OBSOLETE"), None);
    }

    #[test]
    fn test_multi_valued_fields() {
        assert!(Field::Must.is_multi_valued());
        assert!(Field::May.is_multi_valued());
        assert!(!Field::Name.is_multi_valued());
        assert!(!Field::Sup.is_multi_valued());
    }
}
