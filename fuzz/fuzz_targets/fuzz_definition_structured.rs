#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use olcschema::definition::{Field, Flag};
use olcschema::{format_definition, parse_definition};

// Semi-valid definitions built from real keywords
#[derive(Arbitrary, Debug)]
struct FuzzDefinition {
    index: Option<u8>,
    oid: Vec<u8>,
    parts: Vec<FuzzPart>,
    close: bool,
}

#[derive(Arbitrary, Debug)]
enum FuzzPart {
    Field { keyword: u8, value: FuzzValue },
    Flag(u8),
    Extension { name: String, value: String },
    Garbage(String),
}

#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Token(String),
    Quoted(String),
    List(Vec<String>),
    QuotedList(Vec<String>),
}

impl FuzzDefinition {
    fn render(&self) -> String {
        let mut text = String::new();
        if let Some(index) = self.index {
            text.push_str(&format!("{{{}}}", index));
        }
        let oid: String = self
            .oid
            .iter()
            .map(|b| if b % 2 == 0 { '.' } else { char::from(b'0' + b % 10) })
            .collect();
        text.push_str(&format!("( {} ", oid));

        for part in &self.parts {
            match part {
                FuzzPart::Field { keyword, value } => {
                    let field = Field::ALL[*keyword as usize % Field::ALL.len()];
                    text.push_str(field.keyword());
                    text.push(' ');
                    text.push_str(&value.render());
                }
                FuzzPart::Flag(flag) => {
                    text.push_str(Flag::ALL[*flag as usize % Flag::ALL.len()].keyword())
                }
                FuzzPart::Extension { name, value } => {
                    text.push_str(&format!("X-{} '{}'", name, value))
                }
                FuzzPart::Garbage(garbage) => text.push_str(garbage),
            }
            text.push(' ');
        }

        if self.close {
            text.push(')');
        }
        text
    }
}

impl FuzzValue {
    fn render(&self) -> String {
        match self {
            FuzzValue::Token(token) => token.clone(),
            FuzzValue::Quoted(value) => format!("'{}'", value),
            FuzzValue::List(values) => format!("( {} )", values.join(" $ ")),
            FuzzValue::QuotedList(values) => format!(
                "( {} )",
                values
                    .iter()
                    .map(|v| format!("'{}'", v))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
        }
    }
}

fuzz_target!(|definition: FuzzDefinition| {
    let text = definition.render();
    let _ = format_definition(&text);
    if let Ok(parsed) = parse_definition(&text) {
        let _ = parsed.names();
        let _ = parsed.is_obsolete();
        let _ = parsed.to_string();
    }
});
