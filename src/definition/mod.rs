pub mod formatter;
pub mod keywords;
pub mod parser;
mod tokenizer;

pub use formatter::{format_definition, format_parsed};
pub use keywords::{Field, Flag};
pub use parser::{parse_definition, Element, ParsedDefinition, Value};
