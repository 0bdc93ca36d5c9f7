use super::kind::DefinitionKind;
use crate::SchemaError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Definitions read from one `.schema` or `.ldif` file, verbatim and in file
/// order, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDefinitionFile {
    definitions: BTreeMap<DefinitionKind, Vec<String>>,
}

impl SchemaDefinitionFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DefinitionKind, definition: String) {
        self.definitions.entry(kind).or_default().push(definition);
    }

    pub fn definitions(&self, kind: DefinitionKind) -> &[String] {
        self.definitions
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.definitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_definitions(self) -> BTreeMap<DefinitionKind, Vec<String>> {
        self.definitions
    }

    /// Read a file, picking the reader from its extension.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ldif") => Self::parse_ldif(&content)?,
            Some("schema") => Self::parse_schema(&content)?,
            _ => {
                return Err(SchemaError::InvalidSchemaFileName(
                    path.display().to_string(),
                ))
            }
        };
        debug!("Read {} definitions from {}", file.len(), path.display());
        Ok(file)
    }

    /// slapd.conf style: `attributetype ( ... )`, continuation lines start
    /// with whitespace, `#` starts a comment line.
    pub fn parse_schema(content: &str) -> crate::Result<Self> {
        let mut file = Self::new();
        let mut current: Option<(usize, String)> = None;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                match current.as_mut() {
                    Some((_, text)) => {
                        text.push(' ');
                        text.push_str(line.trim());
                    }
                    None => {
                        return Err(SchemaError::InvalidSchemaFile(format!(
                            "line {}: continuation line without a directive",
                            number + 1
                        )))
                    }
                }
                continue;
            }

            if let Some((start, text)) = current.take() {
                file.push_directive(start, &text)?;
            }
            current = Some((number + 1, line.trim().to_string()));
        }

        if let Some((start, text)) = current.take() {
            file.push_directive(start, &text)?;
        }

        Ok(file)
    }

    fn push_directive(&mut self, line: usize, text: &str) -> crate::Result<()> {
        let (keyword, rest) = match text.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (text, ""),
        };

        let Some(kind) = DefinitionKind::from_directive(keyword) else {
            warn!("Skipping unknown directive {} at line {}", keyword, line);
            return Ok(());
        };

        if rest.is_empty() {
            return Err(SchemaError::InvalidSchemaFile(format!(
                "line {}: {} without a definition",
                line, keyword
            )));
        }

        self.push(kind, rest.to_string());
        Ok(())
    }

    /// cn=config LDIF: `olcAttributeTypes: ( ... )` values, folded lines,
    /// base64 values behind `::`.
    pub fn parse_ldif(content: &str) -> crate::Result<Self> {
        let mut file = Self::new();

        for (line, logical) in unfold_ldif(content) {
            if logical.is_empty() || logical == "-" {
                continue;
            }

            let Some((name, rest)) = logical.split_once(':') else {
                return Err(SchemaError::Ldif(format!(
                    "line {}: expected attribute: value, got {:?}",
                    line, logical
                )));
            };

            let Some(kind) = DefinitionKind::from_attribute(name.trim()) else {
                continue;
            };

            let value = if let Some(encoded) = rest.strip_prefix(':') {
                let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
                    SchemaError::Ldif(format!("line {}: invalid base64 value: {}", line, e))
                })?;
                String::from_utf8(bytes).map_err(|e| {
                    SchemaError::Ldif(format!("line {}: value is not UTF-8: {}", line, e))
                })?
            } else if rest.starts_with('<') {
                return Err(SchemaError::Ldif(format!(
                    "line {}: URL values are not supported",
                    line
                )));
            } else {
                rest.trim_start().to_string()
            };

            file.push(kind, value);
        }

        Ok(file)
    }
}

// Joins folded lines (a newline followed by one space) and drops comments.
// Yields the starting line number of every logical line.
fn unfold_ldif(content: &str) -> Vec<(usize, String)> {
    let mut logical: Vec<(usize, String)> = Vec::new();
    let mut in_comment = false;

    for (number, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if let Some(folded) = line.strip_prefix(' ') {
            if in_comment {
                continue;
            }
            if let Some((_, text)) = logical.last_mut() {
                text.push_str(folded);
                continue;
            }
        }
        in_comment = line.starts_with('#');
        if !in_comment {
            logical.push((number + 1, line.to_string()));
        }
    }

    logical
}

fn file_name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^(.+)\.(ldif|schema)$").expect("file name pattern is valid"))
}

/// `/etc/ldap/schema/core.schema` is the schema `core`.
pub fn schema_name_from_path(path: &Path) -> crate::Result<String> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = file_name_regex()
        .captures(&file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    name.ok_or(SchemaError::InvalidSchemaFileName(file_name))
}

/// Schema name from a command argument that may be a bare name or a file.
pub fn schema_name_from_argument(argument: &str) -> String {
    schema_name_from_path(Path::new(argument)).unwrap_or_else(|_| argument.to_string())
}

/// Use the path as given when it names a file, otherwise look for it in the
/// default schema directory.
pub fn resolve_schema_path(path: &Path, schema_dir: &Path) -> crate::Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let candidate = schema_dir.join(path);
    if candidate.is_file() {
        debug!("Resolved {} to {}", path.display(), candidate.display());
        return Ok(candidate);
    }

    Err(SchemaError::FileNotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"# Test schema
objectidentifier fdTestOID 1.3.6.1.4.1.10098.1

attributetype ( fdTestOID:1.1 NAME 'fdTestAttr'
    DESC 'A test attribute'
    EQUALITY caseIgnoreMatch
    SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 SINGLE-VALUE )

# comment between definitions
ObjectClass ( fdTestOID:2.1 NAME 'fdTestClass'
	SUP top AUXILIARY
	MAY ( fdTestAttr ) )
"#;

    const LDIF: &str = "dn: cn=fdtest,cn=schema,cn=config
objectClass: olcSchemaConfig
cn: fdtest
# a folded comment
 that continues
olcObjectIdentifier: fdTestOID 1.3.6.1.4.1.10098.1
olcAttributeTypes: ( fdTestOID:1.1 NAME 'fdTestAttr'
  DESC 'A test attribute' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )
olcObjectClasses:: KCBmZFRlc3RPSUQ6Mi4xIE5BTUUgJ2ZkVGVzdENsYXNzJyBTVVAgdG9wIEFVWElMSUFSWSAp
";

    #[test]
    fn test_parse_schema_file() {
        let file = SchemaDefinitionFile::parse_schema(SCHEMA).unwrap();

        assert_eq!(
            file.definitions(DefinitionKind::ObjectIdentifier),
            &["fdTestOID 1.3.6.1.4.1.10098.1".to_string()]
        );
        assert_eq!(
            file.definitions(DefinitionKind::AttributeType),
            &["( fdTestOID:1.1 NAME 'fdTestAttr' DESC 'A test attribute' EQUALITY caseIgnoreMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 SINGLE-VALUE )".to_string()]
        );
        assert_eq!(
            file.definitions(DefinitionKind::ObjectClass),
            &["( fdTestOID:2.1 NAME 'fdTestClass' SUP top AUXILIARY MAY ( fdTestAttr ) )".to_string()]
        );
        assert!(file.definitions(DefinitionKind::LdapSyntax).is_empty());
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_parse_schema_skips_unknown_directives() {
        let file = SchemaDefinitionFile::parse_schema(
            "include /etc/ldap/schema/core.schema\nattributetype ( 1.2 NAME 'x' )\n",
        )
        .unwrap();
        assert_eq!(file.len(), 1);
    }

    #[test]
    fn test_parse_schema_errors() {
        let result = SchemaDefinitionFile::parse_schema("  ( 1.2 NAME 'x' )\n");
        assert!(matches!(result, Err(SchemaError::InvalidSchemaFile(_))));

        let result = SchemaDefinitionFile::parse_schema("attributetype\n");
        assert!(matches!(result, Err(SchemaError::InvalidSchemaFile(_))));
    }

    #[test]
    fn test_parse_ldif_file() {
        let file = SchemaDefinitionFile::parse_ldif(LDIF).unwrap();

        assert_eq!(
            file.definitions(DefinitionKind::ObjectIdentifier),
            &["fdTestOID 1.3.6.1.4.1.10098.1".to_string()]
        );
        assert_eq!(
            file.definitions(DefinitionKind::AttributeType),
            &["( fdTestOID:1.1 NAME 'fdTestAttr' DESC 'A test attribute' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )".to_string()]
        );
        assert_eq!(
            file.definitions(DefinitionKind::ObjectClass),
            &["( fdTestOID:2.1 NAME 'fdTestClass' SUP top AUXILIARY )".to_string()]
        );
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_parse_ldif_errors() {
        let result = SchemaDefinitionFile::parse_ldif("olcAttributeTypes:: !!!\n");
        assert!(matches!(result, Err(SchemaError::Ldif(_))));

        let result = SchemaDefinitionFile::parse_ldif("not an ldif line\n");
        assert!(matches!(result, Err(SchemaError::Ldif(_))));
    }

    #[test]
    fn test_schema_name_from_path() {
        assert_eq!(
            schema_name_from_path(Path::new("/etc/ldap/schema/core.schema")).unwrap(),
            "core"
        );
        assert_eq!(
            schema_name_from_path(Path::new("fusiondirectory/core-fd.ldif")).unwrap(),
            "core-fd"
        );
        assert!(matches!(
            schema_name_from_path(Path::new("/etc/ldap/schema/core.txt")),
            Err(SchemaError::InvalidSchemaFileName(_))
        ));
        assert!(schema_name_from_path(Path::new(".schema")).is_err());
    }

    #[test]
    fn test_schema_name_from_argument() {
        assert_eq!(schema_name_from_argument("core.schema"), "core");
        assert_eq!(schema_name_from_argument("nis"), "nis");
    }

    #[test]
    fn test_resolve_schema_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test.schema"), SCHEMA).unwrap();

        let resolved = resolve_schema_path(Path::new("test.schema"), dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join("test.schema"));

        let absolute = dir.path().join("test.schema");
        assert_eq!(resolve_schema_path(&absolute, Path::new("/nonexistent")).unwrap(), absolute);

        assert!(matches!(
            resolve_schema_path(Path::new("missing.schema"), dir.path()),
            Err(SchemaError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("test.schema");
        let ldif_path = dir.path().join("test.ldif");
        std::fs::write(&schema_path, SCHEMA).unwrap();
        std::fs::write(&ldif_path, LDIF).unwrap();

        assert_eq!(SchemaDefinitionFile::load(&schema_path).unwrap().len(), 3);
        assert_eq!(SchemaDefinitionFile::load(&ldif_path).unwrap().len(), 3);
    }
}
