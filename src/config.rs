use crate::commands::ShowFormat;
use crate::directory::BindMethod;
use crate::SchemaError;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_LDAP_URI: &str = "ldapi:///";
const DEFAULT_SCHEMA_DIR: &str = "/etc/ldap/schema";
const DEFAULT_SASL_MECH: &str = "EXTERNAL";
const ENV_PREFIX: &str = "OLCSCHEMA";

#[derive(Parser, Debug)]
#[command(name = "olcschema")]
#[command(about = "Manage the schemas of an OpenLDAP server configured through cn=config")]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// URI to connect to, defaults to ldapi:///
    #[arg(long, global = true)]
    pub ldapuri: Option<String>,

    /// DN to bind with
    #[arg(long, global = true)]
    pub binddn: Option<String>,

    /// Password to bind with
    #[arg(long, global = true)]
    pub bindpwd: Option<String>,

    /// Disable SASL, use simple bind
    #[arg(long, global = true)]
    pub simplebind: bool,

    /// SASL mechanism, defaults to EXTERNAL
    #[arg(long, global = true)]
    pub saslmech: Option<String>,

    /// Directory where schema files given without a path are looked up
    #[arg(long, global = true, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Subtree searched for entries using deprecated definitions
    #[arg(long, global = true)]
    pub base_dn: Option<String>,

    /// YAML settings file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level: debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List schemas
    List,
    /// Show a schema's definitions
    Show {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long, value_enum, default_value_t = ShowFormat::Text)]
        format: ShowFormat,
    },
    /// Insert schemas from .schema or .ldif files
    Insert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Replace installed schemas with the content of files
    Replace {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove every definition of schemas
    Empty {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove schemas (OpenLDAP > 2.5)
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show which schema defines attributes
    ShowAttribute {
        #[arg(required = true)]
        attributes: Vec<String>,
    },
    /// List deprecated attributes and object classes
    ListDeprecated,
    /// List entries using deprecated attributes or object classes
    CheckDeprecated,
    /// Print an LDIF removing deprecated attributes
    LdifDeprecated,
}

/// Settings as merged from defaults, file, environment and flags.
#[derive(Debug, Deserialize)]
struct Settings {
    ldapuri: String,
    binddn: Option<String>,
    bindpwd: Option<String>,
    simplebind: bool,
    saslmech: String,
    schema_dir: PathBuf,
    base_dn: Option<String>,
    log_level: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,
    pub ldap_uri: String,
    pub bind: BindMethod,
    pub schema_dir: PathBuf,
    pub base_dn: Option<String>,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_cli_args(args: CliArgs) -> crate::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("ldapuri", DEFAULT_LDAP_URI)
            .and_then(|b| b.set_default("simplebind", false))
            .and_then(|b| b.set_default("saslmech", DEFAULT_SASL_MECH))
            .and_then(|b| b.set_default("schema_dir", DEFAULT_SCHEMA_DIR))
            .and_then(|b| b.set_default("log_level", "info"))
            .map_err(config_error)?;

        if let Some(path) = &args.config {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .set_override_option("ldapuri", args.ldapuri)
            .and_then(|b| b.set_override_option("binddn", args.binddn))
            .and_then(|b| b.set_override_option("bindpwd", args.bindpwd))
            .and_then(|b| b.set_override_option("simplebind", args.simplebind.then_some(true)))
            .and_then(|b| b.set_override_option("saslmech", args.saslmech))
            .and_then(|b| {
                b.set_override_option(
                    "schema_dir",
                    args.schema_dir.map(|dir| dir.to_string_lossy().into_owned()),
                )
            })
            .and_then(|b| b.set_override_option("base_dn", args.base_dn))
            .and_then(|b| b.set_override_option("log_level", args.log_level))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        let bind = if settings.simplebind {
            BindMethod::Simple {
                dn: settings.binddn.unwrap_or_default(),
                password: settings.bindpwd.unwrap_or_default(),
            }
        } else if settings.saslmech.eq_ignore_ascii_case(DEFAULT_SASL_MECH) {
            BindMethod::SaslExternal
        } else {
            return Err(SchemaError::Config(format!(
                "SASL mechanism {} is not supported, use EXTERNAL or --simplebind",
                settings.saslmech
            )));
        };

        let log_level = if args.verbose {
            tracing::Level::DEBUG
        } else {
            match settings.log_level.to_lowercase().as_str() {
                "debug" => tracing::Level::DEBUG,
                "info" => tracing::Level::INFO,
                "warn" => tracing::Level::WARN,
                "error" => tracing::Level::ERROR,
                _ => tracing::Level::INFO,
            }
        };

        Ok(Config {
            command: args.command,
            ldap_uri: settings.ldapuri,
            bind,
            schema_dir: settings.schema_dir,
            base_dn: settings.base_dn,
            log_level,
        })
    }
}

fn config_error(err: config::ConfigError) -> SchemaError {
    SchemaError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_args_default_values() {
        let args = CliArgs::parse_from(["olcschema", "list"]);
        assert_eq!(args.command, Command::List);
        assert_eq!(args.ldapuri, None);
        assert_eq!(args.binddn, None);
        assert!(!args.simplebind);
        assert!(!args.verbose);
        assert_eq!(args.schema_dir, None);
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn test_cli_args_custom_values() {
        let args = CliArgs::parse_from([
            "olcschema",
            "--ldapuri",
            "ldap://localhost:1389",
            "--simplebind",
            "--binddn",
            "cn=admin,cn=config",
            "--bindpwd",
            "secret",
            "insert",
            "core.schema",
            "nis.ldif",
            "--schema-dir",
            "/usr/share/schema",
            "-v",
        ]);
        assert_eq!(args.ldapuri.as_deref(), Some("ldap://localhost:1389"));
        assert!(args.simplebind);
        assert_eq!(args.binddn.as_deref(), Some("cn=admin,cn=config"));
        assert_eq!(args.schema_dir, Some(PathBuf::from("/usr/share/schema")));
        assert!(args.verbose);
        assert_eq!(
            args.command,
            Command::Insert {
                files: vec![PathBuf::from("core.schema"), PathBuf::from("nis.ldif")]
            }
        );
    }

    #[test]
    fn test_cli_args_show_format() {
        let args = CliArgs::parse_from(["olcschema", "show", "core", "--format", "yaml"]);
        assert_eq!(
            args.command,
            Command::Show {
                names: vec!["core".to_string()],
                format: ShowFormat::Yaml
            }
        );

        let args = CliArgs::parse_from(["olcschema", "show-attribute", "cn"]);
        assert_eq!(
            args.command,
            Command::ShowAttribute {
                attributes: vec!["cn".to_string()]
            }
        );
    }

    #[test]
    fn test_cli_args_require_arguments() {
        assert!(CliArgs::try_parse_from(["olcschema", "insert"]).is_err());
        assert!(CliArgs::try_parse_from(["olcschema"]).is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_cli_args(CliArgs::parse_from(["olcschema", "list"])).unwrap();
        assert_eq!(config.ldap_uri, "ldapi:///");
        assert_eq!(config.bind, BindMethod::SaslExternal);
        assert_eq!(config.schema_dir, PathBuf::from("/etc/ldap/schema"));
        assert_eq!(config.base_dn, None);
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn test_config_simple_bind() {
        let args = CliArgs::parse_from([
            "olcschema",
            "--simplebind",
            "--binddn",
            "cn=admin,cn=config",
            "--bindpwd",
            "secret",
            "list",
        ]);
        let config = Config::from_cli_args(args).unwrap();
        assert_eq!(
            config.bind,
            BindMethod::Simple {
                dn: "cn=admin,cn=config".to_string(),
                password: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_config_rejects_unsupported_sasl_mech() {
        let args = CliArgs::parse_from(["olcschema", "--saslmech", "GSSAPI", "list"]);
        let result = Config::from_cli_args(args);
        assert!(matches!(result, Err(SchemaError::Config(_))));
    }

    #[test]
    fn test_config_log_levels() {
        let levels = vec![
            ("debug", tracing::Level::DEBUG),
            ("info", tracing::Level::INFO),
            ("warn", tracing::Level::WARN),
            ("error", tracing::Level::ERROR),
            ("invalid", tracing::Level::INFO),
            ("DEBUG", tracing::Level::DEBUG),
        ];

        for (level_str, expected_level) in levels {
            let args = CliArgs::parse_from(["olcschema", "--log-level", level_str, "list"]);
            let config = Config::from_cli_args(args).unwrap();
            assert_eq!(config.log_level, expected_level);
        }

        let args = CliArgs::parse_from(["olcschema", "--log-level", "error", "-v", "list"]);
        let config = Config::from_cli_args(args).unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_config_file_under_cli_flags() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "ldapuri: ldap://ldap.example.org\nschema_dir: /srv/schema\nbase_dn: dc=example,dc=org"
        )
        .unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let args = CliArgs::parse_from([
            "olcschema",
            "--config",
            path.as_str(),
            "--schema-dir",
            "/opt/schema",
            "check-deprecated",
        ]);
        let config = Config::from_cli_args(args).unwrap();
        assert_eq!(config.ldap_uri, "ldap://ldap.example.org");
        assert_eq!(config.schema_dir, PathBuf::from("/opt/schema"));
        assert_eq!(config.base_dn.as_deref(), Some("dc=example,dc=org"));
        assert_eq!(config.command, Command::CheckDeprecated);
    }

    #[test]
    fn test_config_missing_file() {
        let args = CliArgs::parse_from([
            "olcschema",
            "--config",
            "/nonexistent/olcschema.yaml",
            "list",
        ]);
        assert!(matches!(
            Config::from_cli_args(args),
            Err(SchemaError::Config(_))
        ));
    }
}
