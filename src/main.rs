use clap::Parser;
use olcschema::directory::LdapDirectory;
use olcschema::{Config, SchemaTool};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = olcschema::config::CliArgs::parse();

    // Merge with the settings file and environment
    let config = Config::from_cli_args(args)?;

    // Reports go to stdout, logs to stderr
    FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let client = LdapDirectory::connect(&config.ldap_uri, &config.bind)?;
    let mut tool = SchemaTool::new(client, config.schema_dir.clone())
        .with_base_dn(config.base_dn.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    tool.run(&config.command, &mut out)?;

    tool.into_client().unbind()?;
    Ok(())
}
