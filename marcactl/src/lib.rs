use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use thiserror::Error;

use marca_core::browser::SessionLauncher;
use marca_core::{
    load_checker_config, AvailabilityChecker, CheckerConfig, RegistryCredentials,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] marca_core::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Brand availability check interface", long_about = None)]
pub struct Cli {
    /// Caminho do marca.toml principal
    #[arg(long, default_value = "configs/marca.toml")]
    pub config: PathBuf,
    /// Usuário do sistema de busca do registro (substitui o config)
    #[arg(long)]
    pub registry_user: Option<String>,
    /// Senha do sistema de busca do registro (substitui o config)
    #[arg(long)]
    pub registry_password: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verifica disponibilidade de um nome (registro + handles sociais)
    Check {
        /// Nome candidato, como exibido
        name: String,
        /// Classe NCL para filtrar a busca no registro (1-45)
        #[arg(long = "class", value_parser = clap::value_parser!(u8).range(1..=45))]
        ncl: Option<u8>,
        /// Emite JSON em linha única em vez de identado
        #[arg(long)]
        compact: bool,
    },
    /// Gera completions de shell
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { name, ncl, compact } => {
            let config = resolve_config(&cli.config, cli.registry_user, cli.registry_password)?;
            let report = run_check(config, &name, ncl)?;
            let rendered = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{rendered}");
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn resolve_config(
    path: &PathBuf,
    registry_user: Option<String>,
    registry_password: Option<String>,
) -> Result<CheckerConfig> {
    let mut config = if path.exists() {
        load_checker_config(path)?
    } else {
        CheckerConfig::default()
    };
    if let (Some(username), Some(password)) = (registry_user, registry_password) {
        config.registry.credentials = Some(RegistryCredentials { username, password });
    }
    Ok(config)
}

fn run_check(
    config: CheckerConfig,
    name: &str,
    ncl: Option<u8>,
) -> Result<marca_core::AvailabilityReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let config = Arc::new(config);
    let sessions = Arc::new(SessionLauncher::new(Arc::clone(&config)));
    let checker = AvailabilityChecker::new(config, sessions);
    Ok(runtime.block_on(checker.check(name, ncl)))
}
