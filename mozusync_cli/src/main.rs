use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use mozusync_cli::auth::{self, AuthTarget};
use mozusync_cli::commands::{App, WatchSession, list_targets, run_specs};
use mozusync_cli::config::{ConfigManager, SharedConfig};
use mozusync_cli::error::{CliError, CliResult};
use mozusync_cli::output::Console;
use mozusync_cli::prompt::DialoguerPrompter;
use mozusync_cli::terminal;
use mozusync_core::auth::{FileTicketStore, PRODUCTION_BASE_URL, TicketStore};
use mozusync_core::client::{AppDevClientFactory, HttpClientFactory};
use mozusync_core::security::{CredentialStore, create_credential_store};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mozusync")]
#[command(author, version, about = "Sync a local theme or application with the Mozu Developer Center", long_about = None)]
struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more targets
    Run {
        /// Targets as `name[:user[:password]]`
        #[arg(required = true, value_name = "TARGET")]
        targets: Vec<String>,
    },

    /// Watch the project and rerun the `[watch].tasks` targets on change
    Watch,

    /// List configured targets
    Targets {
        /// Print each target's merged options
        #[arg(long)]
        show: bool,
    },

    /// Manage saved developer account passwords
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum AuthCommand {
    /// Save a password
    Login(AuthArgs),
    /// Remove a saved password and its auth ticket
    Logout(AuthArgs),
    /// Show saved accounts
    Status(AuthArgs),
}

#[derive(clap::Args)]
struct AuthArgs {
    /// Environment URL; defaults to the project's `options.context.base_url`
    #[arg(long)]
    base_url: Option<String>,

    /// Developer account email; defaults to the project's developer account
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .filter_module("mozusync_core", log::LevelFilter::Debug)
            .filter_module("mozusync_cli", log::LevelFilter::Debug)
            .filter_module("mozusync", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if !terminal::supports_ansi() {
        colored::control::set_override(false);
    }

    let verbose = cli.verbose;
    match execute(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error.format_for_user(verbose));
            std::process::ExitCode::from(error.exit_code() as u8)
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let manager = ConfigManager::new(cli.config);

    match cli.command {
        Commands::Run { targets } => {
            let config = manager.load()?;
            let app = App::new(manager, http_factory().await?, Console::stdout());
            run_specs(&app, &config, &targets).await?;
        }
        Commands::Watch => {
            let config = manager.load()?;
            let app = App::new(manager, http_factory().await?, Console::stdout());
            let session = WatchSession::attach(&app, config)?;
            session.run(&app).await?;
        }
        Commands::Targets { show } => {
            let config = manager.load()?;
            list_targets(&manager, &Console::stdout(), &config, show)?;
        }
        Commands::Auth { command } => {
            let (args, action) = match command {
                AuthCommand::Login(args) => (args, AuthAction::Login),
                AuthCommand::Logout(args) => (args, AuthAction::Logout),
                AuthCommand::Status(args) => (args, AuthAction::Status),
            };
            let target = auth_target(&manager, args)?;
            match action {
                AuthAction::Login => auth::login(&target).await?,
                AuthAction::Logout => auth::logout(&target).await?,
                AuthAction::Status => auth::status(&target).await?,
            }
        }
        Commands::Completions { shell } => generate_completions(shell),
    }

    Ok(())
}

enum AuthAction {
    Login,
    Logout,
    Status,
}

/// Flags first, then the project's task-level context
fn auth_target(manager: &ConfigManager, args: AuthArgs) -> CliResult<AuthTarget> {
    let shared = SharedConfig::new(manager.load()?);
    let configured = |key: &str| {
        shared
            .get(key)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|value| !value.is_empty())
    };

    Ok(AuthTarget {
        base_url: args
            .base_url
            .or_else(|| configured("options.context.base_url"))
            .unwrap_or_else(|| PRODUCTION_BASE_URL.to_string()),
        email_address: args
            .email
            .or_else(|| configured("options.context.developer_account.email_address")),
    })
}

async fn http_factory() -> CliResult<Arc<dyn AppDevClientFactory>> {
    let tickets: Arc<dyn TicketStore> = Arc::new(
        FileTicketStore::open_default()
            .map_err(|e| CliError::filesystem(&format!("Failed to open ticket cache: {e}")))?,
    );
    let passwords: Arc<dyn CredentialStore> = Arc::from(
        create_credential_store()
            .await
            .context("Failed to open credential store")?,
    );

    Ok(Arc::new(HttpClientFactory::new(
        tickets,
        passwords,
        Arc::new(DialoguerPrompter),
    )))
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
