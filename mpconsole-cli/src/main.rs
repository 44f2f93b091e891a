//! mpconsole CLI
//!
//! Command-line front end for the subscription admin console.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (prompts for the password when --password is omitted)
//! mpconsole login admin
//!
//! # Check that the stored session is still accepted
//! mpconsole verify
//!
//! # Run the navigation guard against a route
//! mpconsole navigate /configs
//!
//! # List collected articles
//! mpconsole articles --search rust --format json
//! ```

mod output;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use mpconsole_core::api::articles::ArticleQuery;
use mpconsole_core::api::Page;
use mpconsole_core::{
    load_config, load_config_from, ClassifiedError, Console, ConsoleConfig, NavigationIntent,
};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "mpconsole")]
#[command(about = "Admin client for the subscription console backend")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session credential
    Login {
        /// Account name
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and clear the stored credential
    Logout,

    /// Ask the backend whether the stored credential is valid
    Verify,

    /// Show the signed-in user
    Whoami,

    /// Run the navigation guard for a route
    Navigate {
        /// Route path, e.g. /configs
        path: String,
    },

    /// List collected articles
    Articles {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Items per page
        #[arg(long, default_value_t = 10)]
        size: u32,

        /// Title search
        #[arg(short, long)]
        search: Option<String>,

        /// Subscription id to filter by
        #[arg(long)]
        account: Option<i64>,
    },

    /// List subscribed accounts
    Subscriptions,

    /// List backend configuration entries
    Configs {
        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Items per page
        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// List message push tasks
    Tasks {
        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Items per page
        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// Show backend system information
    SysInfo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => load_config().context("failed to load config")?,
    };
    init_logging(&config, cli.verbose);
    debug!(config = ?config.config_path, base_url = %config.base_url, "configuration loaded");

    let console = Console::from_config(config).context("failed to set up console")?;
    let format = cli.format;

    match cli.command {
        Commands::Login { username, password } => login(&console, &username, password).await,
        Commands::Logout => logout(&console).await,
        Commands::Verify => verify(&console).await,
        Commands::Whoami => {
            let user = console
                .client()
                .current_user()
                .await
                .map_err(|e| failure(&console, e))?;
            output::emit(format, &user, output::user)
        }
        Commands::Navigate { path } => {
            let navigation = console.navigator().navigate(&path).await;
            output::navigation(&navigation);
            Ok(())
        }
        Commands::Articles {
            page,
            size,
            search,
            account,
        } => {
            let query = ArticleQuery {
                page,
                page_size: size,
                search,
                account_id: account,
                ..ArticleQuery::default()
            };
            let listing = console
                .client()
                .list_articles(&query)
                .await
                .map_err(|e| failure(&console, e))?;
            output::emit(format, &listing, output::articles)
        }
        Commands::Subscriptions => {
            let subscriptions = console
                .client()
                .list_subscriptions()
                .await
                .map_err(|e| failure(&console, e))?;
            output::emit(format, &subscriptions, output::subscriptions)
        }
        Commands::Configs { page, size } => {
            let listing = console
                .client()
                .list_configs(Page::new(page, size))
                .await
                .map_err(|e| failure(&console, e))?;
            output::emit(format, &listing, output::configs)
        }
        Commands::Tasks { page, size } => {
            let listing = console
                .client()
                .list_message_tasks(Page::new(page, size))
                .await
                .map_err(|e| failure(&console, e))?;
            output::emit(format, &listing, output::tasks)
        }
        Commands::SysInfo => {
            let info = console
                .client()
                .sys_info()
                .await
                .map_err(|e| failure(&console, e))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
    }
}

fn init_logging(config: &ConsoleConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn login(console: &Console, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password().context("failed to read password")?,
    };

    let (grant, navigation) = console
        .login(username, &password)
        .await
        .map_err(|e| failure(console, e))?;

    println!("Logged in as {}", username);
    if let Some(expires_in) = grant.expires_in {
        println!("  Session valid for {}s", expires_in);
    }
    output::navigation(&navigation);
    Ok(())
}

async fn logout(console: &Console) -> Result<()> {
    match console.logout().await {
        Ok(()) => println!("Logged out"),
        Err(e) => println!("Logged out locally (backend: {})", e),
    }
    Ok(())
}

async fn verify(console: &Console) -> Result<()> {
    if !console.client().session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    console
        .client()
        .verify()
        .await
        .map_err(|e| failure(console, e))?;
    println!("Session is valid");
    Ok(())
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Turn a failed call into the CLI error, pointing at the login route when
/// the session ended.
fn failure(console: &Console, error: ClassifiedError) -> anyhow::Error {
    if error.is_session_expired() {
        let navigator = console.navigator();
        let location = navigator
            .process_redirects()
            .map(|intent| intent.location())
            .unwrap_or_else(|| {
                NavigationIntent::session_expired(
                    &console.config().login_route,
                    navigator.location(),
                )
                .location()
            });
        eprintln!("Please log in again: {}", location);
    }
    anyhow::Error::new(error)
}
