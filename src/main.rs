mod client;
mod config;
mod driver;
mod model;
mod render;

use crate::client::ApiClient;
use crate::config::{Config, Scope, resolve, save};
use crate::driver::{Driver, INTERRUPTED_MESSAGE, report_failure};
use crate::render::{OutputFormat, render_sites, render_wlans};
use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mistclone",
    version,
    about = "Clone Mist WLAN configurations within a site"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "API token override for this invocation (otherwise MIST_API_TOKEN or config)"
    )]
    api_token: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "ORG_ID",
        help = "Organization ID override (otherwise MIST_ORG_ID or config)"
    )]
    org_id: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Regional API base URL (defaults to https://api.eu.mist.com/api/v1)"
    )]
    base_url: Option<String>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        global = true,
        help = "Output format for the listing commands"
    )]
    output: OutputFormat,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v info, -vv debug); RUST_LOG wins when set"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively clone a WLAN (default when no command is given)
    Clone,
    /// Persist the API token and/or organization ID to the chosen scope
    Configure {
        #[arg(long)]
        token: Option<String>,
        #[arg(long, value_name = "ORG_ID")]
        org: Option<String>,
        #[arg(
            long = "store-base-url",
            value_name = "URL",
            help = "Optional base URL to store alongside the credentials"
        )]
        store_base_url: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Show the configuration from files and environment (token masked)
    ConfigShow,
    /// List the organization's sites, sorted by name
    Sites,
    /// List a site's WLANs, sorted by SSID
    Wlans {
        #[arg(long, value_name = "SITE_ID")]
        site: String,
    },
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Loaded first so RUST_LOG from .env reaches the subscriber.
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);
    let cwd = std::env::current_dir().context("reading current directory")?;

    let overrides = Config {
        api_token: cli.api_token.clone(),
        org_id: cli.org_id.clone(),
        base_url: cli.base_url.clone(),
    };

    match cli.command.unwrap_or(Commands::Clone) {
        Commands::Clone => run_interactive(&cwd, overrides)?,
        Commands::Configure {
            token,
            org,
            store_base_url,
            scope,
        } => {
            if token.is_none() && org.is_none() && store_base_url.is_none() {
                return Err(anyhow!(
                    "Nothing to store; pass --token, --org and/or --store-base-url"
                ));
            }
            let mut existing = config::load_scope(scope.into(), &cwd)?;
            existing = config::merge(
                existing,
                Config {
                    api_token: token,
                    org_id: org,
                    base_url: store_base_url,
                },
            );
            let path = save(scope.into(), &existing, &cwd)?;
            println!("Saved configuration to {}", path.display());
        }
        Commands::ConfigShow => {
            let merged = config::load_with_env(&cwd)?;
            let merged = config::merge(merged, overrides);
            println!("{}", serde_json::to_string_pretty(&config::masked(&merged))?);
        }
        Commands::Sites => {
            let client = build_client(&cwd, overrides)?;
            let sites = client.list_sites()?;
            render_sites(&mut io::stdout(), &sites, cli.output)?;
        }
        Commands::Wlans { site } => {
            let client = build_client(&cwd, overrides)?;
            let wlans = client.list_wlans(&site)?;
            render_wlans(&mut io::stdout(), &wlans, cli.output)?;
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut io::stdout())
                }
                CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut io::stdout())
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn build_client(cwd: &Path, overrides: Config) -> Result<ApiClient> {
    let effective = resolve(cwd, overrides)?;
    ApiClient::new(&effective.base_url, &effective.api_token, &effective.org_id)
}

fn run_interactive(cwd: &Path, overrides: Config) -> Result<()> {
    ctrlc::set_handler(|| {
        println!("\n{INTERRUPTED_MESSAGE}");
        std::process::exit(0);
    })
    .context("installing Ctrl-C handler")?;

    println!("Initializing Mist WiFi Cloner...");
    let client = build_client(cwd, overrides)?;

    // Stdout stays unlocked between writes so the Ctrl-C handler can print.
    let result = Driver::new(&client, io::stdin().lock(), io::stdout()).run();
    match result {
        Ok(created) => info!(clones = created.len(), "run finished"),
        Err(err) => report_failure(&mut io::stdout(), &err)?,
    }
    Ok(())
}
