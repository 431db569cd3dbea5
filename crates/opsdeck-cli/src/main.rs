mod console;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use opsdeck_core::command::Registry;
use opsdeck_core::config::{OpsConfig, WarnLevel};
use opsdeck_core::context::CommandContext;
use opsdeck_ops::commands;
use opsdeck_ops::directory::OpsServices;
use opsdeck_ops::http::HttpDirectory;
use opsdeck_ops::memory::{self, InMemoryDirectory};
use opsdeck_ops::model::{Member, Repository, SourceProject, Team};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "opsdeck",
    about = "Chat-style provisioning console — teams, projects, environments, repositories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file (default: built-in defaults)
    #[arg(long, global = true, env = "OPSDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command, answering its prompts interactively
    Run {
        /// Command id (see `opsdeck commands`)
        command: String,

        /// Pre-set a parameter, skipping its prompt
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Chat user identity to act as
        #[arg(long, default_value = "console-user")]
        user: String,

        /// Channel the invocation originates from
        #[arg(long, default_value = "console")]
        channel: String,

        /// Use seeded in-memory services instead of the configured backend
        #[arg(long)]
        demo: bool,
    },

    /// List the available commands
    Commands,

    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => OpsConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => OpsConfig::default(),
    };

    match cli.command {
        Commands::Run {
            command,
            set,
            user,
            channel,
            demo,
        } => {
            let services = if demo {
                memory::services(demo_directory(&user, &channel))
            } else {
                http_services(&config)
            };
            let registry = commands::registry(&config, &services)?;

            let mut ctx = CommandContext::new(command, user, channel);
            for pair in &set {
                let (name, value) = pair
                    .split_once('=')
                    .with_context(|| format!("--set '{pair}' is not NAME=VALUE"))?;
                ctx = ctx.with_value(name, value);
            }

            let outcome = console::converse(&registry, ctx).await?;
            println!("{}", outcome.message);
            if !outcome.success {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Commands => {
            // Listing never calls a service; inert handles are enough.
            let services = memory::services(Arc::new(InMemoryDirectory::new()));
            let registry = commands::registry(&config, &services)?;
            print_listing(&registry, cli.json)
        }

        Commands::Check => check(&config, cli.json),
    }
}

fn print_listing(registry: &Registry, json: bool) -> anyhow::Result<()> {
    let listing = registry.describe();
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for (id, description) in listing {
            println!("{id:<18} {description}");
        }
    }
    Ok(())
}

fn check(config: &OpsConfig, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();
    if json {
        println!("{}", serde_json::to_string_pretty(&warnings)?);
    } else if warnings.is_empty() {
        println!("configuration ok");
    } else {
        for warning in &warnings {
            let level = match warning.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("{level}: {}", warning.message);
        }
    }
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        std::process::exit(1);
    }
    Ok(())
}

fn http_services(config: &OpsConfig) -> OpsServices {
    let http = Arc::new(HttpDirectory::new(&config.services));
    OpsServices {
        teams: http.clone(),
        projects: http.clone(),
        members: http.clone(),
        repos: http.clone(),
        provisioner: http,
    }
}

/// Offline fixture data for `--demo`: the acting user belongs to two teams,
/// one of which already has a project with source repositories, so every
/// prompt shape is reachable without a backend.
fn demo_directory(user: &str, channel: &str) -> Arc<InMemoryDirectory> {
    Arc::new(
        InMemoryDirectory::new()
            .with_member(Member {
                member_id: "demo-member".to_string(),
                name: "Demo User".to_string(),
                chat_user_id: user.to_string(),
            })
            .with_team(Team {
                team_id: "demo-team-1".to_string(),
                name: "platform".to_string(),
                description: "Platform engineering".to_string(),
                cloud: "community".to_string(),
                channel: None,
                owners: vec![user.to_string()],
                members: Vec::new(),
            })
            .with_team(Team {
                team_id: "demo-team-2".to_string(),
                name: "payments".to_string(),
                description: "Payments".to_string(),
                cloud: "community".to_string(),
                channel: Some(channel.to_string()),
                owners: vec![user.to_string()],
                members: Vec::new(),
            })
            .with_project(opsdeck_ops::model::Project {
                project_id: "demo-project-1".to_string(),
                name: "checkout".to_string(),
                description: "Checkout flow".to_string(),
                team_name: "payments".to_string(),
                source_project: Some(SourceProject {
                    key: "CHECKOUT".to_string(),
                    name: "checkout".to_string(),
                }),
            })
            .with_repositories(
                "CHECKOUT",
                vec![
                    Repository {
                        slug: "checkout-api".to_string(),
                        name: "Checkout API".to_string(),
                    },
                    Repository {
                        slug: "checkout-web".to_string(),
                        name: "Checkout Web".to_string(),
                    },
                ],
            ),
    )
}
