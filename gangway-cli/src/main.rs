//! Gangway CLI - drive a companion server from the terminal
//!
//! Always runs in remote mode: a terminal session has no desktop shell, so
//! the facade resolves to the HTTP adapter — the same path browser sessions
//! take.

use clap::{Parser, Subcommand};
use colored::Colorize;
use gangway_client::{connect, HostEnv};
use gangway_core::{Bridge, Channel, Envelope, EventData, GangwayError, RemoteConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gangway")]
#[command(about = "Developer client for the gangway companion server", long_about = None)]
struct Cli {
    /// Companion server base URL
    #[arg(
        long,
        global = true,
        env = gangway_core::config::SERVER_URL_ENV,
        default_value = gangway_core::DEFAULT_SERVER_URL
    )]
    server_url: String,

    /// Event channel URL
    #[arg(
        long,
        global = true,
        env = gangway_core::config::EVENTS_URL_ENV,
        default_value = gangway_core::DEFAULT_EVENTS_URL
    )]
    events_url: String,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the companion server's version
    Version,

    /// Show the platform the companion server runs on
    Platform,

    /// Check companion server health
    Health,

    /// Manage stored API keys
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Show or change the local onboarding flag
    Onboarding {
        #[command(subcommand)]
        command: OnboardingCommands,
    },

    /// Stream events from a channel
    Watch {
        /// Channel name: task-event, permission-request or debug-log
        channel: String,
    },

    /// Push an event envelope to every connected watcher
    Emit {
        /// Channel name: task-event, permission-request or debug-log
        channel: String,

        /// JSON payload for the envelope's data field
        data: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// List providers with stored keys
    List,

    /// Store a key for a provider
    Set {
        provider: String,
        key: String,

        /// Human-readable label for the key
        #[arg(long)]
        label: Option<String>,
    },

    /// Print a provider's stored key
    Get { provider: String },

    /// Delete a provider's stored key
    Rm { provider: String },

    /// Check whether a provider has a stored key
    Exists { provider: String },

    /// Run the format-only check against a key
    Validate { provider: String, key: String },
}

#[derive(Subcommand)]
enum OnboardingCommands {
    /// Print the flag
    Show,

    /// Mark onboarding as complete
    Complete,

    /// Clear the flag
    Reset,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = RemoteConfig {
        server_url: cli.server_url.clone(),
        events_url: cli.events_url.clone(),
    };
    let bridge = connect(HostEnv {
        marker: None,
        bridge: None,
        config,
    });

    if let Err(err) = run(&cli, bridge).await {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, bridge: Arc<dyn Bridge>) -> gangway_core::Result<()> {
    match &cli.command {
        Commands::Version => {
            let version = bridge.app_version().await?;
            if cli.json {
                println!("{}", serde_json::json!({ "version": version }));
            } else {
                println!("{version}");
            }
        }

        Commands::Platform => {
            let platform = bridge.platform().await?;
            if cli.json {
                println!("{}", serde_json::json!({ "platform": platform }));
            } else {
                println!("{platform}");
            }
        }

        Commands::Health => {
            let body = get_json(&format!("{}/health", cli.server_url)).await?;
            if cli.json {
                println!("{body}");
            } else {
                let status = body
                    .get("status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                if status == "ok" {
                    println!("{}", "ok".green());
                } else {
                    println!("{status}");
                }
            }
        }

        Commands::Keys { command } => run_keys(cli, bridge.as_ref(), command).await?,

        Commands::Onboarding { command } => match command {
            OnboardingCommands::Show => {
                println!("{}", bridge.onboarding_complete().await?);
            }
            OnboardingCommands::Complete => {
                bridge.set_onboarding_complete(true).await?;
                println!("onboarding marked complete");
            }
            OnboardingCommands::Reset => {
                bridge.set_onboarding_complete(false).await?;
                println!("onboarding flag cleared");
            }
        },

        Commands::Watch { channel } => {
            let Some(parsed) = Channel::from_wire(channel) else {
                return Err(GangwayError::UnknownChannel(channel.clone()));
            };
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let _subscription = bridge.subscribe(
                parsed,
                Arc::new(move |event| {
                    let _ = tx.send(event);
                }),
            )?;
            eprintln!("watching {parsed} (ctrl-c to stop)");
            while let Some(event) = rx.recv().await {
                if cli.json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    print_event(&event);
                }
            }
        }

        Commands::Emit { channel, data } => {
            if Channel::from_wire(channel).is_none() {
                return Err(GangwayError::UnknownChannel(channel.clone()));
            }
            let envelope = Envelope {
                channel: channel.clone(),
                data: serde_json::from_str(data)?,
            };
            post_json(
                &format!("{}/api/events/emit", cli.server_url),
                &serde_json::to_value(&envelope)?,
            )
            .await?;
            println!("emitted on {channel}");
        }
    }
    Ok(())
}

async fn run_keys(
    cli: &Cli,
    bridge: &dyn Bridge,
    command: &KeyCommands,
) -> gangway_core::Result<()> {
    match command {
        KeyCommands::List => {
            let listing = bridge.list_api_keys().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if listing.is_empty() {
                println!("no API keys stored");
            } else {
                for (provider, status) in listing {
                    match status.prefix {
                        Some(prefix) => println!("{provider}  {prefix}…"),
                        None => println!("{provider}"),
                    }
                }
            }
        }
        KeyCommands::Set {
            provider,
            key,
            label,
        } => {
            bridge.set_api_key(provider, key, label.as_deref()).await?;
            println!("stored key for {provider}");
        }
        KeyCommands::Get { provider } => match bridge.get_api_key(provider).await? {
            Some(key) if cli.json => println!("{}", serde_json::json!({ "key": key })),
            Some(key) => println!("{key}"),
            None if cli.json => println!("{}", serde_json::json!({ "key": null })),
            None => println!("no key stored for {provider}"),
        },
        KeyCommands::Rm { provider } => {
            bridge.delete_api_key(provider).await?;
            println!("deleted key for {provider}");
        }
        KeyCommands::Exists { provider } => {
            println!("{}", bridge.api_key_exists(provider).await?);
        }
        KeyCommands::Validate { provider, key } => {
            let validation = bridge.validate_api_key(provider, key).await?;
            if cli.json {
                println!("{}", serde_json::to_string(&validation)?);
            } else {
                if validation.valid {
                    println!("{}", "valid".green());
                } else {
                    println!(
                        "{} {}",
                        "invalid".red(),
                        validation.error.unwrap_or_default()
                    );
                }
                println!("{} {}", "warning:".yellow(), validation.warning);
            }
        }
    }
    Ok(())
}

fn print_event(event: &EventData) {
    match event {
        EventData::Task(task) => {
            println!("{} {} {}", "task".cyan(), task.task_id, task.phase);
            if let Some(message) = &task.message {
                println!("  {message}");
            }
        }
        EventData::Permission(request) => {
            println!(
                "{} {} wants {}",
                "permission".yellow(),
                request.request_id,
                request.tool
            );
            if let Some(description) = &request.description {
                println!("  {description}");
            }
        }
        EventData::Debug(entry) => {
            println!("{} [{}] {}", "debug".dimmed(), entry.level, entry.message);
        }
    }
}

async fn get_json(url: &str) -> gangway_core::Result<serde_json::Value> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| GangwayError::Connection(e.to_string()))?;
    parse_json(response).await
}

async fn post_json(url: &str, body: &serde_json::Value) -> gangway_core::Result<serde_json::Value> {
    let response = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| GangwayError::Connection(e.to_string()))?;
    parse_json(response).await
}

async fn parse_json(response: reqwest::Response) -> gangway_core::Result<serde_json::Value> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| GangwayError::Connection(e.to_string()))?;
    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed")
            .to_string();
        return Err(GangwayError::Request {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}
