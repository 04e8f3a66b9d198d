//! Operator CLI over the ELEOT use-case API.
//!
//! Prints one JSON document per invocation so output can be piped into
//! other tools. Configuration comes from `ELEOT_*` environment variables.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use eleot_api::{AppConfig, AppContext};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "eleot", version, about = "ELEOT observation store tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check core linkage without opening the database.
    Ping,
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that need an opened application context.
#[derive(Debug, Subcommand)]
enum StoreCommand {
    /// Save one observation payload for a user.
    Save {
        #[arg(long)]
        user: String,
        /// JSON object with the observation fields.
        #[arg(long)]
        data: String,
        /// Check `scores` against the ELEOT rubric first.
        #[arg(long)]
        validate: bool,
    },
    /// List a user's observations, newest first.
    List {
        #[arg(long)]
        user: String,
    },
    /// Fetch one observation by id.
    Get {
        #[arg(long)]
        id: String,
    },
    /// Send one settings message to the extension relay.
    Relay {
        /// JSON message, e.g. '{"action":"getApiEndpoint"}'.
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Ping => json!({
            "ping": eleot_core::ping(),
            "version": eleot_core::core_version(),
        }),
        Command::Store(command) => {
            let config = AppConfig::from_env();
            let app = AppContext::bootstrap(&config)
                .await
                .with_context(|| format!("failed to open {}", config.db_path.display()))?;
            run(&app, command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(app: &AppContext, command: StoreCommand) -> Result<Value> {
    let output = match command {
        StoreCommand::Save {
            user,
            data,
            validate,
        } => {
            let data = parse_json(&data)?;
            let response = if validate {
                app.save_validated_observation(&user, data).await
            } else {
                app.save_observation(&user, data).await
            };
            serde_json::to_value(response)?
        }
        StoreCommand::List { user } => serde_json::to_value(app.list_observations(&user).await)?,
        StoreCommand::Get { id } => serde_json::to_value(app.get_observation(&id).await)?,
        StoreCommand::Relay { message } => {
            let message = parse_json(&message)?;
            match app.relay_message(&message).await {
                Some(response) => serde_json::to_value(response)?,
                None => bail!("relay ignored the message: unrecognized action"),
            }
        }
    };
    Ok(output)
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("invalid JSON argument: {raw}"))
}
