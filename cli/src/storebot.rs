//! # `storebot`: Operator Command Line for the App Store Bot
//!
//! Runs the same actions the chat router runs, against the live upstreams
//! and the configured store, and prints the plain-text reply. Useful for
//! checking a deployment and for managing VIP users.
//!
//! ## Usage
//!
//! ```bash
//! storebot --user alice chart us
//! storebot --user alice chart jp --paid
//! storebot price "Things 3" --region jp
//! storebot os ipad
//! storebot --user admin vip set bob
//! storebot --user admin status
//! ```
//!
//! Settings come from `--config` (JSON), `.env` and `STOREBOT_*` variables.
//! Without a Redis URL an in-memory store is used, so quotas and cache only
//! live for the duration of one invocation.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_storebot::appstore::ChartKind;
use lib_storebot::configs::load_settings;
use lib_storebot::firmware::Platform;
use lib_storebot::loggers::init_tracing;
use lib_storebot::services::{open_store, ActionReply, ActionRequest, StoreBot};
use lib_storebot::StoreBotError;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "storebot", about = "Query the App Store bot's data layer", version)]
struct Args {
    /// JSON settings file.
    #[arg(short, long, env = "STOREBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Redis URL; overrides the settings file.
    #[arg(long, env = "STOREBOT_REDIS_URL")]
    redis_url: Option<String>,

    /// User the request is made as (quota and admin checks).
    #[arg(short, long, default_value = "", env = "STOREBOT_USER")]
    user: String,

    /// Print the reply as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Log filter when RUST_LOG is unset; defaults to the configured level.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top-10 chart of a storefront.
    Chart {
        /// Two-letter storefront code.
        region: String,
        /// Paid chart instead of free.
        #[arg(long)]
        paid: bool,
    },
    /// Price of the best-matching app.
    Price {
        app: String,
        #[arg(short, long, default_value = "us")]
        region: String,
    },
    /// Rating, size, version and requirements of an app.
    Detail { app: String },
    /// Largest reachable icon of an app.
    Icon { app: String },
    /// Latest OS releases; with a platform, its recent history.
    Os { platform: Option<String> },
    /// Grant or revoke VIP status (admins only).
    Vip {
        #[command(subcommand)]
        change: VipChange,
    },
    /// Store and quota status (admins only).
    Status,
}

#[derive(Subcommand, Debug)]
enum VipChange {
    Set { user: String },
    Clear { user: String },
}

/// The message a chat user would see for a failed action.
fn outcome_message(err: &StoreBotError) -> String {
    match err {
        StoreBotError::QuotaExceeded { limit, reset_at } => {
            format!("Daily limit of {limit} requests reached; resets at {reset_at}.")
        }
        StoreBotError::InvalidInput(msg) => format!("Invalid request: {msg}."),
        StoreBotError::Unauthorized(_) => "This command is for administrators only.".to_string(),
        e if e.is_no_data() => "No data available right now.".to_string(),
        e if e.is_temporarily_unavailable() => "Apple's service is temporarily unavailable, please try again later.".to_string(),
        e => format!("Request failed: {e}"),
    }
}

fn request_for(command: &Command) -> Result<Option<ActionRequest>> {
    Ok(Some(match command {
        Command::Chart { region, paid } => ActionRequest::Chart {
            region: region.clone(),
            kind: if *paid { ChartKind::Paid } else { ChartKind::Free },
        },
        Command::Price { app, region } => ActionRequest::Price {
            app: app.clone(),
            region: region.clone(),
        },
        Command::Detail { app } => ActionRequest::Detail { app: app.clone() },
        Command::Icon { app } => ActionRequest::Icon { app: app.clone() },
        Command::Os { platform: None } => ActionRequest::OsSummary,
        Command::Os { platform: Some(name) } => ActionRequest::OsDetail {
            platform: name.parse::<Platform>()?,
        },
        Command::Vip { .. } | Command::Status => return Ok(None),
    }))
}

fn print_reply(reply: &ActionReply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply).context("serializing reply")?);
    } else {
        print!("{reply}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("loading settings")?;
    if args.redis_url.is_some() {
        settings.redis_url = args.redis_url.clone();
    }
    let level = args.log_level.clone().unwrap_or_else(|| settings.log_level.clone());
    init_tracing(&level, false).context("initializing logging")?;
    debug!("{settings}");

    let store = open_store(&settings).context("opening store")?;
    let bot = StoreBot::from_settings(&settings, store).context("building clients")?;

    match &args.command {
        Command::Vip { change } => {
            let (user, enabled) = match change {
                VipChange::Set { user } => (user, true),
                VipChange::Clear { user } => (user, false),
            };
            match bot.set_vip(&args.user, user, enabled).await {
                Ok(()) => println!("VIP {} for {user}.", if enabled { "granted" } else { "revoked" }),
                Err(e) => println!("{}", outcome_message(&e)),
            }
        }
        Command::Status => match bot.admin_status(&args.user).await {
            Ok(status) if args.json => println!("{}", serde_json::to_string_pretty(&status)?),
            Ok(status) => print!("{status}"),
            Err(e) => println!("{}", outcome_message(&e)),
        },
        action => {
            if let Some(request) = request_for(action)? {
                match bot.handle(&args.user, request).await {
                    Ok(reply) => print_reply(&reply, args.json)?,
                    Err(e) => println!("{}", outcome_message(&e)),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_map_to_requests() {
        let args = Args::try_parse_from(["storebot", "os", "ipad"]).unwrap();
        assert_eq!(
            request_for(&args.command).unwrap(),
            Some(ActionRequest::OsDetail { platform: Platform::IpadOs })
        );

        let args = Args::try_parse_from(["storebot", "chart", "jp", "--paid"]).unwrap();
        assert_eq!(
            request_for(&args.command).unwrap(),
            Some(ActionRequest::Chart { region: "jp".into(), kind: ChartKind::Paid })
        );

        let args = Args::try_parse_from(["storebot", "status"]).unwrap();
        assert_eq!(request_for(&args.command).unwrap(), None);

        let args = Args::try_parse_from(["storebot", "os", "windows"]).unwrap();
        assert!(request_for(&args.command).is_err());
    }

    #[test]
    fn failures_read_like_chat_replies() {
        let empty = StoreBotError::UpstreamEmptyResult { source_name: "chart" };
        assert_eq!(outcome_message(&empty), "No data available right now.");
        let denied = StoreBotError::Unauthorized("bob".into());
        assert_eq!(outcome_message(&denied), "This command is for administrators only.");
    }
}
