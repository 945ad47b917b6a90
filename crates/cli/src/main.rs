//! uShop CLI - vendor moderation from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List pending applications
//! ushop-cli vendors list
//!
//! # List approved shops
//! ushop-cli vendors list --status approved
//!
//! # Approve or reject an application
//! ushop-cli vendors approve 5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10
//! ushop-cli vendors reject 5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10 -r "Incomplete address"
//!
//! # Toggle the verified badge
//! ushop-cli vendors verify 5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10 --off
//!
//! # Platform counters
//! ushop-cli stats
//! ```
//!
//! # Commands
//!
//! - `vendors list|approve|reject|verify` - Moderate vendor applications
//! - `stats` - Show platform counters

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use ushop_core::{VendorId, VendorStatus};

mod commands;

#[derive(Parser)]
#[command(name = "ushop-cli")]
#[command(author, version, about = "uShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Moderate vendor applications
    Vendors {
        #[command(subcommand)]
        action: VendorAction,
    },
    /// Show platform counters
    Stats,
}

#[derive(Subcommand)]
enum VendorAction {
    /// List applications in a status
    List {
        /// Status to list (`pending`, `approved`, `rejected`)
        #[arg(short, long, default_value = "pending")]
        status: VendorStatus,
    },
    /// Approve a pending application
    Approve {
        /// Vendor ID
        id: VendorId,
    },
    /// Reject a pending application
    Reject {
        /// Vendor ID
        id: VendorId,

        /// Reason shown to the applicant
        #[arg(short, long)]
        reason: String,
    },
    /// Set or clear the verified badge
    Verify {
        /// Vendor ID
        id: VendorId,

        /// Remove the badge instead of granting it
        #[arg(long)]
        off: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CommandError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let client = commands::connect()?;
    match cli.command {
        Commands::Vendors { action } => match action {
            VendorAction::List { status } => commands::vendors::list(&client, status).await?,
            VendorAction::Approve { id } => commands::vendors::approve(&client, id).await?,
            VendorAction::Reject { id, reason } => {
                commands::vendors::reject(&client, id, &reason).await?;
            }
            VendorAction::Verify { id, off } => {
                commands::vendors::verify(&client, id, !off).await?;
            }
        },
        Commands::Stats => commands::vendors::stats(&client).await?,
    }
    Ok(())
}
