//! Konvy CLI - Database migrations and order code tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! konvy-cli migrate
//!
//! # Issue an order code (generated when --code is omitted)
//! konvy-cli order create -p "Fortnite Account" -c OG-SKULL-01
//!
//! # Print a random code without storing it
//! konvy-cli order generate-code
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "konvy-cli")]
#[command(author, version, about = "Konvy CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage order codes
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Issue a new order code on behalf of the owner account
    Create {
        /// Product name shown to the customer
        #[arg(short, long)]
        product: String,

        /// Order code; a random 8-character code is used when omitted
        #[arg(short, long)]
        code: Option<String>,
    },
    /// Print a random order code
    GenerateCode,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Order { action } => match action {
            OrderAction::Create { product, code } => {
                commands::order::create(&product, code.as_deref()).await?;
            }
            OrderAction::GenerateCode => commands::order::generate_code(),
        },
    }
    Ok(())
}
