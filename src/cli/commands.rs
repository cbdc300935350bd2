use clap::{Parser, Subcommand};

/// `SouqBot` - AliExpress product cards for Telegram chats.
#[derive(Parser, Debug)]
#[command(name = "souqbot")]
#[command(version = "0.1.0")]
#[command(about = "Replies to AliExpress links with localized product cards.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the Telegram bot
    Run,

    /// Check channel health and catalog credentials
    Doctor,

    /// Resolve a message or URL to a product id (debug helper)
    Resolve {
        /// Message text or URL to scan
        text: String,
    },

    /// Fetch a product and print the rendered reply (debug helper)
    Fetch {
        /// Numeric product id
        id: u64,

        /// Reply locale override (default: the configured catalog language)
        #[arg(long)]
        locale: Option<String>,
    },
}
