use clap::{Parser, Subcommand};

/// deskhub: notification service for the office marketplace
#[derive(Parser)]
#[command(name = "deskhub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to DESKHUB_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a notification directly in the store
    Notify {
        /// Recipient user id
        #[arg(long)]
        user: String,
        /// meeting_invite, chat, task or generic
        #[arg(long = "type", default_value = "generic")]
        kind: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        message: String,
        /// JSON payload, e.g. '{"meetingId":"abc"}'
        #[arg(long)]
        data: Option<String>,
    },

    /// Print the current user's feed (uses DESKHUB_API_URL / DESKHUB_TOKEN)
    Feed,

    /// Mark one notification as read
    Ack { id: i64 },

    /// Mark every notification as read
    AckAll,

    /// Mint a local development session token
    Token {
        #[arg(long)]
        user: String,
        /// Lifetime in hours
        #[arg(long, default_value = "24")]
        hours: i64,
    },
}
