use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "intake", version, about = "Conversational application intake", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the completion relay HTTP server
    Serve,

    /// Fill in an application from the terminal through a running relay
    Chat {
        /// Relay endpoint, defaults to client.relay_url from the config
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Inspect stored applications
    Applications {
        #[command(subcommand)]
        action: ApplicationAction,
    },
}

#[derive(Subcommand)]
pub enum ApplicationAction {
    /// List the most recent applications
    List {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Print one application as JSON
    Show {
        id: String,
    },
}
