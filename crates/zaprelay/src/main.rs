//! zaprelay - relay prompts to an LLM agent with Zapier NLA tools

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{chat_command, init_command, portal_command, tools_command};

/// zaprelay - prompt relay for an automation agent
#[derive(Parser)]
#[command(name = "zaprelay")]
#[command(about = "◆ Relay prompts to an LLM agent armed with Zapier NLA actions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the config file
    Init,
    /// Relay prompts typed in the terminal
    Chat {
        /// LLM provider: "openai" or "hugging face"
        #[arg(long)]
        llm: String,
        /// Model name or Hugging Face repo id
        #[arg(long = "model-name", alias = "model_name")]
        model_name: Option<String>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Serve the web form portal
    Portal {
        /// LLM provider: "openai" or "hugging face"
        #[arg(long, default_value = "openai")]
        llm: String,
        /// Model name or Hugging Face repo id
        #[arg(long = "model-name", alias = "model_name")]
        model_name: Option<String>,
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the tools your keys expose
    Tools {
        /// LLM provider: "openai" or "hugging face"
        #[arg(long)]
        llm: String,
        /// Model name or Hugging Face repo id
        #[arg(long = "model-name", alias = "model_name")]
        model_name: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(
        cli.command,
        Commands::Chat { verbose: true, .. } | Commands::Portal { verbose: true, .. }
    );
    init_tracing(verbose);

    match cli.command {
        Commands::Init => exit_on_error(init_command().await),
        Commands::Chat {
            llm, model_name, ..
        } => exit_on_error(chat_command(llm, model_name).await),
        Commands::Portal {
            llm,
            model_name,
            host,
            port,
            ..
        } => exit_on_error(portal_command(llm, model_name, host, port).await),
        Commands::Tools { llm, model_name } => exit_on_error(tools_command(llm, model_name).await),
    }
}
