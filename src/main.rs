mod assistant;
mod chat;
mod linkup;
mod markdown;
mod openai;

pub const USER_AGENT: &str = concat!("juris/", env!("CARGO_PKG_VERSION"));

use clap::{Parser, Subcommand};
use reqwest::Client;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use assistant::{Assistant, Responder};
use linkup::LinkupClient;
use openai::OpenAiClient;

const DEFAULT_LOG_FILTER: &str = "juris=warn";
const DEFAULT_QUESTION: &str = "Explique moi les principes de l'article L121-2 du code de commerce ?";

#[derive(Parser)]
#[command(name = "juris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question and print the sources (default)
    Ask {
        /// Question to ask; a built-in example is used when omitted
        question: Option<String>,
    },
    /// Start an interactive conversation
    Chat,
}

/// `RUST_LOG` wins when it is set and parses; otherwise only this crate's warnings show.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Shared by both API clients. No timeouts are set; library defaults apply.
fn http_client() -> reqwest::Result<Client> {
    Client::builder().build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();

    let http = http_client()?;
    let openai = OpenAiClient::from_env(http.clone())
        .inspect_err(|e| warn!("OpenAI client not available: {e}"))
        .ok();
    let linkup = LinkupClient::from_env(http)
        .inspect_err(|e| warn!("Linkup client not available: {e}"))
        .ok();
    let assistant = Assistant::new(openai, linkup);

    match cli.command.unwrap_or(Command::Ask { question: None }) {
        Command::Ask { question } => {
            let question = question.unwrap_or_else(|| DEFAULT_QUESTION.to_string());
            info!(question = %question, "answering one question");
            let answer = assistant.respond(&question, &[]).await?;
            print!("{}", chat::render::one_shot(&answer));
        }
        Command::Chat => {
            info!("starting chat session");
            let stdin = BufReader::new(tokio::io::stdin());
            chat::run(&assistant, stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
