use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use grok_filter_contracts::chat::{ChatBody, ChatMessage};
use grok_filter_contracts::events::{FilterEvent, JsonlNotifier, Notifier};
use grok_filter_contracts::valves::{
    FilterValves, ResponseFormat, UserContext, UserValves, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL,
};
use grok_filter_engine::{FilterChain, ImageGenerationFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const EXIT_NO_IMAGES: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "grok-filter", version, about = "Drive the Grok image filter from a terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate images for a single prompt and print the resulting body.
    Run(RunArgs),
    /// Read prompts from stdin, one per line.
    Chat(ChatArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    prompt: String,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long, env = "XAI_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,
    #[arg(long, env = "XAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
    #[arg(long, env = "GROK_FILTER_PRIORITY", default_value_t = 0)]
    priority: i64,
    #[arg(long, env = "GROK_FILTER_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    model: String,
    #[arg(long, env = "GROK_FILTER_N", default_value_t = 1)]
    n: u32,
    #[arg(long, env = "GROK_FILTER_RESPONSE_FORMAT", default_value = "url")]
    response_format: ResponseFormat,
    #[arg(long, env = "GROK_FILTER_USER")]
    user: Option<String>,
    /// Append status events to this JSONL file.
    #[arg(long, env = "GROK_FILTER_EVENTS")]
    events: Option<PathBuf>,
}

impl FilterArgs {
    fn filter_valves(&self) -> FilterValves {
        FilterValves::new(self.api_key.clone(), self.api_base.clone()).with_priority(self.priority)
    }

    fn user_context(&self) -> UserContext {
        UserContext::new(UserValves {
            model: self.model.clone(),
            n: self.n,
            response_format: self.response_format,
            user: self.user.clone(),
        })
    }

    fn notifier(&self) -> CliNotifier {
        let events = self
            .events
            .as_ref()
            .map(|path| JsonlNotifier::new(path, uuid::Uuid::new_v4().to_string()));
        if let Some(events) = events.as_ref() {
            info!(
                run_id = events.run_id(),
                path = %events.path().display(),
                "writing status events"
            );
        }
        CliNotifier { events }
    }

    fn chain(&self) -> Result<FilterChain> {
        let filter = ImageGenerationFilter::new(self.filter_valves())
            .context("failed to build image generation filter")?;
        info!(
            endpoint = %filter.valves().endpoint(),
            priority = filter.valves().priority,
            "image filter ready"
        );
        let mut chain = FilterChain::new();
        chain.register(filter);
        Ok(chain)
    }
}

/// Logs every status event and optionally mirrors it to a JSONL file.
struct CliNotifier {
    events: Option<JsonlNotifier>,
}

#[async_trait]
impl Notifier for CliNotifier {
    async fn notify(&self, event: FilterEvent) -> Result<()> {
        info!(done = event.is_done(), "{}", event.description());
        if let Some(events) = self.events.as_ref() {
            events.notify(event).await?;
        }
        Ok(())
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("grok-filter error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(async move {
        match cli.command {
            Command::Run(args) => run_once(args).await,
            Command::Chat(args) => {
                run_chat(args).await?;
                Ok(0)
            }
        }
    })
}

async fn run_once(args: RunArgs) -> Result<i32> {
    let chain = args.filter.chain()?;
    let user = args.filter.user_context();
    let notifier = args.filter.notifier();

    let body = ChatBody::new(vec![ChatMessage::user(args.prompt.clone())]);
    let body = chain.run_inlet(body, &user, &notifier).await?;
    let body = chain.run_outlet(body, &user, &notifier).await?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    let changed = body
        .last_message()
        .map(|message| message.content != args.prompt)
        .unwrap_or(false);
    Ok(if changed { 0 } else { EXIT_NO_IMAGES })
}

async fn run_chat(args: ChatArgs) -> Result<()> {
    let chain = args.filter.chain()?;
    let user = args.filter.user_context();
    let notifier = args.filter.notifier();

    let mut body = ChatBody::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "/quit" {
            break;
        }

        body.messages.push(ChatMessage::user(prompt));
        body = chain.run_inlet(body, &user, &notifier).await?;
        body = chain.run_outlet(body, &user, &notifier).await?;
        if let Some(last) = body.last_message() {
            println!("{}", last.content);
        }
    }
    Ok(())
}
