//! Ticketmail - inbound email to Markdown issue comments.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ticketmail_core::{Config, DispatchOutcome, Dispatcher, GitHubPoster, fold_quotes};
use ticketmail_mime::Message;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "ticketmail=info,ticketmail_core=info";
const VERBOSE_FILTER: &str = "ticketmail=debug,ticketmail_core=debug,ticketmail_mime=debug";

#[derive(Debug, Parser)]
#[command(
    name = "ticketmail",
    version,
    about = "Turn inbound email into Markdown issue comments.",
    propagate_version = true
)]
struct Cli {
    /// Log selection and dispatch decisions (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the Markdown body of a message
    Render {
        /// Message file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
        /// Fold quoted history into a collapsible block
        #[arg(long)]
        fold: bool,
        /// Drop quoted history entirely (implies --fold)
        #[arg(long)]
        discard_quotes: bool,
    },
    /// Check messages and post them as issue comments
    Dispatch {
        /// Message files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render {
            input,
            fold,
            discard_quotes,
        } => render(&input, fold || discard_quotes, discard_quotes),
        Command::Dispatch { inputs } => dispatch(&inputs).await,
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(input: &Path) -> anyhow::Result<Vec<u8>> {
    if input.as_os_str() == "-" {
        let mut raw = Vec::new();
        io::stdin()
            .read_to_end(&mut raw)
            .context("failed to read message from stdin")?;
        Ok(raw)
    } else {
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))
    }
}

fn render(input: &Path, fold: bool, discard_quotes: bool) -> anyhow::Result<()> {
    let raw = read_input(input)?;
    let message = Message::parse(&raw);
    let mut markdown = message
        .body_markdown()
        .with_context(|| format!("failed to extract body of {}", input.display()))?;
    if fold {
        markdown = fold_quotes(&markdown, discard_quotes);
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", markdown.trim_end_matches('\n'))?;
    Ok(())
}

async fn dispatch(inputs: &[PathBuf]) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let mut dispatcher = Dispatcher::new(config);
    if dispatcher.config().github_project.is_some() {
        let poster = GitHubPoster::new(dispatcher.config())?;
        dispatcher = dispatcher.with_poster(poster);
    } else {
        info!("GITHUB_PROJECT not set, will only check messages and log metadata");
    }

    let mut failed = 0usize;
    for input in inputs {
        match dispatcher.dispatch_file(input).await {
            Ok(outcome) => {
                let ticket = outcome.ticket();
                let status = match &outcome {
                    DispatchOutcome::Posted(_) => "posted",
                    DispatchOutcome::AlreadyPosted(_) => "already posted",
                    DispatchOutcome::MetadataOnly(_) => "checked",
                };
                info!(
                    file = %input.display(),
                    message_id = %ticket.message_id,
                    issue = %ticket.issue,
                    status,
                    "done"
                );
            }
            Err(err) => {
                failed += 1;
                error!(file = %input.display(), %err, "failed to dispatch message");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} messages failed", inputs.len());
    }
    Ok(())
}
