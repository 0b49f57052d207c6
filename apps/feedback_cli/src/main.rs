use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use feedback_store::{load_settings, AlwaysConfirm, Confirmer, DeleteOutcome, FeedbackStore};
use serde_json::Number;
use shared::domain::{FeedbackId, FeedbackItem, FeedbackPatch, NewFeedback};
use tracing::warn;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the api_url from feedback.toml / the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Stats,
    Add {
        #[arg(long)]
        rating: Number,
        #[arg(long)]
        text: String,
    },
    /// Replaces the whole record, keeping fields not given here.
    Update {
        id: FeedbackId,
        #[arg(long)]
        rating: Option<Number>,
        #[arg(long)]
        text: Option<String>,
    },
    Delete {
        id: FeedbackId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            print!("{prompt} [y/N] ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(Err(err)) => {
                warn!("could not read confirmation: {err}");
                false
            }
            Err(err) => {
                warn!("confirmation prompt aborted: {err}");
                false
            }
        }
    }
}

fn print_item(item: &FeedbackItem) {
    println!(
        "#{:<6} {:>4}/10  {}",
        item.id.to_string(),
        item.rating.to_string(),
        item.text
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }

    let confirmer: Arc<dyn Confirmer> = match args.command {
        Command::Delete { yes: true, .. } => Arc::new(AlwaysConfirm),
        _ => Arc::new(TerminalConfirmer),
    };
    let store = FeedbackStore::new(&settings, confirmer)
        .with_context(|| format!("invalid feedback api url {}", settings.api_url))?;
    store
        .spawn_initial_load()
        .await
        .context("initial load task failed")??;

    match args.command {
        Command::List => {
            for item in store.items().await {
                print_item(&item);
            }
        }
        Command::Stats => {
            let stats = store.stats().await;
            match stats.average_rating {
                Some(average) => println!("{} reviews, average rating {average}", stats.count),
                None => println!("no reviews yet"),
            }
        }
        Command::Add { rating, text } => {
            let created = store.add(NewFeedback::new(rating, text)).await?;
            print_item(&created);
        }
        Command::Update { id, rating, text } => {
            let changes = FeedbackPatch {
                rating,
                text,
                ..FeedbackPatch::default()
            };
            if changes.is_empty() {
                bail!("nothing to update: pass --rating and/or --text");
            }
            let Some(current) = store.find(&id).await else {
                bail!("feedback #{id} not found locally");
            };
            let body = current.with_changes(changes);
            match store.update(id.clone(), body).await? {
                Some(item) => print_item(&item),
                None => println!("feedback #{id} updated on the server but is gone locally"),
            }
        }
        Command::Delete { id, .. } => match store.delete(id.clone()).await? {
            DeleteOutcome::Declined => println!("kept feedback #{id}"),
            DeleteOutcome::Removed { removed: false, .. } => {
                println!("feedback #{id} was not in the local list")
            }
            DeleteOutcome::Removed {
                remote_error: None, ..
            } => println!("deleted feedback #{id}"),
            DeleteOutcome::Removed {
                remote_error: Some(err),
                ..
            } => println!("removed feedback #{id} locally; server reported: {err}"),
        },
    }

    Ok(())
}
