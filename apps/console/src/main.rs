use std::{io::Write, sync::Arc};

use anyhow::{Context, Result};
use catalog::Catalog;
use clap::Parser;
use oracle::{AiResponder, GeminiConfig, GeminiResponder, UnavailableResponder};
use server::config::load_settings;
use session::{SessionController, SessionRegistry};
use shared::{domain::Place, protocol::SessionSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{parse_line, resolve_category, ConsoleCommand, HELP};

#[derive(Parser, Debug)]
#[command(about = "Talk with the oracle about the world's mysterious places")]
struct Cli {
    /// TOML catalog to use instead of the built-in one.
    #[arg(long)]
    catalog: Option<String>,
    /// Gemini model name.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(path) = cli.catalog {
        settings.catalog_path = Some(path);
    }
    if let Some(model) = cli.model {
        settings.gemini_model = model;
    }

    let catalog = match settings.catalog_path.as_deref() {
        Some(path) => {
            Catalog::load(path).with_context(|| format!("loading catalog from '{path}'"))?
        }
        None => Catalog::builtin(),
    };
    let labels: Vec<String> = catalog.labels().map(str::to_string).collect();

    let responder: Arc<dyn AiResponder> = match settings.gemini_api_key.clone() {
        Some(api_key) => {
            let responder = GeminiResponder::new(GeminiConfig {
                api_key,
                model: settings.gemini_model.clone(),
                base_url: settings.gemini_base_url.clone(),
                temperature: settings.gemini_temperature,
            })
            .context("configuring Gemini client")?
            .with_excluded_places(catalog.all_places().map(|place| place.name.clone()));
            info!(model = %settings.gemini_model, "using Gemini");
            Arc::new(responder)
        }
        None => {
            warn!("no Gemini API key configured; the oracle will not answer");
            Arc::new(UnavailableResponder)
        }
    };

    let controller = SessionController::new(Arc::new(catalog), responder)
        .with_ai_timeout(settings.ai_timeout());
    let registry = SessionRegistry::new(Arc::new(controller));
    let session = registry.create().await.context("starting session")?;

    let mut shown = session.snapshot().await;
    print_place(&shown.current_place);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let result = match command {
            ConsoleCommand::Nothing => continue,
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ConsoleCommand::Categories => {
                for (i, label) in labels.iter().enumerate() {
                    println!("{}. {label}", i + 1);
                }
                continue;
            }
            ConsoleCommand::History => {
                let history = session.history().await;
                if history.is_empty() {
                    println!("nowhere yet");
                }
                for place in history {
                    println!("- {} ({})", place.name, place.coords);
                }
                continue;
            }
            ConsoleCommand::Where => {
                print_place(&session.snapshot().await.current_place);
                continue;
            }
            ConsoleCommand::Pick(arg) => {
                let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
                let Some(label) = resolve_category(&refs, &arg) else {
                    println!("no category '{arg}', try /categories");
                    continue;
                };
                session.select_category(label).await
            }
            ConsoleCommand::Dealer => session.dealers_choice().await,
            ConsoleCommand::Message(text) => session.user_message(&text).await,
        };

        if let Err(error) = &result {
            println!("! {error}");
        }
        let current = session.snapshot().await;
        print_changes(&shown, &current);
        shown = current;
    }

    registry.end(session.id()).await;
    Ok(())
}

fn print_place(place: &Place) {
    println!("📍 {} ({})", place.name, place.coords);
    if !place.summary.is_empty() {
        println!("   {}", place.summary);
    }
    if let Some(url) = &place.url {
        println!("   {url}");
    }
}

fn print_changes(before: &SessionSnapshot, after: &SessionSnapshot) {
    if before.current_place != after.current_place {
        print_place(&after.current_place);
    }
    let new_turns = if after.transcript.starts_with(&before.transcript) {
        &after.transcript[before.transcript.len()..]
    } else {
        &after.transcript[..]
    };
    for turn in new_turns {
        println!("{}: {}", turn.role.as_str(), turn.text);
    }
}
