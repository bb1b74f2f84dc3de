use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use danci_drill::config::AppConfig;
use danci_drill::logging::init_tracing;
use danci_drill::{
    Card, Curriculum, DrillSession, JsonFileStore, ProgressiveScheduler, SchedulerFactory,
    SessionRegistry,
};

enum Answer {
    Correct,
    Incorrect,
    Stats,
    Reset,
    Quit,
    Unknown,
}

fn parse_answer(line: &str) -> Answer {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" | "1" => Answer::Correct,
        "n" | "no" | "0" => Answer::Incorrect,
        "s" | "stats" => Answer::Stats,
        "r" | "reset" => Answer::Reset,
        "q" | "quit" | "exit" => Answer::Quit,
        _ => Answer::Unknown,
    }
}

fn prompt(card: &Card) {
    println!(
        "[{}] {}  (streak {}, {}/{} correct)  y/n, s = stats, r = reset, q = quit",
        card.kind.as_str(),
        card.item,
        card.metadata.correct_streak,
        card.metadata.total_correct,
        card.metadata.total_correct + card.metadata.total_incorrect,
    );
}

fn print_stats(session: &DrillSession) {
    let stats = session.stats();
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::warn!(error = %err, "failed to render stats"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    let _log_guard = init_tracing(&config.logging);

    let curriculum = match Curriculum::notes(&config.min_note, &config.max_note) {
        Ok(curriculum) => curriculum,
        Err(err) => {
            tracing::error!(error = %err, "invalid note range");
            return ExitCode::FAILURE;
        }
    };

    let store = Arc::new(JsonFileStore::new(&config.persistence.data_dir));
    let scheduler_config = config.scheduler.clone();
    let seed = config.seed;
    let factory: SchedulerFactory = Arc::new(move |_identity: &str| {
        let builder = ProgressiveScheduler::builder(curriculum.clone()).config(scheduler_config.clone());
        match seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    });
    let registry = SessionRegistry::with_factory(store, factory, config.persistence.save_debounce);

    let session = match registry.switch_to(&config.identity).await {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, identity = %config.identity, "failed to load progress");
            return ExitCode::FAILURE;
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current = session.next_card();

    while let Some(card) = current.clone() {
        prompt(&card);
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read input");
                break;
            }
        };

        match parse_answer(&line) {
            Answer::Correct => {
                session.mark_correct(&card.item);
                current = session.next_card();
            }
            Answer::Incorrect => {
                session.mark_incorrect(&card.item);
                current = session.next_card();
            }
            Answer::Stats => print_stats(&session),
            Answer::Reset => {
                if let Err(err) = session.reset().await {
                    tracing::warn!(error = %err, "failed to clear stored progress");
                }
                current = session.next_card();
            }
            Answer::Quit => break,
            Answer::Unknown => println!("answer with y or n"),
        }
    }

    if current.is_none() {
        println!("nothing to drill: the curriculum is empty");
    }

    print_stats(&session);
    if let Err(err) = registry.flush_all().await {
        tracing::error!(error = %err, "failed to save progress");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
