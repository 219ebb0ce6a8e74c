mod commands;
mod config;
mod render;

use anyhow::{Context, Result};
use curation::{CurationSession, Outcome, CANCEL_KEY};
use dataset_api::{DatasetApi, HttpDatasetApi};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::commands::{Command, HELP};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cfg = AppConfig::from_env()?;
    let api = HttpDatasetApi::new(&cfg.client()).context("Failed to build HTTP client")?;
    info!(api = %api.base_url(), "inspector starting");

    let session = CurationSession::new(api, cfg.session());

    // Loading indicator goes to the trace log; the prompt stays clean.
    let mut loading = session.loading().subscribe();
    tokio::spawn(async move {
        while loading.changed().await.is_ok() {
            let in_flight = *loading.borrow();
            debug!(in_flight, "requests in flight");
        }
    });

    match session.load_datasets().await {
        Ok(list) => {
            let active = session.active_dataset_name();
            println!("{}", render::datasets(&list, active.as_deref()));
            print_labels(&session);
        }
        Err(e) => println!("error: {e}"),
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        run(&session, cmd).await;
    }

    info!("inspector exiting");
    Ok(())
}

async fn run<A: DatasetApi>(session: &CurationSession<A>, cmd: Command) {
    match cmd {
        Command::Datasets => match session.load_datasets().await {
            Ok(list) => {
                let active = session.active_dataset_name();
                println!("{}", render::datasets(&list, active.as_deref()));
            }
            Err(e) => println!("error: {e}"),
        },
        Command::Use(name) => {
            if report(session.select_dataset(&name).await) {
                print_labels(session);
            }
        }
        Command::Label(label) => {
            if report(session.select_label(&label).await) {
                print_labels(session);
                println!("{}", render::tiles(&session.tiles()));
            }
        }
        Command::Grid => println!("{}", render::tiles(&session.tiles())),
        Command::Click { hash, at } => match session.select_image(&hash, at) {
            Ok(view) => println!("{}", render::overlay(&view)),
            Err(e) => println!("error: {e}"),
        },
        Command::Tap(at) => {
            if session.click(at) {
                println!("overlay closed");
            }
        }
        Command::Esc => {
            if session.press_key(CANCEL_KEY) {
                println!("overlay closed");
            }
        }
        Command::Toggle(toggle) => {
            if report(session.choose(toggle).await) {
                println!("{}", render::tiles(&session.tiles()));
            }
        }
        Command::Done => {
            if report(session.toggle_label_completed().await) {
                print_labels(session);
            }
        }
        Command::Refresh => {
            if report(session.refresh_metadata().await) {
                print_labels(session);
                println!("{}", render::tiles(&session.tiles()));
            }
        }
        Command::Log => {
            if session.toggle_log() {
                println!("{}", render::log(&session.log_entries()));
            } else {
                println!("log hidden");
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }

    if session.is_log_visible() {
        if let Some(last) = session.log_entries().last() {
            println!("  | {last}");
        }
    }
}

/// Prints failures; true when the result was applied.
fn report(res: dataset_api::Result<Outcome>) -> bool {
    match res {
        Ok(Outcome::Applied) => true,
        Ok(Outcome::Superseded) => {
            println!("superseded by a newer selection");
            false
        }
        Err(e) => {
            println!("error: {e}");
            false
        }
    }
}

fn print_labels<A: DatasetApi>(session: &CurationSession<A>) {
    let (Some(name), Some(meta)) = (session.active_dataset_name(), session.metadata()) else {
        return;
    };
    println!("{}", render::labels(&name, &meta, &session.label_entries()));
}
