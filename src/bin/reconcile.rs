//! Offline maintenance for the plant ledger: rebuild cached counters or apply
//! migrations without starting the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use plant_ledger_api::{
    config, db,
    events::{self, EventSender},
    services::reconciliation::{ReconcileReport, ReconciliationService},
};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "plant-ledger-reconcile",
    about = "Rebuild derived ledger counters from their children",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render reports as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute every hold batch from its issuances
    Holds,
    /// Recompute every lot from its hold batches and lowercase heat numbers
    Lots,
    /// Holds first, then lots
    All,
    /// Apply pending schema migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    let sweep = match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
            return Ok(());
        }
        Commands::Holds => Sweep::Holds,
        Commands::Lots => Sweep::Lots,
        Commands::All => Sweep::All,
    };

    let (tx, rx) = mpsc::channel(cfg.event_channel_capacity);
    let processor = tokio::spawn(events::process_events(rx));
    let service = ReconciliationService::new(
        Arc::new(pool),
        Arc::new(EventSender::new(tx)),
        cfg.status_tolerance_kg,
    );

    match sweep {
        Sweep::Holds => {
            let report = service.reconcile_hold_materials().await?;
            render(&report, cli.json, print_report)?;
        }
        Sweep::Lots => {
            let report = service.reconcile_rm_receivings().await?;
            render(&report, cli.json, print_report)?;
        }
        Sweep::All => {
            let report = service.reconcile_all().await?;
            render(&report, cli.json, |r| {
                print_report(&r.hold_materials);
                print_report(&r.rm_receivings);
            })?;
        }
    }

    // Dropping the service closes the channel so the processor drains and exits.
    drop(service);
    processor.await.context("event processor panicked")?;
    Ok(())
}

enum Sweep {
    Holds,
    Lots,
    All,
}

fn render<T: Serialize>(value: &T, json: bool, plain: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        plain(value);
    }
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    print!(
        "{}: examined {}, corrected {}",
        report.sweep, report.examined, report.corrected
    );
    match report.heatnos_normalized {
        Some(n) => println!(", heat numbers lowercased {}", n),
        None => println!(),
    }
}
