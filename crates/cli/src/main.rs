//! Command Line Interface for the lpscope reconciliation engine.
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use lpscope_data::{Database, MemoryStore, PositionQuery, PositionStore};
use lpscope_domain::{
    CanonicalKey, Capture, CaptureId, Observation, PositionRecord, StoredPosition, SystemClock,
};
use lpscope_reconcile::prelude::*;
use prettytable::{Cell, Row, Table, row};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lpscope")]
#[command(about = "Reconcile scraped DeFi portfolio positions", long_about = None)]
struct Cli {
    /// Use an in-memory store instead of DATABASE_URL
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Migrate,
    /// Ingest a recorded capture and run its QC sweep
    Ingest {
        /// JSON file with `capture`, `text` and optional `vision` observations
        #[arg(short, long)]
        file: PathBuf,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the selected record per position
    Positions {
        /// Only show this protocol
        #[arg(short, long)]
        protocol: Option<String>,
    },
    /// List the stored observations of one position, newest first
    History {
        /// Protocol name
        #[arg(short, long)]
        protocol: String,

        /// Pair label, normalized before lookup
        #[arg(long)]
        pair: String,

        /// How many observations to list
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List recent captures
    Captures {
        /// How many captures to list
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Re-run the QC sweep for a stored capture
    Qc {
        /// Capture id
        #[arg(short, long)]
        capture: Uuid,
    },
    /// Print the normalized form of a pair label
    Normalize {
        /// Pair label (e.g., "SOL/USDC0")
        label: String,
    },
    /// Match a pair label against candidate labels
    Match {
        /// Extracted pair label
        label: String,

        /// Candidate labels, comma separated
        #[arg(short, long, value_delimiter = ',')]
        candidates: Vec<String>,
    },
}

/// A capture recorded by the browser host together with both extractors'
/// output.
#[derive(Deserialize)]
struct RecordedCapture {
    capture: Capture,
    #[serde(default)]
    text: Vec<Observation>,
    #[serde(default)]
    vision: Option<Vec<Observation>>,
}

struct ReplayText(Vec<Observation>);

impl TextExtractor for ReplayText {
    fn extract(&self, _capture: &Capture) -> Vec<Observation> {
        self.0.clone()
    }
}

struct ReplayVision(Vec<Observation>);

#[async_trait]
impl VisionExtractor for ReplayVision {
    async fn extract(&self, _image: &[u8], _context: &[Observation]) -> EngineResult<Vec<Observation>> {
        Ok(self.0.clone())
    }
}

async fn open_store(memory: bool) -> Result<Arc<dyn PositionStore>> {
    if memory {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in .env or environment")?;
    let database = Database::connect(&database_url)
        .await
        .context("failed to connect to the database")?;
    Ok(Arc::new(database))
}

fn fmt_decimal(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string()).unwrap_or_else(|| "-".to_string())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn text_row(cells: &[String]) -> Row {
    Row::new(cells.iter().map(|cell| Cell::new(cell)).collect())
}

fn print_positions(records: &[PositionRecord]) {
    let mut table = Table::new();
    table.add_row(row![
        "Protocol", "Pair", "Section", "Source", "Balance", "Token0", "Token1", "%0", "%1",
        "Complete", "Captured"
    ]);

    for record in records {
        let obs = record.observation();
        let fields = &obs.fields;
        table.add_row(text_row(&[
            record.key.protocol().to_string(),
            record.key.pair().to_string(),
            obs.section.to_string(),
            obs.source.to_string(),
            fmt_decimal(fields.balance),
            fmt_decimal(fields.token0_amount),
            fmt_decimal(fields.token1_amount),
            fmt_decimal(fields.token0_percentage),
            fmt_decimal(fields.token1_percentage),
            yes_no(record.complete),
            obs.captured_at.format("%Y-%m-%d %H:%M").to_string(),
        ]));
    }

    table.printstd();
    println!("{} position(s)", records.len());
}

fn print_history(rows: &[StoredPosition]) {
    let mut table = Table::new();
    table.add_row(row![
        "Captured", "Source", "Label", "Balance", "Token0", "Token1", "Range", "Price", "Capture"
    ]);
    for row in rows {
        let obs = &row.observation;
        let fields = &obs.fields;
        table.add_row(text_row(&[
            obs.captured_at.format("%Y-%m-%d %H:%M").to_string(),
            obs.source.to_string(),
            obs.raw_pair_label.clone(),
            fmt_decimal(fields.balance),
            fmt_decimal(fields.token0_amount),
            fmt_decimal(fields.token1_amount),
            format!("{}..{}", fmt_decimal(fields.range_min), fmt_decimal(fields.range_max)),
            fmt_decimal(fields.current_price),
            row.capture_id.to_string(),
        ]));
    }
    table.printstd();
}

fn print_qc(report: &QcReport) {
    if report.aborted {
        println!("❌ QC aborted for capture {}", report.capture_id);
        for issue in &report.validation.errors {
            println!("   {}: {}", issue.field, issue.message);
        }
        return;
    }

    let status = if report.success { "✅" } else { "⚠️" };
    println!(
        "{status} QC for capture {}: {} position(s), {} issue(s), {} fixed, {} failed",
        report.capture_id,
        report.positions_checked,
        report.issues_found.len(),
        report.fixes_applied(),
        report.fixes_failed()
    );
    for warning in &report.validation.warnings {
        println!("   warning: {}", warning.message);
    }
    for outcome in &report.fixes {
        match &outcome.error {
            None => println!(
                "   fixed {} on {}: {}",
                outcome.fix.issue_type, outcome.fix.position.key, outcome.fix.description
            ),
            Some(err) => println!(
                "   failed {} on {}: {err}",
                outcome.fix.issue_type, outcome.fix.position.key
            ),
        }
    }
    for issue in &report.remaining_issues {
        println!(
            "   [{}] {} on {}: {}",
            issue.severity, issue.issue_type, issue.position.key, issue.message
        );
    }
}

fn print_ingest(label: &str, report: &IngestReport) {
    println!(
        "📥 {label}: {} attempted, {} saved, {} dropped, {} failed",
        report.attempted,
        report.saved,
        report.dropped.len(),
        report.failures.len()
    );
    for dropped in &report.dropped {
        println!("   dropped {} {:?}: {}", dropped.protocol, dropped.raw_pair_label, dropped.reason);
    }
    for failure in &report.failures {
        println!("   failed {:?}: {}", failure.raw_pair_label, failure.error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Normalize { label } => {
            println!("{}", normalize(label));
            return Ok(());
        }
        Commands::Match { label, candidates } => {
            match PairMatcher::new().match_label(label, candidates) {
                Some(found) => println!(
                    "{} -> {} (candidate #{}, {:?})",
                    label, found.candidate, found.index, found.kind
                ),
                None => println!("{label} -> no match"),
            }
            return Ok(());
        }
        Commands::Migrate => {
            if cli.memory {
                bail!("the in-memory store has no schema to migrate");
            }
            let database_url = env::var("DATABASE_URL")
                .context("DATABASE_URL must be set in .env or environment")?;
            Database::connect(&database_url).await?.migrate().await?;
            println!("✅ Schema is up to date");
            return Ok(());
        }
        _ => {}
    }

    let store = open_store(cli.memory).await?;
    let engine = Engine::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        EngineConfig::from_env(),
    );

    match &cli.command {
        Commands::Ingest { file, json } => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let recorded: RecordedCapture =
                serde_json::from_str(&raw).context("capture file is not valid JSON")?;

            let mut pipeline = engine.pipeline(Arc::new(ReplayText(recorded.text)));
            if let Some(vision) = recorded.vision {
                pipeline = pipeline.with_vision(Arc::new(ReplayVision(vision)));
            }

            let outcome = pipeline.process(&recorded.capture).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_ingest("text", &outcome.text);
                if let Some(vision) = &outcome.vision {
                    print_ingest("vision", vision);
                }
                if let Some(err) = &outcome.vision_error {
                    println!("⚠️ vision pass failed: {err}");
                }
                print_qc(&outcome.qc);
                print_positions(&engine.cache().all().await?);
            }
        }
        Commands::Positions { protocol: None } => {
            print_positions(&engine.cache().all().await?);
        }
        Commands::Positions {
            protocol: Some(protocol),
        } => {
            let rows = store
                .select_positions(&PositionQuery::all().with_protocol(protocol.as_str()))
                .await?;
            print_positions(&RecordMerger::group_and_select(&rows));
        }
        Commands::History {
            protocol,
            pair,
            limit,
        } => {
            let key = CanonicalKey::new(protocol, normalize(pair));
            let query = PositionQuery::all().with_key(key.clone()).newest_first().limit(*limit);
            let rows = store.select_positions(&query).await?;
            if rows.is_empty() {
                println!("No observations stored for {key}");
            } else {
                print_history(&rows);
            }
        }
        Commands::Captures { limit } => {
            let captures = store.recent_captures(*limit).await?;
            let mut table = Table::new();
            table.add_row(row!["Id", "Protocol", "Captured", "Title", "Image"]);
            for capture in &captures {
                table.add_row(text_row(&[
                    capture.id.to_string(),
                    capture.protocol_name().unwrap_or("-").to_string(),
                    capture
                        .captured_at
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    capture.title.clone().unwrap_or_else(|| "-".to_string()),
                    yes_no(capture.has_image()),
                ]));
            }
            table.printstd();
        }
        Commands::Qc { capture } => {
            let report = engine.qc().run(CaptureId(*capture)).await?;
            print_qc(&report);
        }
        Commands::Migrate | Commands::Normalize { .. } | Commands::Match { .. } => {}
    }

    Ok(())
}
