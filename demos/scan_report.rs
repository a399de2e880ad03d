//! Scan Report Example
//!
//! Analyses one photo of a dump site, prints the severity report and stores
//! it in a JSON-lines history file.
//!
//! Run with: cargo run --example scan_report -- <image_path> [history_file] [config.json]

use std::{env, path::Path, sync::Arc};

use dump_severity::{
    AnalysisConfig, SeverityEngine,
    pipeline::AnalysisPipeline,
    report::display::StatusBoard,
    storage::{DEFAULT_RECENT_LIMIT, ReportStore, file::JsonLinesStore, worker::PersistenceWorker},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Dump Severity - Scan Report Example");
        println!("===================================");
        println!();
        println!("Usage: {} <image_path> [history_file] [config.json]", args[0]);
        println!();
        println!("Arguments:");
        println!("  image_path    - Photo of the dump site");
        println!("  history_file  - JSON-lines history (default: ./analysis_results.jsonl)");
        println!("  config.json   - Optional analysis config overrides");
        return Ok(());
    }

    let image_path = &args[1];
    let history_path = args.get(2).map(|s| s.as_str()).unwrap_or("./analysis_results.jsonl");

    if !Path::new(image_path).exists() {
        eprintln!("Error: Image file '{}' not found", image_path);
        std::process::exit(1);
    }

    let config = match args.get(3) {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    let store = Arc::new(JsonLinesStore::new(history_path));
    let (handle, worker) = PersistenceWorker::spawn(store.clone());
    let pipeline = AnalysisPipeline::new(SeverityEngine::new(config)?).with_persistence(handle);

    let mut board = StatusBoard::new();
    board.image_loaded(image_path.as_str());
    println!("{}", board.status_text());

    board.analysing();
    println!("{}", board.status_text());

    let outcome = match pipeline.analyze_file(image_path).await {
        Ok(outcome) => outcome,
        Err(err) => {
            board.fail();
            eprintln!("{}: {}", board.status_text(), err);
            std::process::exit(1);
        }
    };

    board.show(&outcome.presentation);
    let state = &outcome.presentation;

    println!("{}", board.status_text());
    println!();
    println!("  Severity:      {} ({})", state.score_text, state.label);
    println!("  Colour band:   {}", state.colour_text);
    println!("  Category:      {}", state.category);
    println!("  Volume:        {}", state.volume_text);
    println!("  Badges:        {:?}", state.badges);
    println!();
    println!("  {}", state.justification);
    println!();

    if let Some(pending) = outcome.persistence {
        match pending.outcome().await {
            Ok(id) => println!("Saved to {} as {}", history_path, id),
            Err(err) => println!("Warning: result not saved ({})", err),
        }
    }

    drop(pipeline);
    let stats = worker.await?;
    println!("Persistence: {} stored, {} failed", stats.stored, stats.failed);

    println!();
    println!("Recent analyses:");
    for record in store.list_recent(DEFAULT_RECENT_LIMIT)? {
        println!(
            "  {}  {:<9} {:>2}/10  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.report.severity_band(),
            record.report.severity_score(),
            record.context.origin.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
