use std::env;
use std::time::Duration;

use cvrank_cli::{load_documents, load_job, parse_args, render_table, USAGE};
use cvrank_core::config::Config;
use cvrank_core::Pipeline;
use cvrank_embed::get_default_embedder;
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE_MS: u64 = 500;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        std::process::exit(if args.is_empty() { 1 } else { 0 });
    }
    let args = parse_args(args).map_err(|e| {
        eprintln!("{e}\n{USAGE}");
        e
    })?;

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let settings = config.settings()?;

    let job = load_job(&args)?;
    let documents = load_documents(&args.inputs)?;
    let encoder = get_default_embedder(&settings.encoder)?;
    tracing::info!(encoder = %encoder.id(), candidates = documents.len(), "starting comparison");

    let pipeline = Pipeline::new(settings, encoder)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(pipeline.run(&job, documents));
    // Encoder calls abandoned after a timeout must not hold the process open.
    runtime.shutdown_timeout(Duration::from_millis(SHUTDOWN_GRACE_MS));
    let report = report?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_table(&report));
    }
    Ok(())
}
