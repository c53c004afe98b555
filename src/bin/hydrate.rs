//! # hydrate
//!
//! Hydrate JSON records against a JSON fixture store from the command line.
//!
//! Usage:
//!   # Attach users to posts, then authors to each post's comments
//!   hydrate posts.json --store fixtures.json \
//!       --relation user=users --relation author=users \
//!       --spec user --spec comments.author
//!
//!   # NDJSON from stdin, compact output
//!   cat posts.jsonl | hydrate --ndjson --store fixtures.json --relation user=users --spec user --compact

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tasker_hydration::{
    logging, HydrationConfig, HydrationSpec, Hydrator, InMemoryStore, RelationTarget,
    ResolverRegistry,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hydrate")]
#[command(about = "Hydrate JSON records with related data in one fetch per key")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Input file (use stdin if omitted): a JSON array, a single object, or NDJSON
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Treat input as newline-delimited JSON records
    #[arg(long)]
    ndjson: bool,

    /// Fixture store: a JSON object mapping source names to arrays of rows
    #[arg(long, short = 's')]
    store: PathBuf,

    /// Relation binding `key=source` or `key=source:primary_key` (repeatable)
    #[arg(long, short = 'r', value_name = "KEY=SOURCE")]
    relation: Vec<String>,

    /// Hydration spec, JSON form or dotted form like `posts.author` (repeatable)
    #[arg(long = "spec", required = true)]
    specs: Vec<String>,

    /// Configuration file (defaults to config/hydration.* if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HydrationConfig::load_from_file(path),
        None => HydrationConfig::load(),
    }
    .context("Failed to load configuration")?;
    logging::init_with_config(&config.logging);

    let store_file = File::open(&args.store)
        .with_context(|| format!("Failed to open store {}", args.store.display()))?;
    let fixture: Value = serde_json::from_reader(BufReader::new(store_file))
        .context("Failed to parse store fixture")?;
    let store = Arc::new(InMemoryStore::from_fixture(&fixture)?);

    let registry = Arc::new(ResolverRegistry::new());
    for binding in &args.relation {
        let Some((key, target)) = binding.split_once('=') else {
            bail!("Invalid relation binding '{binding}', expected KEY=SOURCE[:PK]");
        };
        registry.register_relation(key.trim(), RelationTarget::parse(target))?;
    }

    let specs = args
        .specs
        .iter()
        .map(|s| HydrationSpec::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let input = read_input(args.input.as_ref(), args.ndjson)?;
    let hydrator = Hydrator::with_config(registry, store.clone(), config);
    let output = hydrator.hydrate(input, &specs).await?;

    info!(fetches = store.fetch_count(), "Hydration finished");

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{rendered}");

    Ok(())
}

fn read_input(path: Option<&PathBuf>, ndjson: bool) -> Result<Value> {
    let mut reader: Box<dyn BufRead> = match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(stdin())),
    };

    if ndjson {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.context("Failed to read line")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line).context("Failed to parse JSON line")?);
        }
        return Ok(Value::Array(records));
    }

    let mut buffer = String::new();
    reader.read_to_string(&mut buffer).context("Failed to read input")?;
    serde_json::from_str(&buffer).context("Failed to parse JSON input")
}
