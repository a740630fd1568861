//! Training entry point: fetch history for every configured instrument,
//! build the labeled dataset, select and fit a model per instrument, and
//! persist the mapping.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::dataset;
use stockcast::application::indicators;
use stockcast::application::model::FitParams;
use stockcast::application::reporting::{print_performance_summary, print_training_summary};
use stockcast::application::trainer::{ModelTrainer, TrainingSummary};
use stockcast::config::{Config, parse_candidates, parse_symbols, validate_range};
use stockcast::domain::market::display_name;
use stockcast::domain::ports::MarketDataService;
use stockcast::infrastructure::model_store::ModelStore;
use stockcast::infrastructure::yahoo::YahooMarketDataService;
use tracing::{Level, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train per-instrument direction models", long_about = None)]
struct Args {
    /// Comma-separated instrument symbols (overrides SYMBOLS)
    #[arg(long)]
    symbols: Option<String>,

    /// History range to train on, e.g. 2y (overrides HISTORY_RANGE)
    #[arg(long)]
    history_range: Option<String>,

    /// Prediction horizon in bars (overrides PREDICTION_HORIZON)
    #[arg(long)]
    horizon: Option<usize>,

    /// Candidate model kinds in evaluation order, e.g. rf,linear
    #[arg(long)]
    candidates: Option<String>,

    /// Number of walk-forward validation folds
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Number of trees in the random forest
    #[arg(long)]
    n_trees: Option<usize>,

    /// Seed for the forest's bootstrap sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Path of the model artifact (overrides MODEL_PATH)
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Also append the labeled training dataset to this CSV file
    #[arg(long)]
    export_dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(raw) = &args.symbols {
        config.symbols = parse_symbols(raw)?;
    }
    if let Some(raw) = &args.history_range {
        config.history_range = validate_range(raw)?;
    }
    if let Some(raw) = &args.candidates {
        config.candidates = parse_candidates(raw)?;
    }
    if let Some(horizon) = args.horizon {
        config.horizon = horizon;
    }
    if let Some(cv_folds) = args.cv_folds {
        config.cv_folds = cv_folds;
    }
    if let Some(n_trees) = args.n_trees {
        config.n_trees = n_trees;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(path) = args.model_path {
        config.model_path = path;
    }

    let market: Arc<dyn MarketDataService> =
        Arc::new(YahooMarketDataService::new(&config.data_base_url));
    let trainer = ModelTrainer::new(
        config.candidates.clone(),
        config.cv_folds,
        FitParams {
            n_trees: config.n_trees,
            seed: config.seed,
        },
    );

    println!("Fetching {} history per instrument...", config.history_range);

    let mut models = HashMap::new();
    let mut scores: Vec<(String, f64)> = Vec::new();

    for symbol in &config.symbols {
        let series = match market.get_daily_history(symbol, &config.history_range).await {
            Ok(series) if series.is_empty() => {
                warn!(symbol = %symbol, "no usable bars returned; skipping");
                continue;
            }
            Ok(series) => series,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "history fetch failed; skipping");
                continue;
            }
        };
        println!("{}: {} records", display_name(symbol), series.len());

        let rows = indicators::compute(&series);
        let dataset = match dataset::assemble(&series, &rows, config.horizon) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "dataset assembly failed; skipping");
                continue;
            }
        };

        if let Some(path) = &args.export_dataset {
            dataset::write_csv(&dataset, path)?;
        }

        match trainer.train(&dataset) {
            Ok(model) => {
                scores.push((symbol.clone(), model.cv_accuracy));
                models.insert(symbol.clone(), model);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "training failed"),
        }
    }

    if models.is_empty() {
        anyhow::bail!("No models trained; nothing to save");
    }

    println!();
    print_performance_summary(&scores);

    ModelStore::new(&config.model_path).save(&models)?;

    let raw_scores: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();
    if let Some(summary) = TrainingSummary::from_scores(&raw_scores) {
        print_training_summary(&summary);
    }

    Ok(())
}
