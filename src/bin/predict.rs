//! Prediction entry point: load the persisted models, fetch a trailing
//! window per instrument, and print direction and confidence for each.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::predictor::{PortfolioMetrics, StockPredictor};
use stockcast::application::reporting::{print_portfolio_summary, print_prediction};
use stockcast::config::{Config, parse_symbols, validate_range};
use stockcast::domain::ports::MarketDataService;
use stockcast::infrastructure::model_store::ModelStore;
use stockcast::infrastructure::yahoo::YahooMarketDataService;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict next-period direction per instrument", long_about = None)]
struct Args {
    /// Comma-separated instrument symbols (overrides SYMBOLS)
    #[arg(long)]
    symbols: Option<String>,

    /// Trailing window to fetch for inference, e.g. 3mo
    #[arg(long)]
    prediction_range: Option<String>,

    /// Path of the model artifact (overrides MODEL_PATH)
    #[arg(long)]
    model_path: Option<PathBuf>,
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
    if let Some(raw) = &args.prediction_range {
        config.prediction_range = validate_range(raw)?;
    }
    if let Some(path) = args.model_path {
        config.model_path = path;
    }

    let models = ModelStore::new(&config.model_path).load();
    if models.is_empty() {
        println!("No trained models found. Run `train` first.");
        return Ok(());
    }

    let market: Arc<dyn MarketDataService> =
        Arc::new(YahooMarketDataService::new(&config.data_base_url));
    let predictor = StockPredictor::new(models, market, config.prediction_range.clone());

    let results = predictor.predict_portfolio(&config.symbols).await;
    for result in &results {
        print_prediction(result);
    }

    if let Some(metrics) = PortfolioMetrics::from_results(&results) {
        print_portfolio_summary(&metrics);
    }

    Ok(())
}
