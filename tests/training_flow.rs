//! End-to-end flow over the mock provider: train on synthetic history,
//! persist, reload, and serve predictions. No network involved.

use std::collections::HashMap;
use std::sync::Arc;
use stockcast::application::dataset;
use stockcast::application::indicators;
use stockcast::application::model::{FitParams, ModelKind, TrainedModel};
use stockcast::application::predictor::{PortfolioMetrics, PredictionStatus, StockPredictor};
use stockcast::application::trainer::ModelTrainer;
use stockcast::domain::ports::MarketDataService;
use stockcast::infrastructure::mock::{MockMarketDataService, synthetic_series};
use stockcast::infrastructure::model_store::ModelStore;

fn trainer() -> ModelTrainer {
    ModelTrainer::new(
        vec![ModelKind::RandomForest, ModelKind::Linear],
        5,
        FitParams {
            n_trees: 20,
            seed: 42,
        },
    )
}

fn train_one(symbol: &str, bars: usize) -> TrainedModel {
    let series = synthetic_series(symbol, bars);
    let rows = indicators::compute(&series);
    let dataset = dataset::assemble(&series, &rows, 1).unwrap();
    trainer().train(&dataset).unwrap()
}

fn temp_artifact(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("stockcast-{}-{}.json", tag, std::process::id()))
}

#[tokio::test]
async fn train_persist_reload_and_predict() {
    let model_a = train_one("RELIANCE.NS", 400);
    let model_b = train_one("TCS.NS", 400);
    assert!((0.0..=1.0).contains(&model_a.cv_accuracy));

    let mut models = HashMap::new();
    models.insert("RELIANCE.NS".to_string(), model_a);
    models.insert("TCS.NS".to_string(), model_b);

    let path = temp_artifact("flow");
    let store = ModelStore::new(&path);
    store.save(&models).unwrap();
    let reloaded = store.load();
    assert_eq!(reloaded.len(), 2);

    let market: Arc<dyn MarketDataService> = Arc::new(
        MockMarketDataService::new()
            .with_series(synthetic_series("RELIANCE.NS", 120))
            .with_series(synthetic_series("TCS.NS", 120)),
    );
    let predictor = StockPredictor::new(reloaded, market, "3mo");

    let symbols: Vec<String> = ["RELIANCE.NS", "TCS.NS", "INFY.NS"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let results = predictor.predict_portfolio(&symbols).await;

    assert_eq!(results.len(), 3);
    for result in &results[..2] {
        assert!(result.is_success(), "unexpected status: {}", result.status);
        let confidence = result.confidence.unwrap();
        assert!((50.0..=100.0).contains(&confidence));
        assert!(result.direction.is_some());
    }
    // No model was trained for the third symbol.
    assert_eq!(results[2].status, PredictionStatus::ModelNotFound);
    assert!(results[2].direction.is_none());

    let metrics = PortfolioMetrics::from_results(&results).unwrap();
    assert_eq!(metrics.total_predictions, 2);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn reloaded_model_predicts_bit_identically() {
    let model = train_one("RELIANCE.NS", 400);

    // Score the freshest complete row directly with the in-memory model.
    let window = synthetic_series("RELIANCE.NS", 120);
    let rows = indicators::compute(&window);
    let latest = dataset::latest_complete_row(&rows).unwrap();
    let before = model.predict(&latest.to_vector()).unwrap();

    let mut models = HashMap::new();
    models.insert("RELIANCE.NS".to_string(), model);

    let path = temp_artifact("roundtrip");
    let store = ModelStore::new(&path);
    store.save(&models).unwrap();
    let reloaded = store.load();

    let after = reloaded["RELIANCE.NS"].predict(&latest.to_vector()).unwrap();
    assert_eq!(before.direction, after.direction);
    assert_eq!(before.confidence, after.confidence);
    assert_eq!(before.probability_up, after.probability_up);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn one_bad_symbol_never_aborts_the_batch() {
    let mut models = HashMap::new();
    models.insert("GONE.NS".to_string(), train_one("GONE.NS", 400));
    models.insert("RELIANCE.NS".to_string(), train_one("RELIANCE.NS", 400));

    // The provider has data for one of the two modeled symbols only.
    let market: Arc<dyn MarketDataService> = Arc::new(
        MockMarketDataService::new().with_series(synthetic_series("RELIANCE.NS", 120)),
    );
    let predictor = StockPredictor::new(models, market, "3mo");

    let symbols: Vec<String> = ["GONE.NS", "RELIANCE.NS"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let results = predictor.predict_portfolio(&symbols).await;

    assert!(matches!(results[0].status, PredictionStatus::Failed(_)));
    assert!(results[1].is_success());
}

#[tokio::test]
async fn too_short_window_degrades_to_a_status() {
    let mut models = HashMap::new();
    models.insert("RELIANCE.NS".to_string(), train_one("RELIANCE.NS", 400));

    // Ten bars cannot fill a 30-bar window.
    let market: Arc<dyn MarketDataService> = Arc::new(
        MockMarketDataService::new().with_series(synthetic_series("RELIANCE.NS", 10)),
    );
    let predictor = StockPredictor::new(models, market, "3mo");

    let result = predictor.predict_symbol("RELIANCE.NS").await;
    assert_eq!(result.status, PredictionStatus::InsufficientHistory);
}
