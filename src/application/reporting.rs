//! Console report formatting. Display only; reports go to stdout via
//! `println!`, diagnostics go through `tracing`.

use crate::application::predictor::{PortfolioMetrics, PredictionResult};
use crate::application::trainer::TrainingSummary;
use crate::domain::market::display_name;

/// Quality tier for a cross-validated accuracy score.
pub fn score_grade(score: f64) -> &'static str {
    if score > 0.60 {
        "excellent"
    } else if score > 0.55 {
        "good"
    } else if score > 0.52 {
        "fair"
    } else {
        "poor"
    }
}

/// Quality tier for a prediction confidence percentage.
pub fn confidence_grade(confidence: f64) -> &'static str {
    if confidence > 75.0 {
        "strong"
    } else if confidence > 65.0 {
        "moderate"
    } else {
        "weak"
    }
}

pub fn print_performance_summary(results: &[(String, f64)]) {
    if results.is_empty() {
        println!("No results to display");
        return;
    }

    println!("Performance summary:");
    println!("{}", "=".repeat(40));
    for (symbol, score) in results {
        println!(
            "{:<12} {:.4}  {}",
            display_name(symbol),
            score,
            score_grade(*score)
        );
    }
}

pub fn print_training_summary(summary: &TrainingSummary) {
    println!("\nTraining complete!");
    println!("Models trained:   {}", summary.count);
    println!("Average accuracy: {:.4}", summary.avg_score);
    println!("Best performer:   {:.4}", summary.best_score);
    println!("Worst performer:  {:.4}", summary.worst_score);
}

pub fn print_prediction(result: &PredictionResult) {
    let name = display_name(&result.symbol);
    match (result.direction, result.confidence) {
        (Some(direction), Some(confidence)) => {
            println!(
                "{:<12} {:<5} {} {:.1}%",
                name,
                direction.to_string(),
                confidence_grade(confidence),
                confidence
            );
        }
        _ => println!("{:<12} ---   {}", name, result.status),
    }
}

pub fn print_portfolio_summary(metrics: &PortfolioMetrics) {
    println!("\nPortfolio summary:");
    println!(
        "Bullish: {}/{} ({:.0}%)",
        metrics.bullish_count, metrics.total_predictions, metrics.bullish_percentage
    );
    println!("Avg confidence: {:.1}%", metrics.avg_confidence);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_grades_follow_the_tiers() {
        assert_eq!(score_grade(0.65), "excellent");
        assert_eq!(score_grade(0.58), "good");
        assert_eq!(score_grade(0.53), "fair");
        assert_eq!(score_grade(0.52), "poor");
        assert_eq!(score_grade(0.40), "poor");
    }

    #[test]
    fn confidence_grades_follow_the_tiers() {
        assert_eq!(confidence_grade(80.0), "strong");
        assert_eq!(confidence_grade(70.0), "moderate");
        assert_eq!(confidence_grade(65.0), "weak");
        assert_eq!(confidence_grade(51.0), "weak");
    }
}
