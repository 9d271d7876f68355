use crate::model::PredictionResult;
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Waiting,
    Analyzing,
    Active,
}

impl UiState {
    pub fn status_text(&self) -> &'static str {
        match self {
            UiState::Waiting => "Waiting to start",
            UiState::Analyzing => "Analyzing market...",
            UiState::Active => "Active monitoring",
        }
    }
}

/// Display surface the monitor reports into. The monitor never reaches into
/// rendering details directly.
pub trait UiSurface: Send + Sync {
    fn set_state(&self, state: UiState);
    fn set_last_check(&self, at: DateTime<Utc>);
    fn render(&self, result: &PredictionResult);
}

/// Console rendering of status and the latest prediction.
pub struct ConsoleUi;

impl UiSurface for ConsoleUi {
    fn set_state(&self, state: UiState) {
        info!("Status: {}", state.status_text());
    }

    fn set_last_check(&self, at: DateTime<Utc>) {
        info!("Last check: {}", at.format("%H:%M:%S"));
    }

    fn render(&self, result: &PredictionResult) {
        info!(
            "Prediction: {} | Confidence: {}% | Source: {} | {}",
            result.direction,
            result.confidence,
            result.quote.source,
            result.timestamp.format("%H:%M:%S"),
        );
        info!(
            "{} @ {} (open {}, high {}, low {}, change {}%, vol {}) as of {}",
            result.quote.symbol,
            result.quote.current_price,
            result.quote.open_price,
            result.quote.high_price,
            result.quote.low_price,
            result.quote.percent_change,
            result.quote.volume,
            result.quote.timestamp.format("%H:%M:%S"),
        );
        if !result.rationale.is_empty() {
            info!("Rationale: {}", result.rationale);
        }
        for (timeframe, signal) in &result.timeframes {
            info!(
                "  {:>3} | {:<7} | {:>3}% | {}",
                timeframe.label(),
                signal.direction.to_string(),
                signal.confidence,
                signal.rationale,
            );
        }
    }
}
