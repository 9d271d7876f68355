// Core structs: Quote, TimeframeSignal, CombinedSignal, PredictionResult
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Provenance tag for a quote. Callers must not infer precision beyond the
/// stored display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLabel {
    Live,
    Simulated,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Live => "live",
            SourceLabel::Simulated => "simulated",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One currency-pair quote. Prices are carried as 4-decimal display strings
/// and the percent change as a 2-decimal string, matching what is shown.
#[derive(Debug, Clone)]
pub struct Quote {
    pub symbol: String,
    pub current_price: String,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: u64,
    pub percent_change: String,
    pub timestamp: DateTime<Utc>,
    pub source: SourceLabel,
}

impl Quote {
    /// Numeric view of the current price for analysis.
    pub fn price_value(&self) -> f64 {
        self.current_price.parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// Nominal analysis horizon. Used only to select a weight and a label; no
/// real multi-resolution data is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M5,
    M15,
    M30,
    H1,
}

impl Timeframe {
    /// Fixed iteration order: 5m, 15m, 30m, 1h.
    pub const ALL: [Timeframe; 4] = [
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
        }
    }

    /// Combination weight. The four weights sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Timeframe::M5 => 0.1,
            Timeframe::M15 => 0.2,
            Timeframe::M30 => 0.3,
            Timeframe::H1 => 0.4,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Diagnostic indicator values behind a timeframe signal. Display-only, no
/// downstream consumer.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub sma20: f64,
    pub ema12: f64,
}

#[derive(Debug, Clone)]
pub struct TimeframeSignal {
    pub direction: Direction,
    pub confidence: u8,
    pub rationale: String,
    pub indicators: IndicatorSnapshot,
}

#[derive(Debug, Clone)]
pub struct CombinedSignal {
    pub direction: Direction,
    pub confidence: u8,
    pub rationale: String,
}

/// Result of one full analysis cycle. Immutable once built; held only as the
/// last result for change detection.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub direction: Direction,
    pub confidence: u8,
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
    pub quote: Quote,
    pub timeframes: Vec<(Timeframe, TimeframeSignal)>,
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("malformed number in field: {0}")]
    MalformedNumber(&'static str),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifications unsupported")]
    Unsupported,
    #[error("notification permission denied")]
    Denied,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("timeframe estimation failed: {0}")]
    Estimation(String),
}
