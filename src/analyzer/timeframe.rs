use crate::model::{CycleError, Direction, IndicatorSnapshot, Quote, Timeframe, TimeframeSignal};
use rand::Rng;

/// Produces one directional estimate per timeframe. The seam where a real
/// indicator computation over price history can replace the scripted
/// heuristic without touching the combiner.
#[async_trait::async_trait]
pub trait TimeframeEstimator: Send + Sync {
    async fn estimate(
        &self,
        quote: &Quote,
        timeframe: Timeframe,
    ) -> Result<TimeframeSignal, CycleError>;
}

/// Scripted estimator: indicator values are sampled fresh per call, not
/// derived from price history, then run through a fixed rule table.
pub struct HeuristicEstimator;

impl HeuristicEstimator {
    pub fn new() -> Self {
        Self
    }

    fn sample_indicators(price: f64, rng: &mut impl Rng) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 30.0 + rng.random::<f64>() * 40.0,
            macd: (rng.random::<f64>() - 0.5) * 0.002,
            sma20: price + (rng.random::<f64>() - 0.5) * 0.005,
            ema12: price + (rng.random::<f64>() - 0.5) * 0.003,
        }
    }

    /// Rule table, first match wins. The oversold/overbought rules
    /// short-circuit the moving-average rules.
    fn evaluate(
        price: f64,
        indicators: &IndicatorSnapshot,
        rng: &mut impl Rng,
    ) -> (Direction, u8, &'static str) {
        if indicators.rsi < 30.0 && indicators.macd > 0.0 {
            let confidence = (70.0 + rng.random::<f64>() * 20.0).round() as u8;
            (Direction::Up, confidence, "oversold + positive momentum")
        } else if indicators.rsi > 70.0 && indicators.macd < 0.0 {
            let confidence = (70.0 + rng.random::<f64>() * 20.0).round() as u8;
            (Direction::Down, confidence, "overbought + negative momentum")
        } else if price > indicators.sma20 && indicators.ema12 > indicators.sma20 {
            let confidence = (60.0 + rng.random::<f64>() * 15.0).round() as u8;
            (Direction::Up, confidence, "price above short-term averages")
        } else if price < indicators.sma20 && indicators.ema12 < indicators.sma20 {
            let confidence = (60.0 + rng.random::<f64>() * 15.0).round() as u8;
            (Direction::Down, confidence, "price below short-term averages")
        } else {
            (Direction::Neutral, 50, "")
        }
    }
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TimeframeEstimator for HeuristicEstimator {
    async fn estimate(
        &self,
        quote: &Quote,
        _timeframe: Timeframe,
    ) -> Result<TimeframeSignal, CycleError> {
        let price = quote.price_value();
        let mut rng = rand::rng();
        let indicators = Self::sample_indicators(price, &mut rng);
        let (direction, confidence, rationale) = Self::evaluate(price, &indicators, &mut rng);

        Ok(TimeframeSignal {
            direction,
            confidence,
            rationale: rationale.to_string(),
            indicators,
        })
    }
}
