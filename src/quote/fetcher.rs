use crate::config::AppConfig;
use crate::model::{Quote, QuoteError, SourceLabel};
use crate::quote::traits::QuoteSource;
use crate::utils::{format_change, format_price, parse_refresh_time};
use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const AV_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Fallback anchor price and volatility band for the simulated quote.
const SIM_BASE_PRICE: f64 = 1.0850;
const SIM_VOLATILITY: f64 = 0.002;

/// The provider reports no forex volume; one is synthesized in this range.
const VOLUME_MIN: u64 = 500_000;
const VOLUME_MAX: u64 = 1_500_000;

#[derive(Debug, Deserialize)]
struct ExchangeRateEnvelope {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    rate: Option<ExchangeRate>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    exchange_rate: String,
    #[serde(rename = "6. Last Refreshed")]
    last_refreshed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyEnvelope {
    #[serde(rename = "Time Series FX (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

struct HistoryFields {
    open: f64,
    high: f64,
    low: f64,
    change: f64,
}

/// Alpha Vantage quote source for one currency pair.
pub struct AlphaVantageSource {
    client: Client,
    api_key: String,
    from_currency: String,
    to_currency: String,
    symbol: String,
}

impl AlphaVantageSource {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("❗ Failed to create HTTP client");
        Self {
            client,
            api_key: config.api_key.clone(),
            from_currency: config.from_currency.clone(),
            to_currency: config.to_currency.clone(),
            symbol: config.pair_symbol(),
        }
    }

    async fn fetch_live(&self) -> Result<Quote, QuoteError> {
        let rate_url = format!(
            "{AV_BASE_URL}?function=CURRENCY_EXCHANGE_RATE&from_currency={}&to_currency={}&apikey={}",
            self.from_currency, self.to_currency, self.api_key
        );
        let envelope: ExchangeRateEnvelope =
            self.client.get(&rate_url).send().await?.json().await?;
        let rate = envelope
            .rate
            .ok_or(QuoteError::MissingField("Realtime Currency Exchange Rate"))?;
        let current: f64 = rate
            .exchange_rate
            .parse()
            .map_err(|_| QuoteError::MalformedNumber("5. Exchange Rate"))?;

        let history_url = format!(
            "{AV_BASE_URL}?function=FX_DAILY&from_symbol={}&to_symbol={}&outputsize=compact&apikey={}",
            self.from_currency, self.to_currency, self.api_key
        );
        let history: DailyEnvelope =
            self.client.get(&history_url).send().await?.json().await?;
        let fields = history_fields(current, history.series.as_ref())?;

        let timestamp = rate
            .last_refreshed
            .as_deref()
            .and_then(parse_refresh_time)
            .unwrap_or_else(Utc::now);

        let mut rng = rand::rng();
        Ok(Quote {
            symbol: self.symbol.clone(),
            current_price: format_price(current),
            open_price: format_price(fields.open),
            high_price: format_price(fields.high),
            low_price: format_price(fields.low),
            volume: rng.random_range(VOLUME_MIN..VOLUME_MAX),
            percent_change: format_change(fields.change),
            timestamp,
            source: SourceLabel::Live,
        })
    }
}

#[async_trait::async_trait]
impl QuoteSource for AlphaVantageSource {
    async fn fetch_quote(&self) -> Quote {
        info!("🔄 Requesting {} data from Alpha Vantage...", self.symbol);
        match self.fetch_live().await {
            Ok(quote) => {
                info!("📊 Live {} quote received", quote.symbol);
                quote
            }
            Err(e) => {
                warn!("⚠️ Quote fetch failed ({e}), switching to simulation");
                simulated_quote(&self.symbol)
            }
        }
    }
}

/// Derives open/high/low and percent change from the most recent daily bars.
/// Without history everything defaults to the current price and zero change.
fn history_fields(
    current: f64,
    series: Option<&BTreeMap<String, DailyBar>>,
) -> Result<HistoryFields, QuoteError> {
    // ISO date keys sort chronologically, so the last entries are the newest.
    let mut newest_first = series.iter().flat_map(|s| s.values().rev());
    let Some(latest) = newest_first.next() else {
        return Ok(HistoryFields {
            open: current,
            high: current,
            low: current,
            change: 0.0,
        });
    };
    let previous = newest_first.next().unwrap_or(latest);

    let open = latest
        .open
        .parse()
        .map_err(|_| QuoteError::MalformedNumber("1. open"))?;
    let high = latest
        .high
        .parse()
        .map_err(|_| QuoteError::MalformedNumber("2. high"))?;
    let low = latest
        .low
        .parse()
        .map_err(|_| QuoteError::MalformedNumber("3. low"))?;
    let prev_close: f64 = previous
        .close
        .parse()
        .map_err(|_| QuoteError::MalformedNumber("4. close"))?;
    let change = (current - prev_close) / prev_close * 100.0;

    Ok(HistoryFields {
        open,
        high,
        low,
        change,
    })
}

/// Fully synthetic quote used whenever the live path fails.
pub fn simulated_quote(symbol: &str) -> Quote {
    let mut rng = rand::rng();
    let current = SIM_BASE_PRICE + (rng.random::<f64>() - 0.5) * SIM_VOLATILITY;

    Quote {
        symbol: symbol.to_string(),
        current_price: format_price(current),
        open_price: format_price(SIM_BASE_PRICE + (rng.random::<f64>() - 0.5) * 0.001),
        high_price: format_price(current + rng.random::<f64>() * 0.001),
        low_price: format_price(current - rng.random::<f64>() * 0.001),
        volume: rng.random_range(VOLUME_MIN..VOLUME_MAX),
        percent_change: format_change((current - SIM_BASE_PRICE) / SIM_BASE_PRICE * 100.0),
        timestamp: Utc::now(),
        source: SourceLabel::Simulated,
    }
}
