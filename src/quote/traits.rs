use crate::model::Quote;

/// A quote provider for one currency pair. Never fails: implementations must
/// degrade to synthetic data rather than propagate errors.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self) -> Quote;
}
