// Quote module: live market data with a synthetic fallback.

pub mod fetcher;
pub mod traits;

pub use fetcher::AlphaVantageSource;
pub use traits::QuoteSource;
