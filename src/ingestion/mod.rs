pub mod normalize;
pub mod pipeline;

pub use normalize::NormalizeError;
pub use pipeline::{ingest_trade, store_market, IngestOutcome};
