pub mod alert_engine;
pub mod classifier;
pub mod scorer;
pub mod settlement;

pub use alert_engine::{analyze_trade, AlertActionError, BatchReport, RiskAssessment};
pub use classifier::{evaluate_freshness, FreshnessRules, WalletHistory};
pub use scorer::{score_trade, RiskFactors};
