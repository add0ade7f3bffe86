pub mod data_client;
pub mod gamma_client;
pub mod types;

pub use data_client::{DataClient, DataClientError};
pub use gamma_client::{GammaClient, GammaClientError};
pub use types::{ApiTrade, GammaMarket};
