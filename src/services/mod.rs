pub mod collector;
pub mod detector;
pub mod resolution;
pub mod scheduler;
pub mod wallet_stats;

pub use scheduler::run_periodic;
