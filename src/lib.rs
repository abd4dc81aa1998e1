pub mod aggregator;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod metrics;
pub mod payload;
pub mod percentiles;
pub mod report;
pub mod worker;
