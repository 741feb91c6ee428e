pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod snapshots;
pub mod telemetry;
