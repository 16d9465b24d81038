pub mod config;
pub mod domain;
pub mod optimizer;
pub mod repo;
pub mod runner;
pub mod savings;
pub mod telemetry;
