pub mod config;
pub mod error;
pub mod fetch;
pub mod regions;
pub mod session;
pub mod telemetry;
pub mod workflows;
