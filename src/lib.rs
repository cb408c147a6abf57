pub mod assertions;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod report;
pub mod scenarios;
