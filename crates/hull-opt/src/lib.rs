//! Configuration, run orchestration and artifact writers for the `hullopt`
//! command-line tool.

pub mod config;
pub mod export;
pub mod logging;
pub mod report;
pub mod runner;
