pub mod analyzer;
pub mod backend;
pub mod cli;
pub mod collector;
pub mod config;
pub mod coverage;
pub mod coverages;
pub mod detect;
pub mod error;
pub mod finding;
pub mod ingest;
pub mod limits;
pub mod location;
pub mod readers;
pub mod rules;
