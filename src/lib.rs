pub mod adapter;
pub mod backend;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod logging;
pub mod trend;
pub mod utils;
pub mod web;
