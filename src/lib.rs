pub mod band;
pub mod classify;
pub mod cli;
pub mod coerce;
pub mod complete;
pub mod config;
pub mod fetch;
pub mod identifiers;
pub mod inspect;
pub mod io_utils;
pub mod labels;
pub mod melt;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod query_cmd;
pub mod raw;
pub mod sink;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("eurostat_longform", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => pipeline::execute(&args),
        Commands::Inspect(args) => inspect::execute(&args),
        Commands::Query(args) => query_cmd::execute(&args),
        Commands::Facets(args) => query_cmd::execute_facets(&args),
    }
}
