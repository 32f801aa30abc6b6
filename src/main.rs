mod assets;
mod cli;
mod collectors;
mod config;
mod documents;
mod http;
mod models;
mod parsers;
mod prelude;
mod publishers;
mod services;

#[cfg(test)]
mod testing;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = cli::Args::parse();
    match args.execute().await {
        Ok(report) if report.failed_items == 0 => {
            info!("Finished: {report}.");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            warn!("Finished with errors: {report}.");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
