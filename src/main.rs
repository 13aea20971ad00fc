use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use gallery_scrap::{cli, info_time, logging};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();
    let start_time = Local::now();

    let args = cli::Args::parse();
    match cli::run(args).await {
        Ok(()) => {
            info_time!(start_time, "Full program time:");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
