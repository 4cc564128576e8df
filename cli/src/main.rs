mod cli;

use crate::cli::ViaductArguments;
use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, trace};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ViaductArguments::parse();
    pretty_env_logger::env_logger::builder()
        .format_timestamp(None)
        .filter_level(if args.verbose { LevelFilter::Trace } else { LevelFilter::Info })
        .init();

    trace!("Arguments: {:#?}", args);

    args.handle_arguments().await
}
