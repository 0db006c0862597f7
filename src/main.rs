mod cli;
mod config;
mod download;
mod errors;
mod github;
mod java;
mod patcher;
mod probe;
mod progress;
mod tools;
mod version;

use crate::errors::Fatal;
use crate::progress::MultiProgressWriter;
use std::sync::Arc;
use tracing::{Level, error};

fn main() {
    let mp = Arc::new(progress::GLOBAL_MP.clone());

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(move || MultiProgressWriter::new(mp.clone()))
        .init();

    if let Err(err) = cli::program::program() {
        error!("{err:#}");
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Fatal>())
            .map(Fatal::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
