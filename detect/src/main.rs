use anyhow::{Context, Result};
use clap::Parser;
use frcnn_detect::{args::Args, config::Config};
use std::env;

fn main() -> Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let options = Args::parse().check()?;
    let config = match &options.config_file {
        Some(path) => Config::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => Config::default(),
    };

    frcnn_detect::start(&options, &config)?;

    Ok(())
}
