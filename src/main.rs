use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = warp_starfield::config::Config::parse();
    warp_starfield::logging::init_logging(cfg.log_file.as_deref(), &cfg.log_level)?;

    warp_starfield::app::run(cfg)
}
