// src/bin/cli.rs
use tyfcb_relay::cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::run()
}
