// src/bin/cli.rs
use hero_counters::cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let code = cli::run()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
