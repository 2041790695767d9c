use clap::Parser;
use tradejournal::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
