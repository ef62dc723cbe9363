use clap::Parser;
use cryptota::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
