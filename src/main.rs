use clap::Parser;
use tsbatch::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
