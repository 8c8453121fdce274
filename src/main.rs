use clap::Parser;
use clipsort::cli::{CliArgs, run_cli};
use clipsort::output::OutputFormatter;

fn main() {
    let args = CliArgs::parse();

    if let Err(e) = run_cli(args) {
        OutputFormatter::error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
