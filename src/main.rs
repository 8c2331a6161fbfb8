use clap::Parser;
use filesorter::cli::{Cli, run};
use filesorter::logging::init_logging;
use filesorter::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        OutputFormatter::error(&format!("Error: {}", e));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
