use clap::Parser;
use dg_core::cli::{self, Cli};
use dg_core::exit_codes::ExitCode;
use dg_core::logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_config()) {
        eprintln!("error: failed to initialise logging: {}", e);
        std::process::exit(ExitCode::IoError.as_i32());
    }

    let code = cli::run(&cli);
    std::process::exit(code.as_i32());
}
