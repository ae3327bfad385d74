use cachestatus_core::logging;

mod cli;
mod server;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging as early as possible; fall back to stderr if the
    // state dir is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match cli::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cachestatus error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
