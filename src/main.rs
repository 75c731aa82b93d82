use std::process::ExitCode;

use stablecut::ui::output;

fn main() -> ExitCode {
    match stablecut::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(e);
            ExitCode::FAILURE
        }
    }
}
