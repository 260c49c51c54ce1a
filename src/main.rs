//! planner - Task layout for day-grid calendars

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = planner_layout::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
