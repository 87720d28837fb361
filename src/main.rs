use std::process::ExitCode;

fn main() -> ExitCode {
    fixture_registry::cli::run()
}
