use std::process::ExitCode;

fn main() -> ExitCode {
    scuderia_cli::run()
}
