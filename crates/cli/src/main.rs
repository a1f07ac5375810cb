use std::process::ExitCode;

fn main() -> ExitCode {
    coverquote_cli::run()
}
