use std::process::ExitCode;

fn main() -> ExitCode {
    resin_cli::run()
}
