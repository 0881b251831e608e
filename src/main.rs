use std::process::ExitCode;

fn main() -> ExitCode {
    medrisk_lib::run()
}
