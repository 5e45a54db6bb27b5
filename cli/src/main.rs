//! Binary entrypoint for typq-cli (made by FontLab https://www.fontlab.com/)

fn main() {
    match typq_cli::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(typq_cli::EXIT_FATAL);
        }
    }
}
