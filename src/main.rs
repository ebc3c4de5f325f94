// src/main.rs

use testdag::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("testdag error: {err:?}");
        std::process::exit(1);
    }

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("testdag error: {err}");
            err.exit_code()
        }
    };

    std::process::exit(code);
}
