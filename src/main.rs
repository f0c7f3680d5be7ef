// src/main.rs

use buildrunner::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("buildrunner error: {err:?}");
            std::process::exit(2);
        }
    }
}

async fn run_main() -> buildrunner::errors::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
