// src/main.rs

use devloop::config::load_settings;
use devloop::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("devloop error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let settings = load_settings(args.config.as_deref())?;
    logging::init_logging(args.log_level, &settings)?;
    run(settings).await
}
