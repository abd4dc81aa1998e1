use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use write_loadtest::client::build_client;
use write_loadtest::config::{usage, Config};
use write_loadtest::metrics::{gather_metrics_string, register_metrics};
use write_loadtest::worker::run_post_load_test;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "write_loadtest".to_string());
    let args: Vec<String> = args.collect();

    let config = match Config::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", usage(&program));
            std::process::exit(1);
        }
    };

    register_metrics()?;

    let client = match build_client(&config.to_client_config()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    config.print_summary();

    let report = run_post_load_test(&config, client).await;
    println!("{}", report.format());

    debug!(metrics = %gather_metrics_string(), "Final metrics");

    Ok(())
}
