use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use web_reader::utils::default_output_path;
use web_reader::{CrawlerConfig, SiteReader};

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => match CrawlerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => CrawlerConfig::new(&args.url),
    };
    let config = args.apply(base);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.start_url));

    println!("Note: reading pages requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    // Ctrl-C lets in-flight pages finish, then the partial result is written
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupted, finishing pages in flight");
            on_signal.cancel();
        }
    });

    let report = match SiteReader::new(&config.start_url)
        .with_config(config)
        .with_cancellation(cancel)
        .read()
        .await
    {
        Ok(report) => report,
        Err(e) => {
            ::log::error!("Failed to read website: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for failure in &report.failures {
        ::log::debug!("{:?} at depth {}: {}", failure.kind, failure.depth, failure.message);
    }

    if let Err(e) = report.pages.save_json(&output) {
        ::log::error!("Failed to write result: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Read {} of {} visited pages in {:.2} seconds{} -> {}",
        report.pages.len(),
        report.visited.len(),
        report.elapsed.as_secs_f64(),
        if report.cancelled { " (cancelled)" } else { "" },
        output.display()
    );
    ExitCode::SUCCESS
}
