use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proxy_vet::{
    config::Config,
    proxy::{CheckerConfig, ProxyChecker, ProxyDownloader, ProxyParser},
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// A concurrent proxy checker with retries and speed filtering
#[derive(Parser)]
#[command(name = "proxy-vet")]
#[command(about = "A concurrent proxy checker with retries and speed filtering")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config/config.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the proxies in the configured proxy file
    Check,
    /// Download the proxy list, then check it
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    println!("Using configuration file: {}", cli.config.display());

    let config = Config::load(&cli.config);
    config.validate()?;

    match cli.command {
        Some(Commands::Download) => {
            download_list(&config).await?;
            run_check(&config).await
        }
        Some(Commands::Check) | None => run_check(&config).await,
    }
}

async fn download_list(config: &Config) -> Result<()> {
    println!("Downloading proxy list from {}", config.proxy_url);

    let downloader = ProxyDownloader::new()?;
    let proxies = downloader.download(&config.proxy_url).await?;

    ensure_parent_dir(&config.proxy_file)?;
    ProxyParser::save_to_file(&proxies, &config.proxy_file)?;
    println!(
        "✅ Downloaded {} proxies to {}",
        proxies.len(),
        config.proxy_file
    );
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    println!("Starting proxy check...");
    println!("Proxy file: {}", config.proxy_file);
    println!("Output file: {}", config.output_file);
    println!("Test URLs: {}", config.test_urls.join(", "));
    println!("Timeout: {} seconds", config.timeout);
    println!("Concurrent checks: {}", config.concurrent_checks);
    println!("Retry count: {}", config.retry_count);
    println!(
        "Save to input file: {}",
        if config.save_to_input_file { "Yes" } else { "No" }
    );
    if config.speed_filter.enabled {
        println!(
            "Speed filter: {}-{}ms",
            config.speed_filter.min_speed, config.speed_filter.max_speed
        );
    }
    println!();

    let proxies = ProxyParser::read_file(&config.proxy_file)
        .with_context(|| format!("failed to read proxy file {}", config.proxy_file))?;
    println!(
        "Loaded {} proxies from file {}",
        proxies.len(),
        config.proxy_file
    );

    if proxies.is_empty() {
        println!("No proxies found for checking.");
        return Ok(());
    }

    let checker_config = CheckerConfig::new()
        .with_timeout(config.timeout_duration())
        .with_concurrency(config.concurrent_checks)
        .with_test_urls(config.test_urls.clone())
        .with_retry_count(config.retry_count)
        .with_speed_filter(config.speed_filter.clone());

    let checker = ProxyChecker::with_config(checker_config);
    let report = checker.run(proxies).await;

    println!("\nResults of the check:");
    println!("Total proxies: {}", report.total);
    println!("Working proxies: {}", report.working);
    println!("Filtered proxies: {}", report.filtered);
    println!("Not working proxies: {}", report.failed);
    println!(
        "Speed categories: {} fast, {} medium, {} slow, {} unknown",
        report.histogram.fast,
        report.histogram.medium,
        report.histogram.slow,
        report.histogram.unknown
    );

    let list_target = if config.save_to_input_file {
        println!("Saving working proxies back to input file {}", config.proxy_file);
        &config.proxy_file
    } else {
        &config.output_file
    };

    ensure_parent_dir(list_target)?;
    std::fs::write(list_target, report.plain_list())?;
    println!("Saved {} working proxies to {}", report.working, list_target);

    ensure_parent_dir(&config.results_file)?;
    std::fs::write(&config.results_file, report.records_json()?)?;
    println!("Saved structured results to {}", config.results_file);

    Ok(())
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
