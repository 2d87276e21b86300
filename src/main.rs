//! detik-scraper CLI - serve the scraping API or run one-off scrapes.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use detik_scraper::{
    api::HttpServer, ScraperConfig, SearchPipeline, SearchRequest, SearchStatus, TrendingSource,
};

/// detik-scraper - detik.com search and trending scraper
#[derive(Parser)]
#[command(name = "detik-scraper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, env = "DETIK_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

/// Settings that override the configuration file.
#[derive(Args)]
struct ConfigOverrides {
    /// Site origin used for search URLs and relative links
    #[arg(long, global = true, env = "DETIK_BASE_URL")]
    base_url: Option<String>,

    /// Trending source URL
    #[arg(long, global = true, env = "DETIK_TRENDING_URL")]
    trending_url: Option<String>,

    /// Trending source format
    #[arg(long, global = true, env = "DETIK_TRENDING_SOURCE")]
    trending_source: Option<TrendingSourceArg>,

    /// Per-fetch timeout in seconds
    #[arg(long, global = true, env = "DETIK_TIMEOUT")]
    timeout: Option<u64>,

    /// Maximum concurrent upstream fetches per search
    #[arg(long, global = true, env = "DETIK_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Retries for transient upstream failures
    #[arg(long, global = true, env = "DETIK_RETRIES")]
    retries: Option<u32>,

    /// Drop repeated article URLs across pages
    #[arg(long, global = true)]
    dedup: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API
    Serve(ServeArgs),

    /// Scrape search results for a keyword
    Search(SearchArgs),

    /// Print the current trending keywords
    Trending,
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "DETIK_LISTEN")]
    listen: SocketAddr,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search keyword
    keyword: String,

    /// Number of result pages to scrape
    #[arg(short, long, default_value = "1")]
    pages: u32,

    /// Skip fetching article bodies
    #[arg(long)]
    no_content: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrendingSourceArg {
    Api,
    Html,
}

impl From<TrendingSourceArg> for TrendingSource {
    fn from(arg: TrendingSourceArg) -> Self {
        match arg {
            TrendingSourceArg::Api => TrendingSource::Api,
            TrendingSourceArg::Html => TrendingSource::Html,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref(), cli.overrides)?;

    match cli.command {
        Commands::Serve(args) => HttpServer::from_config(args.listen, &config)?.run().await,
        Commands::Search(args) => run_search(&config, args).await,
        Commands::Trending => run_trending(&config).await,
    }
}

fn load_config(path: Option<&std::path::Path>, overrides: ConfigOverrides) -> Result<ScraperConfig> {
    let mut config = match path {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };

    if let Some(base_url) = overrides.base_url {
        config.base_url = base_url;
    }
    if let Some(trending_url) = overrides.trending_url {
        config.trending_url = trending_url;
    }
    if let Some(source) = overrides.trending_source {
        config.trending_source = source.into();
    }
    if let Some(timeout) = overrides.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(max_concurrency) = overrides.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    if let Some(retries) = overrides.retries {
        config.retry.max_retries = retries;
    }
    if overrides.dedup {
        config.dedup = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_search(config: &ScraperConfig, args: SearchArgs) -> Result<()> {
    let pipeline = SearchPipeline::from_config(config)?;

    let mut request = SearchRequest::new(&args.keyword).with_pages(args.pages);
    if args.no_content {
        request = request.with_fetch_content(false);
    }
    let outcome = pipeline.search(&request).await?;

    if outcome.status != SearchStatus::Complete {
        eprintln!(
            "Warning: {} of {} pages failed ({:?})",
            outcome.failed_pages.len(),
            outcome.pages_requested,
            outcome.failed_page_numbers()
        );
    }

    match args.format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" ({} results in {}ms):\n",
                args.keyword,
                outcome.items().len(),
                outcome.duration_ms
            );

            for (i, article) in outcome.items().iter().enumerate() {
                println!("{}. {}", i + 1, article.title);
                println!("   URL: {}", article.url);
                if !article.published_at.is_empty() {
                    println!("   Date: {}", article.published_at);
                }
                if !article.description.is_empty() {
                    println!("   {}", truncate(&article.description, 150));
                }
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome.items())?);
        }
        OutputFormat::Compact => {
            for article in outcome.items() {
                println!("{}\t{}", article.title, article.url);
            }
        }
    }

    Ok(())
}

async fn run_trending(config: &ScraperConfig) -> Result<()> {
    let pipeline = SearchPipeline::from_config(config)?;
    let keywords = pipeline.trending().await?;

    for (i, keyword) in keywords.iter().enumerate() {
        println!("{:>2}. {}", i + 1, keyword);
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
