//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use reviewcrew_core::{CrewPlan, CsvWriterTool, MarkdownTableTool, RunContext};
use reviewcrew_crawler::{HttpScraper, Scraper};
use reviewcrew_shared::{
    AppConfig, RunConfig, Table, init_config, load_config, validate_search_keys,
};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ReviewCrew — collect product reviews into tables.
#[derive(Parser)]
#[command(
    name = "reviewcrew",
    version,
    about = "Plan review-collection runs, scrape review pages, and render review tables.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the crew plan (agents and tasks) as JSON.
    Plan {
        /// Product category, e.g. "smartphones".
        #[arg(long)]
        product: Option<String>,

        /// Attributes to collect, e.g. "price, battery life".
        #[arg(long)]
        attributes: Option<String>,

        /// Kinds of sources to prefer.
        #[arg(long)]
        hints: Option<String>,

        /// Product types to exclude.
        #[arg(long)]
        avoid: Option<String>,

        /// Validate the plan against the local tools before printing.
        #[arg(long)]
        check: bool,
    },

    /// List the agent tools as JSON definitions.
    Tools,

    /// Render review records (JSON array of objects) to a file.
    Render {
        #[command(subcommand)]
        format: RenderFormat,
    },

    /// Scrape review pages and report how many sources succeeded.
    Scrape {
        /// Page URLs.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum concurrent fetches (defaults to config).
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Print each page's Markdown.
        #[arg(long)]
        show: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Output formats for `render`.
#[derive(Subcommand)]
pub(crate) enum RenderFormat {
    /// Markdown table.
    Markdown {
        /// JSON input file, or `-` for stdin.
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output file (defaults to config).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Append to the file instead of overwriting it.
        #[arg(long)]
        append: bool,
    },
    /// CSV file.
    Csv {
        /// JSON input file, or `-` for stdin.
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output file (defaults to config).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Check that search API keys are present in the environment.
    Check,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reviewcrew=info",
        1 => "reviewcrew=debug",
        _ => "reviewcrew=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan {
            product,
            attributes,
            hints,
            avoid,
            check,
        } => cmd_plan(product, attributes, hints, avoid, check).await,
        Command::Tools => cmd_tools().await,
        Command::Render { format } => match format {
            RenderFormat::Markdown { input, out, append } => {
                cmd_render_markdown(&input, out.as_deref(), append).await
            }
            RenderFormat::Csv { input, out } => cmd_render_csv(&input, out.as_deref()).await,
        },
        Command::Scrape {
            urls,
            concurrency,
            show,
        } => cmd_scrape(&urls, concurrency, show).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
            ConfigAction::Check => cmd_config_check().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_plan(
    product: Option<String>,
    attributes: Option<String>,
    hints: Option<String>,
    avoid: Option<String>,
    check: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut run = RunConfig::from(&config);
    if let Some(p) = product {
        run.product_type = p;
    }
    if let Some(a) = attributes {
        run.review_attributes = a;
    }
    if let Some(h) = hints {
        run.source_hints = h;
    }
    if let Some(a) = avoid {
        run.avoid_types = a;
    }

    let plan = CrewPlan::for_run(&run);
    if check {
        let ctx = RunContext::new();
        let scraper = HttpScraper::new(&config.scrape)?;
        plan.validate(&ctx.toolset(&run, scraper))?;
        info!("plan validated against local tools");
    }

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn cmd_tools() -> Result<()> {
    let config = load_config()?;
    let run = RunConfig::from(&config);
    let scraper = HttpScraper::new(&config.scrape)?;
    let tools = RunContext::new().toolset(&run, scraper);

    println!("{}", serde_json::to_string_pretty(&tools.definitions())?);
    Ok(())
}

/// Read review records from a file or stdin.
fn read_records(input: &str) -> Result<Table> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| eyre!("failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|e| eyre!("failed to read '{input}': {e}"))?
    };

    Ok(Table::from_json_str(&text)?)
}

async fn cmd_render_markdown(input: &str, out: Option<&Path>, append: bool) -> Result<()> {
    let config = load_config()?;
    let table = read_records(input)?;
    let tool = MarkdownTableTool::new(RunConfig::from(&config).markdown_output);

    let written = tool.run(&table, out, append)?;
    println!(
        "Markdown table generated and saved as {} ({} rows, {} bytes)",
        written.path.display(),
        written.rows,
        written.bytes
    );
    Ok(())
}

async fn cmd_render_csv(input: &str, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let table = read_records(input)?;
    let tool = CsvWriterTool::new(RunConfig::from(&config).csv_output);

    let written = tool.run(&table, out)?;
    println!(
        "CSV file generated and saved as {} ({} rows, {} bytes)",
        written.path.display(),
        written.rows,
        written.bytes
    );
    Ok(())
}

async fn cmd_scrape(urls: &[String], concurrency: Option<usize>, show: bool) -> Result<()> {
    let config = load_config()?;
    let limit = concurrency
        .unwrap_or(config.scrape.concurrency as usize)
        .max(1);

    let parsed = urls
        .iter()
        .map(|u| Url::parse(u).map_err(|e| eyre!("invalid URL '{u}': {e}")))
        .collect::<Result<Vec<_>>>()?;

    let ctx = RunContext::new();
    let scraper = Arc::new(ctx.counting(HttpScraper::new(&config.scrape)?));
    let semaphore = Arc::new(Semaphore::new(limit));
    let started = Instant::now();

    info!(run_id = %ctx.run_id(), urls = parsed.len(), concurrency = limit, "scraping sources");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("invalid progress template: {e}"))?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(format!("Fetching {} pages", parsed.len()));

    let mut handles = Vec::with_capacity(parsed.len());
    for url in parsed {
        let scraper = Arc::clone(&scraper);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = scraper.scrape(&url).await;
            (url, result)
        }));
    }

    let total = handles.len();
    let mut failed = 0usize;
    for (i, handle) in handles.into_iter().enumerate() {
        let (url, result) = handle.await.map_err(|e| eyre!("scrape task panicked: {e}"))?;
        spinner.set_message(format!("Fetched [{}/{total}] {url}", i + 1));
        match result {
            Ok(page) => {
                if show {
                    spinner.suspend(|| {
                        println!("## {}\n", page.title.as_deref().unwrap_or(&page.url));
                        println!("{}", page.markdown);
                    });
                }
            }
            Err(e) => {
                failed += 1;
                warn!(url = %url, error = %e, "scrape failed");
            }
        }
    }
    spinner.finish_and_clear();

    println!();
    println!("  Total sources used: {}", ctx.total_sources());
    println!("  Failed:             {failed}");
    println!("  Time:               {:.1}s", started.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

async fn cmd_config_check() -> Result<()> {
    let config = load_config()?;
    validate_search_keys(&config)?;
    println!(
        "Search keys present: {}, {}",
        config.search.serper_api_key_env, config.search.exa_api_key_env
    );
    Ok(())
}
