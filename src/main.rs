use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use shelfcheck_api::{ApiConfig, ApiSuite, Case, ReqwestClient};
use shelfcheck_support::{DirectorySink, EvidenceSink, MemorySink, ParamDef, Params};
use shelfcheck_web::{Runner, WebConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "shelfcheck")]
#[command(about = "End-to-end checks for a retail storefront and its user REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the storefront, filter by price and scrape the product grid
    Web {
        #[command(flatten)]
        common: CommonArgs,

        /// Run in headless mode (overrides config)
        #[arg(long)]
        headless: bool,
    },
    /// Run the user CRUD and authentication suite
    Api {
        #[command(flatten)]
        common: CommonArgs,

        /// Run only this case (can be used multiple times)
        #[arg(long = "case", value_name = "NAME")]
        cases: Vec<String>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Config file to run
    config: PathBuf,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

impl CommonArgs {
    fn init_logging(&self) {
        let level = if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                _ => Level::DEBUG,
            }
        };

        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }

    fn params(&self) -> anyhow::Result<Params> {
        Ok(Params::from_args(&self.params)?)
    }
}

fn evidence_sink(dir: Option<&str>) -> anyhow::Result<Box<dyn EvidenceSink>> {
    Ok(match dir {
        Some(dir) => Box::new(
            DirectorySink::create(dir)
                .with_context(|| format!("cannot create evidence directory {}", dir))?,
        ),
        None => Box::new(MemorySink::new()),
    })
}

fn print_params(params: &HashMap<String, ParamDef>) {
    if params.is_empty() {
        return;
    }
    println!("  Parameters: {}", params.len());
    for (name, def) in params {
        let req = if def.required { " (required)" } else { "" };
        let desc = def.description.as_deref().unwrap_or("");
        println!("    - {}{}: {}", name, req, desc);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let success = match cli.command {
        Command::Web { common, headless } => run_web(common, headless).await?,
        Command::Api { common, cases } => run_api(common, cases).await?,
    };
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_web(args: CommonArgs, headless: bool) -> anyhow::Result<bool> {
    args.init_logging();
    let params = args.params()?;
    let mut config = WebConfig::load_with_params(&args.config, &params)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if args.check {
        println!("Config valid: {}", config.name);
        println!("  Site: {}", config.site.base_url);
        println!("  Search term: {}", config.site.search_term);
        println!(
            "  Price filter: {:.2} - {:.2}, expecting above {:.2}",
            config.price_filter.min, config.price_filter.max, config.price_filter.expected
        );
        print_params(&config.params);
        if let Some(retry) = config.on_failure.as_ref().and_then(|f| f.retry.as_ref()) {
            println!("  Retry attempts: {}", retry.max_attempts);
        }
        return Ok(true);
    }

    if headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);
    let evidence = evidence_sink(config.evidence.dir.as_deref())?;

    let mut runner = Runner::new(&config.browser).await?;
    let result = runner.run(&config, evidence.as_ref()).await?;

    println!();
    if let Some(ref report) = result.report {
        println!(
            "Products above R$ {:.2}: {}",
            config.price_filter.expected,
            report.products.len()
        );
        for product in &report.products {
            println!("  {}", product);
        }
        if report.skipped > 0 {
            println!("  Skipped cards: {}", report.skipped);
        }
        if report.degraded_prices > 0 {
            println!("  Unreadable prices: {}", report.degraded_prices);
        }
    }
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    println!("  Duration: {}ms", result.duration_ms);
    if result.retries > 0 {
        println!("  Retries: {}", result.retries);
    }

    runner.close().await?;
    Ok(result.success)
}

async fn run_api(args: CommonArgs, cases: Vec<String>) -> anyhow::Result<bool> {
    args.init_logging();
    let params = args.params()?;
    let mut config = ApiConfig::load_with_params(&args.config, &params)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if !cases.is_empty() {
        if let Some(unknown) = cases.iter().find(|c| Case::from_name(c).is_none()) {
            anyhow::bail!("unknown case: {}", unknown);
        }
        config.cases = cases;
    }

    if args.check {
        println!("Config valid: {}", config.name);
        println!("  Base URL: {}", config.base_url);
        println!("  Cases: {}", config.selected_cases().len());
        print_params(&config.params);
        return Ok(true);
    }

    println!("Running: {}", config.name);
    let evidence = evidence_sink(config.evidence.dir.as_deref())?;
    let client = ReqwestClient::new(config.timeout())?;
    let report = ApiSuite::new(&client, &config, evidence.as_ref()).run().await;

    println!();
    for result in &report.results {
        let mark = if result.passed { "✓" } else { "✗" };
        let status = result
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{} {:<24} {:>4}  {}ms",
            mark,
            result.case.name(),
            status,
            result.duration_ms
        );
        if let Some(ref error) = result.error {
            println!("    {}", error);
        }
    }
    println!();
    println!(
        "Passed: {}/{}  Duration: {}ms",
        report.passed(),
        report.results.len(),
        report.duration_ms
    );
    Ok(report.all_passed())
}
