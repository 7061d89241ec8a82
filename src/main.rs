// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot CLI - WCAG 2.1 website accessibility auditor

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wcagbot::analysis::{analyze_snapshots, AnalysisResult, Auditor};
use wcagbot::config::{default_config_path, load_config, write_default_config, Config};
use wcagbot::finding::WcagLevel;
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::scanner;

/// WCAG 2.1 website accessibility auditor
#[derive(Parser)]
#[command(name = "wcagbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site, run all checks and score it
    Audit {
        /// Start URL
        url: String,

        /// Maximum pages to extract
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum link depth from the start URL
        #[arg(long)]
        max_depth: Option<usize>,

        /// Also estimate the site's page count
        #[arg(long)]
        count_pages: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Estimate how many pages a site has
    Count {
        /// Site URL
        url: String,

        /// Config file (defaults to the user config when present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Audit a directory of HTML files
    Scan {
        /// Directory to scan
        dir: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write the default configuration
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    format: FormatArg,

    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Config file (defaults to the user config when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// WCAG conformance level to check and score against
    #[arg(long)]
    level: Option<WcagLevelArg>,

    /// Exit with status 1 when the overall score is below this value
    #[arg(long)]
    fail_under: Option<f64>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

/// WCAG conformance level CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum WcagLevelArg {
    /// Level A - minimum
    A,
    /// Level AA - standard
    Aa,
    /// Level AAA - enhanced
    Aaa,
}

impl From<WcagLevelArg> for WcagLevel {
    fn from(arg: WcagLevelArg) -> Self {
        match arg {
            WcagLevelArg::A => WcagLevel::A,
            WcagLevelArg::Aa => WcagLevel::AA,
            WcagLevelArg::Aaa => WcagLevel::AAA,
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wcagbot=debug")
    } else {
        EnvFilter::new("wcagbot=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit path, else the user config if it exists, else defaults
fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Ok(load_config(p)?),
        None => {
            let user = default_config_path();
            if user.exists() {
                Ok(load_config(&user)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn apply_common(config: &mut Config, common: &CommonArgs) {
    if let Some(level) = common.level {
        config.checks.target_level = level.into();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit {
            url,
            max_pages,
            max_depth,
            count_pages,
            common,
        } => {
            init_logging(common.verbose);
            let mut config = resolve_config(common.config.as_deref())?;
            apply_common(&mut config, &common);
            if let Some(n) = max_pages {
                config.crawl.max_pages = n;
            }
            if let Some(d) = max_depth {
                config.crawl.max_depth = d;
            }

            let auditor = Auditor::new(config)?.with_page_count(count_pages);
            match auditor.audit(&url).await {
                Ok(result) => finish(&result, &common)?,
                Err(e) => {
                    eprintln!("{}", serde_json::to_string(&e)?);
                    anyhow::bail!(e);
                }
            }
        }

        Commands::Count { url, config, verbose } => {
            init_logging(verbose);
            let config = resolve_config(config.as_deref())?;
            let auditor = Auditor::new(config)?;
            match auditor.count_pages(&url).await {
                Ok(estimate) => println!("{}", serde_json::to_string_pretty(&estimate)?),
                Err(e) => {
                    eprintln!("{}", serde_json::to_string(&e)?);
                    anyhow::bail!(e);
                }
            }
        }

        Commands::Scan { dir, common } => {
            init_logging(common.verbose);
            let mut config = resolve_config(common.config.as_deref())?;
            apply_common(&mut config, &common);
            let pages = scanner::scan_directory(&dir, &config.extract)?;
            let result = analyze_snapshots(&dir.display().to_string(), &pages, &config);
            finish(&result, &common)?;
        }

        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(default_config_path);
            write_default_config(&path)?;
            eprintln!("Default configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Render, write, and apply the `--fail-under` gate
fn finish(result: &AnalysisResult, common: &CommonArgs) -> anyhow::Result<()> {
    let report = generate_report(result, common.format.into());
    write_output(&report, common.output.as_deref())?;

    if let Some(threshold) = common.fail_under {
        if result.scores.overall.score < threshold {
            eprintln!(
                "Overall score {:.2} is below {:.2}",
                result.scores.overall.score, threshold
            );
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
