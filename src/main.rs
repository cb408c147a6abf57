use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context, Result};
use apiharness::{
    client::ApiClient,
    config::{load_settings, resolve_environment, DEFAULT_SETTINGS_PATH},
    logging::{init_logging, DEFAULT_LOG_FILE},
    report::{NullSink, ReportSink, ResultsDirectory},
    scenarios::{print_listing, print_result, print_summary, Suite},
};
use clap::Parser;
use regex::Regex;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "apiharness",
    version,
    about = "API test harness for the Automation Exercise demo shop"
)]
struct Cli {
    /// Environment to run against (dev, qa, prod, ...)
    #[arg(long, env = "ENV")]
    env: Option<String>,

    /// Settings file with per-environment base URLs and retry settings
    #[arg(short, long, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// Directory holding the fixture files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Write Allure results into this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Only run scenarios whose name matches this regex
    #[arg(short, long)]
    filter: Option<String>,

    /// Only run scenarios carrying this tag (smoke, functional, regression)
    #[arg(short, long)]
    tag: Option<String>,

    /// List the selected scenarios without running them
    #[arg(long)]
    list: bool,

    /// Log file; rotated daily as <stem>.<date>.<ext>
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let base_dir = std::env::current_dir()?;

    let _log_guard = init_logging(cli.verbose, Some(&resolve_relative(&base_dir, &cli.log_file)));

    let settings_path = resolve_relative(&base_dir, &cli.config);
    let loaded = load_settings(&settings_path).context("loading settings")?;
    let environment = resolve_environment(&loaded.settings, cli.env.as_deref())?;

    let data_dir = resolve_relative(&base_dir, &cli.data_dir);
    let mut suite = Suite::standard(&data_dir).context("collecting scenarios")?;
    if let Some(pattern) = &cli.filter {
        let regex =
            Regex::new(pattern).with_context(|| format!("invalid --filter pattern '{pattern}'"))?;
        suite = suite.filter(&regex);
    }
    if let Some(tag) = &cli.tag {
        suite = suite.with_tag(tag);
    }

    if cli.list {
        print_listing(&suite);
        return Ok(ExitCode::SUCCESS);
    }
    if suite.is_empty() {
        bail!("No scenarios match the given --filter/--tag");
    }

    let client = ApiClient::new(&environment).context("building HTTP client")?;

    let report_dir = cli
        .report_dir
        .as_ref()
        .map(|dir| resolve_relative(&base_dir, dir));
    let sink: Box<dyn ReportSink> = match &report_dir {
        Some(dir) => {
            let results = ResultsDirectory::create(dir).context("preparing report directory")?;
            results
                .write_environment(&environment)
                .context("writing report environment")?;
            Box::new(results)
        }
        None => Box::new(NullSink),
    };

    info!(
        env = %environment.name,
        scenarios = suite.len(),
        "running suite"
    );
    let summary = suite.run(&client, &environment.name, sink.as_ref()).await;

    for result in &summary.results {
        print_result(result);
    }
    print_summary(&summary, report_dir.as_deref());

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
