// src/cli.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};

use crate::config::consts::{DEFAULT_OUT_ROOT, DEFAULT_PATCH, LOG_FILE};
use crate::config::Config;
use crate::model::HeroSlug;
use crate::pipeline::{self, RunSummary};
use crate::progress::Progress;
use crate::recommend::{self, EnemySelection};
use crate::store;

/// Exit code when a run finished but too many heroes failed.
pub const EXIT_ELEVATED_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "hero_counters", about = "Scrape hero counter tables and rank counter picks")]
pub struct Cli {
    /// Debug-level entries in the log file.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[arg(long, global = true, default_value = LOG_FILE)]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover heroes, fetch their counters pages, save one record per hero.
    Ingest(IngestArgs),
    /// Parse a directory of saved `<slug>.html` pages instead of fetching.
    Parse(ParseArgs),
    /// List patch directories under the output root.
    Patches(RootArgs),
    /// List heroes recorded for a patch.
    Heroes(DatasetArgs),
    /// Rank counter picks against up to five enemies.
    Recommend(RecommendArgs),
}

#[derive(Args, Debug)]
struct RootArgs {
    #[arg(long, default_value = DEFAULT_OUT_ROOT)]
    out_root: PathBuf,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    #[command(flatten)]
    root: RootArgs,
    #[arg(long, default_value = DEFAULT_PATCH)]
    patch: String,
}

#[derive(Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[arg(long, default_value_t = 3)]
    retries: u32,
    /// Seconds between attempts for one hero.
    #[arg(long, default_value_t = 5.0)]
    retry_sleep: f64,
    /// Seconds, lower bound of the pause between heroes.
    #[arg(long, default_value_t = 0.8)]
    sleep_min: f64,
    #[arg(long, default_value_t = 1.6)]
    sleep_max: f64,
    /// Seconds to wait for a page's table to appear.
    #[arg(long, default_value_t = 25)]
    timeout: u64,
    /// Refresh even records already written today.
    #[arg(long, default_value_t = false)]
    force: bool,
    /// Only process these hero slugs.
    #[arg(long, num_args = 1..)]
    only: Vec<String>,
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[arg(long)]
    input_dir: PathBuf,
    #[arg(long, default_value = "html")]
    ext: String,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// `slug` or `slug:weight` (weight 0..1, default 1). Repeat up to five times.
    #[arg(long = "enemy", short = 'e', required = true)]
    enemies: Vec<String>,
    #[arg(long, default_value_t = 10)]
    top: usize,
}

/// Parse args, run, and return the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    crate::log::init(&cli.log_file, cli.verbose)
        .wrap_err_with(|| format!("opening log file {}", cli.log_file.display()))?;

    match cli.command {
        Command::Ingest(args) => ingest(args),
        Command::Parse(args) => parse_dir(args),
        Command::Patches(args) => {
            for p in store::list_patches(&args.out_root)? {
                println!("{p}");
            }
            Ok(0)
        }
        Command::Heroes(args) => {
            for h in store::list_heroes(&args.root.out_root, &args.patch)? {
                println!("{h}");
            }
            Ok(0)
        }
        Command::Recommend(args) => recommend_cmd(args),
    }
}

fn base_config(dataset: &DatasetArgs) -> Config {
    let mut config = Config::default();
    config.ingest.out_root = dataset.root.out_root.clone();
    config.ingest.patch = dataset.patch.clone();
    config
}

fn secs(v: f64, what: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(v).map_err(|_| eyre!("{what} must be a non-negative number of seconds"))
}

fn ingest(args: IngestArgs) -> Result<i32> {
    let mut config = base_config(&args.dataset);
    let o = &mut config.ingest;
    o.retries = args.retries;
    o.retry_sleep = secs(args.retry_sleep, "--retry-sleep")?;
    o.pacing_min = secs(args.sleep_min, "--sleep-min")?;
    o.pacing_max = secs(args.sleep_max, "--sleep-max")?;
    o.page_timeout = Duration::from_secs(args.timeout);
    o.force = args.force;
    if !args.only.is_empty() {
        let only = args
            .only
            .iter()
            .map(|s| HeroSlug::parse(s).ok_or_else(|| eyre!("invalid hero slug {s:?}")))
            .collect::<Result<Vec<_>>>()?;
        o.only = Some(only);
    }
    if let Some(base) = args.base_url {
        config.site.base_url = base.trim_end_matches('/').to_string();
    }

    println!("Patch: {}", config.ingest.patch);

    let mut progress = CliProgress::default();
    let summary = pipeline::ingest(&config, Some(&mut progress))?;
    Ok(exit_code(&summary))
}

fn parse_dir(args: ParseArgs) -> Result<i32> {
    let config = base_config(&args.dataset);
    let mut progress = CliProgress::default();
    let summary = pipeline::parse_saved_pages(&config, &args.input_dir, &args.ext, Some(&mut progress))?;
    Ok(exit_code(&summary))
}

fn recommend_cmd(args: RecommendArgs) -> Result<i32> {
    let config = base_config(&args.dataset);
    let picks = args
        .enemies
        .iter()
        .map(|raw| parse_enemy(raw))
        .collect::<Result<Vec<_>>>()?;
    let selection = EnemySelection::with_limit(&picks, config.recommend.max_enemies)?;
    let known = store::list_heroes(&config.ingest.out_root, &config.ingest.patch)?;
    selection.require_known(&known)?;

    let data = store::load_dataset(&config.ingest.out_root, &config.ingest.patch)?;
    if data.is_empty() {
        bail!("no matchup data for patch {} under {}", config.ingest.patch, config.ingest.out_root.display());
    }

    let results = recommend::score(&data, &selection);
    if results.is_empty() {
        bail!("no candidates had usable matchup data against the selected enemies");
    }
    print!("{}", recommend::render_table(&results, &selection, args.top));
    Ok(0)
}

/// `axe` → (`axe`, None); `axe:0.5` → (`axe`, Some(0.5)).
fn parse_enemy(raw: &str) -> Result<(String, Option<f64>)> {
    match raw.split_once(':') {
        Some((slug, w)) => {
            let w: f64 = w.trim().parse().wrap_err_with(|| format!("bad weight in {raw:?}"))?;
            Ok((s!(slug.trim()), Some(w)))
        }
        None => Ok((s!(raw.trim()), None)),
    }
}

fn exit_code(summary: &RunSummary) -> i32 {
    if summary.elevated_failure { EXIT_ELEVATED_FAILURE } else { 0 }
}

/// Prints `[i/N] …` lines and the end-of-run summary.
#[derive(Default)]
struct CliProgress {
    total: usize,
}

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        println!("Processing {total} heroes.");
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, idx: usize, hero: &HeroSlug, path: &Path) {
        println!("[{idx}/{}] Saved {hero} -> {}", self.total, path.display());
    }

    fn item_skipped(&mut self, idx: usize, hero: &HeroSlug) {
        println!("[{idx}/{}] Up to date, skipped {hero}", self.total);
    }

    fn item_failed(&mut self, idx: usize, hero: &HeroSlug, reason: &str) {
        eprintln!("[{idx}/{}] ERROR {hero}: {reason}", self.total);
    }

    fn finish(&mut self, summary: &RunSummary) {
        println!("\n=== Summary ===");
        println!("Saved:   {}", summary.saved.len());
        println!("Skipped: {}", summary.skipped.len());
        if summary.failed.is_empty() {
            println!("Failures: 0");
        } else {
            let names: Vec<&str> = summary.failed.iter().map(|(h, _)| h.as_str()).collect();
            eprintln!("Failures ({}): {}", names.len(), names.join(", "));
        }
        if let Some(meta) = &summary.metadata_path {
            println!("Saved {}", meta.display());
        }
        if summary.elevated_failure {
            eprintln!(
                "!! {:.0}% of heroes failed. The site may be rate limiting or blocking requests.",
                summary.failure_ratio() * 100.0
            );
        }
    }
}
