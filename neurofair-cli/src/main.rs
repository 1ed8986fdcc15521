//! NeuroFair CLI — evaluation runs and result-cache management.
//!
//! Commands:
//! - `run` — evaluate the configured submission roster from a TOML config
//! - `submissions` — list the registered submission names
//! - `cache status` — report cached seeds
//! - `cache clear` — remove every cached results table

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use neurofair_core::confusion::Category;
use neurofair_core::submission::SubmissionRegistry;
use neurofair_runner::runner::run_evaluation;
use neurofair_runner::{save_report, CsvDataProvider, EvalConfig, EvaluationReport, ResultCache};

#[derive(Parser)]
#[command(
    name = "neurofair",
    about = "NeuroFair CLI — fairness-aware classifier evaluation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the configured submission roster.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for report artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// List the registered submission names.
    Submissions,
    /// Result-cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report which seeds have cached results.
    Status {
        /// Cache directory. Defaults to ./saved_outcomes.
        #[arg(long, default_value = "saved_outcomes")]
        cache_dir: PathBuf,
    },
    /// Remove every cached results table.
    Clear {
        /// Cache directory. Defaults to ./saved_outcomes.
        #[arg(long, default_value = "saved_outcomes")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            output_dir,
        } => run_cmd(&config, seed, &output_dir),
        Commands::Submissions => {
            let registry = SubmissionRegistry::with_baselines();
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => cache_status(&cache_dir),
            CacheAction::Clear { cache_dir, confirm } => cache_clear(&cache_dir, confirm),
        },
    }
}

fn run_cmd(config_path: &Path, seed_override: Option<u64>, output_dir: &Path) -> Result<()> {
    let mut config = EvalConfig::from_file(config_path)
        .with_context(|| format!("failed to load config '{}'", config_path.display()))?;
    if let Some(seed) = seed_override {
        config.evaluation.seed = seed;
    }

    let provider = CsvDataProvider::new(config.data.train.clone(), config.data.test.clone());
    let registry = SubmissionRegistry::with_baselines();
    let cache = ResultCache::open(&config.evaluation.cache_dir)?;

    let report = run_evaluation(&config, &provider, &registry, &cache)?;
    print_summary(&report);

    let run_dir = save_report(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ResultCache::open(cache_dir)?;
    let seeds = cache.stored_seeds()?;
    if seeds.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache: {}", cache_dir.display());
    println!("Cached runs: {}", seeds.len());
    for seed in seeds {
        match cache.load(seed) {
            Ok(table) => println!(
                "  seed {seed}: {} submission(s), {} fold(s)",
                table.submissions().len(),
                table.n_folds()
            ),
            Err(_) => println!("  seed {seed}: (corrupt results file)"),
        }
    }
    Ok(())
}

fn cache_clear(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ResultCache::open(cache_dir)?;
    let seeds = cache.stored_seeds()?;
    if seeds.is_empty() {
        println!("Cache is already empty.");
        return Ok(());
    }

    println!("Found {} cached run(s): {seeds:?}", seeds.len());
    if !confirm {
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    let removed = cache.clear()?;
    println!("Done. Removed {removed} cached run(s).");
    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    println!();
    println!("=== Evaluation Result ===");
    println!("Seed:           {}", report.seed);
    println!("Folds:          {}", report.n_folds);
    if report.from_cache {
        println!("Source:         cache (no training performed)");
    } else {
        println!("Source:         fresh training run");
    }
    println!();

    for submission in report.table.submissions() {
        println!("--- {submission} ---");
        if let Some(overall) = report.table.fold_means(submission, Category::Overall) {
            println!("Overall AUC:    {:.3}", overall.auc);
        }
        if let Some(male) = report.table.fold_means(submission, Category::Male) {
            println!("Male AUC:       {:.3}", male.auc);
        }
        if let Some(female) = report.table.fold_means(submission, Category::Female) {
            println!("Female AUC:     {:.3}", female.auc);
        }

        let signed: Vec<f64> = report
            .accuracy_gap
            .iter()
            .filter(|g| g.submission == submission)
            .map(|g| g.gap * f64::from(g.sign))
            .collect();
        if !signed.is_empty() {
            let mean = signed.iter().sum::<f64>() / signed.len() as f64;
            println!("Accuracy gap:   {mean:+.2} pp (positive favors female)");
        }

        let eo: Vec<f64> = report
            .equal_opportunity
            .points
            .iter()
            .filter(|p| p.submission == submission)
            .map(|p| p.value)
            .collect();
        if !eo.is_empty() {
            let mean = eo.iter().sum::<f64>() / eo.len() as f64;
            println!("Equal opp.:     {mean:+.2} pp (positive favors male)");
        }
        println!();
    }
}
