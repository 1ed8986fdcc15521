//! Seed-keyed result cache.
//!
//! A completed run's results table is written to `<cache_dir>/<seed>.csv`.
//! A later run with the same seed loads the table instead of retraining;
//! changing the seed changes the file name, so stale results are never
//! replayed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::table::ResultsTable;

pub struct ResultCache {
    cache_dir: PathBuf,
}

impl ResultCache {
    /// Open the cache directory, creating it if absent.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create cache directory '{}'", cache_dir.display()))?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, seed: u64) -> PathBuf {
        self.cache_dir.join(format!("{seed}.csv"))
    }

    pub fn contains(&self, seed: u64) -> bool {
        self.path_for(seed).is_file()
    }

    pub fn load(&self, seed: u64) -> Result<ResultsTable> {
        let path = self.path_for(seed);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cached results '{}'", path.display()))?;
        ResultsTable::from_csv_str(&raw)
            .with_context(|| format!("failed to parse cached results '{}'", path.display()))
    }

    pub fn store(&self, seed: u64, table: &ResultsTable) -> Result<()> {
        let path = self.path_for(seed);
        let raw = table
            .to_csv_string()
            .context("failed to encode results table")?;
        fs::write(&path, raw)
            .with_context(|| format!("failed to write cached results '{}'", path.display()))
    }

    /// Seeds with a cached table, ascending.
    pub fn stored_seeds(&self) -> Result<Vec<u64>> {
        let mut seeds = Vec::new();
        let entries = fs::read_dir(&self.cache_dir).with_context(|| {
            format!("failed to list cache directory '{}'", self.cache_dir.display())
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "csv") {
                if let Some(seed) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse().ok())
                {
                    seeds.push(seed);
                }
            }
        }
        seeds.sort_unstable();
        Ok(seeds)
    }

    /// Delete every cached table. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        let seeds = self.stored_seeds()?;
        for &seed in &seeds {
            let path = self.path_for(seed);
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove '{}'", path.display()))?;
        }
        Ok(seeds.len())
    }
}
