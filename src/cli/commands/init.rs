//! Implementation of the `djinn init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::adapters::sqlite::{initialize_database, SqliteMovieCatalog};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CompiledFilter, Config};
use crate::domain::ports::MovieCatalog;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed the database with a handful of well-known movies
    #[arg(long)]
    pub sample: bool,

    /// Overwrite an existing configuration file with the defaults
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub database_path: String,
    pub movies_seeded: usize,
    pub movies_total: u64,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("Wrote {}", self.config_path.display()));
        } else {
            lines.push(format!("Kept existing {}", self.config_path.display()));
        }
        lines.push(format!("Database ready at {}", self.database_path));
        if self.movies_seeded > 0 {
            lines.push(format!("Seeded {} sample movie(s)", self.movies_seeded));
        }
        lines.push(format!("{} movie(s) available", self.movies_total));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, config: &Config, config_path: &Path, json_mode: bool) -> Result<()> {
    let config_written = write_default_config(config_path, args.force).await?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let catalog = SqliteMovieCatalog::new(pool);

    let movies_seeded = if args.sample {
        catalog.seed_samples().await.context("Failed to seed sample movies")?
    } else {
        0
    };
    let movies_total = catalog
        .count(&CompiledFilter::match_all())
        .await
        .context("Failed to count movies")?;

    tracing::info!(database = %config.database.path, movies_seeded, movies_total, "project initialized");

    let output_data = InitOutput {
        success: true,
        message: "Project initialized successfully.".to_string(),
        config_path: config_path.to_path_buf(),
        config_written,
        database_path: config.database.path.clone(),
        movies_seeded,
        movies_total,
    };
    output(&output_data, json_mode);
    Ok(())
}

/// Write the default configuration unless a file is already there.
async fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
    fs::write(path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConfigLoader;

    #[tokio::test]
    async fn test_write_default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".djinn").join("config.yaml");

        assert!(write_default_config(&path, false).await.unwrap());
        assert!(!write_default_config(&path, false).await.unwrap());
        assert!(write_default_config(&path, true).await.unwrap());

        let loaded = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(loaded.poll.wait_secs, Config::default().poll.wait_secs);
        assert_eq!(loaded.poll.vote_symbol, Config::default().poll.vote_symbol);
    }

    #[tokio::test]
    async fn test_execute_seeds_database() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.database.path = dir.path().join("movies.db").display().to_string();

        let args = InitArgs { sample: true, force: false };
        execute(args, &config, &config_path, true).await.unwrap();

        let pool = initialize_database(&config.database).await.unwrap();
        let count = SqliteMovieCatalog::new(pool)
            .count(&CompiledFilter::match_all())
            .await
            .unwrap();
        assert_eq!(count, crate::adapters::sqlite::sample_movies().len() as u64);
    }
}
