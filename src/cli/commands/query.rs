//! Implementation of the `djinn query` command.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;

use crate::adapters::sqlite::{initialize_database, SqliteMovieCatalog};
use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, Movie};
use crate::domain::ports::MovieCatalog;
use crate::services::{constraint_parser, QueryCompiler};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Filter expression, e.g. `rating > 8 and genres = comedy`. Empty matches everything.
    #[arg(num_args = 0..)]
    pub expression: Vec<String>,

    /// Number of random matches to show
    #[arg(short = 'n', long)]
    pub amount: Option<u32>,
}

#[derive(Debug, serde::Serialize)]
pub struct QueryOutput {
    pub expression: String,
    pub filter: String,
    pub matches: u64,
    pub movies: Vec<Movie>,
}

impl CommandOutput for QueryOutput {
    fn to_human(&self) -> String {
        if self.movies.is_empty() {
            return format!("No movies matched `{}`.", self.filter);
        }

        let mut table = list_table(&["imdb", "title", "year", "rating", "votes", "runtime", "genres"]);
        for movie in &self.movies {
            table.add_row(vec![
                Cell::new(&movie.tconst),
                Cell::new(truncate(&movie.title, 40)),
                Cell::new(movie.year.map_or_else(String::new, |y| y.to_string())),
                Cell::new(movie.rating.map_or_else(String::new, |r| format!("{r:.1}"))),
                Cell::new(movie.votes.map_or_else(String::new, |v| v.to_string())),
                Cell::new(movie.runtime_minutes.map_or_else(String::new, |m| format!("{m} min"))),
                Cell::new(truncate(&movie.genres.join(", "), 30)),
            ]);
        }
        format!(
            "{} match(es) for `{}`, showing {}:\n{table}",
            console::style(self.matches).bold(),
            self.filter,
            self.movies.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: QueryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let expression = args.expression.join(" ");
    let amount = args.amount.unwrap_or(config.commands.default_amount);
    let limits = &config.commands;
    if !(limits.min_amount..=limits.max_amount).contains(&amount) {
        anyhow::bail!(
            "Amount must be between {} and {}, got {amount}",
            limits.min_amount,
            limits.max_amount
        );
    }

    let parsed = constraint_parser::parse(&expression)
        .with_context(|| format!("Could not parse `{expression}`"))?;
    let filter = QueryCompiler::new()
        .try_compile(parsed.as_ref())
        .with_context(|| format!("Could not compile `{expression}`"))?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to open movie database")?;
    let catalog = SqliteMovieCatalog::new(pool);

    let matches = catalog.count(&filter).await.context("Failed to count matches")?;
    let movies = catalog
        .sample(&filter, amount)
        .await
        .context("Failed to sample movies")?;

    let output_data = QueryOutput {
        expression,
        filter: filter.to_string(),
        matches,
        movies,
    };
    output(&output_data, json_mode);
    Ok(())
}
