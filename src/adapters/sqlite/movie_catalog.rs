//! SQLite implementation of the MovieCatalog.

use async_trait::async_trait;
use sqlx::sqlite::SqliteArguments;
use sqlx::query::QueryAs;
use sqlx::{Sqlite, SqlitePool};

use crate::domain::errors::CatalogError;
use crate::domain::models::{BoundValue, CompiledFilter, Movie};
use crate::domain::ports::MovieCatalog;

const SELECT_MOVIES: &str = "SELECT m.tconst, m.primary_title, m.year, m.runtime, m.genres, m.poster_url, \
     r.rating, r.votes FROM movies m LEFT JOIN ratings r ON r.tconst = m.tconst";

const COUNT_MOVIES: &str = "SELECT COUNT(*) FROM movies m LEFT JOIN ratings r ON r.tconst = m.tconst";

/// Marker the IMDb feeds use for a missing value.
const MISSING: &str = "\\N";

#[derive(Clone)]
pub struct SqliteMovieCatalog {
    pool: SqlitePool,
}

impl SqliteMovieCatalog {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a movie together with its rating.
    pub async fn insert_movie(&self, movie: &Movie) -> Result<(), CatalogError> {
        let genres = (!movie.genres.is_empty()).then(|| movie.genres.join(","));
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"INSERT OR REPLACE INTO movies (tconst, primary_title, original_title, is_adult, year, runtime, genres, poster_url)
               VALUES (?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(&movie.tconst)
        .bind(&movie.title)
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime_minutes)
        .bind(genres)
        .bind(&movie.poster_url)
        .execute(&mut *tx)
        .await?;

        if movie.rating.is_some() || movie.votes.is_some() {
            sqlx::query("INSERT OR REPLACE INTO ratings (tconst, rating, votes) VALUES (?, ?, ?)")
                .bind(&movie.tconst)
                .bind(movie.rating)
                .bind(movie.votes)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Build the statement text for `base` restricted by `filter`.
    fn statement(base: &str, filter: &CompiledFilter) -> Result<String, CatalogError> {
        let placeholders = filter.placeholder_count();
        if placeholders != filter.values.len() {
            return Err(CatalogError::MismatchedBindings {
                placeholders,
                values: filter.values.len(),
            });
        }

        let mut query = format!("{base} WHERE m.is_adult = 0");
        if !filter.is_match_all() {
            query.push_str(" AND (");
            query.push_str(&filter.predicate);
            query.push(')');
        }
        Ok(query)
    }
}

fn bind_values<'q, O>(
    mut q: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [BoundValue],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        q = match value {
            BoundValue::Integer(v) => q.bind(*v),
            BoundValue::Real(v) => q.bind(*v),
            BoundValue::Text(v) => q.bind(v.as_str()),
        };
    }
    q
}

#[async_trait]
impl MovieCatalog for SqliteMovieCatalog {
    async fn sample(&self, filter: &CompiledFilter, amount: u32) -> Result<Vec<Movie>, CatalogError> {
        let mut query = Self::statement(SELECT_MOVIES, filter)?;
        query.push_str(" ORDER BY RANDOM() LIMIT ?");

        let rows: Vec<MovieRow> = bind_values(sqlx::query_as(&query), &filter.values)
            .bind(i64::from(amount))
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(filter = %filter, amount, found = rows.len(), "sampled movies");

        rows.into_iter().map(Movie::try_from).collect()
    }

    async fn count(&self, filter: &CompiledFilter) -> Result<u64, CatalogError> {
        let query = Self::statement(COUNT_MOVIES, filter)?;
        let (count,): (i64,) = bind_values(sqlx::query_as(&query), &filter.values)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    tconst: String,
    primary_title: String,
    year: Option<i64>,
    runtime: Option<i64>,
    genres: Option<String>,
    poster_url: Option<String>,
    rating: Option<f64>,
    votes: Option<i64>,
}

impl TryFrom<MovieRow> for Movie {
    type Error = CatalogError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        if row.primary_title.trim().is_empty() {
            return Err(CatalogError::CorruptRecord {
                tconst: row.tconst,
                reason: "empty title".to_string(),
            });
        }

        let genres = row
            .genres
            .as_deref()
            .filter(|g| *g != MISSING)
            .map(|g| {
                g.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            tconst: row.tconst,
            title: row.primary_title,
            year: row.year,
            poster_url: row.poster_url,
            rating: row.rating,
            votes: row.votes,
            runtime_minutes: row.runtime,
            genres,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_wraps_predicate() {
        let filter = CompiledFilter {
            predicate: "r.rating > ? OR m.year < ?".to_string(),
            values: vec![BoundValue::Real(8.0), BoundValue::Integer(1950)],
        };
        let sql = SqliteMovieCatalog::statement(COUNT_MOVIES, &filter).unwrap();
        assert!(sql.ends_with("WHERE m.is_adult = 0 AND (r.rating > ? OR m.year < ?)"));

        let all = SqliteMovieCatalog::statement(COUNT_MOVIES, &CompiledFilter::match_all()).unwrap();
        assert!(all.ends_with("WHERE m.is_adult = 0"));
    }

    #[test]
    fn test_statement_rejects_mismatched_bindings() {
        let filter = CompiledFilter {
            predicate: "r.rating > ?".to_string(),
            values: vec![],
        };
        assert!(matches!(
            SqliteMovieCatalog::statement(SELECT_MOVIES, &filter),
            Err(CatalogError::MismatchedBindings { placeholders: 1, values: 0 })
        ));
    }

    #[test]
    fn test_row_genres_split() {
        let row = MovieRow {
            tconst: "tt1".to_string(),
            primary_title: "Heat".to_string(),
            year: Some(1995),
            runtime: Some(170),
            genres: Some("Action,Crime,Drama".to_string()),
            poster_url: None,
            rating: Some(8.3),
            votes: Some(700_000),
        };
        let movie = Movie::try_from(row).unwrap();
        assert_eq!(movie.genres, vec!["Action", "Crime", "Drama"]);
        assert_eq!(movie.heading(), "Heat (1995)");
    }

    #[test]
    fn test_row_missing_marker_and_empty_title() {
        let row = MovieRow {
            tconst: "tt2".to_string(),
            primary_title: "X".to_string(),
            year: None,
            runtime: None,
            genres: Some(MISSING.to_string()),
            poster_url: None,
            rating: None,
            votes: None,
        };
        assert!(Movie::try_from(row).unwrap().genres.is_empty());

        let corrupt = MovieRow {
            tconst: "tt3".to_string(),
            primary_title: " ".to_string(),
            year: None,
            runtime: None,
            genres: None,
            poster_url: None,
            rating: None,
            votes: None,
        };
        assert!(matches!(
            Movie::try_from(corrupt),
            Err(CatalogError::CorruptRecord { .. })
        ));
    }
}
