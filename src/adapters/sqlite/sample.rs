//! A small built-in dataset for `djinn init --sample` and tests.

use crate::domain::errors::CatalogError;
use crate::domain::models::Movie;

use super::SqliteMovieCatalog;

pub fn sample_movies() -> Vec<Movie> {
    vec![
        Movie::new("tt0111161", "The Shawshank Redemption")
            .with_year(1994)
            .with_runtime(142)
            .with_genres(["Drama"])
            .with_rating(9.3, 2_900_000),
        Movie::new("tt0068646", "The Godfather")
            .with_year(1972)
            .with_runtime(175)
            .with_genres(["Crime", "Drama"])
            .with_rating(9.2, 2_000_000),
        Movie::new("tt0088763", "Back to the Future")
            .with_year(1985)
            .with_runtime(116)
            .with_genres(["Adventure", "Comedy", "Sci-Fi"])
            .with_rating(8.5, 1_300_000),
        Movie::new("tt0107048", "Groundhog Day")
            .with_year(1993)
            .with_runtime(101)
            .with_genres(["Comedy", "Drama", "Fantasy"])
            .with_rating(8.0, 680_000),
        Movie::new("tt0078748", "Alien")
            .with_year(1979)
            .with_runtime(117)
            .with_genres(["Horror", "Sci-Fi"])
            .with_rating(8.5, 950_000),
        Movie::new("tt0110912", "Pulp Fiction")
            .with_year(1994)
            .with_runtime(154)
            .with_genres(["Crime", "Drama"])
            .with_rating(8.9, 2_200_000),
        Movie::new("tt0118715", "The Big Lebowski")
            .with_year(1998)
            .with_runtime(117)
            .with_genres(["Comedy", "Crime"])
            .with_rating(8.1, 850_000),
        Movie::new("tt0081505", "The Shining")
            .with_year(1980)
            .with_runtime(146)
            .with_genres(["Drama", "Horror"])
            .with_rating(8.4, 1_100_000),
        Movie::new("tt0245429", "Spirited Away")
            .with_year(2001)
            .with_runtime(125)
            .with_genres(["Animation", "Adventure", "Family"])
            .with_rating(8.6, 850_000),
        Movie::new("tt0093779", "The Princess Bride")
            .with_year(1987)
            .with_runtime(98)
            .with_genres(["Adventure", "Family", "Fantasy"])
            .with_rating(8.0, 450_000),
    ]
}

impl SqliteMovieCatalog {
    /// Insert [`sample_movies`]. Returns how many were written.
    pub async fn seed_samples(&self) -> Result<usize, CatalogError> {
        let movies = sample_movies();
        for movie in &movies {
            self.insert_movie(movie).await?;
        }
        Ok(movies.len())
    }
}
