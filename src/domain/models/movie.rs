use serde::{Deserialize, Serialize};

/// Base URL of IMDb title pages; the movie's `tconst` is appended.
pub const IMDB_TITLE_URL: &str = "https://www.imdb.com/title/";

/// A movie record as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// IMDb identifier, e.g. `tt0111161`.
    pub tconst: String,
    pub title: String,
    pub year: Option<i64>,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub runtime_minutes: Option<i64>,
    pub genres: Vec<String>,
}

impl Movie {
    pub fn new(tconst: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            tconst: tconst.into(),
            title: title.into(),
            year: None,
            poster_url: None,
            rating: None,
            votes: None,
            runtime_minutes: None,
            genres: Vec::new(),
        }
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_rating(mut self, rating: f64, votes: i64) -> Self {
        self.rating = Some(rating);
        self.votes = Some(votes);
        self
    }

    pub fn with_runtime(mut self, minutes: i64) -> Self {
        self.runtime_minutes = Some(minutes);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_poster(mut self, url: impl Into<String>) -> Self {
        self.poster_url = Some(url.into());
        self
    }

    pub fn imdb_url(&self) -> String {
        format!("{IMDB_TITLE_URL}{}", self.tconst)
    }

    /// `Title (Year)`, or just the title when the year is unknown.
    pub fn heading(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}
