//! Rendering of movies into chat cards.

use crate::domain::models::{MessageContent, Movie, MovieCard};

/// Sent before any cards are published.
pub const INTRO: &str = "Wait while I search my boundless library";

/// Build the card published for `movie`.
pub fn card_for(movie: &Movie) -> MovieCard {
    MovieCard {
        heading: movie.heading(),
        description: movie.imdb_url(),
        image_url: movie
            .poster_url
            .as_deref()
            .filter(|url| !url.trim().is_empty() && !url.eq_ignore_ascii_case("n/a"))
            .map(str::to_string),
        footer: stats_line(movie),
    }
}

fn stats_line(movie: &Movie) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(rating) = movie.rating {
        match movie.votes {
            Some(votes) => parts.push(format!("{rating:.1}/10 ({votes} votes)")),
            None => parts.push(format!("{rating:.1}/10")),
        }
    }
    if let Some(minutes) = movie.runtime_minutes {
        parts.push(format!("{minutes} min"));
    }
    if !movie.genres.is_empty() {
        parts.push(movie.genres.join(", "));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Keycap emoji for a single digit, e.g. `3` -> `3️⃣`. Larger numbers are
/// spelled digit by digit.
pub fn integer_to_keycap(n: u32) -> String {
    n.to_string()
        .chars()
        .map(|digit| format!("{digit}\u{FE0F}\u{20E3}"))
        .collect()
}

/// Plain-text rendering used by terminal transports and logs.
pub fn render_plain(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Movie(card) => {
            let mut lines = vec![card.heading.clone(), card.description.clone()];
            if let Some(footer) = &card.footer {
                lines.push(footer.clone());
            }
            if let Some(image) = &card.image_url {
                lines.push(format!("poster: {image}"));
            }
            lines.join("\n")
        }
    }
}
