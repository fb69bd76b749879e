//! Compiled, parameterized filters handed to the movie catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value bound to one `?` placeholder of a [`CompiledFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// Predicate template plus the values for its placeholders, in order.
///
/// The template only ever contains allow-listed column names, operators,
/// `AND`/`OR`, parentheses and `?` placeholders. An empty predicate matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledFilter {
    pub predicate: String,
    pub values: Vec<BoundValue>,
}

impl CompiledFilter {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.predicate.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.predicate.matches('?').count()
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match_all() {
            return f.write_str("<all>");
        }
        let values: Vec<String> = self.values.iter().map(ToString::to_string).collect();
        write!(f, "{} [{}]", self.predicate, values.join(", "))
    }
}
