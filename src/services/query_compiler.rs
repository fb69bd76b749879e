//! Compiles parsed filter expressions into parameterized SQL predicates.
//!
//! Field names and operators cannot be bound as parameters, so they are
//! checked against fixed allow-lists and only the allow-listed spellings are
//! written into the predicate. Every user-supplied value travels as a
//! [`BoundValue`].

use crate::domain::errors::ValidationError;
use crate::domain::models::{Atom, BoundValue, CompiledFilter, Conjunction, Disjunction};

/// Filterable movie fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Rating,
    Votes,
    Runtime,
    Year,
    Genres,
}

impl Field {
    pub const ALL: [Self; 5] = [Self::Rating, Self::Votes, Self::Runtime, Self::Year, Self::Genres];

    /// Case-insensitive lookup. `genre` is accepted for `genres`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rating" => Some(Self::Rating),
            "votes" => Some(Self::Votes),
            "runtime" => Some(Self::Runtime),
            "year" => Some(Self::Year),
            "genres" | "genre" => Some(Self::Genres),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Votes => "votes",
            Self::Runtime => "runtime",
            Self::Year => "year",
            Self::Genres => "genres",
        }
    }

    /// Qualified column in the catalog's `movies m JOIN ratings r` query.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Rating => "r.rating",
            Self::Votes => "r.votes",
            Self::Runtime => "m.runtime",
            Self::Year => "m.year",
            Self::Genres => "m.genres",
        }
    }
}

/// Allow-listed comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Stateless compiler from [`Disjunction`] to [`CompiledFilter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler;

impl QueryCompiler {
    pub const fn new() -> Self {
        Self
    }

    /// Compile an optional expression, returning `None` if any atom is
    /// rejected. No expression compiles to a match-everything filter.
    pub fn compile(&self, expression: Option<&Disjunction>) -> Option<CompiledFilter> {
        self.try_compile(expression).ok()
    }

    /// Like [`compile`](Self::compile) but reports the first rejected atom.
    pub fn try_compile(
        &self,
        expression: Option<&Disjunction>,
    ) -> Result<CompiledFilter, ValidationError> {
        let Some(expression) = expression else {
            return Ok(CompiledFilter::match_all());
        };

        let mut values = Vec::new();
        let mut groups = Vec::with_capacity(expression.conjunctions().len());
        for conjunction in expression.conjunctions() {
            groups.push(compile_conjunction(conjunction, &mut values)?);
        }

        let predicate = if groups.len() == 1 {
            groups.remove(0)
        } else {
            groups
                .iter()
                .map(|g| format!("({g})"))
                .collect::<Vec<_>>()
                .join(" OR ")
        };

        Ok(CompiledFilter { predicate, values })
    }
}

fn compile_conjunction(
    conjunction: &Conjunction,
    values: &mut Vec<BoundValue>,
) -> Result<String, ValidationError> {
    let mut parts = Vec::with_capacity(conjunction.atoms().len());
    for atom in conjunction.atoms() {
        parts.push(compile_atom(atom, values)?);
    }
    Ok(parts.join(" AND "))
}

fn compile_atom(atom: &Atom, values: &mut Vec<BoundValue>) -> Result<String, ValidationError> {
    let field = Field::from_name(&atom.field)
        .ok_or_else(|| ValidationError::UnknownField(atom.field.clone()))?;
    let operator = Operator::from_symbol(&atom.operator)
        .ok_or_else(|| ValidationError::UnknownOperator(atom.operator.clone()))?;

    match field {
        Field::Genres => {
            if operator != Operator::Eq {
                return Err(ValidationError::UnsupportedOperator {
                    field: field.name().to_string(),
                    operator: atom.operator.clone(),
                });
            }
            values.push(BoundValue::Text(format!("%{}%", escape_like(&atom.value))));
            Ok(format!("{} LIKE ? ESCAPE '\\'", field.column()))
        }
        Field::Rating => {
            let value = atom
                .value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid_number(field, atom))?;
            values.push(BoundValue::Real(value));
            Ok(format!("{} {} ?", field.column(), operator.as_sql()))
        }
        Field::Votes | Field::Runtime | Field::Year => {
            let value = atom
                .value
                .parse::<i64>()
                .map_err(|_| invalid_number(field, atom))?;
            values.push(BoundValue::Integer(value));
            Ok(format!("{} {} ?", field.column(), operator.as_sql()))
        }
    }
}

fn invalid_number(field: Field, atom: &Atom) -> ValidationError {
    ValidationError::InvalidNumber {
        field: field.name().to_string(),
        value: atom.value.clone(),
    }
}

/// Escape LIKE wildcards so the value matches literally.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::constraint_parser::parse;
    use proptest::prelude::*;

    fn compile_text(text: &str) -> Option<CompiledFilter> {
        let expr = parse(text).expect("test expression should parse");
        QueryCompiler::new().compile(expr.as_ref())
    }

    #[test]
    fn test_no_expression_matches_all() {
        let filter = QueryCompiler::new().compile(None).unwrap();
        assert!(filter.is_match_all());
        assert!(filter.values.is_empty());
    }

    #[test]
    fn test_rating_and_genre() {
        let filter = compile_text("rating > 8 and genre = comedy").unwrap();
        assert_eq!(filter.predicate, "r.rating > ? AND m.genres LIKE ? ESCAPE '\\'");
        assert_eq!(
            filter.values,
            vec![BoundValue::Real(8.0), BoundValue::Text("%comedy%".to_string())]
        );
        assert_eq!(filter.placeholder_count(), filter.values.len());
    }

    #[test]
    fn test_disjunction_is_parenthesized() {
        let filter = compile_text("rating > 9 or votes > 1000 and year >= 1990").unwrap();
        assert_eq!(
            filter.predicate,
            "(r.rating > ?) OR (r.votes > ? AND m.year >= ?)"
        );
        assert_eq!(
            filter.values,
            vec![
                BoundValue::Real(9.0),
                BoundValue::Integer(1000),
                BoundValue::Integer(1990)
            ]
        );
    }

    #[test]
    fn test_value_never_in_template() {
        let filter = compile_text("genres = x';DROP_TABLE_movies;--").unwrap();
        assert!(!filter.predicate.contains("DROP"));
        assert_eq!(
            filter.values,
            vec![BoundValue::Text("%x';DROP\\_TABLE\\_movies;--%".to_string())]
        );
    }

    #[test]
    fn test_unknown_field_rejects_whole_expression() {
        assert!(compile_text("rating > 8 and title = jaws").is_none());
        assert_eq!(
            QueryCompiler::new()
                .try_compile(parse("rating > 8 or tconst = tt1").unwrap().as_ref())
                .unwrap_err(),
            ValidationError::UnknownField("tconst".to_string())
        );
    }

    #[test]
    fn test_unknown_operator_rejected() {
        assert!(compile_text("rating != 8").is_none());
        assert!(compile_text("rating => 8 or votes > 1").is_none());
    }

    #[test]
    fn test_genres_only_supports_equality() {
        assert_eq!(
            QueryCompiler::new()
                .try_compile(parse("genres <> drama").unwrap().as_ref())
                .unwrap_err(),
            ValidationError::UnsupportedOperator {
                field: "genres".to_string(),
                operator: "<>".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        assert!(compile_text("rating > high").is_none());
        assert!(compile_text("votes > 1.5").is_none());
        assert!(compile_text("rating > NaN").is_none());
        assert!(compile_text("year = 1999").is_some());
    }

    #[test]
    fn test_field_names_case_insensitive() {
        let filter = compile_text("Rating > 8").unwrap();
        assert_eq!(filter.predicate, "r.rating > ?");
    }

    proptest! {
        #[test]
        fn prop_compile_is_deterministic(
            atoms in prop::collection::vec(
                (
                    prop::sample::select(vec!["rating", "votes", "runtime", "year", "genres"]),
                    prop::sample::select(vec!["=", "<", ">", "<=", ">=", "<>"]),
                    0u32..5000,
                ),
                1..6,
            ),
            split in 0usize..6,
        ) {
            let clauses: Vec<String> = atoms
                .iter()
                .map(|(f, o, v)| format!("{f} {o} {v}"))
                .collect();
            let split = split.min(clauses.len());
            let (left, right) = clauses.split_at(split);
            let text = [left.join(" and "), right.join(" and ")]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" or ");
            let expr = parse(&text).unwrap();
            let compiler = QueryCompiler::new();
            let first = compiler.compile(expr.as_ref());
            let second = compiler.compile(expr.as_ref());
            prop_assert_eq!(&first, &second);
            if let Some(filter) = first {
                prop_assert_eq!(filter.placeholder_count(), filter.values.len());
            }
        }

        #[test]
        fn prop_disallowed_atom_poisons_expression(
            good in prop::collection::vec(0u32..100, 0..4),
            bad_field in "[a-z]{3,8}",
        ) {
            prop_assume!(Field::from_name(&bad_field).is_none());
            prop_assume!(bad_field != "and" && bad_field != "or");
            let mut clauses: Vec<String> = good.iter().map(|v| format!("votes > {v}")).collect();
            clauses.push(format!("{bad_field} = 1"));
            let expr = parse(&clauses.join(" and ")).unwrap();
            prop_assert!(QueryCompiler::new().compile(expr.as_ref()).is_none());
        }
    }
}
