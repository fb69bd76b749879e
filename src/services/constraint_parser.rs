//! Parser for `where` clauses.
//!
//! ```text
//! text        := conjunction ("or" conjunction)*
//! conjunction := atom ("and" atom)*
//! atom        := field operator value
//! ```
//!
//! AND binds tighter than OR and parentheses are not supported. Operators
//! may be written with or without surrounding spaces (`rating>8` and
//! `rating > 8` are the same atom). Parsing is strict: a single malformed
//! atom rejects the whole expression.

use crate::domain::errors::ParseError;
use crate::domain::models::{Atom, Conjunction, Disjunction};

const OPERATOR_CHARS: [char; 4] = ['<', '>', '=', '!'];

/// Parse a filter clause.
///
/// Blank input means "no filter" and yields `Ok(None)`.
pub fn parse(text: &str) -> Result<Option<Disjunction>, ParseError> {
    let spaced = space_operators(text);
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut conjunctions = Vec::new();
    for clause in tokens.split(|t| t.eq_ignore_ascii_case("or")) {
        let mut atoms = Vec::new();
        for atom_tokens in clause.split(|t| t.eq_ignore_ascii_case("and")) {
            atoms.push(parse_atom(atom_tokens)?);
        }
        let conjunction = Conjunction::new(atoms).ok_or(ParseError::EmptyConjunction)?;
        conjunctions.push(conjunction);
    }

    // tokens is non-empty, so there is at least one conjunction
    Ok(Disjunction::new(conjunctions))
}

fn parse_atom(tokens: &[&str]) -> Result<Atom, ParseError> {
    match tokens {
        [field, operator, value] => Ok(Atom::new(*field, *operator, *value)),
        [] => Err(ParseError::EmptyConjunction),
        _ => Err(ParseError::MalformedAtom {
            atom: tokens.join(" "),
            found: tokens.len(),
        }),
    }
}

/// Surround every run of operator characters with spaces.
fn space_operators(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_operator = false;
    for ch in text.chars() {
        let is_op = OPERATOR_CHARS.contains(&ch);
        if is_op != in_operator {
            out.push(' ');
            in_operator = is_op;
        }
        out.push(ch);
    }
    out
}
