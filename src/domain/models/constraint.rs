//! Structured filter expressions.
//!
//! A filter clause such as `rating > 8 and genres = comedy or votes > 1000`
//! is held as a [`Disjunction`] of [`Conjunction`]s of [`Atom`]s. AND binds
//! tighter than OR and there is no grouping, so the structure is always two
//! levels deep.
//!
//! Atoms keep the raw tokens the user typed. Whether a field or operator is
//! allowed is decided later by the query compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `field operator value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Atom {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Non-empty, AND-joined sequence of atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conjunction(Vec<Atom>);

impl Conjunction {
    /// Returns `None` when `atoms` is empty.
    pub fn new(atoms: Vec<Atom>) -> Option<Self> {
        if atoms.is_empty() {
            None
        } else {
            Some(Self(atoms))
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atom) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{atom}")?;
        }
        Ok(())
    }
}

/// Non-empty, OR-joined sequence of conjunctions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Disjunction(Vec<Conjunction>);

impl Disjunction {
    /// Returns `None` when `conjunctions` is empty.
    pub fn new(conjunctions: Vec<Conjunction>) -> Option<Self> {
        if conjunctions.is_empty() {
            None
        } else {
            Some(Self(conjunctions))
        }
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.0
    }

    /// All atoms in left-to-right order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.0.iter().flat_map(|c| c.atoms().iter())
    }
}

/// Renders back into the grammar the parser accepts.
impl fmt::Display for Disjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conjunction) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{conjunction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_groups_rejected() {
        assert!(Conjunction::new(vec![]).is_none());
        assert!(Disjunction::new(vec![]).is_none());
    }

    #[test]
    fn test_display_round_trips_grammar() {
        let first = Conjunction::new(vec![
            Atom::new("rating", ">", "8"),
            Atom::new("genres", "=", "comedy"),
        ])
        .unwrap();
        let second = Conjunction::new(vec![Atom::new("votes", ">=", "1000")]).unwrap();
        let expr = Disjunction::new(vec![first, second]).unwrap();

        assert_eq!(
            expr.to_string(),
            "rating > 8 and genres = comedy or votes >= 1000"
        );
        assert_eq!(expr.atoms().count(), 3);
    }
}
