//! Keyword lookup and argument parsing for inbound command text.
//!
//! Inbound text looks like `fetch 5 where rating > 8 and genres = comedy`:
//! a keyword, an optional amount and an optional `where` clause. The phrase
//! `give me movies` anywhere in the text is an alias for a default `poll`.

use std::collections::HashMap;

use crate::domain::errors::ParseError;
use crate::domain::models::{CommandKind, CommandRequest};
use crate::services::constraint_parser;

const POLL_PHRASE: &str = "give me movies";

/// Reply for the `help` keyword.
pub const HELP_TEXT: &str = "\
Commands:
  fetch [amount] [where <filter>]  show random movies
  poll [amount] [where <filter>]   start a vote between random movies
  cancel                           stop the command running in this channel
Filters compare a field with a value: `rating > 8`, `genres = comedy`.
Fields: rating, votes, runtime, year, genres. Operators: = <> < <= > >= (genres only =).
Combine comparisons with `and` / `or`. `and` binds tighter than `or` and there are no parentheses:
`rating > 8 and year > 2000 or genres = horror` means (rating > 8 and year > 2000) or genres = horror.";

/// Maps keywords to [`CommandKind`]s.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    keywords: HashMap<&'static str, CommandKind>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let keywords = CommandKind::ALL
            .iter()
            .map(|kind| (kind.keyword(), *kind))
            .collect();
        Self { keywords }
    }

    /// Look up a single keyword.
    pub fn lookup(&self, keyword: &str) -> Option<CommandKind> {
        self.keywords
            .get(keyword.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Identify the command in `raw` and return it with the unparsed rest.
    pub fn recognize<'a>(&self, raw: &'a str) -> Option<(CommandKind, &'a str)> {
        let (first, rest) = split_first_word(raw.trim());
        let keyword = first.trim_end_matches(|c: char| !c.is_alphanumeric());
        if let Some(kind) = self.lookup(keyword) {
            return Some((kind, rest));
        }
        if raw.to_lowercase().contains(POLL_PHRASE) {
            return Some((CommandKind::Poll, ""));
        }
        None
    }

    /// Recognize and parse a full command. `Ok(None)` means no keyword matched.
    pub fn parse(&self, raw: &str) -> Result<Option<CommandRequest>, ParseError> {
        let Some((kind, rest)) = self.recognize(raw) else {
            return Ok(None);
        };
        self.parse_arguments(kind, rest).map(Some)
    }

    /// Parse `[amount] [where <expression>]` following the keyword.
    /// Commands without a slot take no arguments and ignore the rest.
    pub fn parse_arguments(
        &self,
        kind: CommandKind,
        rest: &str,
    ) -> Result<CommandRequest, ParseError> {
        if kind.needs_slot() {
            parse_arguments(kind, rest)
        } else {
            Ok(CommandRequest::bare(kind))
        }
    }
}

fn parse_arguments(kind: CommandKind, rest: &str) -> Result<CommandRequest, ParseError> {
    let mut request = CommandRequest::bare(kind);
    let (mut word, mut tail) = split_first_word(rest);

    if let Some(amount) = parse_amount(word) {
        request.amount = Some(amount);
        (word, tail) = split_first_word(tail);
    }

    if word.is_empty() {
        return Ok(request);
    }
    if !word.eq_ignore_ascii_case("where") {
        return Err(ParseError::UnexpectedToken(word.to_string()));
    }

    request.expression =
        Some(constraint_parser::parse(tail)?.ok_or(ParseError::MissingExpression)?);
    Ok(request)
}

/// Read an integer amount. Values beyond `i64` saturate so range checks
/// still report them as out of range.
fn parse_amount(word: &str) -> Option<i64> {
    let digits = word.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(word.parse::<i64>().unwrap_or(if word.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Atom;

    #[test]
    fn test_lookup_keywords() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.lookup("fetch"), Some(CommandKind::Fetch));
        assert_eq!(registry.lookup("POLL"), Some(CommandKind::Poll));
        assert_eq!(registry.lookup("cancel"), Some(CommandKind::Cancel));
        assert_eq!(registry.lookup("help"), Some(CommandKind::Help));
        assert_eq!(registry.lookup("delete"), None);
    }

    #[test]
    fn test_fetch_with_amount_and_filter() {
        let request = CommandRegistry::new()
            .parse("fetch 5 where rating > 8 and genre = comedy")
            .unwrap()
            .unwrap();
        assert_eq!(request.kind, CommandKind::Fetch);
        assert_eq!(request.amount, Some(5));
        let expr = request.expression.unwrap();
        assert_eq!(expr.conjunctions().len(), 1);
        assert_eq!(
            expr.conjunctions()[0].atoms(),
            &[Atom::new("rating", ">", "8"), Atom::new("genre", "=", "comedy")]
        );
    }

    #[test]
    fn test_poll_without_amount() {
        let request = CommandRegistry::new()
            .parse("poll where rating > 9 or votes > 1000")
            .unwrap()
            .unwrap();
        assert_eq!(request.kind, CommandKind::Poll);
        assert_eq!(request.amount, None);
        assert_eq!(request.expression.unwrap().conjunctions().len(), 2);
    }

    #[test]
    fn test_bare_commands() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.parse("fetch").unwrap(),
            Some(CommandRequest::bare(CommandKind::Fetch))
        );
        assert_eq!(
            registry.parse("  cancel  ").unwrap(),
            Some(CommandRequest::bare(CommandKind::Cancel))
        );
        assert_eq!(
            registry.parse("cancel everything").unwrap(),
            Some(CommandRequest::bare(CommandKind::Cancel))
        );
    }

    #[test]
    fn test_trigger_phrase_is_poll() {
        let request = CommandRegistry::new()
            .parse("Hey djinn, GIVE ME MOVIES please")
            .unwrap()
            .unwrap();
        assert_eq!(request, CommandRequest::bare(CommandKind::Poll));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(CommandRegistry::new().parse("what's up").unwrap(), None);
        assert_eq!(CommandRegistry::new().parse("").unwrap(), None);
    }

    #[test]
    fn test_out_of_range_amount_still_parses() {
        // range checks belong to the dispatcher
        let request = CommandRegistry::new().parse("fetch -3").unwrap().unwrap();
        assert_eq!(request.amount, Some(-3));
    }

    #[test]
    fn test_oversized_amount_saturates() {
        let registry = CommandRegistry::new();
        let request = registry.parse("fetch 99999999999999999999").unwrap().unwrap();
        assert_eq!(request.amount, Some(i64::MAX));

        let request = registry
            .parse("poll -99999999999999999999 where year > 2000")
            .unwrap()
            .unwrap();
        assert_eq!(request.amount, Some(i64::MIN));
        assert!(request.expression.is_some());

        assert!(matches!(
            registry.parse("fetch 12abc").unwrap_err(),
            ParseError::UnexpectedToken(t) if t == "12abc"
        ));
    }

    #[test]
    fn test_malformed_arguments() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.parse("fetch lots").unwrap_err(),
            ParseError::UnexpectedToken("lots".to_string())
        );
        assert_eq!(
            registry.parse("fetch 2 where").unwrap_err(),
            ParseError::MissingExpression
        );
        assert!(matches!(
            registry.parse("fetch 2 where rating").unwrap_err(),
            ParseError::MalformedAtom { found: 1, .. }
        ));
    }

    #[test]
    fn test_keyword_punctuation_ignored() {
        assert_eq!(
            CommandRegistry::new().recognize("cancel!").map(|(k, _)| k),
            Some(CommandKind::Cancel)
        );
    }
}
