//! Compatibility rewrite for `labels(n) CONTAINS <expr>` predicates
//!
//! Some server versions reject `labels(n) CONTAINS $param` with a type
//! mismatch because `labels(n)` is a `List<String>`. The equivalent
//! `ANY(label IN labels(n) WHERE label = <expr>)` predicate is accepted.
//! Detection keys on the English error text, so this is a best-effort shim:
//! when the rewritten shape cannot be derived unambiguously the rewrite is
//! declined and the original error stands.

use once_cell::sync::Lazy;
use regex::Regex;

static LABELS_CONTAINS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\blabels\(\s*(\w+)\s*\)\s+CONTAINS\s+")
        .expect("Valid labels CONTAINS regex")
});

static RETURN_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bRETURN\b").expect("Valid RETURN clause regex"));

/// Clauses that may sit between the predicate and `RETURN`; `OPTIONAL MATCH` is caught by `MATCH`
static INTERVENING_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(WITH|MATCH|UNWIND|CALL|SET|CREATE|MERGE|DELETE|REMOVE|FOREACH|UNION)\b")
        .expect("Valid clause keyword regex")
});

/// Outcome of attempting the rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Query with the predicate replaced
    Applied(String),

    /// Rewrite not attempted; the reason is logged by the caller
    Declined(&'static str),
}

/// Does this database error message describe the `List<String>` type mismatch?
pub fn is_label_list_mismatch(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("type mismatch") && lower.contains("list<string>")
}

/// Replace the single `labels(v) CONTAINS <expr>` occurrence with an `ANY(...)`
/// predicate, closing it right before the following `RETURN` clause.
pub fn rewrite_labels_contains(query: &str) -> Rewrite {
    let mut matches = LABELS_CONTAINS.captures_iter(query);

    let caps = match matches.next() {
        Some(caps) => caps,
        None => return Rewrite::Declined("query has no labels(..) CONTAINS predicate"),
    };
    if matches.next().is_some() {
        return Rewrite::Declined("query has more than one labels(..) CONTAINS predicate");
    }

    let whole = match caps.get(0) {
        Some(m) => m,
        None => return Rewrite::Declined("query has no labels(..) CONTAINS predicate"),
    };
    let variable = &caps[1];
    if variable.eq_ignore_ascii_case("label") {
        return Rewrite::Declined("predicate variable clashes with the rewrite's iterator name");
    }

    let tail = &query[whole.end()..];
    let masked = mask_literals(tail);
    let return_at = match RETURN_CLAUSE.find(&masked) {
        Some(m) => m.start(),
        None => return Rewrite::Declined("no RETURN clause follows the predicate"),
    };

    if INTERVENING_CLAUSE.is_match(&masked[..return_at]) {
        return Rewrite::Declined("another clause sits between the predicate and RETURN");
    }

    let operand = tail[..return_at].trim_end();
    if operand.is_empty() {
        return Rewrite::Declined("predicate has no operand before RETURN");
    }

    Rewrite::Applied(format!(
        "{}ANY(label IN labels({}) WHERE label = {}) {}",
        &query[..whole.start()],
        variable,
        operand,
        &tail[return_at..]
    ))
}

/// Blank out the contents of quoted strings and escaped names, keeping byte offsets intact
fn mask_literals(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                    masked.push(c);
                    continue;
                }
                masked.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
            None => {
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                }
                masked.push(c);
            }
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_type_mismatch_message() {
        assert!(is_label_list_mismatch(
            "Type mismatch: expected String but was List<String> (line 1, column 23 (offset: 22))"
        ));
        assert!(!is_label_list_mismatch("Invalid input 'X': expected whitespace"));
        assert!(!is_label_list_mismatch("Type mismatch: expected Integer but was String"));
    }

    #[test]
    fn test_rewrites_parameter_operand() {
        let query = "MATCH (n) WHERE labels(n) CONTAINS $label RETURN n";
        assert_eq!(
            rewrite_labels_contains(query),
            Rewrite::Applied(
                "MATCH (n) WHERE ANY(label IN labels(n) WHERE label = $label) RETURN n".to_string()
            )
        );
    }

    #[test]
    fn test_rewrites_multiline_query_and_other_variable() {
        let query = "MATCH (p)\nWHERE labels(p) CONTAINS 'Person'\nreturn p.name AS name";
        assert_eq!(
            rewrite_labels_contains(query),
            Rewrite::Applied(
                "MATCH (p)\nWHERE ANY(label IN labels(p) WHERE label = 'Person') return p.name AS name"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_declines_without_pattern() {
        assert!(matches!(
            rewrite_labels_contains("MATCH (n:Person) RETURN n"),
            Rewrite::Declined(_)
        ));
    }

    #[test]
    fn test_declines_without_return() {
        assert!(matches!(
            rewrite_labels_contains("MATCH (n) WHERE labels(n) CONTAINS $l DELETE n"),
            Rewrite::Declined(_)
        ));
    }

    #[test]
    fn test_declines_multiple_occurrences() {
        let query = "MATCH (a), (b) WHERE labels(a) CONTAINS $x AND labels(b) CONTAINS $y RETURN a, b";
        assert!(matches!(rewrite_labels_contains(query), Rewrite::Declined(_)));
    }

    #[test]
    fn test_declines_intervening_clauses() {
        for query in [
            "MATCH (n) WHERE labels(n) CONTAINS $l WITH n RETURN n",
            "MATCH (n) WHERE labels(n) CONTAINS $l SET n.seen = true RETURN n",
            "MATCH (n) WHERE labels(n) CONTAINS $l OPTIONAL MATCH (n)-->(m) RETURN n, m",
            "MATCH (n) WHERE labels(n) CONTAINS $l\nUNWIND n.tags AS t RETURN t",
            "MATCH (n) WHERE labels(n) CONTAINS $l CALL { WITH n RETURN 1 AS x } RETURN n",
        ] {
            assert!(
                matches!(rewrite_labels_contains(query), Rewrite::Declined(_)),
                "expected decline for {:?}",
                query
            );
        }
    }

    #[test]
    fn test_keywords_inside_string_literals_are_ignored() {
        let query = "MATCH (n) WHERE labels(n) CONTAINS 'SET WITH ünïcode' RETURN n";
        assert_eq!(
            rewrite_labels_contains(query),
            Rewrite::Applied(
                "MATCH (n) WHERE ANY(label IN labels(n) WHERE label = 'SET WITH ünïcode') RETURN n"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_return_inside_string_literal_is_not_the_clause() {
        let query = "MATCH (n) WHERE labels(n) CONTAINS \"RETURN\" RETURN n";
        assert_eq!(
            rewrite_labels_contains(query),
            Rewrite::Applied(
                "MATCH (n) WHERE ANY(label IN labels(n) WHERE label = \"RETURN\") RETURN n"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_mask_literals_keeps_byte_offsets() {
        let text = "'a\\'b' x \"é\" `y z`";
        let masked = mask_literals(text);
        assert_eq!(masked.len(), text.len());
        assert!(masked.contains(" x "));
        assert!(!masked.contains('y'));
    }

    #[test]
    fn test_declines_iterator_name_clash() {
        let query = "MATCH (label) WHERE labels(label) CONTAINS $l RETURN label";
        assert!(matches!(rewrite_labels_contains(query), Rewrite::Declined(_)));
    }
}
