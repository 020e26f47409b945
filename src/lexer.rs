//! Whitespace tokenization of a raw command line.

/// Split a raw line into an ordered sequence of owned tokens.
///
/// Runs of whitespace act as a single delimiter, so consecutive spaces or tabs
/// never produce empty tokens. An empty or all-whitespace line yields an empty
/// vector, which downstream code treats as a no-op rather than an error.
///
/// There is no quoting or escaping: every token is a literal slice of the
/// input. Operator words (`&`, `>`, `>>`, `|`) come out as ordinary tokens and
/// are given meaning later, by [`crate::parser::classify`].
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}
