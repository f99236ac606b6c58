//! Include/exclude file name patterns.
//!
//! A pattern list is comma separated. `*` matches any run of characters,
//! `\,` is a literal comma, everything else matches itself. Matching is
//! case-sensitive and covers the whole file name.

use regex::Regex;

use crate::error::EngineError;

#[derive(Debug, Clone, Default)]
pub struct FilePatterns {
    patterns: Vec<Regex>,
}

impl FilePatterns {
    pub fn parse(list: &str) -> Result<Self, EngineError> {
        let patterns = split_patterns(list)
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when any pattern matches the whole of `name`.
    pub fn is_match(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Split on unescaped commas. Empty items are dropped.
fn split_patterns(list: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    out.push(current);

    out.into_iter().filter(|p| !p.is_empty()).collect()
}

fn glob_to_regex(glob: &str) -> Result<Regex, EngineError> {
    let mut expr = String::with_capacity(glob.len() + 8);
    expr.push('^');
    for (i, part) in glob.split('*').enumerate() {
        if i > 0 {
            expr.push_str(".*");
        }
        expr.push_str(&regex::escape(part));
    }
    expr.push('$');
    Regex::new(&expr).map_err(|e| EngineError::pattern(format!("{glob}: {e}")))
}

#[cfg(test)]
#[path = "tests/pattern_tests.rs"]
mod tests;
