//! Key Pattern Module
//!
//! Shell-style wildcard patterns used to invalidate groups of keys.
//! `*` matches any run of characters (including none) and `?` matches
//! exactly one character. Everything else matches itself.

use std::fmt;

// == Key Pattern ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
    chars: Vec<char>,
}

impl KeyPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let chars = raw.chars().collect();
        Self { raw, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains no wildcard, i.e. names a single key.
    pub fn is_literal(&self) -> bool {
        !self.chars.iter().any(|&c| c == '*' || c == '?')
    }

    // == Matching ==
    /// Greedy match with single-star backtracking, linear in practice.
    pub fn matches(&self, key: &str) -> bool {
        let key: Vec<char> = key.chars().collect();
        let pattern = &self.chars;

        let (mut p, mut k) = (0, 0);
        // Position after the last `*` and the key index it is currently absorbing up to
        let mut backtrack: Option<(usize, usize)> = None;

        while k < key.len() {
            match pattern.get(p) {
                Some(&'*') => {
                    p += 1;
                    backtrack = Some((p, k));
                }
                Some(&c) if c == '?' || c == key[k] => {
                    p += 1;
                    k += 1;
                }
                _ => match backtrack {
                    Some((star_p, star_k)) => {
                        p = star_p;
                        k = star_k + 1;
                        backtrack = Some((star_p, star_k + 1));
                    }
                    None => return false,
                },
            }
        }

        pattern[p..].iter().all(|&c| c == '*')
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}
