//! Key Patterns
//!
//! Redis `KEYS` patterns evaluated with `glob::Pattern`, for the in-process
//! store and for policy validation.
//!
//! Redis syntax is translated once at parse time: `[^..]` becomes `[!..]`,
//! `\x` becomes `[x]` for metacharacters, runs of `*` collapse to one, and
//! reversed ranges such as `[z-a]` are swapped the way Redis reads them.

use crate::error::{CacheError, Result};

/// Characters with special meaning in a key pattern.
const GLOB_META: [char; 4] = ['*', '?', '[', '\\'];

/// Returns true if `s` contains any glob metacharacter.
pub fn is_glob(s: &str) -> bool {
    s.contains(GLOB_META)
}

/// A parsed Redis-style key pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    /// `None` for patterns that can match no key, e.g. an empty class `[]`
    compiled: Option<::glob::Pattern>,
}

impl KeyPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let compiled = match translate(pattern) {
            Some(translated) => Some(::glob::Pattern::new(&translated).map_err(|err| {
                CacheError::InvalidRequest(format!("pattern '{}': {}", pattern, err))
            })?),
            None => None,
        };
        Ok(Self { compiled })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.compiled.as_ref().is_some_and(|p| p.matches(key))
    }
}

/// Matches `text` against a Redis-style glob `pattern`.
///
/// A pattern that does not parse matches nothing.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    KeyPattern::parse(pattern).is_ok_and(|p| p.matches(text))
}

// == Translation ==
/// Rewrites a Redis pattern into `glob` syntax, or `None` if it can never match.
fn translate(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
                out.push('*');
                i += 1;
            }
            '?' => {
                out.push('?');
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                push_literal(&mut out, chars[i + 1]);
                i += 2;
            }
            '[' => {
                let (class, next) = parse_class(&chars, i);
                out.push_str(&class.render()?);
                i = next;
            }
            c => {
                push_literal(&mut out, c);
                i += 1;
            }
        }
    }
    Some(out)
}

fn push_literal(out: &mut String, c: char) {
    if matches!(c, '*' | '?' | '[' | ']') {
        out.push('[');
        out.push(c);
        out.push(']');
    } else {
        out.push(c);
    }
}

#[derive(Debug, Default)]
struct Class {
    negate: bool,
    singles: Vec<char>,
    ranges: Vec<(char, char)>,
}

/// Reads the class opening at `open`. An unterminated class runs to the end.
fn parse_class(p: &[char], open: usize) -> (Class, usize) {
    let mut class = Class::default();
    let mut i = open + 1;
    if p.get(i) == Some(&'^') {
        class.negate = true;
        i += 1;
    }

    while i < p.len() && p[i] != ']' {
        if p[i] == '\\' && i + 1 < p.len() {
            class.singles.push(p[i + 1]);
            i += 2;
        } else if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' {
            let (lo, hi) = if p[i] <= p[i + 2] {
                (p[i], p[i + 2])
            } else {
                (p[i + 2], p[i])
            };
            class.ranges.push((lo, hi));
            i += 3;
        } else {
            class.singles.push(p[i]);
            i += 1;
        }
    }

    let next = if i < p.len() { i + 1 } else { i };
    (class, next)
}

impl Class {
    /// Renders in `glob` syntax. `]` may only lead the set, `!` may not lead
    /// an un-negated set, and `-` is literal only in last position.
    fn render(&self) -> Option<String> {
        // A range may not start with `!` or `-` either; peel that char off
        let mut singles = self.singles.clone();
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            if matches!(lo, '!' | '-') {
                singles.push(lo);
                if let Some(next) = char::from_u32(lo as u32 + 1).filter(|n| *n <= hi) {
                    ranges.push((next, hi));
                }
            } else {
                ranges.push((lo, hi));
            }
        }

        let has = |c: char| singles.contains(&c);
        let others: Vec<char> = singles
            .iter()
            .copied()
            .filter(|c| !matches!(c, ']' | '!' | '-'))
            .collect();

        if singles.is_empty() && ranges.is_empty() {
            return self.negate.then(|| "?".to_string());
        }

        let mut body = String::new();
        if has(']') {
            body.push(']');
        }
        for (lo, hi) in &ranges {
            body.push(*lo);
            body.push('-');
            body.push(*hi);
        }
        body.extend(others);

        let bang = has('!');
        let dash = has('-');
        if bang && body.is_empty() && !self.negate {
            // `!` cannot lead, so it goes after the dash, or stands alone
            return Some(if dash { "[-!]".to_string() } else { "!".to_string() });
        }
        if bang {
            body.push('!');
        }
        if dash {
            body.push('-');
        }

        let open = if self.negate { "[!" } else { "[" };
        Some(format!("{}{}]", open, body))
    }
}
