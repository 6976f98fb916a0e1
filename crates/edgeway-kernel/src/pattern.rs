//! Compiled glob path patterns.
//!
//! ```text
//! /health        exact path
//! /users/*       exactly one segment after /users
//! /api/**        one or more segments after /api (last segment only)
//! ```
//!
//! Matching is anchored and case-sensitive; a single trailing `/` on the
//! request path is ignored.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: any one non-empty segment.
    Single,
    /// `**`: one or more segments.
    Multi,
}

impl Segment {
    fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == part,
            Segment::Single | Segment::Multi => !part.is_empty(),
        }
    }
}

fn split(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// A path pattern compiled into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile `pattern`, returning a human-readable reason on failure.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if !pattern.starts_with('/') {
            return Err("path pattern must start with '/'".to_string());
        }
        let raw = split(pattern);
        let mut segments = Vec::with_capacity(raw.len());
        for (i, part) in raw.iter().enumerate() {
            let segment = match *part {
                "*" => Segment::Single,
                "**" if i + 1 == raw.len() => Segment::Multi,
                "**" => return Err("'**' is only allowed as the last segment".to_string()),
                "" => return Err("path pattern contains an empty segment".to_string()),
                lit => Segment::Literal(lit.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts = split(path);
        match self.segments.split_last() {
            Some((Segment::Multi, fixed)) => {
                parts.len() > fixed.len()
                    && fixed.iter().zip(&parts).all(|(seg, part)| seg.matches(part))
                    && parts[fixed.len()..].iter().all(|part| !part.is_empty())
            }
            _ => {
                parts.len() == self.segments.len()
                    && self
                        .segments
                        .iter()
                        .zip(&parts)
                        .all(|(seg, part)| seg.matches(part))
            }
        }
    }

    /// Number of leading literal segments.
    fn literal_prefix_len(&self) -> usize {
        self.segments
            .iter()
            .take_while(|seg| matches!(seg, Segment::Literal(_)))
            .count()
    }

    /// Remove the pattern's leading literal segments from `path`.
    ///
    /// `/api/users/**` strips `/api/users/42` down to `/42`; stripping a path
    /// to nothing yields `/`. The remainder is kept verbatim, trailing `/`
    /// included.
    pub fn strip_literal_prefix(&self, path: &str) -> String {
        let mut rest = path.trim_start_matches('/');
        for _ in 0..self.literal_prefix_len() {
            match rest.find('/') {
                Some(idx) => rest = &rest[idx + 1..],
                None => {
                    rest = "";
                    break;
                }
            }
        }
        format!("/{rest}")
    }
}
