//! Addresses inside the realtime JSON tree.

use std::fmt;

use cloudchat_shared::constants::{FORBIDDEN_KEY_CHARS, PATH_SEPARATOR};

use crate::error::{Result, StoreError};

/// A `/`-separated location in the database tree. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `a/b/c`. Leading and trailing separators are ignored; empty
    /// inner segments are not.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches(PATH_SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(trimmed.split(PATH_SEPARATOR))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path.push(segment.as_ref())?;
        }
        Ok(path)
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Result<Self> {
        let mut path = self.clone();
        path.push(segment.as_ref())?;
        Ok(path)
    }

    fn push(&mut self, segment: &str) -> Result<()> {
        validate_segment(segment)?;
        self.segments.push(segment.to_string());
        Ok(())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; zero for the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every proper ancestor, root excluded, shortest first.
    pub fn ancestors(&self) -> impl Iterator<Item = DbPath> + '_ {
        (1..self.segments.len()).map(move |n| DbPath {
            segments: self.segments[..n].to_vec(),
        })
    }

    pub fn is_ancestor_or_self_of(&self, other: &DbPath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a write at one path can change the value seen at the other.
    pub fn overlaps(&self, other: &DbPath) -> bool {
        self.is_ancestor_or_self_of(other) || other.is_ancestor_or_self_of(self)
    }

    /// The storage form: segments joined by `/`, root as the empty string.
    pub fn encode(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.encode())
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".into()));
    }
    if let Some(ch) = segment
        .chars()
        .find(|c| *c == PATH_SEPARATOR || FORBIDDEN_KEY_CHARS.contains(c) || c.is_control())
    {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains {ch:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_encode() {
        let p = DbPath::parse("/chats/a_b/").unwrap();
        assert_eq!(p.segments(), ["chats", "a_b"]);
        assert_eq!(p.encode(), "chats/a_b");
        assert_eq!(p.to_string(), "/chats/a_b");
        assert!(DbPath::parse("").unwrap().is_root());
        assert!(DbPath::parse("/").unwrap().is_root());
    }

    #[test]
    fn rejects_bad_segments() {
        assert!(DbPath::parse("a//b").is_err());
        assert!(DbPath::parse("a/b.c").is_err());
        assert!(DbPath::parse("a/$b").is_err());
        assert!(DbPath::root().child("x/y").is_err());
    }

    #[test]
    fn overlap_is_ancestry_in_either_direction() {
        let chats = DbPath::parse("chats").unwrap();
        let conv = DbPath::parse("chats/a_b").unwrap();
        let seen = DbPath::parse("chats/a_b/m1/seen").unwrap();
        let users = DbPath::parse("users").unwrap();

        assert!(chats.overlaps(&seen));
        assert!(seen.overlaps(&conv));
        assert!(!users.overlaps(&conv));
        assert!(DbPath::root().overlaps(&users));
        // compared per segment, not as string prefixes
        assert!(!DbPath::parse("chat").unwrap().overlaps(&chats));
    }

    #[test]
    fn ancestors_exclude_root_and_self() {
        let p = DbPath::parse("a/b/c").unwrap();
        let ancestors: Vec<_> = p.ancestors().map(|a| a.encode()).collect();
        assert_eq!(ancestors, ["a", "a/b"]);
    }
}
