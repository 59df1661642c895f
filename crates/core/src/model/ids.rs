use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a question inside the loaded question bank.
///
/// Indices are zero-based and stable for the lifetime of a bank, which is why
/// progress, exclusions, and mistake records all key on them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionIndex(usize);

impl QuestionIndex {
    /// Creates a new `QuestionIndex`
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying index
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }

    /// Human-facing, one-based question number.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.0 + 1
    }
}

/// Opaque identifier of an authenticated user, as issued by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new `UserId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionIndex({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionIndex {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map(QuestionIndex::new)
            .map_err(|_| ParseIdError {
                kind: "QuestionIndex",
            })
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError { kind: "UserId" });
        }
        Ok(UserId::new(trimmed))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_index_parses_and_displays() {
        let index: QuestionIndex = " 12 ".parse().unwrap();
        assert_eq!(index.value(), 12);
        assert_eq!(index.ordinal(), 13);
        assert_eq!(index.to_string(), "12");
        assert_eq!(format!("{index:?}"), "QuestionIndex(12)");
    }

    #[test]
    fn question_index_rejects_garbage() {
        let err = "abc".parse::<QuestionIndex>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse QuestionIndex from string");
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!("   ".parse::<UserId>().is_err());
        assert_eq!("u-1".parse::<UserId>().unwrap().as_str(), "u-1");
    }

    #[test]
    fn question_index_serializes_as_number() {
        let json = serde_json::to_string(&QuestionIndex::new(4)).unwrap();
        assert_eq!(json, "4");
    }
}
