use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when resolving a test type from its slug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TestTypeError {
    #[error("unknown test type slug: {0}")]
    UnknownSlug(String),
}

/// The self-assessment instruments supported by the platform.
///
/// Each instrument carries its own question set and dimension list; the
/// scoring engine itself is shared across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    /// Five love languages (5 dimensions).
    LoveLanguage,
    /// Love attitude styles (6 dimensions).
    LoveStyle,
    /// Interpersonal skills (4 dimensions).
    Interpersonal,
    /// DISC behavioral assessment (4 dimensions).
    Disc,
    /// Holland occupational interest codes, RIASEC (6 dimensions).
    Holland,
    /// Leadership style (5 dimensions).
    Leadership,
}

impl TestType {
    /// All supported instruments, in declaration order.
    pub const ALL: [TestType; 6] = [
        TestType::LoveLanguage,
        TestType::LoveStyle,
        TestType::Interpersonal,
        TestType::Disc,
        TestType::Holland,
        TestType::Leadership,
    ];

    /// Stable slug used in cache namespaces and persisted keys.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            TestType::LoveLanguage => "love-language",
            TestType::LoveStyle => "love-style",
            TestType::Interpersonal => "interpersonal",
            TestType::Disc => "disc",
            TestType::Holland => "holland",
            TestType::Leadership => "leadership",
        }
    }

    /// Resolves a slug back to a test type.
    ///
    /// # Errors
    ///
    /// Returns `TestTypeError::UnknownSlug` if the slug does not name a
    /// supported instrument.
    pub fn from_slug(slug: &str) -> Result<Self, TestTypeError> {
        Self::ALL
            .into_iter()
            .find(|t| t.slug() == slug)
            .ok_or_else(|| TestTypeError::UnknownSlug(slug.to_string()))
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}
