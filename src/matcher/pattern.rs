//! Pattern matching implementation.

/// The base58 alphabet used for Solana public keys.
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Longest base58 rendering of a 32-byte public key.
pub const MAX_IDENTIFIER_LEN: usize = 44;

/// The type of pattern matching to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternType {
    /// Every keypair matches
    #[default]
    Any,
    /// Match at the end of the public key
    Suffix,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Any => write!(f, "any"),
            PatternType::Suffix => write!(f, "suffix"),
        }
    }
}

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A compiled predicate over public identifiers.
///
/// Suffix matching is case-sensitive: base58 distinguishes `a` from `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The suffix string (empty for `Any`)
    pattern: String,
    /// The pattern type
    pattern_type: PatternType,
}

impl Pattern {
    /// A pattern that accepts every keypair.
    pub fn any() -> Self {
        Self {
            pattern: String::new(),
            pattern_type: PatternType::Any,
        }
    }

    /// A pattern that accepts public keys ending with `suffix`.
    ///
    /// `suffix` must be non-empty; an empty suffix would accept every key.
    /// Use [`Pattern::any`] for that, and [`validate_suffix`] on user input.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        let pattern = suffix.into();
        debug_assert!(!pattern.is_empty(), "vanity suffix must be non-empty");

        Self {
            pattern,
            pattern_type: PatternType::Suffix,
        }
    }

    /// Returns the pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the pattern type.
    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Matches a public identifier against this pattern.
    #[inline]
    pub fn matches(&self, public_key: &str) -> MatchResult {
        let matched = match self.pattern_type {
            PatternType::Any => true,
            PatternType::Suffix => public_key.ends_with(self.pattern.as_str()),
        };

        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns the estimated difficulty (number of attempts to find a match).
    ///
    /// Each base58 character has 58 possible values, so the expected
    /// number of attempts is 58^n for a suffix of length n.
    pub fn estimated_difficulty(&self) -> u64 {
        match self.pattern_type {
            PatternType::Any => 1,
            PatternType::Suffix => 58u64.saturating_pow(self.pattern.len() as u32),
        }
    }

    /// Returns a human-readable difficulty estimate.
    ///
    /// Buckets assume one stream producing roughly 50K Ed25519 keys per
    /// second.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=10_000 => "Very Easy (< 1 second)".into(),
            10_001..=1_000_000 => "Easy (seconds)".into(),
            1_000_001..=100_000_000 => "Medium (minutes)".into(),
            100_000_001..=10_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

/// Checks that `suffix` is a searchable vanity suffix.
pub fn validate_suffix(suffix: &str) -> Result<(), String> {
    if suffix.is_empty() {
        return Err("suffix cannot be empty".into());
    }

    if let Some(bad) = suffix.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(format!(
            "suffix {:?} contains {:?}, which is not in the base58 alphabet",
            suffix, bad
        ));
    }

    if suffix.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "suffix cannot be longer than {} characters (full public key)",
            MAX_IDENTIFIER_LEN
        ));
    }

    Ok(())
}
