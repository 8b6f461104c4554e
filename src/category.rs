//! Generation categories.
//!
//! Every category owns one inventory partition and one generation stream.

use std::fmt;
use std::str::FromStr;

use crate::matcher::Pattern;

/// Partition name of the unfiltered stream.
pub const UNFILTERED_NAME: &str = "random";

/// A named vanity target, e.g. `pumpfun=pump`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VanityTarget {
    name: String,
    suffix: String,
}

impl VanityTarget {
    pub fn new(name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl FromStr for VanityTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, suffix)) => Ok(Self::new(name.trim(), suffix.trim())),
            None => Err(format!("expected NAME=SUFFIX, got {:?}", s)),
        }
    }
}

impl fmt::Display for VanityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.suffix)
    }
}

/// How `drain` picks records from a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Uniform random sample without replacement.
    Random,
    /// Insertion order, oldest first.
    Oldest,
}

/// The kind of keypairs a stream produces and a partition holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Unfiltered,
    Vanity(VanityTarget),
}

impl Category {
    /// Returns the partition key, also used as the API path segment.
    pub fn name(&self) -> &str {
        match self {
            Category::Unfiltered => UNFILTERED_NAME,
            Category::Vanity(target) => target.name(),
        }
    }

    pub fn selection(&self) -> Selection {
        match self {
            Category::Unfiltered => Selection::Random,
            Category::Vanity(_) => Selection::Oldest,
        }
    }

    /// Returns the predicate keypairs of this category satisfy.
    pub fn pattern(&self) -> Pattern {
        match self {
            Category::Unfiltered => Pattern::any(),
            Category::Vanity(target) => Pattern::suffix(target.suffix()),
        }
    }

    pub fn is_vanity(&self) -> bool {
        matches!(self, Category::Vanity(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::PatternType;

    #[test]
    fn test_parse_target() {
        let target: VanityTarget = "pumpfun=pump".parse().unwrap();
        assert_eq!(target.name(), "pumpfun");
        assert_eq!(target.suffix(), "pump");
        assert_eq!(target.to_string(), "pumpfun=pump");
        assert!("pumpfun".parse::<VanityTarget>().is_err());
    }

    #[test]
    fn test_category_policies() {
        let unfiltered = Category::Unfiltered;
        assert_eq!(unfiltered.name(), "random");
        assert_eq!(unfiltered.selection(), Selection::Random);
        assert_eq!(unfiltered.pattern().pattern_type(), PatternType::Any);

        let vanity = Category::Vanity(VanityTarget::new("letbonk", "bonk"));
        assert_eq!(vanity.name(), "letbonk");
        assert_eq!(vanity.selection(), Selection::Oldest);
        assert_eq!(vanity.pattern(), Pattern::suffix("bonk"));
        assert!(vanity.is_vanity());
    }
}
