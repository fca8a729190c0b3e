use std::{cmp::Ordering, fmt};

/// A CRAM format version (the file definition's major/minor pair).
///
/// Only the major component is behaviorally significant to this crate: it
/// gates whether a slice header carries a trailing tag chain (§4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Version {
    major: u8,
    minor: u8,
}

impl Version {
    /// CRAM 2.0
    pub const V2_0: Self = Self::new(2, 0);

    /// CRAM 2.1
    pub const V2_1: Self = Self::new(2, 1);

    /// CRAM 3.0
    pub const V3_0: Self = Self::new(3, 0);

    /// CRAM 3.1
    pub const V3_1: Self = Self::new(3, 1);

    /// Creates a format version.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Returns the major version.
    pub fn major(&self) -> u8 {
        self.major
    }

    /// Returns the minor version.
    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Returns `true` if a slice header of this version carries a trailing
    /// tag chain (major ≥ 3, §4.4).
    pub fn supports_tag_chain(&self) -> bool {
        self.major >= 3
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V3_0
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major.cmp(&other.major).then(self.minor.cmp(&other.minor))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
