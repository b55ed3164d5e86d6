//! Three-component format version used to gate fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format version `major.minor.patch`.
///
/// Ordering is lexicographic over (major, minor, patch), so any two versions
/// are comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Malformed version string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("version must be supplied in form x.y.z, given {0:?}")]
pub struct VersionFormatError(pub String);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted `x.y.z` string.
    ///
    /// Exactly three non-empty integer components are required.
    pub fn parse(s: &str) -> Result<Self, VersionFormatError> {
        let err = || VersionFormatError(s.to_string());

        let mut parts = s.split('.');
        let mut next = || -> Result<u32, VersionFormatError> {
            let part = parts.next().ok_or_else(err)?;
            if part.is_empty() {
                return Err(err());
            }
            part.parse().map_err(|_| err())
        };

        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

impl FromStr for Version {
    type Err = VersionFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}
