// bndl-common/src/dependency/requirement.rs
use std::fmt;
use std::str::FromStr;

use semver::{Op, Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::error::{BndlError, Result};

/// A version constraint: a set of (operator, version) comparators that must all hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirement(VersionReq);

impl Requirement {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::any());
        }
        Ok(Self(VersionReq::parse(trimmed)?))
    }

    /// Matches any version.
    pub fn any() -> Self {
        Self(VersionReq::STAR)
    }

    /// `=version`, pinned to exactly one release.
    pub fn exact(version: &Version) -> Self {
        Self(VersionReq {
            comparators: vec![semver::Comparator {
                op: Op::Exact,
                major: version.major,
                minor: Some(version.minor),
                patch: Some(version.patch),
                pre: version.pre.clone(),
            }],
        })
    }

    /// True when every comparator is an equality. A wildcard has no comparators and is never exact.
    pub fn is_exact(&self) -> bool {
        !self.0.comparators.is_empty() && self.0.comparators.iter().all(|c| c.op == Op::Exact)
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.0.matches(version)
    }
}

impl Default for Requirement {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for Requirement {
    type Err = BndlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<VersionReq> for Requirement {
    fn from(req: VersionReq) -> Self {
        Self(req)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
