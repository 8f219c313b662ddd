use serde::{Deserialize, Serialize};

use crate::license::classifier::{classify, LicenseClass};

/// Sentinel license value used when no strategy produced a license.
pub const UNKNOWN_LICENSE: &str = "Unknown";

/// Parent name recorded for forest roots.
pub const DIRECT_PARENT: &str = "Direct";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Node,
    Python,
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Node => write!(f, "Node"),
            Ecosystem::Python => write!(f, "Python"),
        }
    }
}

/// One top-level requirement extracted from a manifest or requirement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSpec {
    pub name: String,
    /// Requested version; empty means "whatever the registry calls latest".
    pub version: String,
}

impl RequirementSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// One resolved package at one version, with its resolved runtime dependencies.
///
/// Copyleft status is not stored: it is always re-derived from `license`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyNode {
    pub name: String,
    pub requested_version: String,
    pub resolved_version: String,
    pub license: String,
    pub details_url: String,
    pub ecosystem: Ecosystem,
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    pub fn is_copyleft(&self) -> bool {
        classify(&self.license) == LicenseClass::Copyleft
    }

    pub fn risk(&self) -> LicenseRisk {
        LicenseRisk::of(&self.license)
    }
}

/// Parent-annotated, tabular projection of a [`DependencyNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatDependencyRecord {
    pub name: String,
    pub version: String,
    pub license: String,
    pub details_url: String,
    pub ecosystem: Ecosystem,
    pub parent: String,
}

impl FlatDependencyRecord {
    pub fn is_copyleft(&self) -> bool {
        classify(&self.license) == LicenseClass::Copyleft
    }

    pub fn risk(&self) -> LicenseRisk {
        LicenseRisk::of(&self.license)
    }
}

/// Nested document handed to tree renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeDocument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyleft: Option<bool>,
    pub children: Vec<TreeDocument>,
}

/// Reporting bucket used for coloring: the two classifier outcomes plus
/// the "no license found" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LicenseRisk {
    Copyleft,
    Permissive,
    Unknown,
}

impl LicenseRisk {
    pub fn of(license: &str) -> Self {
        if license == UNKNOWN_LICENSE {
            return LicenseRisk::Unknown;
        }
        match classify(license) {
            LicenseClass::Copyleft => LicenseRisk::Copyleft,
            LicenseClass::Other => LicenseRisk::Permissive,
        }
    }
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Copyleft => write!(f, "Copyleft"),
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}
