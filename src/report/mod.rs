//! Report renderers for resolved dependency data.
//!
//! - [`terminal`]: colored summary box and dependency table; respects `--verbose` / `--quiet`.
//! - [`json`]: flat records plus one tree document per ecosystem.
//! - [`html`]: standalone page with a colored table and collapsible trees.

pub mod html;
pub mod json;
pub mod terminal;

use std::path::PathBuf;

use crate::models::{Ecosystem, FlatDependencyRecord, LicenseRisk, TreeDocument};

/// Everything a renderer needs, produced once per run.
#[derive(Debug, Clone)]
pub struct Report {
    pub project: PathBuf,
    /// Per ecosystem, how many top-level requirements were requested.
    pub top_level: Vec<(Ecosystem, usize)>,
    pub records: Vec<FlatDependencyRecord>,
    pub trees: Vec<TreeDocument>,
    /// Packages dropped because their registry lookup failed.
    pub unresolved: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub copyleft: usize,
    pub permissive: usize,
    pub unknown: usize,
}

impl Report {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.records.len(),
            ..Summary::default()
        };
        for record in &self.records {
            match record.risk() {
                LicenseRisk::Copyleft => summary.copyleft += 1,
                LicenseRisk::Permissive => summary.permissive += 1,
                LicenseRisk::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// One-line description, e.g. `3 Node top-level deps, 2 Python top-level deps, Copyleft: 1`.
    pub fn headline(&self) -> String {
        let mut parts: Vec<String> = self
            .top_level
            .iter()
            .map(|(ecosystem, n)| format!("{} {} top-level deps", n, ecosystem))
            .collect();
        parts.push(format!("Copyleft: {}", self.summary().copyleft));
        parts.join(", ")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(name: &str, license: &str, parent: &str) -> FlatDependencyRecord {
        FlatDependencyRecord {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            license: license.to_string(),
            details_url: format!("https://www.npmjs.com/package/{}", name),
            ecosystem: Ecosystem::Node,
            parent: parent.to_string(),
        }
    }

    pub(crate) fn sample_report() -> Report {
        Report {
            project: PathBuf::from("/work/app"),
            top_level: vec![(Ecosystem::Node, 2), (Ecosystem::Python, 0)],
            records: vec![
                record("express", "MIT", "Direct"),
                record("readline", "GPL-3.0", "express"),
                record("<mystery>", "Unknown", "Direct"),
            ],
            trees: Vec::new(),
            unresolved: 1,
        }
    }

    #[test]
    fn test_summary() {
        let summary = sample_report().summary();
        assert_eq!(
            summary,
            Summary {
                total: 3,
                copyleft: 1,
                permissive: 1,
                unknown: 1,
            }
        );
    }

    #[test]
    fn test_headline() {
        assert_eq!(
            sample_report().headline(),
            "2 Node top-level deps, 0 Python top-level deps, Copyleft: 1"
        );
    }
}
