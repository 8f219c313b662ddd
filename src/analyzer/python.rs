use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;

use crate::detector::find_file;
use crate::models::RequirementSpec;

/// Requirement list names, in lookup order.
const REQUIREMENT_FILES: &[&str] = &["requirements.txt", "requirement.txt"];

/// `name[extras] (==|>=)version`; older metadata wraps the pin in parentheses.
static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.\-]+)\s*(?:\[[^\]]*\])?\s*\(?\s*(?:(?:==|>=)=?\s*([^\s;,()]+))?")
        .expect("requirement pattern is valid")
});

pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for PythonAnalyzer {
    fn analyze(&self, root: &Path) -> Result<Vec<RequirementSpec>> {
        let Some(path) = REQUIREMENT_FILES.iter().find_map(|f| find_file(root, f)) else {
            debug!("No requirements file under {}", root.display());
            return Ok(Vec::new());
        };
        info!("Reading Python requirements from {}", path.display());
        parse_requirements_txt(&path)
    }
}

/// Parse a requirement list, one `name==version` or `name>=version` per line.
///
/// Blank lines and comments are ignored; any other line without a
/// recognised separator is skipped with a warning.
fn parse_requirements_txt(path: &Path) -> Result<Vec<RequirementSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_requirement_lines(&content))
}

fn parse_requirement_lines(content: &str) -> Vec<RequirementSpec> {
    let mut reqs = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        match split_requirement(line) {
            Some(req) => reqs.push(req),
            None => warn!("Skipping requirement line {}: {:?}", idx + 1, raw.trim()),
        }
    }
    reqs
}

/// Split `name==version` / `name>=version` into a [`RequirementSpec`].
///
/// The separator is the first one following the name, so
/// `django>=4.0,==4.2` pins `4.0`. Environment markers and extras are
/// dropped; the version stops at the first comma, `;`, `)` or whitespace.
pub fn split_requirement(line: &str) -> Option<RequirementSpec> {
    let caps = REQUIREMENT.captures(line.trim())?;
    let version = caps.get(2)?;
    Some(RequirementSpec::new(&caps[1], version.as_str()))
}

/// Like [`split_requirement`], but an entry without a `==` / `>=` pin
/// still yields its name with an empty (latest) version.
pub fn split_dependency(entry: &str) -> Option<RequirementSpec> {
    let caps = REQUIREMENT.captures(entry.trim())?;
    let version = caps.get(2).map_or("", |v| v.as_str());
    Some(RequirementSpec::new(&caps[1], version))
}
