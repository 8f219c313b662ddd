use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use crate::detector::find_file;
use crate::models::RequirementSpec;

pub struct NodeAnalyzer {
    include_dev: bool,
}

impl NodeAnalyzer {
    pub fn new(include_dev: bool) -> Self {
        Self { include_dev }
    }
}

impl super::Analyzer for NodeAnalyzer {
    fn analyze(&self, root: &Path) -> Result<Vec<RequirementSpec>> {
        let Some(manifest) = find_file(root, "package.json") else {
            debug!("No package.json under {}", root.display());
            return Ok(Vec::new());
        };
        info!("Reading Node requirements from {}", manifest.display());
        parse_package_json(&manifest, self.include_dev)
    }
}

/// Parse `package.json`: the `dependencies` map, plus `devDependencies`
/// when requested. Version ranges are kept verbatim.
fn parse_package_json(path: &Path, include_dev: bool) -> Result<Vec<RequirementSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    let sections: &[&str] = if include_dev {
        &["dependencies", "devDependencies"]
    } else {
        &["dependencies"]
    };

    let mut reqs: Vec<RequirementSpec> = Vec::new();
    for section in sections {
        if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
            for (name, range) in pkgs {
                if reqs.iter().any(|r| &r.name == name) {
                    continue;
                }
                let version = range.as_str().unwrap_or("").trim();
                reqs.push(RequirementSpec::new(name.clone(), version));
            }
        }
    }

    if reqs.is_empty() {
        info!("No dependencies declared in {}", path.display());
    }
    Ok(reqs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const PACKAGE_JSON: &str = r#"{
  "name": "my-app",
  "dependencies": {
    "express": "^4.18.2",
    "left-pad": "^1.3.0"
  },
  "devDependencies": {
    "jest": "^29.0.0",
    "express": "^4.0.0"
  }
}"#;

    #[test]
    fn test_parse_package_json() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", PACKAGE_JSON).unwrap();

        let reqs = parse_package_json(f.path(), false).unwrap();
        assert_eq!(reqs.len(), 2);
        assert!(reqs.contains(&RequirementSpec::new("left-pad", "^1.3.0")));

        let with_dev = parse_package_json(f.path(), true).unwrap();
        assert_eq!(with_dev.len(), 3);
        assert!(with_dev.contains(&RequirementSpec::new("express", "^4.18.2")));
    }

    #[test]
    fn test_no_dependencies_is_empty() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{ "name": "empty" }}"#).unwrap();
        assert!(parse_package_json(f.path(), false).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{{ not json").unwrap();
        assert!(parse_package_json(f.path(), false).is_err());
    }

    #[test]
    fn test_analyze_without_manifest() {
        let dir = tempdir().unwrap();
        assert!(NodeAnalyzer::new(false).analyze(dir.path()).unwrap().is_empty());
    }
}
