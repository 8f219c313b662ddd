use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::{debug, trace};

use crate::models::Ecosystem;

/// Directories holding installed third-party code rather than project manifests.
const SKIP_DIRS: &[&str] = &["node_modules", "venv", "venvpython", "site-packages", "__pycache__"];

/// Locate `target` under `root`.
///
/// The root itself is checked first; otherwise the tree is walked
/// (honouring `.gitignore`, skipping hidden and vendored directories) and
/// the shallowest match is returned.
pub fn find_file(root: &Path, target: &str) -> Option<PathBuf> {
    let direct = root.join(target);
    if direct.is_file() {
        return Some(direct);
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !SKIP_DIRS.contains(&name.as_ref())
        })
        .build();

    let mut best: Option<(usize, PathBuf)> = None;
    for dent in walker.flatten() {
        if dent.file_name() != target {
            continue;
        }
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        trace!("Candidate {} at depth {}", dent.path().display(), dent.depth());
        if best.as_ref().map_or(true, |(depth, _)| dent.depth() < *depth) {
            best = Some((dent.depth(), dent.into_path()));
        }
    }

    let found = best.map(|(_, path)| path);
    debug!("find_file({}, {}) -> {:?}", root.display(), target, found);
    found
}

/// Auto-detect supported ecosystems by looking for their manifests.
pub fn detect_ecosystems(root: &Path) -> Vec<Ecosystem> {
    let mut ecosystems = Vec::new();

    if find_file(root, "package.json").is_some() {
        ecosystems.push(Ecosystem::Node);
    }

    if find_file(root, "requirements.txt").is_some() || find_file(root, "requirement.txt").is_some() {
        ecosystems.push(Ecosystem::Python);
    }

    ecosystems
}
