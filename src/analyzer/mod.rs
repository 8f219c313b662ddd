use std::path::Path;

use anyhow::Result;

use crate::models::RequirementSpec;

pub mod node;
pub mod python;

/// Extracts the top-level requirements of one ecosystem from a project tree.
///
/// A project without the ecosystem's manifest yields an empty list; an
/// unreadable or unparsable manifest is an error.
pub trait Analyzer {
    fn analyze(&self, root: &Path) -> Result<Vec<RequirementSpec>>;
}
