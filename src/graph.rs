use crate::models::{DependencyNode, Ecosystem, FlatDependencyRecord, TreeDocument, DIRECT_PARENT};

/// Pre-order projection of a forest: each node is emitted before its
/// children, tagged with its immediate parent's name (`"Direct"` for roots).
pub fn flatten(forest: &[DependencyNode]) -> Vec<FlatDependencyRecord> {
    let mut records = Vec::new();
    let mut stack: Vec<(&DependencyNode, &str)> = forest
        .iter()
        .rev()
        .map(|root| (root, DIRECT_PARENT))
        .collect();

    while let Some((node, parent)) = stack.pop() {
        records.push(FlatDependencyRecord {
            name: node.name.clone(),
            version: node.resolved_version.clone(),
            license: node.license.clone(),
            details_url: node.details_url.clone(),
            ecosystem: node.ecosystem,
            parent: parent.to_string(),
        });
        stack.extend(node.children.iter().rev().map(|child| (child, node.name.as_str())));
    }

    records
}

/// Wrap one ecosystem's forest under a single synthetic root, e.g.
/// `"Node Dependencies"`. An empty forest gives a root without children.
pub fn to_tree_document(ecosystem: Ecosystem, forest: &[DependencyNode]) -> TreeDocument {
    TreeDocument {
        name: format!("{} Dependencies", ecosystem),
        version: None,
        license: None,
        copyleft: None,
        children: forest.iter().map(node_document).collect(),
    }
}

fn node_document(node: &DependencyNode) -> TreeDocument {
    TreeDocument {
        name: node.name.clone(),
        version: Some(node.resolved_version.clone()),
        license: Some(node.license.clone()),
        copyleft: Some(node.is_copyleft()),
        children: node.children.iter().map(node_document).collect(),
    }
}
