//! Canonical XML projection of a tree.
//!
//! The output is a pure function of the tree value: pre-order from the root,
//! attributes sorted by name, two spaces of indentation per level. The node
//! table is an ordered map, so insertion order never leaks into the result.
//! Broken trees still project. A dangling child renders as a placeholder
//! comment and a node reached again through its own descendants renders as a
//! cycle marker, so the projector can be used to display trees under
//! diagnosis.

use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::ast::{Attributes, NodeId, Tree};

const INDENT: usize = 2;

/// Renders `tree` as canonical XML.
///
/// # Examples
///
/// ```rust
/// use uix::ast::{Node, Tree};
/// use uix::projection::project;
/// let tree = Tree::with_root(Node::new("R", "shell").with_attr("wide", true));
/// assert_eq!(project(&tree), r#"<shell id="R" wide />"#);
/// ```
pub fn project(tree: &Tree) -> String {
    let mut out = String::new();
    let mut ancestors = Vec::new();
    render_node(tree, &tree.root_id, 0, &mut ancestors, &mut out);
    out
}

/// Lowercase hex SHA-256 of the canonical projection.
pub fn digest(tree: &Tree) -> String {
    let hash = Sha256::digest(project(tree).as_bytes());
    format!("{:x}", hash)
}

fn render_node(tree: &Tree, id: &str, depth: usize, ancestors: &mut Vec<NodeId>, out: &mut String) {
    let Some(node) = tree.get(id) else {
        let _ = write!(out, "<!-- Missing Node: {} -->", id);
        return;
    };
    let indent = " ".repeat(depth * INDENT);
    if ancestors.iter().any(|a| a == id) {
        let _ = write!(out, "{}<!-- Cycle: {} -->", indent, id);
        return;
    }

    let attrs = render_attributes(&node.attributes);
    if node.children.is_empty() {
        let _ = write!(out, "{}<{} id=\"{}\"{} />", indent, node.kind, node.id, attrs);
        return;
    }

    let _ = writeln!(out, "{}<{} id=\"{}\"{}>", indent, node.kind, node.id, attrs);
    ancestors.push(id.to_string());
    for child in &node.children {
        render_node(tree, child, depth + 1, ancestors, out);
        out.push('\n');
    }
    ancestors.pop();
    let _ = write!(out, "{}</{}>", indent, node.kind);
}

// `Attributes` iterates in ascending key order already.
fn render_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(name, value)| {
            if value.is_true() {
                format!(" {}", name)
            } else {
                format!(" {}=\"{}\"", name, value)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    #[test]
    fn attributes_sort_and_booleans_render_bare() {
        let tree = Tree::with_root(
            Node::new("R", "button")
                .with_attr("variant", "primary")
                .with_attr("disabled", true)
                .with_attr("hidden", false)
                .with_attr("count", 3.0),
        );
        assert_eq!(
            project(&tree),
            r#"<button id="R" count="3" disabled hidden="false" variant="primary" />"#
        );
    }

    #[test]
    fn nested_children_indent_two_spaces_per_level() {
        let mut tree = Tree::with_root(Node::new("R", "shell").with_children(["A"]));
        tree.nodes.insert(
            "A".to_string(),
            Node::new("A", "region").with_children(["B"]).with_parent("R"),
        );
        tree.nodes.insert("B".to_string(), Node::new("B", "text").with_parent("A"));
        assert_eq!(
            project(&tree),
            "<shell id=\"R\">\n  <region id=\"A\">\n    <text id=\"B\" />\n  </region>\n</shell>"
        );
    }

    #[test]
    fn dangling_child_renders_placeholder() {
        let tree = Tree::with_root(Node::new("R", "shell").with_children(["gone"]));
        assert_eq!(
            project(&tree),
            "<shell id=\"R\">\n<!-- Missing Node: gone -->\n</shell>"
        );
    }

    #[test]
    fn missing_root_renders_placeholder() {
        let mut tree = Tree::with_root(Node::new("R", "shell"));
        tree.root_id = "other".to_string();
        assert_eq!(project(&tree), "<!-- Missing Node: other -->");
    }

    #[test]
    fn cycles_terminate() {
        let mut tree = Tree::with_root(Node::new("R", "shell").with_children(["A"]));
        tree.nodes.insert("A".to_string(), Node::new("A", "region").with_children(["R"]));
        let xml = project(&tree);
        assert!(xml.contains("<!-- Cycle: R -->"));
        assert!(xml.ends_with("</shell>"));
    }

    #[test]
    fn shared_child_is_rendered_under_each_parent() {
        let mut tree = Tree::with_root(Node::new("R", "shell").with_children(["A", "B"]));
        tree.nodes.insert("A".to_string(), Node::new("A", "region").with_children(["C"]));
        tree.nodes.insert("B".to_string(), Node::new("B", "region").with_children(["C"]));
        tree.nodes.insert("C".to_string(), Node::new("C", "text"));
        assert_eq!(project(&tree).matches("<text id=\"C\" />").count(), 2);
    }

    #[test]
    fn digest_is_stable_hex() {
        let tree = Tree::initial();
        let d = digest(&tree);
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest(&tree.clone()));
        assert_ne!(d, digest(&Tree::with_root(Node::new("R", "shell"))));
    }
}
