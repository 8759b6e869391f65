// src/tree/render.rs

use std::fmt::Write as _;

use crate::tree::node::Node;

/// Render a snapshot as an indented listing, two spaces per level.
///
/// Directories get a trailing `/`. Files that appear in their parent's
/// `children` are prefixed with `+`, everything else with a space.
pub fn render_tree(root: &Node) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}/", root.name());
    render_entries(root, 1, &mut out);
    out
}

fn render_entries(dir: &Node, depth: usize, out: &mut String) {
    for node in dir.files() {
        let expandable = dir.children().iter().any(|c| std::sync::Arc::ptr_eq(c, node));
        let marker = if expandable && !node.is_directory() { '+' } else { ' ' };
        let indent = "  ".repeat(depth);

        if node.is_directory() {
            let _ = writeln!(out, "{indent}{marker}{}/", node.name());
            render_entries(node, depth + 1, out);
        } else {
            let _ = writeln!(out, "{indent}{marker}{}", node.name());
        }
    }
}
