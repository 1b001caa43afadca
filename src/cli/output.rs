//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::domain::Node;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One line per node: id, parent, bounds, indented by depth.
pub fn node_line(node: &Node) -> String {
    let parent = node
        .parent_id
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "{}{} (parent {}) {}",
        "  ".repeat(node.depth as usize),
        node.id.to_string().bold(),
        parent,
        node.bounds().to_string().dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeId;

    #[test]
    fn given_child_node_when_formatting_line_then_indents_and_shows_bounds() {
        colored::control::set_override(false);
        let node = Node {
            id: NodeId(2),
            parent_id: Some(NodeId(1)),
            lft: 2,
            rgt: 3,
            depth: 1,
        };
        assert_eq!(node_line(&node), "  2 (parent 1) [2, 3] depth 1");
    }
}
