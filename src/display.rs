//! ASCII rendering of trees for diagnostics and golden tests.
//!
//! The format is the standard rooted tree drawing: `○` marks a node,
//! children appear under their parent in sorted order behind `├── `/`└── `
//! branches, and continuation columns use `│   ` or blank padding. A
//! key-terminal prints its value in parentheses after the edge label:
//!
//! ```text
//! ○
//! └── ○ T
//!     ├── ○ E
//!     │   ├── ○ AM (2)
//!     │   └── ○ ST (1)
//!     └── ○ OAST (3)
//! ```

use std::fmt::{Display, Write};
use std::sync::Arc;

use crate::node::Node;

/// Render the subtree rooted at `node`, ending with a newline.
#[must_use]
pub fn pretty_print<V: Display>(node: &Arc<Node<V>>) -> String {
    let mut out = String::new();
    render(node, &mut out, "", "");
    out
}

fn render<V: Display>(node: &Arc<Node<V>>, out: &mut String, branch: &str, label_prefix: &str) {
    out.push_str(branch);
    out.push('○');

    if !node.incoming_edge().is_empty() {
        out.push(' ');
        out.push_str(node.incoming_edge());
    }

    if let Some(value) = node.value() {
        // Infallible: writing into a String cannot fail.
        let _ = write!(out, " ({value})");
    }

    out.push('\n');

    let children: Vec<Arc<Node<V>>> = node.child_nodes();
    let last: usize = children.len().saturating_sub(1);

    for (index, child) in children.iter().enumerate() {
        let is_last: bool = index == last;

        let child_branch: String = if is_last {
            format!("{label_prefix}└── ")
        } else {
            format!("{label_prefix}├── ")
        };

        let next_prefix: String = if is_last {
            format!("{label_prefix}    ")
        } else {
            format!("{label_prefix}│   ")
        };

        render(child, out, &child_branch, &next_prefix);
    }
}
