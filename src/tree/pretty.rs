//! Box-drawing renderer shared by every tree's `pretty_print`
//!
//! Output is a diagnostic aid for test failures, not a stable format:
//!
//! ```text
//! └── 5
//!     ├── 3
//!     │   └── 1
//!     └── 8
//! ```
//!
//! Children are rendered left before right, one indentation level per
//! depth. A node with exactly one child shows the missing side as `nil` so
//! the shape stays unambiguous.

use super::traits::{Side, TreeNavigator};

const EMPTY_SPACE: &str = "    ";
const EDGE: &str = "│   ";
const MIDDLE_ITEM: &str = "├── ";
const LAST_ITEM: &str = "└── ";
const NIL: &str = "nil";

/// Render `tree` as indented lines, or `"empty"` when it has no root
pub fn render<K, T>(tree: &T) -> String
where
    K: crate::tree::IndexKey,
    T: TreeNavigator<K> + ?Sized,
{
    let Some(root) = tree.root_cursor() else {
        return "empty".to_string();
    };

    // (indent, is_last, node) with `None` standing for an absent sibling
    let mut stack = vec![(String::new(), true, Some(root))];
    let mut lines = Vec::new();

    while let Some((indent, is_last, node)) = stack.pop() {
        let connector = if is_last { LAST_ITEM } else { MIDDLE_ITEM };
        let text = match node {
            Some(cursor) => tree.label_at(cursor),
            None => NIL.to_string(),
        };
        lines.push(format!("{}{}{}", indent, connector, text));

        if let Some(cursor) = node {
            let left = tree.child(cursor, Side::Left);
            let right = tree.child(cursor, Side::Right);
            if left.is_some() || right.is_some() {
                let edge = if is_last { EMPTY_SPACE } else { EDGE };
                let child_indent = format!("{}{}", indent, edge);
                stack.push((child_indent.clone(), true, right));
                stack.push((child_indent, false, left));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use crate::tree::{HeightBalancedIndex, OrderedLookup};

    #[test]
    fn test_render_empty() {
        let tree = HeightBalancedIndex::<i32>::new();
        assert_eq!(tree.pretty_print(), "empty");
    }

    #[test]
    fn test_render_borrowed_keys() {
        let owned = vec!["b".to_string(), "a".to_string()];
        let tree = HeightBalancedIndex::from_sequence(owned.iter().map(String::as_str)).unwrap();
        assert_eq!(tree.pretty_print(), "└── \"b\"\n    ├── \"a\"\n    └── nil");
    }

    #[test]
    fn test_render_nested_edges() {
        let tree = HeightBalancedIndex::from_sequence([5, 3, 8, 1]).unwrap();
        let expected = [
            "└── 5",
            "    ├── 3",
            "    │   ├── 1",
            "    │   └── nil",
            "    └── 8",
        ]
        .join("\n");
        assert_eq!(tree.pretty_print(), expected);
    }
}
