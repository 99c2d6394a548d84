//! Directory tree built from discovered reject paths.

use std::collections::BTreeMap;
use std::path::{Component, Path};

/// A node in the reject tree; leaves are files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeNode {
    children: BTreeMap<String, TreeNode>,
}

/// One rendered row: box-drawing prefix plus the segment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub prefix: String,
    pub name: String,
    pub is_dir: bool,
}

impl TreeNode {
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Self {
        let mut root = Self::default();
        for path in paths {
            let mut node = &mut root;
            for component in path.components() {
                if matches!(component, Component::CurDir) {
                    continue;
                }
                let key = component.as_os_str().to_string_lossy().into_owned();
                node = node.children.entry(key).or_default();
            }
        }
        root
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flatten into rows in display order.
    pub fn lines(&self) -> Vec<TreeLine> {
        let mut out = Vec::new();
        self.collect("", &mut out);
        out
    }

    fn collect(&self, prefix: &str, out: &mut Vec<TreeLine>) {
        let count = self.children.len();
        for (index, (name, child)) in self.children.iter().enumerate() {
            let last = index + 1 == count;
            let (branch, indent) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push(TreeLine {
                prefix: format!("{prefix}{branch}"),
                name: name.clone(),
                is_dir: !child.is_empty(),
            });
            child.collect(&format!("{prefix}{indent}"), out);
        }
    }
}
