//! Page hierarchy resolved from a navigation menu.
//!
//! Pages are stored in a flat `Vec<PageNode>` with parent/children
//! relationships tracked by indices. Children own the forward links; the
//! parent index is kept for bookkeeping and structural equality.

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`PageTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

/// One entry of the page hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageNode {
    /// Page title as shown in the navigation.
    pub title: String,
    /// Source HTML file; `None` for container nodes.
    pub source: Option<PathBuf>,
    /// Parent node, `None` for roots.
    pub parent: Option<PageId>,
}

impl PageNode {
    /// True if the node only groups children and has no content.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.source.is_none()
    }
}

/// Ordered forest of pages.
///
/// Immutable once built. Sibling order is document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageTree {
    nodes: Vec<PageNode>,
    children: Vec<Vec<PageId>>,
    roots: Vec<PageId>,
}

impl PageTree {
    /// Top-level nodes in document order.
    #[must_use]
    pub fn roots(&self) -> &[PageId] {
        &self.roots
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another tree.
    #[must_use]
    pub fn node(&self, id: PageId) -> &PageNode {
        &self.nodes[id.0]
    }

    /// Children of a node in document order.
    #[must_use]
    pub fn children(&self, id: PageId) -> &[PageId] {
        &self.children[id.0]
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes depth-first (parent before children), with their depth.
    #[must_use]
    pub fn walk(&self) -> Vec<(PageId, usize)> {
        fn visit(tree: &PageTree, id: PageId, depth: usize, out: &mut Vec<(PageId, usize)>) {
            out.push((id, depth));
            for &child in tree.children(id) {
                visit(tree, child, depth + 1, out);
            }
        }

        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            visit(self, root, 0, &mut out);
        }
        out
    }

    /// Return a tree with a single synthetic root that adopts all current roots.
    #[must_use]
    pub fn nest_under(&self, title: &str, source: Option<&Path>) -> PageTree {
        fn copy(tree: &PageTree, id: PageId, parent: PageId, builder: &mut PageTreeBuilder) {
            let node = tree.node(id);
            let new_id = builder.add(node.title.clone(), node.source.clone(), Some(parent));
            for &child in tree.children(id) {
                copy(tree, child, new_id, builder);
            }
        }

        let mut builder = PageTreeBuilder::new();
        let root = builder.add(title.to_owned(), source.map(Path::to_path_buf), None);
        for &id in &self.roots {
            copy(self, id, root, &mut builder);
        }
        builder.build()
    }

    /// Indented outline with one `-> title` line per node.
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for (id, depth) in self.walk() {
            let _ = writeln!(out, "{}-> {}", "  ".repeat(depth), self.node(id).title);
        }
        out
    }
}

/// Incremental builder for [`PageTree`].
#[derive(Debug, Default)]
pub struct PageTreeBuilder {
    tree: PageTree,
}

impl PageTreeBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (or as a root) and return its id.
    pub fn add(&mut self, title: String, source: Option<PathBuf>, parent: Option<PageId>) -> PageId {
        let id = PageId(self.tree.nodes.len());

        self.tree.nodes.push(PageNode {
            title,
            source,
            parent,
        });
        self.tree.children.push(Vec::new());

        if let Some(parent) = parent {
            self.tree.children[parent.0].push(id);
        } else {
            self.tree.roots.push(id);
        }

        id
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> PageTree {
        self.tree
    }
}
