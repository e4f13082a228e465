//! Prefix tree of route segments
//!
//! One tree exists per HTTP method. Each node matches one raw segment token;
//! a node whose `pattern` is non-empty terminates a registered route.

use crate::Segment;

/// Trie node for path segment matching
#[derive(Debug, Default, Clone)]
pub struct Node {
    /// Full registered pattern; empty unless a route ends here
    pattern: String,
    /// Raw token this node matches (`users`, `:id`, `*path`), empty at the root
    part: String,
    /// Children in insertion order
    children: Vec<Node>,
    /// Matches any incoming segment (`:name` or `*name`)
    is_wild: bool,
}

impl Node {
    /// Create an empty root node
    pub fn new() -> Self {
        Self::default()
    }

    fn child(part: &str) -> Self {
        Self {
            pattern: String::new(),
            part: part.to_string(),
            children: Vec::new(),
            is_wild: part.starts_with(':') || part.starts_with('*'),
        }
    }

    /// The full pattern registered at this node, empty if none
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The raw segment token this node matches
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Whether this node matches arbitrary segments
    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Whether a route terminates at this node
    pub fn is_route(&self) -> bool {
        !self.pattern.is_empty()
    }

    /// Insert `pattern`, whose parsed form is `segments`, below this node.
    ///
    /// Existing children are reused by raw token equality, so `b` and `:name`
    /// are always distinct children. Re-inserting a pattern only re-sets it.
    pub fn insert(&mut self, pattern: &str, segments: &[Segment], depth: usize) {
        let Some(segment) = segments.get(depth) else {
            self.pattern = pattern.to_string();
            return;
        };

        let part = segment.raw();
        let index = match self.children.iter().position(|c| c.part == part) {
            Some(index) => index,
            None => {
                self.children.push(Node::child(&part));
                self.children.len() - 1
            }
        };
        self.children[index].insert(pattern, segments, depth + 1);
    }

    /// Find the node terminating a route for the incoming `parts`.
    ///
    /// A `*` node swallows whatever remains. Candidates are tried in
    /// insertion order and the first successful branch wins.
    pub fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.part.starts_with('*') {
            return self.is_route().then_some(self);
        }

        let part = parts[depth];
        self.children
            .iter()
            .filter(|child| child.is_wild || child.part == part)
            .find_map(|child| child.search(parts, depth + 1))
    }
}
