//! Compressed trie of compiled route paths.
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. Every node owns a run of
//! tokens (`edge`), the sorted first tokens of its children (`indices`) and a slot payload `S`.
//! A node has at most one child starting with a capture token, so walking the tree never has to
//! choose between two dynamic branches.

use crate::pattern::{render, Token};
use std::io::{self, Write};
use std::mem;

pub(crate) use self::matcher::Span;

mod matcher;

/// Separates tree levels in [`Tree::print`].
const PRINT_SEP: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// Returned when a second dynamic branch would be added at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

#[derive(Debug)]
pub(crate) struct Node<S> {
    edge: Vec<Token>,
    indices: Vec<Token>,
    children: Vec<NodeId>,
    slots: S,
}

impl<S: Default> Node<S> {
    fn with_edge(edge: Vec<Token>) -> Self {
        Node {
            edge,
            indices: Vec::new(),
            children: Vec::new(),
            slots: S::default(),
        }
    }
}

impl<S> Node<S> {
    fn is_blank(&self) -> bool {
        self.edge.is_empty() && self.children.is_empty()
    }

    fn child(&self, first: Token) -> Option<NodeId> {
        self.indices
            .iter()
            .position(|&t| t == first)
            .map(|idx| self.children[idx])
    }

    fn accepts(&self, first: Token) -> bool {
        !(first.is_capture() && self.indices.last().map_or(false, |t| t.is_capture()))
    }
}

#[derive(Debug)]
pub(crate) struct Tree<S> {
    nodes: Vec<Node<S>>,
}

impl<S: Default> Default for Tree<S> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<S: Default> Tree<S> {
    pub(crate) fn new() -> Self {
        Tree {
            nodes: vec![Node::with_edge(Vec::new())],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[ROOT.0].is_blank()
    }

    pub(crate) fn slots(&self, id: NodeId) -> &S {
        &self.nodes[id.0].slots
    }

    pub(crate) fn slots_mut(&mut self, id: NodeId) -> &mut S {
        &mut self.nodes[id.0].slots
    }

    /// Every slot payload in the tree, in arena order.
    pub(crate) fn all_slots(&self) -> impl Iterator<Item = &S> {
        self.nodes.iter().map(|n| &n.slots)
    }

    pub(crate) fn all_slots_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.nodes.iter_mut().map(|n| &mut n.slots)
    }

    /// Inserts a compiled path and returns the node that terminates it.
    pub(crate) fn insert(&mut self, path: &[Token]) -> Result<NodeId, Conflict> {
        let mut current = ROOT;
        let mut path = path;

        loop {
            let node = &self.nodes[current.0];
            if node.is_blank() {
                self.nodes[current.0].edge = path.to_vec();
                return Ok(current);
            }

            let common = common_prefix(&node.edge, path);

            if common < path.len() {
                let first = path[common];
                if common == node.edge.len() {
                    if let Some(child) = node.child(first) {
                        current = child;
                        path = &path[common..];
                        continue;
                    }
                    if !node.accepts(first) {
                        return Err(Conflict);
                    }
                } else {
                    self.split(current, common);
                    if !self.nodes[current.0].accepts(first) {
                        return Err(Conflict);
                    }
                }

                let id = self.push(Node::with_edge(path[common..].to_vec()));
                self.add_child(current, id);
                return Ok(id);
            }

            if common < node.edge.len() {
                self.split(current, common);
            }

            return Ok(current);
        }
    }

    /// Grafts `sub` under `path`.
    ///
    /// Returns `false` when the graft would sit next to a literal `/` branch (the mounted tree
    /// always starts with `/`) or next to another dynamic branch.
    pub(crate) fn mount(&mut self, path: &[Token], sub: Tree<S>) -> bool {
        if sub.is_empty() {
            return true;
        }

        let slash = Token::Byte(b'/');
        let mut current = ROOT;
        let mut path = path;

        loop {
            let node = &self.nodes[current.0];
            if node.is_blank() {
                self.nodes[current.0].edge = path.to_vec();
                return self.graft(current, &[], sub);
            }

            let common = common_prefix(&node.edge, path);

            if common < path.len() {
                if common == node.edge.len() {
                    if let Some(child) = node.child(path[common]) {
                        current = child;
                        path = &path[common..];
                        continue;
                    }
                } else {
                    self.split(current, common);
                }
                return self.graft(current, &path[common..], sub);
            }

            if common < node.edge.len() {
                if node.edge[common] == slash {
                    return false;
                }
                self.split(current, common);
            } else if node.indices.contains(&slash) {
                return false;
            }

            return self.graft(current, &[], sub);
        }
    }

    fn graft(&mut self, parent: NodeId, prefix: &[Token], sub: Tree<S>) -> bool {
        let first = prefix.first().or_else(|| sub.nodes[ROOT.0].edge.first()).copied();
        let first = match first {
            Some(first) => first,
            None => return false,
        };
        if !self.nodes[parent.0].accepts(first) || self.nodes[parent.0].child(first).is_some() {
            return false;
        }

        let offset = self.nodes.len();
        for mut node in sub.nodes {
            for child in node.children.iter_mut() {
                child.0 += offset;
            }
            self.nodes.push(node);
        }

        let root = &mut self.nodes[offset];
        let mut edge = prefix.to_vec();
        edge.append(&mut root.edge);
        root.edge = edge;

        self.add_child(parent, NodeId(offset));
        true
    }

    /// Moves the part of `id`'s edge after `at`, its children and its slots into a new child.
    fn split(&mut self, id: NodeId, at: usize) {
        let node = &mut self.nodes[id.0];
        let tail = node.edge.split_off(at);
        let copy = Node {
            edge: tail,
            indices: mem::take(&mut node.indices),
            children: mem::take(&mut node.children),
            slots: mem::take(&mut node.slots),
        };

        let copy_id = self.push(copy);
        self.add_child(id, copy_id);
    }

    fn push(&mut self, node: Node<S>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a child keeping `indices` sorted. Callers check [`Node::accepts`] first.
    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let first = self.nodes[child.0].edge[0];
        let node = &mut self.nodes[parent.0];
        let pos = node.indices.partition_point(|&t| t <= first);
        node.indices.insert(pos, first);
        node.children.insert(pos, child);
    }
}

impl<S> Tree<S> {
    /// Writes one line per node, the path of each level joined by `-`, captures shown as `:`/`*`.
    pub(crate) fn print<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.print_node(w, ROOT, "")
    }

    fn print_node<W: Write>(&self, w: &mut W, id: NodeId, parent: &str) -> io::Result<()> {
        let node = &self.nodes[id.0];
        let current = if parent.is_empty() {
            render(&node.edge)
        } else {
            format!("{}{}{}", parent, PRINT_SEP, render(&node.edge))
        };

        writeln!(w, "{}", current)?;
        for &child in &node.children {
            self.print_node(w, child, &current)?;
        }
        Ok(())
    }
}

fn common_prefix(a: &[Token], b: &[Token]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
