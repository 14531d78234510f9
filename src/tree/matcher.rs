//! Read-only walks over a built [`Tree`].
//!
//! All walks share [`Tree::step`]: literal tokens must equal the next path byte, a wildcard
//! swallows bytes up to the next `/`, a catch-all swallows the rest and ends the walk. Once an
//! edge is consumed the walk continues into the child keyed by the next path byte, or else into
//! the dynamic child. A branch is never revisited: if the chosen child fails deeper down the
//! whole match fails.

use super::{Node, NodeId, Tree, ROOT};
use crate::pattern::Token;
use std::ops::Range;

/// Byte range of one captured value inside the matched path.
pub(crate) type Span = Range<usize>;

/// Receives capture spans during a walk.
pub(crate) trait CaptureSink {
    fn capture(&mut self, span: Span);
}

impl CaptureSink for Vec<Span> {
    fn capture(&mut self, span: Span) {
        self.push(span);
    }
}

/// Discards captures, used by [`Tree::match_only`].
impl CaptureSink for () {
    fn capture(&mut self, _: Span) {}
}

enum Step {
    Descend(NodeId, usize),
    Done(Option<NodeId>),
}

impl<S> Node<S> {
    fn next_child(&self, byte: u8) -> Option<NodeId> {
        self.indices
            .iter()
            .position(|&t| t == Token::Byte(byte) || t.is_capture())
            .map(|idx| self.children[idx])
    }
}

impl<S> Tree<S> {
    fn step<C: CaptureSink>(&self, id: NodeId, path: &[u8], mut pos: usize, captures: &mut C) -> Step {
        let node = &self.nodes[id.0];
        let len = path.len();

        for &token in &node.edge {
            if pos == len {
                return Step::Done(None);
            }

            match token {
                Token::Byte(b) if b == path[pos] => pos += 1,
                Token::Wildcard => {
                    let start = pos;
                    while pos < len && path[pos] != b'/' {
                        pos += 1;
                    }
                    captures.capture(start..pos);
                }
                Token::Catchall => {
                    captures.capture(pos..len);
                    return Step::Done(Some(id));
                }
                Token::Byte(_) => return Step::Done(None),
            }
        }

        if pos == len {
            return Step::Done(Some(id));
        }

        match node.next_child(path[pos]) {
            Some(child) => Step::Descend(child, pos),
            None => Step::Done(None),
        }
    }

    /// Finds the node for `path`, recording captured spans.
    pub(crate) fn match_one<C: CaptureSink>(&self, path: &str, captures: &mut C) -> Option<NodeId> {
        self.match_multiple(path, captures, |_| {})
    }

    /// Like [`Tree::match_one`] but calls `visit` with the slots of every node entered on the way
    /// down, the final one included, in root-to-leaf order.
    pub(crate) fn match_multiple<C, F>(&self, path: &str, captures: &mut C, mut visit: F) -> Option<NodeId>
    where
        C: CaptureSink,
        F: FnMut(&S),
    {
        let path = path.as_bytes();
        let mut id = ROOT;
        let mut pos = 0;

        loop {
            visit(&self.nodes[id.0].slots);
            match self.step(id, path, pos, captures) {
                Step::Descend(child, next) => {
                    id = child;
                    pos = next;
                }
                Step::Done(found) => return found,
            }
        }
    }

    /// Finds the node for `path` without recording captures.
    pub(crate) fn match_only(&self, path: &str) -> Option<NodeId> {
        self.match_one(path, &mut ())
    }
}
