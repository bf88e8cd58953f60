//! The search tree: an arena of [`Node`]s plus the board position at the
//! root, and re-rooting for tree reuse across moves.

use std::collections::VecDeque;

use crate::board::Board;
use crate::error::SearchError;

use super::node::Node;

pub struct Tree {
    root_board: Board,
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(root_board: Board) -> Tree {
        Tree {
            root_board,
            nodes: vec![Node::root()],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_board(&self) -> &Board {
        &self.root_board
    }

    pub fn root_visits(&self) -> u64 {
        self.nodes[0].visits
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// Append a new node, returning its arena index.
    pub fn push_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Re-root the tree at the child reached by playing `column`, discarding
    /// every node outside that subtree and rebuilding a fresh, compact arena
    /// breadth-first. Unlike a naive rebuild, every child's `parent`
    /// index is re-patched to its new position so the field stays valid
    /// after reuse.
    pub fn reuse(&mut self, column: u8) -> Result<(), SearchError> {
        let root = &self.nodes[0];
        let new_root_old_idx = root.children.and_then(|range| {
            range.into_iter().find(|&idx| self.nodes[idx].mv == Some(column))
        });

        let mut new_board = self.root_board.clone();
        new_board.apply(column)?;

        let new_root_old_idx = match new_root_old_idx {
            Some(idx) => idx,
            None => {
                // column was legal but never expanded under search; start a
                // fresh one-node tree at the resulting position.
                self.root_board = new_board;
                self.nodes = vec![Node::root()];
                return Ok(());
            }
        };

        let mut new_nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut old_to_new = vec![usize::MAX; self.nodes.len()];

        let mut new_root = self.nodes[new_root_old_idx].clone();
        new_root.parent = None;
        new_root.mv = None;
        new_root.prior = None;
        new_nodes.push(new_root);
        old_to_new[new_root_old_idx] = 0;

        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(new_root_old_idx);

        while let Some(old_idx) = queue.pop_front() {
            let new_idx = old_to_new[old_idx];
            if let Some(range) = self.nodes[old_idx].children {
                let children: Vec<usize> = range.into_iter().collect();
                let start = new_nodes.len();
                for &old_child in &children {
                    let mut child = self.nodes[old_child].clone();
                    child.parent = Some(new_idx);
                    old_to_new[old_child] = new_nodes.len();
                    new_nodes.push(child);
                }
                let end = new_nodes.len();
                new_nodes[new_idx].children = Some(super::range::ChildRange::new(start, end));
                queue.extend(children);
            }
        }

        self.root_board = new_board;
        self.nodes = new_nodes;
        Ok(())
    }
}
