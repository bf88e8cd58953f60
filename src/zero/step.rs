//! Selector, Expander and Back-propagator: one call each
//! per playout, batched together by the Search Driver.

use rand::Rng;

use crate::board::{Board, COLUMNS};
use crate::dirichlet::mix_dirichlet_noise;

use super::node::Node;
use super::range::ChildRange;
use super::tree::Tree;

/// A deferred tree-pruning mark produced while selecting a batch of
/// descents. Applying these before the next batch (and only after the
/// current batch has fully backpropagated) avoids a descent in the same
/// batch observing a half-updated tree.
#[derive(Debug, Copy, Clone)]
pub enum PruneMark {
    /// `curr` is now a proven loss for the side to move there; treat as
    /// terminal with `terminal_score = -1` going forward.
    Terminal,
    /// `curr` has at least one proven-winning reply available and should no
    /// longer be explored as if merely unlucky; mark `prune`.
    Flag,
}

/// One descent from the root to a leaf, ready to be evaluated and
/// backpropagated.
pub struct Descent {
    /// Root-to-leaf path, root first.
    pub path: Vec<usize>,
    pub leaf: usize,
    /// Board position at `leaf`.
    pub board: Board,
    /// `Some(v)` if `leaf` is terminal and needs no oracle evaluation.
    pub terminal_value: Option<f32>,
    pub pending_prunes: Vec<(usize, PruneMark)>,
}

/// Walk from the root to an unexpanded or terminal node, applying virtual
/// loss along the way. Ties among equal PUCT scores are broken by the
/// lowest child index, which requires a manual scan: `Iterator::max_by_key`
/// keeps the *last* maximum on a tie, the wrong direction here.
pub fn select_descent(tree: &mut Tree, c_puct: f32, pruning: bool) -> Descent {
    let mut path = Vec::new();
    let mut board = tree.root_board().clone();
    let mut pending_prunes = Vec::new();

    let mut curr = 0usize;
    loop {
        path.push(curr);
        tree.node_mut(curr).virtual_loss += 1;

        if tree.node(curr).terminal {
            let value = -(tree.node(curr).terminal_score.abs() as f32);
            return Descent {
                path,
                leaf: curr,
                board,
                terminal_value: Some(value),
                pending_prunes,
            };
        }

        let children = match tree.node(curr).children {
            Some(range) => range,
            None => {
                return Descent {
                    path,
                    leaf: curr,
                    board,
                    terminal_value: None,
                    pending_prunes,
                }
            }
        };

        // `curr`'s own virtual loss was already bumped above, so this reflects
        // in-flight sibling descents from earlier in the same batch.
        let parent_visits = tree.node(curr).effective_visits();
        let mut best_idx = children.get(0);
        let mut best_score = tree.node(best_idx).puct_score(parent_visits, c_puct);
        for i in 1..children.len() {
            let idx = children.get(i);
            let score = tree.node(idx).puct_score(parent_visits, c_puct);
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        if pruning {
            if best_score <= -1.0 {
                pending_prunes.push((curr, PruneMark::Terminal));
                return Descent {
                    path,
                    leaf: curr,
                    board,
                    terminal_value: Some(-1.0),
                    pending_prunes,
                };
            }
            if best_score.is_infinite() {
                pending_prunes.push((curr, PruneMark::Flag));
            }
        }

        board
            .apply(tree.node(best_idx).mv.expect("non-root node has a move"))
            .expect("child move is always legal");
        curr = best_idx;
    }
}

/// Materialize children for `leaf` from a freshly-evaluated policy. A no-op
/// if another descent in the same batch already expanded this leaf (shared
/// leaves are expected under virtual loss, §4.5).
pub fn expand(
    tree: &mut Tree,
    leaf: usize,
    mut priors: [f32; COLUMNS],
    board_at_leaf: &Board,
    stochastic: bool,
    dir_alpha: f32,
    rng: &mut impl Rng,
) {
    if tree.node(leaf).children.is_some() {
        return;
    }

    let legal = board_at_leaf.legal_moves();
    if stochastic {
        mix_dirichlet_noise(&mut priors, &legal, dir_alpha, 0.5, 0.5, rng);
    }

    let start = tree.len();
    for col in 0..COLUMNS as u8 {
        if !legal[col as usize] {
            continue;
        }
        let mut child_board = board_at_leaf.clone();
        child_board.apply(col).expect("legal move");
        let (terminal, terminal_score) = match child_board.check_terminal() {
            crate::board::Outcome::Win => (true, 1),
            crate::board::Outcome::Draw => (true, 0),
            crate::board::Outcome::None => (false, 0),
        };
        let node = Node::new_child(leaf, col, priors[col as usize], terminal, terminal_score);
        tree.push_node(node);
    }
    let end = tree.len();

    if end > start {
        tree.node_mut(leaf).children = Some(ChildRange::new(start, end));
    }
}

/// Propagate a leaf evaluation back to the root, flipping sign at every
/// step and releasing the virtual loss applied during selection.
///
/// `leaf_value` is the evaluation for the side to move *at* the leaf; the
/// leaf node itself stores the value from the perspective of whoever chose
/// the move into it (its parent's mover), matching `terminal_score`'s own
/// "win for the player who just moved" convention, so the sign is flipped
/// once before the very first accumulation.
pub fn backpropagate(tree: &mut Tree, path: &[usize], leaf_value: f32) {
    let mut value = -leaf_value;
    for &idx in path.iter().rev() {
        let node = tree.node_mut(idx);
        node.visits += 1;
        node.total_value += value;
        if node.virtual_loss > 0 {
            node.virtual_loss -= 1;
        }
        value = -value;
    }
}
