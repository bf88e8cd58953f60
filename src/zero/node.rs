//! The arena node: visit counts, virtual loss, the PUCT formula.

use super::range::ChildRange;

/// Constant from the PUCT exploration-scale formula; fixed, not
/// exposed for tuning.
const C_BASE: f32 = 19652.0;

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<usize>,
    pub mv: Option<u8>,
    pub children: Option<ChildRange>,
    pub prior: Option<f32>,
    pub visits: u64,
    pub total_value: f32,
    pub virtual_loss: u32,
    pub terminal: bool,
    /// +1 win for the side to move at this node, 0 draw, meaningless unless
    /// `terminal`.
    pub terminal_score: i8,
    /// Set once every child has been shown to be a proven loss for the side
    /// to move there; never un-set.
    pub prune: bool,
}

impl Node {
    pub fn root() -> Node {
        Node {
            parent: None,
            mv: None,
            children: None,
            prior: None,
            visits: 0,
            total_value: 0.0,
            virtual_loss: 0,
            terminal: false,
            terminal_score: 0,
            prune: false,
        }
    }

    pub fn new_child(parent: usize, mv: u8, prior: f32, terminal: bool, terminal_score: i8) -> Node {
        Node {
            parent: Some(parent),
            mv: Some(mv),
            children: None,
            prior: Some(prior),
            visits: 0,
            total_value: 0.0,
            virtual_loss: 0,
            terminal,
            terminal_score,
            prune: false,
        }
    }

    /// Mean action value including virtual loss. `-1.0` first-play
    /// urgency when a node has never been visited and carries no virtual
    /// loss; a pruned node's value is forced below any real evaluation so it
    /// is never selected again.
    pub fn q(&self) -> f32 {
        let denom = self.visits as f32 + self.virtual_loss as f32;
        if self.prune {
            let ratio = if denom == 0.0 {
                0.0
            } else {
                (self.total_value - self.virtual_loss as f32) / denom
            };
            return -2.0 * self.visits as f32 + ratio;
        }

        if denom == 0.0 {
            return -1.0;
        }
        (self.total_value - self.virtual_loss as f32) / denom
    }

    /// Visits plus in-flight virtual loss: the effective visit count used by
    /// the exploration term so that sibling descents *within the same batch*
    /// actually spread across children instead of all tying on the bare `N`
    /// (which virtual loss alone does not move, since an unvisited node's `Q`
    /// stays pinned at the `-1` FPU value regardless of how much virtual loss
    /// piles onto it). Matches the teacher's `total_visits` (`complete_visits
    /// + virtual_visits`) used on both sides of its own `uct` exploration term.
    pub fn effective_visits(&self) -> u64 {
        self.visits + self.virtual_loss as u64
    }

    /// PUCT score used by the Selector. A proven win is `+inf` so it
    /// is always chosen; the exploration scale grows logarithmically with
    /// the parent's effective visit count (real visits plus in-flight
    /// virtual loss).
    pub fn puct_score(&self, parent_effective_visits: u64, c_puct: f32) -> f32 {
        if self.terminal && self.terminal_score > 0 {
            return f32::INFINITY;
        }

        let scale = ((parent_effective_visits as f32 + C_BASE + 1.0) / C_BASE).ln() + c_puct;
        let u = scale * self.prior.unwrap_or(0.0) * (parent_effective_visits as f32).sqrt()
            / (1.0 + self.effective_visits() as f32);
        self.q() + u
    }
}
