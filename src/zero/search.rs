//! The Search Driver, Move Picker and Tree Reuse wrapper
//!: the crate's public entry point.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::board::{Board, COLUMNS};
use crate::dirichlet::mix_dirichlet_noise;
use crate::error::SearchError;
use crate::oracle::Oracle;

use super::step::{backpropagate, expand, select_descent, Descent, PruneMark};
use super::tree::Tree;
use crate::util::zip_eq_exact;

/// Tunables for one [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub c_puct: f32,
    /// Playouts to add on top of whatever visits the root already has when
    /// [`Search::run`]/[`Search::run_for`] is called (§4.8: after reuse this
    /// is relative to the reused subtree's visit count, not absolute).
    pub playouts: u32,
    pub batch_size: usize,
    /// Enables Dirichlet noise at expansion and move-selection time, and
    /// stochastic (rather than argmax) move picking.
    pub stochastic: bool,
    pub dir_alpha: f32,
    /// Enables deferred forced-win/forced-loss tree pruning.
    pub pruning: bool,
    pub history_depth: usize,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.playouts == 0 {
            return Err(SearchError::ConfigInvalidPlayouts(self.playouts));
        }
        if self.batch_size == 0 {
            return Err(SearchError::ConfigInvalidBatchSize(self.batch_size));
        }
        if self.c_puct < 0.0 {
            return Err(SearchError::ConfigInvalidCPuct(self.c_puct));
        }
        if self.dir_alpha <= 0.0 {
            return Err(SearchError::ConfigInvalidDirAlpha(self.dir_alpha));
        }
        Ok(())
    }
}

/// A snapshot of one node's search statistics, as returned by
/// [`Search::root_stats`] and [`Search::principal_variation`].
#[derive(Debug, Clone, Copy)]
pub struct NodeStats {
    pub mv: Option<u8>,
    pub visits: u64,
    pub q: f32,
    pub prior: Option<f32>,
}

/// An in-progress PUCT search over a fixed root board, reusable across
/// moves via [`Search::apply_and_reuse`].
///
/// Generic over the random source (§1: "the core consumes ... a random
/// source"), so a host can supply a seeded RNG for reproducible self-play or
/// tests rather than being locked into `rand::thread_rng()`.
pub struct Search<O, R> {
    tree: Tree,
    oracle: O,
    config: SearchConfig,
    rng: R,
    stop_flag: bool,
}

pub fn new_search<O: Oracle, R: Rng>(
    board: Board,
    oracle: O,
    rng: R,
    config: SearchConfig,
) -> Result<Search<O, R>, SearchError> {
    Search::new(board, oracle, rng, config)
}

impl<O: Oracle, R: Rng> Search<O, R> {
    pub fn new(board: Board, oracle: O, rng: R, config: SearchConfig) -> Result<Search<O, R>, SearchError> {
        config.validate()?;
        Ok(Search {
            tree: Tree::new(board),
            oracle,
            config,
            rng,
            stop_flag: false,
        })
    }

    /// Run playouts until `target.N >= target` or the deadline passes,
    /// checked between batches only.
    fn run_to_target(&mut self, target: u64, deadline: Option<Instant>) -> Result<(), SearchError> {
        loop {
            if self.stop_flag || self.tree.root_visits() >= target {
                return Ok(());
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(());
                }
            }
            self.run_batch()?;
        }
    }

    /// One batch: collect `batch_size` descents, evaluate the non-terminal
    /// leaves together, expand, backpropagate, then apply any deferred
    /// pruning marks.
    fn run_batch(&mut self) -> Result<(), SearchError> {
        let mut descents: Vec<Descent> = Vec::with_capacity(self.config.batch_size);
        for _ in 0..self.config.batch_size {
            descents.push(select_descent(&mut self.tree, self.config.c_puct, self.config.pruning));
            if self.tree.node(0).terminal {
                // the root itself is proven; no point collecting more descents
                break;
            }
        }

        // One coin flip per batch (§4.5 step 3): either every non-terminal
        // leaf's tensor is mirrored, or none are.
        let mirror_batch = self.config.stochastic && self.rng.gen_bool(0.5);

        let non_terminal_indices: Vec<usize> = descents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.terminal_value.is_none())
            .map(|(i, _)| i)
            .collect();

        let states: Vec<_> = non_terminal_indices
            .iter()
            .map(|&i| {
                let tensor = descents[i].board.state_tensor(self.config.history_depth);
                if mirror_batch {
                    mirror_state_tensor(&tensor, self.config.history_depth)
                } else {
                    tensor
                }
            })
            .collect();

        let raw_evals = if states.is_empty() {
            Vec::new()
        } else {
            self.oracle.evaluate_batch(&states)
        };

        if raw_evals.len() != states.len() {
            return Err(SearchError::OracleShapeBatch {
                expected: states.len(),
                got: raw_evals.len(),
            });
        }

        let mut leaf_values = vec![0.0f32; descents.len()];
        for (&i, eval) in zip_eq_exact(&non_terminal_indices, &raw_evals) {
            if eval.policy.len() != COLUMNS {
                return Err(SearchError::OracleShapePolicy(eval.policy.len()));
            }
            if !(-1.0..=1.0).contains(&eval.value) {
                return Err(SearchError::OracleShapeValue(eval.value));
            }

            let mut policy = [0.0f32; COLUMNS];
            policy.copy_from_slice(&eval.policy);
            if mirror_batch {
                policy.reverse();
            }

            let leaf = descents[i].leaf;
            let board_at_leaf = descents[i].board.clone();
            expand(
                &mut self.tree,
                leaf,
                policy,
                &board_at_leaf,
                self.config.stochastic,
                self.config.dir_alpha,
                &mut self.rng,
            );
            leaf_values[i] = eval.value;
        }

        for (i, descent) in descents.iter().enumerate() {
            let value = descent.terminal_value.unwrap_or(leaf_values[i]);
            backpropagate(&mut self.tree, &descent.path, value);
        }

        for descent in &descents {
            for &(idx, mark) in &descent.pending_prunes {
                match mark {
                    PruneMark::Terminal => {
                        let node = self.tree.node_mut(idx);
                        if !node.terminal {
                            node.terminal = true;
                            node.terminal_score = -1;
                        }
                    }
                    PruneMark::Flag => {
                        self.tree.node_mut(idx).prune = true;
                    }
                }
            }
        }

        Ok(())
    }

    /// Visit-share distribution over the root's children, root.N as the
    /// literal denominator with no correction for the shared leaves
    /// landing on an unexpanded root during the first batch.
    fn visit_distribution(&self) -> Result<[f64; COLUMNS], SearchError> {
        let root = self.tree.node(0);
        let children = root.children.ok_or(SearchError::EmptySearch)?;
        if root.visits == 0 {
            return Err(SearchError::EmptySearch);
        }

        let mut dist = [0.0f64; COLUMNS];
        for i in 0..children.len() {
            let idx = children.get(i);
            let child = self.tree.node(idx);
            let mv = child.mv.expect("child has a move") as usize;
            dist[mv] = child.visits as f64 / root.visits as f64;
        }
        Ok(dist)
    }

    pub fn run(&mut self) -> Result<[f64; COLUMNS], SearchError> {
        let target = self.tree.root_visits() + self.config.playouts as u64;
        self.run_to_target(target, None)?;
        self.visit_distribution()
    }

    pub fn run_for(&mut self, duration: Duration) -> Result<[f64; COLUMNS], SearchError> {
        let start = Instant::now();
        let deadline = start + duration;

        let mut target = self.tree.root_visits() + self.config.playouts as u64;
        self.run_to_target(target, Some(deadline))?;

        while Instant::now() < deadline && !self.stop_flag {
            target += 3 * self.config.batch_size as u64;
            self.run_to_target(target, Some(deadline))?;
        }

        self.visit_distribution()
    }

    /// Pick a move from the current root statistics: deterministic
    /// argmax (lowest index on ties) when not stochastic, otherwise
    /// Dirichlet-mixed, temperature-scaled sampling restricted to legal
    /// columns.
    pub fn pick_move(&mut self, temperature: f32) -> Result<u8, SearchError> {
        if temperature <= 0.0 {
            return Err(SearchError::ConfigInvalidTemperature(temperature));
        }

        let dist = self.visit_distribution()?;

        if !self.config.stochastic {
            let mut best: Option<usize> = None;
            for c in 0..COLUMNS {
                if dist[c] <= 0.0 {
                    continue;
                }
                match best {
                    None => best = Some(c),
                    Some(b) if dist[c] > dist[b] => best = Some(c),
                    _ => {}
                }
            }
            return best.map(|c| c as u8).ok_or(SearchError::EmptySearch);
        }

        let legal = self.tree.root_board().legal_moves();
        let mut probs = [0.0f32; COLUMNS];
        for c in 0..COLUMNS {
            probs[c] = dist[c] as f32;
        }
        mix_dirichlet_noise(&mut probs, &legal, self.config.dir_alpha, 0.84, 0.16, &mut self.rng);

        let mut logits = [f64::NEG_INFINITY; COLUMNS];
        for c in 0..COLUMNS {
            if legal[c] {
                logits[c] = ((probs[c] as f64) + 1e-10).ln() / temperature as f64;
            }
        }
        let max_logit = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let mut weights = [0.0f64; COLUMNS];
        let mut sum = 0.0;
        for c in 0..COLUMNS {
            if legal[c] {
                weights[c] = (logits[c] - max_logit).exp();
                sum += weights[c];
            }
        }
        if sum <= 0.0 {
            return Err(SearchError::EmptySearch);
        }

        let mut target = self.rng.gen::<f64>() * sum;
        let mut chosen = None;
        for c in 0..COLUMNS {
            if !legal[c] {
                continue;
            }
            if target < weights[c] {
                chosen = Some(c);
                break;
            }
            target -= weights[c];
        }

        let chosen = chosen.or_else(|| (0..COLUMNS).rev().find(|&c| legal[c]));
        chosen.map(|c| c as u8).ok_or(SearchError::EmptySearch)
    }

    /// Re-root the tree at the child reached by `column`, discarding the
    /// rest. Clears any pending stop request.
    pub fn apply_and_reuse(&mut self, column: u8) -> Result<(), SearchError> {
        self.tree.reuse(column)?;
        self.stop_flag = false;
        Ok(())
    }

    /// Signal [`Search::run_to_target`] (and thus `run`/`run_for`) to stop
    /// before the next batch.
    pub fn stop(&mut self) {
        self.stop_flag = true;
    }

    /// The root's visit count, i.e. the number of completed playouts since
    /// the tree was created or last re-rooted.
    pub fn root_visits(&self) -> u64 {
        self.tree.root_visits()
    }

    pub fn root_stats(&self) -> Vec<NodeStats> {
        let root = self.tree.node(0);
        match root.children {
            None => Vec::new(),
            Some(range) => (0..range.len())
                .map(|i| {
                    let node = self.tree.node(range.get(i));
                    NodeStats {
                        mv: node.mv,
                        visits: node.visits,
                        q: node.q(),
                        prior: node.prior,
                    }
                })
                .collect(),
        }
    }

    /// Greedy max-visits walk from the root, lowest child index breaking
    /// ties, stopping at the first unexpanded node.
    pub fn principal_variation(&self) -> Vec<NodeStats> {
        let mut out = Vec::new();
        let mut curr = 0usize;
        loop {
            let children = match self.tree.node(curr).children {
                Some(range) => range,
                None => break,
            };

            let mut best_idx = children.get(0);
            for i in 1..children.len() {
                let idx = children.get(i);
                if self.tree.node(idx).visits > self.tree.node(best_idx).visits {
                    best_idx = idx;
                }
            }

            let node = self.tree.node(best_idx);
            out.push(NodeStats {
                mv: node.mv,
                visits: node.visits,
                q: node.q(),
                prior: node.prior,
            });
            curr = best_idx;
        }
        out
    }
}

/// Mirror a state tensor column-wise within every plane (§4.6 symmetry
/// augmentation): `new[plane][c][r] = old[plane][6-c][r]`.
fn mirror_state_tensor(tensor: &crate::board::StateTensor, history_depth: usize) -> crate::board::StateTensor {
    let planes = 2 * history_depth + 1;
    let plane_len = COLUMNS * super::super::board::ROWS;
    let rows = super::super::board::ROWS;
    let mut data = vec![0.0f32; tensor.data.len()];
    for p in 0..planes {
        for c in 0..COLUMNS {
            let src_c = COLUMNS - 1 - c;
            for r in 0..rows {
                data[p * plane_len + c * rows + r] = tensor.data[p * plane_len + src_c * rows + r];
            }
        }
    }
    crate::board::StateTensor { data, history_depth }
}
