//! PUCT/MCTS search core for a neural-network-guided Connect Four engine.
//!
//! This crate owns the board model, the search tree, and the batched
//! select/expand/backpropagate loop. It knows nothing about how the policy
//! and value network is trained, serialized, or served: callers provide an
//! [`oracle::Oracle`] implementation and drive the search through
//! [`zero::search::Search`].

pub mod board;
pub mod dirichlet;
pub mod error;
pub mod oracle;
pub(crate) mod util;
pub mod zero;

pub use board::{Board, Cell, Outcome, Player, StateTensor, COLUMNS, ROWS};
pub use error::SearchError;
pub use oracle::{Oracle, RawEvaluation, UniformOracle};
pub use zero::search::{new_search, NodeStats, Search, SearchConfig};
