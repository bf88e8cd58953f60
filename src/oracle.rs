//! The Oracle interface: a batched policy/value evaluator the search driver
//! calls between descents. The core is generic over it so a host can plug
//! in any network runtime.

use crate::board::{StateTensor, COLUMNS};

/// One evaluation for a single state tensor: a scalar value from the
/// perspective of the side to move, and a length-7 prior policy (unnormalized
/// over illegal columns; the driver never looks at entries for illegal
/// columns).
#[derive(Debug, Clone)]
pub struct RawEvaluation {
    pub value: f32,
    pub policy: Vec<f32>,
}

/// A batched value/policy evaluator. Implementors may run a neural network,
/// a lookup table, or anything else; the trait carries no error type because
/// shape and range validation happen once, centrally, in the search driver.
pub trait Oracle {
    fn evaluate_batch(&mut self, states: &[StateTensor]) -> Vec<RawEvaluation>;
}

/// A uniform-prior, zero-value stand-in used for tests and for exercising
/// the search machinery without a real network attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformOracle;

impl Oracle for UniformOracle {
    fn evaluate_batch(&mut self, states: &[StateTensor]) -> Vec<RawEvaluation> {
        states
            .iter()
            .map(|_| RawEvaluation {
                value: 0.0,
                policy: vec![1.0 / COLUMNS as f32; COLUMNS],
            })
            .collect()
    }
}
