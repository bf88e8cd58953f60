//! Shared test doubles and board-construction helpers for the
//! property/scenario integration tests.

use c4_zero_core::board::{Board, StateTensor, COLUMNS, ROWS};
use c4_zero_core::oracle::{Oracle, RawEvaluation};

/// An oracle whose policy is a pure function of the state tensor's own
/// per-column content (piece counts in that column across every plane),
/// and whose value is always 0. Used for the mirror-symmetry scenario:
/// because it never looks at absolute board identity, only the shape of
/// the tensor handed to it, evaluating it on a board and on that board's
/// exact left-right mirror necessarily produces mirror-reversed policies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnContentOracle;

impl Oracle for ColumnContentOracle {
    fn evaluate_batch(&mut self, states: &[StateTensor]) -> Vec<RawEvaluation> {
        states
            .iter()
            .map(|state| {
                let plane_len = COLUMNS * ROWS;
                let mut weight = [1.0f32; COLUMNS];
                for p in 0..state.planes() {
                    for c in 0..COLUMNS {
                        for r in 0..ROWS {
                            weight[c] += state.data[p * plane_len + c * ROWS + r];
                        }
                    }
                }
                let sum: f32 = weight.iter().sum();
                RawEvaluation {
                    value: 0.0,
                    policy: weight.iter().map(|&w| w / sum).collect(),
                }
            })
            .collect()
    }
}

/// An oracle that always returns the same configured value, regardless of
/// board content, with an otherwise-uniform policy. Used to drive a known,
/// non-zero, asymmetric evaluation through the real `Oracle` trait boundary
/// and into `backpropagate`, so tests can check the sign convention end to
/// end instead of only through hand-constructed values.
#[derive(Debug, Clone, Copy)]
pub struct ConstantValueOracle {
    pub value: f32,
}

impl Oracle for ConstantValueOracle {
    fn evaluate_batch(&mut self, states: &[StateTensor]) -> Vec<RawEvaluation> {
        states
            .iter()
            .map(|_| RawEvaluation {
                value: self.value,
                policy: vec![1.0 / COLUMNS as f32; COLUMNS],
            })
            .collect()
    }
}

/// Build the exact left-right mirror of `board` by replaying its move
/// history with every column index mirrored (`c` -> `6-c`).
pub fn mirror_board(board: &Board) -> Board {
    let mut mirrored = Board::new();
    for &col in board.move_history() {
        mirrored.apply(Board::mirrored_column(col)).unwrap();
    }
    mirrored
}

/// A board with column 0 filled solid (alternating players, no four-in-a-row)
/// and every other column still open: asymmetric under mirroring, so it is
/// useful for checking that the mirror-symmetry property isn't trivially
/// satisfied by board-shape symmetry alone.
pub fn column_zero_filled_board() -> Board {
    let mut board = Board::new();
    for _ in 0..ROWS {
        board.apply(0).unwrap();
    }
    board
}
