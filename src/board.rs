//! The Connect Four game model: grid, legal moves, terminal
//! detection, apply/undo, and the fixed-shape state tensor fed to the Oracle.

use std::fmt;

use itertools::Itertools;

use crate::error::SearchError;

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 6;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Cell {
    Empty,
    Occupied(Player),
}

/// Outcome of [`Board::check_terminal`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Outcome {
    None,
    Draw,
    Win,
}

type Grid = [[Cell; ROWS]; COLUMNS];

const EMPTY_GRID: Grid = [[Cell::Empty; ROWS]; COLUMNS];

/// A 7x6 drop-piece board plus enough history to compute the state tensor
/// for the configured history depth.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Board {
    grid: Grid,
    heights: [u8; COLUMNS],
    side_to_move: Player,
    move_history: Vec<u8>,
    /// Every grid seen so far, oldest first, including the current one.
    position_history: Vec<Grid>,
}

impl Board {
    pub fn new() -> Board {
        Board {
            grid: EMPTY_GRID,
            heights: [0; COLUMNS],
            side_to_move: Player::A,
            move_history: Vec::new(),
            position_history: vec![EMPTY_GRID],
        }
    }

    pub fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    pub fn move_history(&self) -> &[u8] {
        &self.move_history
    }

    pub fn tile(&self, col: usize, row: usize) -> Cell {
        self.grid[col][row]
    }

    pub fn legal_moves(&self) -> [bool; COLUMNS] {
        let mut out = [false; COLUMNS];
        for c in 0..COLUMNS {
            out[c] = (self.heights[c] as usize) < ROWS;
        }
        out
    }

    fn is_legal(&self, col: u8) -> bool {
        (col as usize) < COLUMNS && (self.heights[col as usize] as usize) < ROWS
    }

    /// Drop a piece for the side to move into `col`.
    pub fn apply(&mut self, col: u8) -> Result<(), SearchError> {
        if !self.is_legal(col) {
            return Err(SearchError::IllegalMove(col));
        }

        let row = self.heights[col as usize] as usize;
        self.grid[col as usize][row] = Cell::Occupied(self.side_to_move);
        self.heights[col as usize] += 1;
        self.move_history.push(col);
        self.side_to_move = self.side_to_move.other();
        self.position_history.push(self.grid);

        Ok(())
    }

    /// Reverse the last [`Board::apply`] exactly.
    pub fn undo(&mut self) -> Result<(), SearchError> {
        let col = self.move_history.pop().ok_or(SearchError::NoHistory)?;
        self.position_history.pop();

        self.side_to_move = self.side_to_move.other();
        self.heights[col as usize] -= 1;
        let row = self.heights[col as usize] as usize;
        self.grid[col as usize][row] = Cell::Empty;

        Ok(())
    }

    /// Win if any horizontal, vertical or diagonal run of four equal
    /// non-empty cells exists; otherwise Draw if the board is full, else
    /// None. Columns are scanned first, then rows, then both diagonals.
    pub fn check_terminal(&self) -> Outcome {
        let cell = |c: i32, r: i32| -> Option<Cell> {
            if c < 0 || r < 0 || c as usize >= COLUMNS || r as usize >= ROWS {
                None
            } else {
                Some(self.grid[c as usize][r as usize])
            }
        };

        let four_in_a_row = |start: (i32, i32), step: (i32, i32)| -> bool {
            let (mut c, mut r) = start;
            let mut run_cell = Cell::Empty;
            let mut run_len = 0u8;
            loop {
                match cell(c, r) {
                    None => return false,
                    Some(Cell::Empty) => {
                        run_len = 0;
                    }
                    Some(occ) => {
                        if occ == run_cell {
                            run_len += 1;
                        } else {
                            run_cell = occ;
                            run_len = 1;
                        }
                        if run_len >= 4 {
                            return true;
                        }
                    }
                }
                c += step.0;
                r += step.1;
            }
        };

        // columns (vertical runs)
        for c in 0..COLUMNS as i32 {
            if four_in_a_row((c, 0), (0, 1)) {
                return Outcome::Win;
            }
        }
        // rows (horizontal runs)
        for r in 0..ROWS as i32 {
            if four_in_a_row((0, r), (1, 0)) {
                return Outcome::Win;
            }
        }
        // diagonals, both directions, scanning every cell on the border as a
        // potential run start so short diagonals near the corners are covered
        for c in 0..COLUMNS as i32 {
            if four_in_a_row((c, 0), (1, 1)) {
                return Outcome::Win;
            }
            if four_in_a_row((c, ROWS as i32 - 1), (1, -1)) {
                return Outcome::Win;
            }
        }
        for r in 0..ROWS as i32 {
            if four_in_a_row((0, r), (1, 1)) {
                return Outcome::Win;
            }
            if four_in_a_row((0, r), (1, -1)) {
                return Outcome::Win;
            }
        }

        if self.legal_moves().iter().any(|&l| l) {
            Outcome::None
        } else {
            Outcome::Draw
        }
    }

    pub fn snapshot(&self) -> Board {
        self.clone()
    }

    /// Build the `7*6*(2H+1)` state tensor described in §3: a side-to-move
    /// plane, then for each of the last `history_depth` positions (oldest
    /// first, zero-padded if fewer exist) one plane for A's pieces and one
    /// for B's.
    pub fn state_tensor(&self, history_depth: usize) -> StateTensor {
        let plane_len = COLUMNS * ROWS;
        let planes = 2 * history_depth + 1;
        let mut data = vec![0.0f32; planes * plane_len];

        if self.side_to_move == Player::A {
            data[0..plane_len].fill(1.0);
        }

        let total = self.position_history.len();
        let take = history_depth.min(total);
        let pad = history_depth - take;
        let recent = &self.position_history[total - take..];

        for h in 0..history_depth {
            if h < pad {
                continue;
            }
            let grid = &recent[h - pad];
            let plane_a = 1 + 2 * h;
            let plane_b = plane_a + 1;
            for c in 0..COLUMNS {
                for r in 0..ROWS {
                    match grid[c][r] {
                        Cell::Occupied(Player::A) => data[plane_a * plane_len + c * ROWS + r] = 1.0,
                        Cell::Occupied(Player::B) => data[plane_b * plane_len + c * ROWS + r] = 1.0,
                        Cell::Empty => {}
                    }
                }
            }
        }

        StateTensor { data, history_depth }
    }

    /// Mirror the board left-to-right (column `c` <-> column `6-c`). Used by
    /// the Search Driver's symmetry augmentation only at the tensor level;
    /// exposed here so tests can check move-index equivalence directly.
    pub fn mirrored_column(col: u8) -> u8 {
        COLUMNS as u8 - 1 - col
    }

    fn set_tile_for_compact(&mut self, col: usize, row: usize, player: Player) {
        self.grid[col][row] = Cell::Occupied(player);
        if row as u8 >= self.heights[col] {
            self.heights[col] = row as u8 + 1;
        }
    }

    /// Parse the position-set grammar fixed in §6: six `/`-separated rows
    /// (top row first, as in [`Board::fmt`]), each row a sequence of `X`,
    /// `O` or digits 1-6 meaning that many empty cells, followed by a
    /// trailing side-to-move token `X` or `O`.
    pub fn from_compact_string(s: &str) -> Option<Board> {
        let mut parts = s.split('/');
        let rows: Vec<&str> = (&mut parts).take(ROWS).collect();
        if rows.len() != ROWS {
            return None;
        }
        let trailer = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let side_char = trailer.chars().last()?;
        let side = match side_char {
            'X' => Player::A,
            'O' => Player::B,
            _ => return None,
        };
        let last_row_body = &trailer[..trailer.len() - side_char.len_utf8()];

        let mut board = Board::new();
        // rows are given top (row index ROWS-1) to bottom (row index 0)
        for (display_row, row_str) in rows
            .iter()
            .copied()
            .chain(std::iter::once(last_row_body))
            .enumerate()
        {
            let row = ROWS - 1 - display_row;
            let mut col = 0usize;
            for ch in row_str.chars() {
                if col >= COLUMNS {
                    return None;
                }
                match ch {
                    'X' => {
                        board.set_tile_for_compact(col, row, Player::A);
                        col += 1;
                    }
                    'O' => {
                        board.set_tile_for_compact(col, row, Player::B);
                        col += 1;
                    }
                    '1'..='6' => {
                        col += ch.to_digit(10).unwrap() as usize;
                    }
                    _ => return None,
                }
            }
            if col != COLUMNS {
                return None;
            }
        }

        board.side_to_move = side;
        board.position_history = vec![board.grid];
        Some(board)
    }

    /// Format in the grammar [`Board::from_compact_string`] parses.
    pub fn to_compact_string(&self) -> String {
        let rows = (0..ROWS)
            .map(|display_row| {
                let row = ROWS - 1 - display_row;
                let mut out = String::new();
                let mut empty_run = 0u32;
                for c in 0..COLUMNS {
                    match self.grid[c][row] {
                        Cell::Empty => empty_run += 1,
                        Cell::Occupied(p) => {
                            if empty_run > 0 {
                                out.push_str(&empty_run.to_string());
                                empty_run = 0;
                            }
                            out.push(match p {
                                Player::A => 'X',
                                Player::B => 'O',
                            });
                        }
                    }
                }
                if empty_run > 0 {
                    out.push_str(&empty_run.to_string());
                }
                out
            })
            .join("/");

        let side = match self.side_to_move {
            Player::A => 'X',
            Player::B => 'O',
        };
        format!("{rows}/{side}")
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for display_row in 0..ROWS {
            let row = ROWS - 1 - display_row;
            write!(f, "|")?;
            for c in 0..COLUMNS {
                let ch = match self.grid[c][row] {
                    Cell::Empty => ' ',
                    Cell::Occupied(Player::A) => 'X',
                    Cell::Occupied(Player::B) => 'O',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f, " |")?;
        }
        write!(f, " ")?;
        for c in 0..COLUMNS {
            write!(f, " {c}")?;
        }
        writeln!(f)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board({})", self.to_compact_string())
    }
}

/// The fixed-shape `7*6*(2H+1)` numeric input to the Oracle.
#[derive(Debug, Clone)]
pub struct StateTensor {
    pub data: Vec<f32>,
    pub history_depth: usize,
}

impl StateTensor {
    pub fn planes(&self) -> usize {
        2 * self.history_depth + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_undo_round_trip() {
        let mut board = Board::new();
        let original = board.clone();
        for &col in &[3u8, 3, 2, 4, 1, 5] {
            board.apply(col).unwrap();
        }
        for _ in 0..6 {
            board.undo().unwrap();
        }
        assert_eq!(board, original);
    }

    #[test]
    fn undo_without_history_errors() {
        let mut board = Board::new();
        assert_eq!(board.undo(), Err(SearchError::NoHistory));
    }

    #[test]
    fn full_column_is_illegal() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.apply(0).unwrap();
            if board.legal_moves()[0] {
                board.apply(0).unwrap();
            }
        }
        // alternate players fill column 0 exactly ROWS times above; it must now be full
        assert!(!board.legal_moves()[0]);
        assert_eq!(board.apply(0), Err(SearchError::IllegalMove(0)));
    }

    #[test]
    fn horizontal_win_detected() {
        let mut board = Board::new();
        // X plays 0,1,2,3 on the bottom row; O plays elsewhere in between
        for (mv, other) in [(0u8, 0u8), (1, 1), (2, 2)] {
            board.apply(mv).unwrap();
            board.apply(COLUMNS as u8 - 1 - other).unwrap();
        }
        assert_eq!(board.check_terminal(), Outcome::None);
        board.apply(3).unwrap();
        assert_eq!(board.check_terminal(), Outcome::Win);
    }

    #[test]
    fn vertical_win_detected() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.apply(0).unwrap();
            board.apply(1).unwrap();
        }
        assert_eq!(board.check_terminal(), Outcome::None);
        board.apply(0).unwrap();
        assert_eq!(board.check_terminal(), Outcome::Win);
    }

    #[test]
    fn diagonal_win_detected() {
        let mut board = Board::new();
        // build a rising diagonal for X at (0,0) (1,1) (2,2) (3,3)
        let moves: [u8; 9] = [0, 1, 1, 2, 3, 2, 2, 3, 3];
        for (i, &mv) in moves.iter().enumerate() {
            board.apply(mv).unwrap();
            if i == moves.len() - 1 {
                break;
            }
        }
        board.apply(3).unwrap();
        assert_eq!(board.check_terminal(), Outcome::Win);
    }

    #[test]
    fn compact_string_round_trip() {
        let mut board = Board::new();
        for &col in &[3u8, 2, 4, 1] {
            board.apply(col).unwrap();
        }
        let s = board.to_compact_string();
        let parsed = Board::from_compact_string(&s).expect("valid grammar");
        assert_eq!(parsed.side_to_move(), board.side_to_move());
        assert_eq!(parsed.legal_moves(), board.legal_moves());
        assert_eq!(parsed.to_compact_string(), s);
    }

    #[test]
    fn state_tensor_shape_and_side_plane() {
        let board = Board::new();
        let tensor = board.state_tensor(2);
        assert_eq!(tensor.data.len(), COLUMNS * ROWS * 5);
        // side to move A => plane 0 is all ones
        assert!(tensor.data[0..COLUMNS * ROWS].iter().all(|&x| x == 1.0));
    }

    #[test]
    fn legal_moves_match_open_columns() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.apply(2).unwrap();
            if board.legal_moves()[2] {
                board.apply(2).unwrap();
            }
        }
        let open: Vec<usize> = (0..COLUMNS)
            .filter(|&c| board.legal_moves()[c])
            .sorted_by_key(|&c| c)
            .collect_vec();
        assert_eq!(open, vec![0, 1, 3, 4, 5, 6]);
    }
}
