//! 3x3 board state and win detection.

use std::fmt;

/// The 8 winning triples: 3 rows, 3 columns, 2 diagonals.
const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's mark on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(&self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Game board state. X always moves first.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [Option<Mark>; 9],
    next_mark: Mark,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; 9],
            next_mark: Mark::X,
        }
    }

    /// The mark in a cell, if any. `index` must be in 0..9; anything out of
    /// range panics.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells[index]
    }

    /// Whose turn it is.
    pub fn next_mark(&self) -> Mark {
        self.next_mark
    }

    /// The winning mark, if any triple is complete.
    pub fn winner(&self) -> Option<Mark> {
        for [a, b, c] in WINNING_LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Game is over on a win or a cat's game.
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// Attempt a move at `index`. A click is accepted only when the cell is
    /// empty and no winner has been declared; accepting flips whose turn it
    /// is. Returns whether the move was accepted.
    pub fn play(&mut self, index: usize) -> bool {
        if index >= 9 || self.cells[index].is_some() || self.winner().is_some() {
            return false;
        }
        self.cells[index] = Some(self.next_mark);
        self.next_mark = self.next_mark.other();
        true
    }

    /// Clear all cells and hand the first move back to X.
    pub fn reset(&mut self) {
        self.cells = [None; 9];
        self.next_mark = Mark::X;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Play a sequence of moves, asserting each is accepted.
    fn play_all(board: &mut Board, moves: &[usize]) {
        for &m in moves {
            assert!(board.play(m), "move at {} should be accepted", m);
        }
    }

    #[test]
    fn test_empty_board_has_no_winner() {
        let board = Board::new();
        assert_eq!(board.winner(), None);
        assert!(!board.is_full());
        assert!(!board.is_terminal());
    }

    #[test]
    fn test_x_moves_first() {
        let mut board = Board::new();
        assert_eq!(board.next_mark(), Mark::X);
        assert!(board.play(4));
        assert_eq!(board.cell(4), Some(Mark::X));
    }

    #[test]
    fn test_marks_alternate() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 1, 2, 3]);
        assert_eq!(board.cell(0), Some(Mark::X));
        assert_eq!(board.cell(1), Some(Mark::O));
        assert_eq!(board.cell(2), Some(Mark::X));
        assert_eq!(board.cell(3), Some(Mark::O));
        // 4 accepted moves: X is next again
        assert_eq!(board.next_mark(), Mark::X);
    }

    #[test]
    fn test_every_winning_line_detected() {
        let lines: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];
        for line in lines {
            let mut board = Board::new();
            // X takes the line; O plays filler cells off the line
            let filler: Vec<usize> = (0..9).filter(|i| !line.contains(i)).collect();
            assert!(board.play(line[0]));
            assert!(board.play(filler[0]));
            assert!(board.play(line[1]));
            assert!(board.play(filler[1]));
            assert!(board.play(line[2]));
            assert_eq!(board.winner(), Some(Mark::X), "line {:?} not detected", line);
            assert!(board.is_terminal());
        }
    }

    #[test]
    fn test_o_can_win() {
        let mut board = Board::new();
        // X: 0, 1, 5; O: 3, 4 then 5 is taken so O takes the middle row
        play_all(&mut board, &[0, 3, 1, 4, 8, 5]);
        assert_eq!(board.winner(), Some(Mark::O));
    }

    #[test]
    fn test_cats_game_full_board_no_winner() {
        let mut board = Board::new();
        // X O X / X O O / O X X
        play_all(&mut board, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        assert!(board.is_terminal());
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut board = Board::new();
        assert!(board.play(4));
        assert!(!board.play(4));
        // Rejected move does not flip the turn
        assert_eq!(board.next_mark(), Mark::O);
        assert_eq!(board.cell(4), Some(Mark::X));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut board = Board::new();
        assert!(!board.play(9));
        assert_eq!(board.next_mark(), Mark::X);
    }

    #[test]
    fn test_no_moves_after_winner() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 3, 1, 4, 2]); // X wins the top row
        assert_eq!(board.winner(), Some(Mark::X));
        assert!(!board.play(5));
        assert_eq!(board.cell(5), None);
        assert_eq!(board.next_mark(), Mark::O);
    }

    #[test]
    fn test_reset_clears_board_and_turn() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 3, 1, 4, 2]);
        board.reset();
        assert_eq!(board.next_mark(), Mark::X);
        assert_eq!(board.winner(), None);
        for i in 0..9 {
            assert_eq!(board.cell(i), None);
        }
    }
}
