/// A (row, column) coordinate inside a token grid. Ordered by row, then by
/// column. Columns advance by the width of the preceding token on the row,
/// so most columns never hold a token.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const START: Position = Position { row: 0, col: 0 };

    pub const fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    pub const fn row_start(row: usize) -> Position {
        Position { row, col: 0 }
    }

    pub fn is_row_start(&self) -> bool {
        self.col == 0
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.row, self.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}
