pub const SIZE: usize = 3;
pub const CELLS: usize = SIZE * SIZE;

/// The eight lines of three: rows, columns, then both diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    /// Absolute encoding used as network input: X = +1, O = -1, empty = 0.
    pub fn value(self) -> f64 {
        match self {
            Cell::Empty => 0.0,
            Cell::X => 1.0,
            Cell::O => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceError {
    OutOfBounds,
    Occupied,
}

/// Flatten a coordinate into an action index (`row * 3 + col`).
pub fn to_action(row: usize, col: usize) -> usize {
    row * SIZE + col
}

/// Split an action index into `(row, col)`.
pub fn to_coords(action: usize) -> (usize, usize) {
    (action / SIZE, action % SIZE)
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; SIZE]; SIZE],
        }
    }

    /// Get the cell at a specific position. Panics if out of range.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Place a mark on an empty cell.
    pub fn place(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), PlaceError> {
        if row >= SIZE || col >= SIZE {
            return Err(PlaceError::OutOfBounds);
        }
        if self.cells[row][col] != Cell::Empty {
            return Err(PlaceError::Occupied);
        }
        self.cells[row][col] = cell;
        Ok(())
    }

    pub fn is_empty_at(&self, action: usize) -> bool {
        let (row, col) = to_coords(action);
        row < SIZE && self.cells[row][col] == Cell::Empty
    }

    /// Check if every cell is marked
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c != Cell::Empty)
    }

    /// The mark owning a complete line, if any.
    pub fn winning_mark(&self) -> Option<Cell> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, col)| self.cells[r][col]);
            (a != Cell::Empty && a == b && b == c).then_some(a)
        })
    }

    /// Row-major flattened marks.
    pub fn to_vector(&self) -> [f64; CELLS] {
        let mut out = [0.0; CELLS];
        for (i, cell) in self.cells.iter().flatten().enumerate() {
            out[i] = cell.value();
        }
        out
    }

    /// Clear every cell.
    pub fn clear(&mut self) {
        self.cells = [[Cell::Empty; SIZE]; SIZE];
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
