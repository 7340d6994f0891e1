use crate::error::MazeError;
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// A (row, column) coordinate in a grid
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The cell one step away in `direction`, or `None` if that would leave the
    /// non-negative quadrant
    pub fn step(self, direction: Direction) -> Option<Cell> {
        let Cell { row, col } = self;
        Some(match direction {
            Direction::Up => Cell::new(row.checked_sub(1)?, col),
            Direction::Right => Cell::new(row, col.checked_add(1)?),
            Direction::Down => Cell::new(row.checked_add(1)?, col),
            Direction::Left => Cell::new(row, col.checked_sub(1)?),
        })
    }

    /// Returns the direction leading from `self` to `other` if the two cells are
    /// 4-adjacent, i.e. exactly one coordinate differs and it differs by exactly 1
    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.step(direction) == Some(other))
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = anyhow::Error;

    /// Parses `row,col`, optionally wrapped in parentheses
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (row, col) = inner
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Invalid cell, expected `row,col`: {}", s))?;

        Ok(Cell {
            row: row.trim().parse()?,
            col: col.trim().parse()?,
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// The fixed order in which neighbors are generated. It decides which of several
    /// equally short paths a search returns.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "up",
                Direction::Right => "right",
                Direction::Down => "down",
                Direction::Left => "left",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Wall,
    Open,
}

impl From<bool> for Tile {
    fn from(passable: bool) -> Self {
        if passable {
            Tile::Open
        } else {
            Tile::Wall
        }
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tile::Wall => "X",
                Tile::Open => " ",
            }
        )
    }
}

/// Read-only view of a rectangular maze, all a search or a verification needs
pub trait Grid {
    fn rows(&self) -> usize;

    fn columns(&self) -> usize;

    /// Whether the cell can be walked on. Cells outside the grid are never passable.
    fn passable(&self, cell: Cell) -> bool;

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.columns()
    }

    /// The top-left cell, where every path starts
    fn start(&self) -> Cell {
        Cell::new(0, 0)
    }

    /// The bottom-right cell, where every path ends
    fn goal(&self) -> Result<Cell, MazeError> {
        if self.rows() == 0 || self.columns() == 0 {
            return Err(MazeError::InvalidGrid {
                rows: self.rows(),
                columns: self.columns(),
            });
        }
        Ok(Cell::new(self.rows() - 1, self.columns() - 1))
    }

    /// Create a storage holding one value of type T per cell
    fn create_storage<T: Default + Clone>(&self) -> CellStorage<T> {
        CellStorage::new(self.rows(), self.columns())
    }
}

/// Returns the in-bounds, passable cells adjacent to `cell`, in [`Direction::ALL`] order
pub fn neighbors<G: Grid + ?Sized>(grid: &G, cell: Cell) -> impl Iterator<Item = Cell> {
    let mut cells = Vec::with_capacity(4);

    for direction in Direction::ALL {
        if let Some(next) = cell.step(direction) {
            if grid.in_bounds(next) && grid.passable(next) {
                cells.push(next);
            }
        }
    }

    cells.into_iter()
}

/// A Grid implementation that uses a rectangular grid of tiles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    pub rows: usize,
    pub columns: usize,
    pub tiles: Vec<Vec<Tile>>,
}

impl Maze {
    /// An all-open maze
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            tiles: vec![vec![Tile::Open; columns]; rows],
        }
    }

    /// Build a maze from rows of booleans where `true` marks a passable cell
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MazeError> {
        let columns = rows.first().map_or(0, Vec::len);

        let mut tiles = Vec::with_capacity(rows.len());
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != columns {
                return Err(MazeError::Ragged {
                    row,
                    expected: columns,
                    found: cells.len(),
                });
            }
            tiles.push(cells.into_iter().map(Tile::from).collect::<Vec<_>>());
        }

        Ok(Self {
            rows: tiles.len(),
            columns,
            tiles,
        })
    }

    pub fn get(&self, cell: Cell) -> Option<Tile> {
        self.tiles.get(cell.row)?.get(cell.col).copied()
    }

    /// Overwrite the tile at `cell`, ignoring cells outside the maze
    pub fn set(&mut self, cell: Cell, tile: Tile) {
        if let Some(t) = self
            .tiles
            .get_mut(cell.row)
            .and_then(|row| row.get_mut(cell.col))
        {
            *t = tile;
        }
    }

    /// Scales the maze by the given factor, i.e. to make it twice as large, pass 2.
    /// Every tile is repeated into a factor x factor block.
    pub fn scale_up(&mut self, factor: usize) {
        let new_tiles: Vec<Vec<Tile>> = self
            .tiles
            .iter()
            .flat_map(|row| {
                let scaled: Vec<Tile> = row
                    .iter()
                    .flat_map(|&tile| std::iter::repeat(tile).take(factor))
                    .collect();
                std::iter::repeat(scaled).take(factor)
            })
            .collect();

        self.rows = new_tiles.len();
        self.columns = new_tiles.first().map_or(0, Vec::len);
        self.tiles = new_tiles;
    }
}

impl Grid for Maze {
    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn passable(&self, cell: Cell) -> bool {
        self.get(cell) == Some(Tile::Open)
    }
}

impl Display for Maze {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.tiles {
            for tile in row {
                write!(f, "{}", tile)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Dense per-cell storage for a grid, one row after the other
#[derive(Clone, Debug)]
pub struct CellStorage<T> {
    columns: usize,
    cells: Vec<T>,
}

impl<T: Default + Clone> CellStorage<T> {
    pub fn new(rows: usize, columns: usize) -> Self {
        CellStorage {
            columns,
            cells: vec![T::default(); rows * columns],
        }
    }
}

impl<T> CellStorage<T> {
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.col < self.columns {
            Some(cell.row.checked_mul(self.columns)? + cell.col)
        } else {
            None
        }
    }

    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.cells.get(self.index(cell)?)
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.columns == 0 {
            return Ok(());
        }
        for row in self.cells.chunks(self.columns) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
