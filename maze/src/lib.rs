//! Shortest-path solving and solution checking for rectangular mazes.
//!
//! A maze is any [`Grid`] of passable and blocked cells. [`solve`] runs a
//! breadth-first search from the top-left to the bottom-right cell, and
//! [`verify`] independently checks a proposed goal-first path.

mod error;
pub mod find;
pub mod grid;
pub mod util;
pub mod verify;

pub use error::MazeError;
pub use find::{
    solve, solve_observed, PathFinder, PathFinderState, PathResult, StepObserver, Visited,
    VisitedItem,
};
pub use grid::{neighbors, Cell, CellStorage, Direction, Grid, Maze, Tile};
pub use util::{load_maze, load_path, parse_img, parse_path, parse_text};
pub use verify::verify;
