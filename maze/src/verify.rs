use std::collections::HashSet;

use log::debug;

use crate::grid::{Cell, Grid};

/// Check whether `path` solves the maze.
///
/// The path is read goal first: it must begin at the bottom-right cell and walk,
/// one 4-adjacent step at a time and without revisiting a cell, to the top-left
/// cell. The walk succeeds as soon as it reaches the start; anything listed
/// after that is not looked at.
///
/// Only the goal is checked for passability. Intermediate cells are trusted, so
/// a well-formed walk across walls is accepted.
pub fn verify<G: Grid + ?Sized>(grid: &G, path: &[Cell]) -> bool {
    let Ok(goal) = grid.goal() else {
        debug!("rejected: grid has no cells");
        return false;
    };
    let start = grid.start();

    let Some((&first, rest)) = path.split_first() else {
        debug!("rejected: empty path");
        return false;
    };

    if first != goal {
        debug!("rejected: path begins at {} instead of {}", first, goal);
        return false;
    }

    if !grid.passable(goal) {
        debug!("rejected: goal {} is a wall", goal);
        return false;
    }

    if first == start {
        return true;
    }

    let mut visited = HashSet::from([first]);
    let mut previous = first;

    for &cell in rest {
        if previous.direction_to(cell).is_none() {
            debug!("rejected: {} -> {} is not a single step", previous, cell);
            return false;
        }

        if !visited.insert(cell) {
            debug!("rejected: {} is visited twice", cell);
            return false;
        }

        if cell == start {
            return true;
        }

        previous = cell;
    }

    debug!("rejected: path ends at {} without reaching {}", previous, start);
    false
}
