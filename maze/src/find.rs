use std::{
    collections::VecDeque,
    fmt::Display,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use log::{debug, trace};

use crate::error::MazeError;
use crate::grid::{neighbors, Cell, CellStorage, Direction, Grid};

/// Receives the partial path (start first) each time the search takes a cell off
/// its frontier. It cannot influence the search.
pub trait StepObserver {
    fn on_step(&mut self, partial_path: &[Cell]);
}

impl<F: FnMut(&[Cell])> StepObserver for F {
    fn on_step(&mut self, partial_path: &[Cell]) {
        self(partial_path)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitedItem {
    /// Number of steps from the start
    pub distance: usize,
    /// The cell this one was discovered from, `None` for the start
    pub from: Option<Cell>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Visited(Option<VisitedItem>);

impl Deref for Visited {
    type Target = Option<VisitedItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for Visited {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl Display for Visited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(item) => write!(f, "{:03} ", item.distance),
            None => write!(f, "{:>3} ", "."),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult {
    /// Every cell walked, from `start` to `goal`
    pub path: Vec<Cell>,
    pub start: Cell,
    pub goal: Cell,
    /// Number of steps, one less than the number of cells
    pub length: usize,
}

impl PathResult {
    /// The path ordered from goal back to start, as [`verify`](crate::verify::verify) expects it
    pub fn goal_first(&self) -> Vec<Cell> {
        self.path.iter().rev().copied().collect()
    }

    pub fn moves(&self) -> Vec<Direction> {
        self.path
            .windows(2)
            .filter_map(|pair| pair[0].direction_to(pair[1]))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState {
    Computing,
    NoPathFound,
    PathFound(PathResult),
}

impl PathFinderState {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Breadth-first search from the top-left to the bottom-right cell of a grid.
///
/// The search advances one frontier cell per [`PathFinder::step`], so a caller
/// can animate it or stop early. Every discovered cell stores a back-pointer to
/// the cell it was reached from; the path is rebuilt from those once the goal
/// is found.
#[derive(Debug)]
pub struct PathFinder<G: Grid> {
    start: Cell,
    goal: Cell,
    visited: CellStorage<Visited>,
    frontier: VecDeque<Cell>,
    state: PathFinderState,
    _grid: PhantomData<fn(&G)>,
}

impl<G: Grid> PathFinder<G> {
    pub fn new(grid: &G) -> Result<Self, MazeError> {
        let goal = grid.goal()?;
        let start = grid.start();

        let mut finder = Self {
            start,
            goal,
            visited: grid.create_storage(),
            frontier: VecDeque::new(),
            state: PathFinderState::Computing,
            _grid: PhantomData,
        };

        debug!(
            "searching {}x{} grid from {} to {}",
            grid.rows(),
            grid.columns(),
            start,
            goal
        );

        if !grid.passable(start) {
            debug!("start {} is a wall", start);
            finder.state = PathFinderState::NoPathFound;
            return Ok(finder);
        }

        finder.discover(start, None, 0);

        if start == goal {
            finder.state = PathFinderState::PathFound(finder.result(goal));
        } else {
            finder.frontier.push_back(start);
        }

        Ok(finder)
    }

    /// Run the search to the end and hand back the final state together with the
    /// visited record
    pub fn finish(mut self, grid: &G) -> (PathFinderState, CellStorage<Visited>) {
        while !self.state.is_done() {
            self.expand(grid, None);
        }
        (self.state, self.visited)
    }

    pub fn finish_observed<O: StepObserver>(
        mut self,
        grid: &G,
        observer: &mut O,
    ) -> (PathFinderState, CellStorage<Visited>) {
        while !self.state.is_done() {
            self.expand(grid, Some(&mut *observer));
        }
        (self.state, self.visited)
    }

    /// Take one cell off the frontier and discover its unvisited neighbors
    pub fn step(&mut self, grid: &G) -> PathFinderState {
        self.expand(grid, None);
        self.state.clone()
    }

    /// Same as [`PathFinder::step`], reporting the dequeued partial path to `observer`
    pub fn step_observed<O: StepObserver>(
        &mut self,
        grid: &G,
        observer: &mut O,
    ) -> PathFinderState {
        self.expand(grid, Some(&mut *observer));
        self.state.clone()
    }

    fn expand(&mut self, grid: &G, observer: Option<&mut dyn StepObserver>) {
        if self.state.is_done() {
            return;
        }

        let Some(current) = self.frontier.pop_front() else {
            debug!("frontier exhausted, no path to {}", self.goal);
            self.state = PathFinderState::NoPathFound;
            return;
        };

        let distance = self.distance(current);
        trace!("expanding {} at distance {}", current, distance);

        if let Some(observer) = observer {
            observer.on_step(&self.backtrack(current));
        }

        for next in neighbors(grid, current) {
            if self.is_visited(next) {
                continue;
            }

            // marked on discovery, so no cell ever sits in the frontier twice
            self.discover(next, Some(current), distance + 1);

            if next == self.goal {
                let result = self.result(next);
                debug!("found goal {}: length={}", next, result.length);
                self.state = PathFinderState::PathFound(result);
                return;
            }

            self.frontier.push_back(next);
        }
    }

    fn discover(&mut self, cell: Cell, from: Option<Cell>, distance: usize) {
        if let Some(visited) = self.visited.get_mut(cell) {
            **visited = Some(VisitedItem { distance, from });
        }
    }

    fn is_visited(&self, cell: Cell) -> bool {
        self.visited.get(cell).is_some_and(|v| v.is_some())
    }

    fn distance(&self, cell: Cell) -> usize {
        self.visited
            .get(cell)
            .and_then(|v| v.map(|item| item.distance))
            .unwrap_or_default()
    }

    /// Follow the back-pointers from `cell` to the start, returning the cells in
    /// start-first order
    fn backtrack(&self, cell: Cell) -> Vec<Cell> {
        let mut path = vec![cell];
        let mut current = cell;

        while let Some(Visited(Some(VisitedItem {
            from: Some(from), ..
        }))) = self.visited.get(current)
        {
            path.push(*from);
            current = *from;
        }

        path.reverse();
        path
    }

    fn result(&self, goal: Cell) -> PathResult {
        let path = self.backtrack(goal);
        PathResult {
            length: path.len() - 1,
            path,
            start: self.start,
            goal,
        }
    }

    pub fn state(&self) -> &PathFinderState {
        &self.state
    }

    pub fn get_visited(&self) -> &CellStorage<Visited> {
        &self.visited
    }

    /// Number of cells waiting to be expanded
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }
}

/// Find a shortest path from the top-left to the bottom-right cell.
///
/// `Ok(None)` means the maze has no solution; an error is only returned for a
/// grid without cells.
pub fn solve<G: Grid>(grid: &G) -> Result<Option<PathResult>, MazeError> {
    let (state, _) = PathFinder::new(grid)?.finish(grid);
    Ok(into_path(state))
}

/// [`solve`], reporting every expansion step to `observer`
pub fn solve_observed<G: Grid, O: StepObserver>(
    grid: &G,
    observer: &mut O,
) -> Result<Option<PathResult>, MazeError> {
    let (state, _) = PathFinder::new(grid)?.finish_observed(grid, observer);
    Ok(into_path(state))
}

fn into_path(state: PathFinderState) -> Option<PathResult> {
    match state {
        PathFinderState::PathFound(result) => Some(result),
        _ => None,
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::{Maze, Tile};
    use crate::verify::verify;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use std::collections::{HashMap, HashSet};

    fn maze_from_str(s: &str) -> Maze {
        Maze::from_rows(
            s.lines()
                .map(|line| line.chars().map(|c| c != '#').collect())
                .collect(),
        )
        .unwrap()
    }

    fn create_basic_maze() -> Maze {
        maze_from_str(
            "\
..#....
.##.##.
.#..#..
.#.##.#
...#...
##.#.#.
.....#.",
        )
    }

    /// Plain BFS distances over the grid, written independently of `PathFinder`
    fn reference_distances(maze: &Maze) -> HashMap<Cell, usize> {
        let mut dist = HashMap::new();
        let start = Cell::new(0, 0);
        if !maze.passable(start) {
            return dist;
        }
        dist.insert(start, 0);
        let mut queue = VecDeque::from([start]);
        while let Some(c) = queue.pop_front() {
            let d = dist[&c];
            let candidates = [
                (c.row.wrapping_sub(1), c.col),
                (c.row + 1, c.col),
                (c.row, c.col.wrapping_sub(1)),
                (c.row, c.col + 1),
            ];
            for (row, col) in candidates {
                let n = Cell::new(row, col);
                if maze.passable(n) && !dist.contains_key(&n) {
                    dist.insert(n, d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    fn assert_well_formed(maze: &Maze, result: &PathResult) {
        let path = &result.path;
        assert_eq!(path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(path.last(), Some(&maze.goal().unwrap()));
        assert_eq!(result.length + 1, path.len());
        for pair in path.windows(2) {
            assert!(
                pair[0].direction_to(pair[1]).is_some(),
                "{} -> {} is not a single step",
                pair[0],
                pair[1]
            );
        }
        let unique: HashSet<_> = path.iter().collect();
        assert_eq!(unique.len(), path.len(), "path repeats a cell");
        assert!(path.iter().all(|&c| maze.passable(c)));
    }

    #[test]
    fn test_single_cell() {
        let maze = Maze::new(1, 1);
        let result = solve(&maze).unwrap().unwrap();
        assert_eq!(result.path, vec![Cell::new(0, 0)]);
        assert_eq!(result.length, 0);
    }

    #[test]
    fn test_single_wall_cell() {
        let maze = maze_from_str("#");
        assert_eq!(solve(&maze), Ok(None));
    }

    #[test]
    fn test_open_two_by_two() {
        let maze = Maze::new(2, 2);
        let result = solve(&maze).unwrap().unwrap();

        assert_eq!(result.length, 2);
        // up and left lead nowhere from the start, right is tried before down
        assert_eq!(
            result.path,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1)]
        );
        assert_eq!(result.moves(), vec![Direction::Right, Direction::Down]);
    }

    #[test]
    fn test_blocked_start() {
        let mut maze = Maze::new(2, 2);
        maze.set(Cell::new(0, 0), Tile::Wall);

        let finder = PathFinder::new(&maze).unwrap();
        assert_eq!(finder.state(), &PathFinderState::NoPathFound);
        assert_eq!(solve(&maze), Ok(None));
    }

    #[test]
    fn test_separating_wall() {
        let maze = maze_from_str(
            "\
..#
..#
###",
        );
        assert_eq!(solve(&maze), Ok(None));

        let maze = maze_from_str(
            "\
.#.
.#.
.#.",
        );
        assert_eq!(solve(&maze), Ok(None));
    }

    #[test]
    fn test_blocked_goal() {
        let maze = maze_from_str(
            "\
...
...
..#",
        );
        assert_eq!(solve(&maze), Ok(None));
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let maze = Maze::from_rows(vec![]).unwrap();
        assert_eq!(
            solve(&maze),
            Err(MazeError::InvalidGrid {
                rows: 0,
                columns: 0
            })
        );

        let maze = Maze::from_rows(vec![vec![], vec![]]).unwrap();
        assert!(matches!(
            PathFinder::new(&maze),
            Err(MazeError::InvalidGrid { rows: 2, columns: 0 })
        ));
    }

    #[test]
    fn test_basic_route() {
        let maze = create_basic_maze();

        let result = solve(&maze).unwrap().unwrap();
        assert_eq!(result.length, 16);
        assert_well_formed(&maze, &result);
        assert!(verify(&maze, &result.goal_first()));
    }

    #[test]
    fn test_finish_returns_distances() {
        let maze = create_basic_maze();

        let (state, visited) = PathFinder::new(&maze).unwrap().finish(&maze);
        assert!(matches!(
            state,
            PathFinderState::PathFound(PathResult { length: 16, .. })
        ));

        let start = visited.get(Cell::new(0, 0)).unwrap();
        assert_eq!(
            **start,
            Some(VisitedItem {
                distance: 0,
                from: None
            })
        );
        let goal = visited.get(Cell::new(6, 6)).unwrap();
        assert_eq!(goal.map(|item| item.distance), Some(16));
    }

    #[test]
    fn test_stepping() {
        let maze = Maze::new(1, 4);
        let mut finder = PathFinder::new(&maze).unwrap();
        assert_eq!(finder.frontier_len(), 1);

        assert_eq!(finder.step(&maze), PathFinderState::Computing);
        assert_eq!(finder.step(&maze), PathFinderState::Computing);
        let state = finder.step(&maze);
        assert!(matches!(
            state,
            PathFinderState::PathFound(PathResult { length: 3, .. })
        ));

        // finished searches stay finished
        assert_eq!(finder.step(&maze), state);
        assert_eq!(finder.start(), Cell::new(0, 0));
        assert_eq!(finder.goal(), Cell::new(0, 3));
    }

    #[test]
    fn test_observer_sees_every_dequeue() {
        let maze = Maze::new(1, 4);
        let mut seen = Vec::new();

        let result = solve_observed(&maze, &mut |partial: &[Cell]| seen.push(partial.to_vec()))
            .unwrap()
            .unwrap();

        assert_eq!(
            seen,
            vec![
                vec![Cell::new(0, 0)],
                vec![Cell::new(0, 0), Cell::new(0, 1)],
                vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 2)],
            ]
        );
        assert_eq!(Some(result), solve(&maze).unwrap());
    }

    #[test]
    fn test_observer_does_not_change_result() {
        let maze = create_basic_maze();
        let mut steps = 0;
        let observed = solve_observed(&maze, &mut |_: &[Cell]| steps += 1).unwrap();

        assert!(steps > 0);
        assert_eq!(observed, solve(&maze).unwrap());
    }

    #[test]
    fn test_deterministic() {
        let maze = Maze::new(6, 9);
        assert_eq!(solve(&maze).unwrap(), solve(&maze).unwrap());
    }

    #[test]
    fn test_all_three_by_three_mazes() {
        for bits in 0u32..(1 << 9) {
            let rows = (0..3)
                .map(|r| (0..3).map(|c| bits & (1 << (r * 3 + c)) != 0).collect())
                .collect();
            let maze = Maze::from_rows(rows).unwrap();
            let expected = reference_distances(&maze).get(&Cell::new(2, 2)).copied();

            match solve(&maze).unwrap() {
                Some(result) => {
                    assert_eq!(Some(result.length), expected, "maze {:09b}", bits);
                    assert_well_formed(&maze, &result);
                    assert!(verify(&maze, &result.goal_first()));
                }
                None => assert_eq!(expected, None, "maze {:09b}", bits),
            }
        }
    }

    #[derive(Clone, Debug)]
    struct RandomMaze(Maze);

    impl Arbitrary for RandomMaze {
        fn arbitrary(g: &mut Gen) -> Self {
            let rows = usize::arbitrary(g) % 8 + 1;
            let columns = usize::arbitrary(g) % 8 + 1;
            let cells = (0..rows)
                .map(|_| (0..columns).map(|_| u8::arbitrary(g) % 4 != 0).collect())
                .collect();
            RandomMaze(Maze::from_rows(cells).unwrap())
        }
    }

    #[quickcheck]
    fn shortest_path_matches_reference_bfs(RandomMaze(maze): RandomMaze) -> bool {
        let goal = maze.goal().unwrap();
        let expected = reference_distances(&maze).get(&goal).copied();
        solve(&maze).unwrap().map(|result| result.length) == expected
    }

    #[quickcheck]
    fn found_paths_are_well_formed_and_verify(RandomMaze(maze): RandomMaze) {
        if let Some(result) = solve(&maze).unwrap() {
            assert_well_formed(&maze, &result);
            assert!(verify(&maze, &result.goal_first()));
        }
    }

    #[quickcheck]
    fn solving_twice_gives_the_same_path(RandomMaze(maze): RandomMaze) -> bool {
        solve(&maze).unwrap() == solve(&maze).unwrap()
    }
}
