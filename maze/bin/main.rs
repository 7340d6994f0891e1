use std::process::ExitCode;

use log::info;
use maze::{load_maze, load_path, verify, Cell, Grid, PathFinder, PathFinderState};

mod options;

use options::Options;

fn main() -> Result<ExitCode, anyhow::Error> {
    let options = Options::parse();

    env_logger::Builder::new()
        .filter_level(options.log_level())
        .parse_default_env()
        .init();

    let maze = load_maze(&options.maze)?;
    info!(
        "loaded {}x{} maze from {}",
        maze.rows,
        maze.columns,
        options.maze.display()
    );

    println!("{}", maze);

    if let Some(path_file) = &options.verify {
        let path = load_path(path_file)?;
        return Ok(if verify(&maze, &path) {
            println!(
                "valid solution ({} steps)",
                steps_to_start(&path, maze.start())
            );
            ExitCode::SUCCESS
        } else {
            println!("not a solution");
            ExitCode::FAILURE
        });
    }

    let finder = PathFinder::new(&maze)?;
    let (res, visited) = if options.trace {
        let mut step = 0;
        finder.finish_observed(&maze, &mut |partial: &[Cell]| {
            step += 1;
            let cells: Vec<String> = partial.iter().map(Cell::to_string).collect();
            println!("step {:4}: {}", step, cells.join(" "));
        })
    } else {
        finder.finish(&maze)
    };

    if options.show_visited {
        println!("{}", visited);
    }

    match res {
        PathFinderState::PathFound(result) => {
            println!("path found: {} steps", result.length);
            let cells: Vec<String> = result.path.iter().map(Cell::to_string).collect();
            println!("{}", cells.join(" -> "));
            let moves: Vec<String> = result.moves().iter().map(|m| m.to_string()).collect();
            println!("moves: {}", moves.join(", "));
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            println!("no path found");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Steps walked from the goal until the start is reached; the verifier ignores
/// anything listed after it
fn steps_to_start(path: &[Cell], start: Cell) -> usize {
    path.iter()
        .position(|&cell| cell == start)
        .unwrap_or(path.len().saturating_sub(1))
}
