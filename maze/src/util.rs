use std::path::Path;

use anyhow::{anyhow, Context};
use image::{DynamicImage, GenericImageView};

use crate::grid::{Cell, Maze, Tile};

/// Dark pixels (red channel below 128) become walls, everything else is open
pub fn parse_img(img: &DynamicImage) -> Result<Maze, anyhow::Error> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    let mut tiles = vec![vec![Tile::Wall; width]; height];

    for (row, tiles_row) in tiles.iter_mut().enumerate() {
        for (col, tile) in tiles_row.iter_mut().enumerate() {
            let p = img.get_pixel(col as u32, row as u32);

            *tile = if p.0[0] < 128 { Tile::Wall } else { Tile::Open }
        }
    }

    Ok(Maze {
        rows: height,
        columns: width,
        tiles,
    })
}

/// Parse a maze drawn as text, one line per row.
///
/// `#`, `X` and `1` are walls; `.`, `0` and spaces are open. Trailing spaces that
/// an editor may have stripped are treated as open cells, so a line of spaces is
/// a row of open cells. Only empty lines at the end are dropped.
pub fn parse_text(text: &str) -> Result<Maze, anyhow::Error> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    // trailing empty lines carry no rows
    let height = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |last| last + 1);
    let width = lines[..height]
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(height);
    for (row, line) in lines[..height].iter().enumerate() {
        let mut cells = Vec::with_capacity(width);
        for (col, c) in line.chars().enumerate() {
            cells.push(match c {
                '#' | 'X' | '1' => false,
                '.' | ' ' | '0' => true,
                other => {
                    return Err(anyhow!(
                        "Invalid maze character {:?} at {}",
                        other,
                        Cell::new(row, col)
                    ))
                }
            });
        }
        cells.resize(width, true);
        rows.push(cells);
    }

    Ok(Maze::from_rows(rows)?)
}

/// Parse a goal-first path, one `row,col` cell per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn parse_path(text: &str) -> Result<Vec<Cell>, anyhow::Error> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            line.parse::<Cell>()
                .with_context(|| format!("line {}", number + 1))
        })
        .collect()
}

/// Load a maze, picking the format from the file extension: images, JSON
/// (a serialized [`Maze`]) or text
pub fn load_maze(path: impl AsRef<Path>) -> Result<Maze, anyhow::Error> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let maze = match extension.as_deref() {
        Some("png" | "jpg" | "jpeg" | "bmp" | "gif") => {
            let img = image::open(path)
                .with_context(|| format!("failed to open image {}", path.display()))?;
            parse_img(&img)?
        }
        Some("json") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let maze: Maze = serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("failed to parse {}", path.display()))?;
            check_shape(&maze)?;
            maze
        }
        _ => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_text(&text).with_context(|| format!("failed to parse {}", path.display()))?
        }
    };

    Ok(maze)
}

pub fn load_path(path: impl AsRef<Path>) -> Result<Vec<Cell>, anyhow::Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_path(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// The declared dimensions of a deserialized maze must match its tiles
fn check_shape(maze: &Maze) -> Result<(), anyhow::Error> {
    if maze.tiles.len() != maze.rows || maze.tiles.iter().any(|row| row.len() != maze.columns) {
        return Err(anyhow!(
            "maze declares {}x{} but its tiles do not match",
            maze.rows,
            maze.columns
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::Grid;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_parse_text() {
        let maze = parse_text("..#\n#..\n").unwrap();

        assert_eq!((maze.rows, maze.columns), (2, 3));
        assert!(maze.passable(Cell::new(0, 0)));
        assert!(!maze.passable(Cell::new(0, 2)));
        assert!(!maze.passable(Cell::new(1, 0)));
        assert!(maze.passable(Cell::new(1, 2)));
    }

    #[test]
    fn test_parse_text_pads_short_lines() {
        let maze = parse_text("X  X\n X\n\n").unwrap();

        assert_eq!((maze.rows, maze.columns), (2, 4));
        assert!(maze.passable(Cell::new(1, 3)));
        // the Display output reads back as the same maze
        assert_eq!(parse_text(&maze.to_string()).unwrap(), maze);
    }

    #[test]
    fn test_parse_text_keeps_open_rows() {
        let open = Maze::new(3, 3);
        assert_eq!(parse_text(&open.to_string()).unwrap(), open);

        let mut maze = Maze::new(2, 3);
        maze.set(Cell::new(0, 1), Tile::Wall);
        let parsed = parse_text(&maze.to_string()).unwrap();
        assert_eq!(parsed, maze);
        assert_eq!(parsed.goal(), Ok(Cell::new(1, 2)));
    }

    #[test]
    fn test_parse_text_rejects_unknown_characters() {
        assert!(parse_text("..\n.?\n").is_err());
    }

    #[test]
    fn test_parse_img() {
        let mut img = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));

        let maze = parse_img(&DynamicImage::ImageRgb8(img)).unwrap();

        assert_eq!((maze.rows, maze.columns), (2, 3));
        assert!(!maze.passable(Cell::new(0, 1)));
        assert!(maze.passable(Cell::new(1, 1)));
    }

    #[test]
    fn test_parse_path() {
        let path = parse_path("# goal first\n2,2\n\n2, 1\n(1,1)\n").unwrap();
        assert_eq!(
            path,
            vec![Cell::new(2, 2), Cell::new(2, 1), Cell::new(1, 1)]
        );

        let err = parse_path("2,2\nnope\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_json_round_trip_shape_check() {
        let maze = Maze::new(2, 3);
        let json = serde_json::to_string(&maze).unwrap();
        let back: Maze = serde_json::from_str(&json).unwrap();
        assert!(check_shape(&back).is_ok());

        let broken = Maze {
            rows: 3,
            ..back
        };
        assert!(check_shape(&broken).is_err());
    }
}
