//! Command line options.
//! `maze <MAZE>` solves, `maze <MAZE> --verify <PATH>` checks a goal-first path

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

fn make_options_parser() -> Command {
    Command::new("maze")
        .about("Find the shortest path through a maze, or check a proposed one")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("maze")
                .value_name("MAZE")
                .help("Maze file: an image, a JSON-serialized maze, or text (`#` wall, `.` open)")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .value_name("PATH_FILE")
                .help("Check the goal-first path in this file (one `row,col` per line) instead of solving")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("trace")
                .short('t')
                .long("trace")
                .help("Print the partial path at every search step")
                .action(ArgAction::SetTrue)
                .conflicts_with("verify"),
        )
        .arg(
            Arg::new("visited")
                .long("visited")
                .help("Print the distance from the start of every visited cell")
                .action(ArgAction::SetTrue)
                .conflicts_with("verify"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log more; repeat for trace output")
                .action(ArgAction::Count),
        )
}

#[derive(Debug)]
pub struct Options {
    pub maze: PathBuf,
    pub verify: Option<PathBuf>,
    pub trace: bool,
    pub show_visited: bool,
    pub verbosity: u8,
}

impl Options {
    pub fn parse() -> Self {
        let matches = make_options_parser().get_matches();
        Self::from_matches(&matches)
    }

    #[cfg(test)]
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = make_options_parser().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Options {
            maze: matches
                .get_one::<PathBuf>("maze")
                .cloned()
                .unwrap_or_default(),
            verify: matches.get_one::<PathBuf>("verify").cloned(),
            trace: matches.get_flag("trace"),
            show_visited: matches.get_flag("visited"),
            verbosity: matches.get_count("verbose"),
        }
    }

    /// The log filter used when `RUST_LOG` is not set
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
