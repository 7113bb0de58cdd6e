//! Nekomatch: match-three cat café puzzle in the terminal.

mod app;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use nekomatch::GameConfig;

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        logging::init(path, args.verbose)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = args.game_config();
    config.validate()?;
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Match-three cat café puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "nekomatch",
    version,
    about = "Match-three cat café puzzle in the terminal. Swap tiles, chain clears, keep the cats happy before time runs out.",
    long_about = "Nekomatch is a terminal match-three game.\n\n\
        Swap two neighbouring tiles to line up three or more of a kind. Cleared tiles fall, \
        new ones drop in, and every follow-up match is a chain worth 1.5x the one before. \
        Each cleared tile adds half a second to the clock and counts toward the cats' \
        requests; a satisfied cat is worth 500 points.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor   Space/Enter  Pick / swap   x  Drop selection\n  \
        Mouse click    Pick / swap   P  Pause   R  Restart   Q / Esc  Quit\n\n\
        Use --seed to replay a game and --theme to load a btop-style theme."
)]
pub struct Args {
    /// Seed for the tile and request stream. Same seed + same moves = same game.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Starting time in seconds.
    #[arg(short = 't', long, default_value = "60", value_name = "SECS")]
    pub time_limit: f64,

    /// Board side length in tiles.
    #[arg(long, default_value = "8", value_name = "N", value_parser = clap::value_parser!(u16).range(3..=12))]
    pub board_size: u16,

    /// Number of cats waiting at once.
    #[arg(long, default_value = "3", value_name = "N", value_parser = clap::value_parser!(u16).range(1..=6))]
    pub queue_size: u16,

    /// How long each cascade phase (match, clear, fall) stays on screen.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub step_ms: u64,

    /// Disable cascade playback (board jumps straight to the settled state).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip title screen and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the pastel café palette if not set.
    #[arg(long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write a game log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log chain-by-chain detail (with --log-file).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Rule parameters for the engine; everything else stays at the café defaults.
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            board_size: self.board_size as usize,
            time_limit: self.time_limit,
            queue_size: self.queue_size as usize,
            ..GameConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let args = Args::parse_from(["nekomatch"]);
        assert_eq!(args.game_config(), GameConfig::default());
        assert_eq!(args.step_ms, 200);
    }

    #[test]
    fn test_board_size_is_range_checked() {
        assert!(Args::try_parse_from(["nekomatch", "--board-size", "2"]).is_err());
        let args = Args::try_parse_from(["nekomatch", "--board-size", "6", "--seed", "5"]).unwrap();
        assert_eq!(args.game_config().board_size, 6);
        assert_eq!(args.seed, Some(5));
    }
}
