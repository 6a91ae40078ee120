//! Command-line surface, parsed with clap derive.

use clap::{Parser, Subcommand, ValueEnum};

use cardroom_engine::action::GameKind;

#[derive(Parser, Debug)]
#[command(
    name = "cardroom",
    version,
    about = "Color Clash and Flip21 rule engines with a shared-room simulator"
)]
pub struct CardroomCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start one game and print its status as JSON
    Deal {
        #[arg(long, value_enum, default_value_t = GameArg::ColorClash)]
        game: GameArg,
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=10))]
        players: u8,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play whole games between concurrent automated clients sharing one room
    Sim {
        #[arg(long, value_enum, default_value_t = GameArg::ColorClash)]
        game: GameArg,
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=10))]
        players: u8,
        #[arg(long, default_value_t = 1)]
        games: u32,
        #[arg(long)]
        seed: Option<u64>,
        /// JSONL file receiving every committed action
        #[arg(long)]
        output: Option<String>,
        /// Policy for every seat: baseline or random
        #[arg(long, default_value = "baseline")]
        ai: String,
    },
    /// Show the resolved configuration and where each value came from
    Cfg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GameArg {
    ColorClash,
    Flip21,
}

impl GameArg {
    pub fn kind(self) -> GameKind {
        match self {
            GameArg::ColorClash => GameKind::ColorClash,
            GameArg::Flip21 => GameKind::Flip21,
        }
    }
}
