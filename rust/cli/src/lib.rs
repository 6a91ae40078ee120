//! # Cardroom CLI Library
//!
//! Command-line front end for the Color Clash and Flip21 engines and the
//! shared-room simulator. The binary is a thin wrapper around [`run`], which
//! takes the arguments and output streams explicitly so tests can drive it
//! in-process.
//!
//! ```
//! use std::io;
//! let args = vec!["cardroom", "deal", "--game", "flip21", "--players", "2", "--seed", "42"];
//! let code = cardroom_cli::run(args, &mut io::sink(), &mut io::sink());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Subcommands
//!
//! - `deal`: start one game and print its status projection
//! - `sim`: play whole games between concurrent clients sharing a room
//! - `cfg`: show the resolved configuration

use clap::Parser;
use std::io::Write;

pub mod cli;
pub mod commands;
pub mod config;
mod error;
pub mod exit_code;
mod macros;
pub mod ui;

use cli::{CardroomCli, Commands};
use commands::{handle_cfg_command, handle_deal_command, handle_sim_command, SimOptions};

pub use error::CliError;

const COMMANDS: &[&str] = &["deal", "sim", "cfg"];

/// Parses `args` and runs the selected subcommand.
///
/// Returns the process exit code: `0` on success, `2` for parse errors and
/// failed commands. Help and version go to `out` with code `0`.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match CardroomCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;

            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                if write!(out, "{}", e).is_err() {
                    return exit_code::ERROR;
                }
                return exit_code::SUCCESS;
            }
            write_or_exit!(err, "{}", e);
            write_or_exit!(err, "Usage: cardroom <command> [options]\n");
            write_or_exit!(err, "Commands:");
            for c in COMMANDS {
                write_or_exit!(err, "  {}", c);
            }
            write_or_exit!(err, "\nFor full help, run: cardroom --help");
            return exit_code::ERROR;
        }
    };

    let result = match cli.cmd {
        Commands::Deal {
            game,
            players,
            seed,
        } => handle_deal_command(game, players, seed, out),
        Commands::Sim {
            game,
            players,
            games,
            seed,
            output,
            ai,
        } => handle_sim_command(
            SimOptions {
                game,
                players,
                games,
                seed,
                output,
                ai,
            },
            out,
            err,
        ),
        // cfg reports its own errors on stderr
        Commands::Cfg => match handle_cfg_command(out, err) {
            Ok(()) => return exit_code::SUCCESS,
            Err(_) => return exit_code::ERROR,
        },
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(CliError::InvalidInput(_)) => exit_code::ERROR,
        Err(e) => {
            write_or_exit!(err, "Error: {}", e);
            exit_code::ERROR
        }
    }
}
