//! One module per subcommand. Each exposes a `handle_*_command` function
//! taking its parsed arguments and the output streams, and returning
//! `Result<(), CliError>`.

pub mod cfg;
pub mod deal;
pub mod sim;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use sim::{handle_sim_command, SimOptions};

use cardroom_engine::action::{GameKind, GameState};
use cardroom_engine::color_clash::ClashState;
use cardroom_engine::errors::GameError;
use cardroom_engine::player::PlayerId;

/// `p1` to `pN`.
pub(crate) fn seat_names(players: u8) -> Vec<PlayerId> {
    (1..=players).map(|n| format!("p{n}")).collect()
}

/// A started game, dealing `hand_size` cards per Color Clash hand.
pub(crate) fn new_table(
    kind: GameKind,
    seats: Vec<PlayerId>,
    seed: u64,
    hand_size: usize,
) -> Result<GameState, GameError> {
    match kind {
        GameKind::ColorClash => Ok(GameState::ColorClash(
            ClashState::new(seats, seed)?
                .with_hand_size(hand_size)
                .start()?,
        )),
        GameKind::Flip21 => GameState::new_game(kind, seats, seed),
    }
}
