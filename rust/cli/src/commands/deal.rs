//! `deal`: start a single game and print what every player would see.

use std::io::Write;

use cardroom_engine::action::legal_actions;
use cardroom_engine::view::status_view;

use super::{new_table, seat_names};
use crate::cli::GameArg;
use crate::config;
use crate::error::CliError;

/// Prints `{ "seed", "status", "legal_actions" }` as pretty JSON. The seed is
/// taken from `--seed`, then the configuration, then drawn at random, and is
/// always printed so the deal can be reproduced.
pub fn handle_deal_command(
    game: GameArg,
    players: u8,
    seed: Option<u64>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let cfg = config::load().map_err(|e| CliError::Config(e.to_string()))?;
    let seed = seed.or(cfg.seed).unwrap_or_else(rand::random);
    let state = new_table(game.kind(), seat_names(players), seed, cfg.hand_size)?;

    let legal = state
        .current_player()
        .map(|p| legal_actions(&state, p))
        .unwrap_or_default();
    let doc = serde_json::json!({
        "seed": seed,
        "status": status_view(&state),
        "legal_actions": legal,
    });
    let json_str = serde_json::to_string_pretty(&doc).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn deal(game: GameArg, players: u8, seed: u64) -> serde_json::Value {
        let mut out = Vec::new();
        handle_deal_command(game, players, Some(seed), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    #[serial]
    fn same_seed_same_deal() {
        assert_eq!(
            deal(GameArg::ColorClash, 3, 12345),
            deal(GameArg::ColorClash, 3, 12345)
        );
    }

    #[test]
    #[serial]
    fn color_clash_deal_shows_counts_not_cards() {
        let doc = deal(GameArg::ColorClash, 4, 7);
        assert_eq!(doc["seed"], 7);
        let counts = doc["status"]["hand_counts"].as_object().unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(doc["status"]["current_player"], "p1");
        assert!(doc["status"].get("hands").is_none());
        assert!(!doc["legal_actions"].as_array().unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn flip21_deal_hides_the_hole_card() {
        let doc = deal(GameArg::Flip21, 1, 3);
        let table = &doc["status"]["flip21"];
        let dealer = table["dealer_cards"].as_array().unwrap();
        if table["round_status"] == "player_turns" {
            assert_eq!(dealer.len(), 1);
        } else {
            // a natural blackjack settles the round straight away
            assert!(dealer.len() >= 2);
        }
    }

    #[test]
    #[serial]
    fn one_player_cannot_play_color_clash() {
        let mut out = Vec::new();
        let err = handle_deal_command(GameArg::ColorClash, 1, Some(1), &mut out).unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }
}
