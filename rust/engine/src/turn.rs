//! Cyclic turn order shared by the Color Clash engine.

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Direction of play around the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// +1 through the player order
    Clockwise,
    /// -1 through the player order
    CounterClockwise,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Returns the player after `current` in `order` going in `direction`.
///
/// When `current` is not in `order` the first player is returned; this is the
/// recovery path after a roster change removed the current player. `None` only
/// for an empty order.
pub fn next_player_id<'a>(
    order: &'a [PlayerId],
    current: &str,
    direction: Direction,
) -> Option<&'a PlayerId> {
    let n = order.len() as isize;
    if n == 0 {
        return None;
    }
    let index = match order.iter().position(|p| p == current) {
        Some(i) => i as isize,
        None => return order.first(),
    };
    let next = (index + direction.offset() + n).rem_euclid(n);
    order.get(next as usize)
}

/// Moves the turn on from `current`, passing over one extra seat when `skip`
/// is set.
pub fn advance<'a>(
    order: &'a [PlayerId],
    current: &str,
    direction: Direction,
    skip: bool,
) -> Option<&'a PlayerId> {
    let next = next_player_id(order, current, direction)?;
    if skip {
        next_player_id(order, next, direction)
    } else {
        Some(next)
    }
}
