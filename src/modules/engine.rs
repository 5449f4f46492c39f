//! Single-turn decision heuristic.
//!
//! Connect when standing on an owned lighthouse with a valid partner, attack
//! the lighthouse underfoot most of the time, otherwise walk one cardinal step
//! toward the best-looking target.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::modules::wire::Action;
use crate::modules::world::{Direction, Energy, Lighthouse, PlayerId, Position, TurnSnapshot};

/// Percent chance of attacking the lighthouse the agent stands on.
pub const ATTACK_CHANCE_PERCENT: u32 = 60;
/// Above this many owned lighthouses the agent heads back to its first one.
pub const OWNERSHIP_THRESHOLD: usize = 20;

/// Source of the engine's random draws.
pub trait Dice {
    /// Uniform in `0..100`.
    fn percent(&mut self) -> u32;
    /// Uniform in `0..len`; `len` is never zero.
    fn index(&mut self, len: usize) -> usize;
    /// Uniform in `0..=max`.
    fn energy(&mut self, max: Energy) -> Energy;
}

/// `Dice` backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl RngDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn percent(&mut self) -> u32 {
        self.0.gen_range(0..100)
    }

    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn energy(&mut self, max: Energy) -> Energy {
        self.0.gen_range(0..=max)
    }
}

pub fn decide_action<D: Dice + ?Sized>(
    player: PlayerId,
    snapshot: &TurnSnapshot,
    dice: &mut D,
) -> Action {
    let here = snapshot.position;

    if let Some(current) = snapshot.current_lighthouse() {
        if current.is_owned_by(player) {
            let candidates = connection_candidates(player, snapshot);
            if !candidates.is_empty() {
                let pick = candidates[dice.index(candidates.len())];
                return Action::Connect {
                    destination: pick.position,
                };
            }
        }

        if dice.percent() < ATTACK_CHANCE_PERCENT {
            return Action::Attack {
                destination: here,
                energy: dice.energy(snapshot.energy),
            };
        }
    }

    let target = movement_target(player, snapshot).map(|lh| lh.position);
    let destination = match step_toward(here, target) {
        Some(direction) => here.step(direction),
        None => here,
    };
    Action::Move { destination }
}

/// Owned, keyed lighthouses not yet linked to the agent's cell.
///
/// Crossing connections are not checked.
pub fn connection_candidates(player: PlayerId, snapshot: &TurnSnapshot) -> Vec<&Lighthouse> {
    let here = snapshot.position;
    snapshot
        .lighthouses
        .iter()
        .filter(|lh| {
            lh.position != here
                && lh.have_key
                && !lh.connects_to(here)
                && lh.is_owned_by(player)
        })
        .collect()
}

pub fn movement_target(player: PlayerId, snapshot: &TurnSnapshot) -> Option<&Lighthouse> {
    if snapshot.owned_by(player).count() > OWNERSHIP_THRESHOLD {
        // Fixed pick, not the closest one.
        return snapshot.owned_by(player).next();
    }
    best_unowned(player, snapshot)
}

pub fn capture_ratio(from: Position, lighthouse: &Lighthouse) -> f64 {
    let energy = f64::from(lighthouse.energy) + 1.0;
    let distance = from.manhattan(lighthouse.position) as f64 + 1.0;
    1.0 / (energy * distance)
}

/// Highest `capture_ratio` among lighthouses the agent does not own; ties keep the earliest.
pub fn best_unowned(player: PlayerId, snapshot: &TurnSnapshot) -> Option<&Lighthouse> {
    let mut best: Option<(f64, &Lighthouse)> = None;
    for lh in snapshot.lighthouses.iter().filter(|lh| !lh.is_owned_by(player)) {
        let ratio = capture_ratio(snapshot.position, lh);
        match best {
            Some((best_ratio, _)) if ratio <= best_ratio => {}
            _ => best = Some((ratio, lh)),
        }
    }
    best.map(|(_, lh)| lh)
}

/// North, then south, then east, otherwise west. Never diagonal.
pub fn step_toward(from: Position, target: Option<Position>) -> Option<Direction> {
    let target = target?;
    let direction = if target.y > from.y {
        Direction::North
    } else if target.y < from.y {
        Direction::South
    } else if target.x > from.x {
        Direction::East
    } else {
        Direction::West
    };
    Some(direction)
}
