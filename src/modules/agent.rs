use crate::modules::engine::{Dice, decide_action};
use crate::modules::wire::Action;
use crate::modules::world::{PlayerId, TurnSnapshot};

/// One entry of the session log.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub turn: u64,
    pub snapshot: TurnSnapshot,
    pub action: Action,
}

/// The bot's identity and what it has done this game.
///
/// The history is bookkeeping only; decisions never read it back.
#[derive(Debug, Clone)]
pub struct Agent {
    player_id: PlayerId,
    turn: u64,
    history: Vec<TurnRecord>,
}

impl Agent {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            turn: 1,
            history: Vec::new(),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Number of the turn the next `take_turn` call will play.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn last_action(&self) -> Option<Action> {
        self.history.last().map(|record| record.action)
    }

    pub fn take_turn<D: Dice + ?Sized>(&mut self, snapshot: TurnSnapshot, dice: &mut D) -> Action {
        let action = decide_action(self.player_id, &snapshot, dice);
        self.history.push(TurnRecord {
            turn: self.turn,
            snapshot,
            action,
        });
        self.turn += 1;
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::engine::RngDice;
    use crate::modules::world::{Lighthouse, Position, UNOWNED};

    fn wandering_turn(x: i32) -> TurnSnapshot {
        TurnSnapshot {
            position: Position::new(x, 0),
            score: 0,
            energy: 10,
            lighthouses: vec![Lighthouse {
                position: Position::new(100, 0),
                owner: UNOWNED,
                energy: 0,
                connections: Vec::new(),
                have_key: false,
            }],
        }
    }

    #[test]
    fn new_agent_starts_on_turn_one() {
        let agent = Agent::new(4);
        assert_eq!(agent.player_id(), 4);
        assert_eq!(agent.turn(), 1);
        assert!(agent.history().is_empty());
        assert!(agent.last_action().is_none());
    }

    #[test]
    fn turn_counter_tracks_calls() {
        let mut agent = Agent::new(1);
        let mut dice = RngDice::seeded(7);

        for n in 0..5 {
            agent.take_turn(wandering_turn(n), &mut dice);
        }

        assert_eq!(agent.turn(), 6);
        assert_eq!(agent.history().len(), 5);
        let turns: Vec<u64> = agent.history().iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn history_keeps_snapshot_with_its_action() {
        let mut agent = Agent::new(1);
        let mut dice = RngDice::seeded(1);

        let action = agent.take_turn(wandering_turn(3), &mut dice);

        let record = &agent.history()[0];
        assert_eq!(record.snapshot.position, Position::new(3, 0));
        assert_eq!(record.action, action);
        assert_eq!(
            action,
            Action::Move {
                destination: Position::new(4, 0)
            }
        );
        assert_eq!(agent.last_action(), Some(action));
    }
}
