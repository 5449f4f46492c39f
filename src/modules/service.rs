use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::modules::agent::Agent;
use crate::modules::engine::Dice;
use crate::modules::wire::{NewAction, NewPlayer, PlayerIdReply, PlayerReady};
use crate::modules::world::{InitialState, PlayerId, TurnSnapshot};

/// The three calls the game master makes against a player.
pub trait GameService: Send + Sync {
    fn join(&self, request: NewPlayer) -> PlayerIdReply;
    fn initial_state(&self, state: InitialState) -> PlayerReady;
    fn turn(&self, snapshot: TurnSnapshot) -> NewAction;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInitialState,
    InTurnLoop,
}

struct Session<D> {
    agent: Agent,
    dice: D,
    phase: Phase,
    initial_state: Option<InitialState>,
}

/// Player-side implementation of the game protocol.
///
/// Every mutation goes through the one session lock, so concurrent calls are
/// applied one at a time.
pub struct BotService<D> {
    session: Mutex<Session<D>>,
}

impl<D: Dice + Send> BotService<D> {
    pub fn new(player_id: PlayerId, dice: D) -> Self {
        Self {
            session: Mutex::new(Session {
                agent: Agent::new(player_id),
                dice,
                phase: Phase::AwaitingInitialState,
                initial_state: None,
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session<D>> {
        // Session state is consistent between calls, so a poisoned lock is still usable.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> Phase {
        self.session().phase
    }

    pub fn turn_counter(&self) -> u64 {
        self.session().agent.turn()
    }

    pub fn stored_initial_state(&self) -> Option<InitialState> {
        self.session().initial_state.clone()
    }

    /// Run `f` against the agent while holding the session lock.
    pub fn with_agent<T>(&self, f: impl FnOnce(&Agent) -> T) -> T {
        f(&self.session().agent)
    }
}

impl<D: Dice + Send> GameService for BotService<D> {
    fn join(&self, request: NewPlayer) -> PlayerIdReply {
        debug!(?request, "ignoring inbound join");
        PlayerIdReply::default()
    }

    fn initial_state(&self, state: InitialState) -> PlayerReady {
        info!("receiving initial state");
        debug!(?state, "initial state payload");

        let mut session = self.session();
        if state.player_num != session.agent.player_id() {
            warn!(
                "initial state is for player {}, but this bot joined as {}",
                state.player_num,
                session.agent.player_id()
            );
        }
        if session.phase == Phase::AwaitingInitialState {
            let (width, height) = state.map_size();
            info!(
                "game set up: player {} of {}, map {}x{}, {} lighthouse(s)",
                state.player_num,
                state.player_count,
                width,
                height,
                state.lighthouses.len()
            );
            session.phase = Phase::InTurnLoop;
        }
        session.initial_state = Some(state);
        PlayerReady { ready: true }
    }

    fn turn(&self, snapshot: TurnSnapshot) -> NewAction {
        let mut session = self.session();
        let turn = session.agent.turn();
        info!("processing turn {}", turn);
        debug!(?snapshot, "turn payload");
        if session.phase == Phase::AwaitingInitialState {
            warn!("turn {} arrived before the initial state", turn);
        }

        let Session { agent, dice, .. } = &mut *session;
        let action = agent.take_turn(snapshot, dice);
        debug!("turn {} -> {}", turn, action);
        NewAction::from(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::engine::RngDice;
    use crate::modules::wire::ActionKind;
    use crate::modules::world::{Lighthouse, Position};
    use std::sync::Arc;
    use std::thread;

    fn service() -> BotService<RngDice<rand::rngs::StdRng>> {
        BotService::new(1, RngDice::seeded(42))
    }

    fn owned(x: i32, y: i32) -> Lighthouse {
        Lighthouse {
            position: Position::new(x, y),
            owner: 1,
            energy: 0,
            connections: Vec::new(),
            have_key: true,
        }
    }

    fn connect_turn() -> TurnSnapshot {
        TurnSnapshot {
            position: Position::origin(),
            score: 0,
            energy: 10,
            lighthouses: vec![owned(0, 0), owned(2, 0)],
        }
    }

    #[test]
    fn first_initial_state_enters_turn_loop() {
        let svc = service();
        assert_eq!(svc.phase(), Phase::AwaitingInitialState);
        assert!(svc.stored_initial_state().is_none());

        let ready = svc.initial_state(InitialState {
            player_num: 1,
            player_count: 2,
            ..InitialState::default()
        });
        assert!(ready.ready);
        assert_eq!(svc.phase(), Phase::InTurnLoop);

        let again = svc.initial_state(InitialState {
            player_num: 1,
            player_count: 3,
            ..InitialState::default()
        });
        assert!(again.ready);
        assert_eq!(svc.phase(), Phase::InTurnLoop);
        assert_eq!(svc.stored_initial_state().unwrap().player_count, 3);
    }

    #[test]
    fn join_is_a_no_op() {
        let svc = service();
        let reply = svc.join(NewPlayer {
            name: "other".into(),
            server_address: "x".into(),
        });
        assert_eq!(reply, PlayerIdReply::default());
        assert_eq!(svc.turn_counter(), 1);
    }

    #[test]
    fn turn_counter_is_calls_plus_one() {
        let svc = service();
        svc.initial_state(InitialState::default());
        for _ in 0..7 {
            svc.turn(connect_turn());
        }
        assert_eq!(svc.turn_counter(), 8);
        assert_eq!(svc.with_agent(|a| a.history().len()), 7);
    }

    #[test]
    fn turn_before_initial_state_is_still_answered() {
        let svc = service();
        let reply = svc.turn(connect_turn());
        assert_eq!(reply.action, ActionKind::Connect);
        assert_eq!(reply.destination, Position::new(2, 0));
        assert_eq!(svc.phase(), Phase::AwaitingInitialState);
    }

    #[test]
    fn concurrent_turns_are_serialized() {
        let svc = Arc::new(service());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let svc = Arc::clone(&svc);
                thread::spawn(move || {
                    for _ in 0..25 {
                        svc.turn(connect_turn());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(svc.turn_counter(), 201);
        let turns: Vec<u64> = svc.with_agent(|a| a.history().iter().map(|r| r.turn).collect());
        assert_eq!(turns, (1..=200).collect::<Vec<_>>());
    }
}
