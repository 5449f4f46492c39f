use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::world::{Energy, PlayerId, Position};

pub const SERVICE: &str = "GameService";
pub const JOIN: &str = "/GameService/Join";
pub const INITIAL_STATE: &str = "/GameService/InitialState";
pub const TURN: &str = "/GameService/Turn";

/// Registration sent to the game master; `server_address` is where it calls us back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    #[serde(rename = "serverAddress")]
    pub server_address: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdReply {
    #[serde(rename = "PlayerID", default)]
    pub player_id: PlayerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReady {
    #[serde(rename = "Ready")]
    pub ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Move,
    Attack,
    Connect,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::Connect => "connect",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One decision for one turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Move { destination: Position },
    Attack { destination: Position, energy: Energy },
    Connect { destination: Position },
}

impl Action {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Connect { .. } => ActionKind::Connect,
        }
    }

    pub const fn destination(&self) -> Position {
        match *self {
            Action::Move { destination }
            | Action::Attack { destination, .. }
            | Action::Connect { destination } => destination,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Attack {
                destination,
                energy,
            } => write!(
                f,
                "attack({},{}) energy={}",
                destination.x, destination.y, energy
            ),
            other => {
                let dest = other.destination();
                write!(f, "{}({},{})", other.kind(), dest.x, dest.y)
            }
        }
    }
}

/// Turn reply as the game master expects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAction {
    #[serde(rename = "Action")]
    pub action: ActionKind,
    #[serde(rename = "Destination")]
    pub destination: Position,
    #[serde(rename = "Energy", default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<Energy>,
}

impl From<Action> for NewAction {
    fn from(action: Action) -> Self {
        let energy = match action {
            Action::Attack { energy, .. } => Some(energy),
            _ => None,
        };
        Self {
            action: action.kind(),
            destination: action.destination(),
            energy,
        }
    }
}
