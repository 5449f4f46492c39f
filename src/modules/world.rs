use serde::{Deserialize, Serialize};

pub type PlayerId = i32;
pub type Energy = u32;

/// Owner value the game master reports for lighthouses nobody holds.
pub const UNOWNED: PlayerId = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "X", default)]
    pub x: i32,
    #[serde(rename = "Y", default)]
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// One cell over; clamps at the edge of the `i32` grid.
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn manhattan(self, other: Position) -> u64 {
        u64::from(self.x.abs_diff(other.x)) + u64::from(self.y.abs_diff(other.y))
    }
}

/// The eight grid directions the game master accepts for a move.
///
/// `delta` is the only place a direction is turned into coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lighthouse {
    #[serde(rename = "Position", default)]
    pub position: Position,
    #[serde(rename = "Owner", default = "unowned")]
    pub owner: PlayerId,
    #[serde(rename = "Energy", default)]
    pub energy: Energy,
    #[serde(rename = "Connections", default)]
    pub connections: Vec<Position>,
    #[serde(rename = "HaveKey", default)]
    pub have_key: bool,
}

fn unowned() -> PlayerId {
    UNOWNED
}

impl Lighthouse {
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == player
    }

    pub fn connects_to(&self, position: Position) -> bool {
        self.connections.contains(&position)
    }
}

/// World state delivered with every Turn call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    #[serde(rename = "Position")]
    pub position: Position,
    #[serde(rename = "Score", default)]
    pub score: i32,
    #[serde(rename = "Energy", default)]
    pub energy: Energy,
    #[serde(rename = "Lighthouses", default)]
    pub lighthouses: Vec<Lighthouse>,
}

impl TurnSnapshot {
    /// Lighthouse standing on the agent's current cell, if any.
    pub fn current_lighthouse(&self) -> Option<&Lighthouse> {
        self.lighthouses
            .iter()
            .find(|lh| lh.position == self.position)
    }

    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Lighthouse> {
        self.lighthouses
            .iter()
            .filter(move |lh| lh.is_owned_by(player))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRow {
    #[serde(rename = "Row", default)]
    pub row: Vec<bool>,
}

/// Full game setup pushed once before the first turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(rename = "PlayerNum", default)]
    pub player_num: PlayerId,
    #[serde(rename = "PlayerCount", default)]
    pub player_count: i32,
    #[serde(rename = "Position", default)]
    pub position: Position,
    #[serde(rename = "Map", default)]
    pub map: Vec<MapRow>,
    #[serde(rename = "Lighthouses", default)]
    pub lighthouses: Vec<Lighthouse>,
}

impl InitialState {
    pub fn map_size(&self) -> (usize, usize) {
        let height = self.map.len();
        let width = self.map.iter().map(|r| r.row.len()).max().unwrap_or(0);
        (width, height)
    }
}
