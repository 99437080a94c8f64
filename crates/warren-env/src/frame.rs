//! Immutable snapshots handed to consumers.

use serde::Serialize;
use warren_core::{Cell, Position, TickId};

use crate::agent::Agent;
use crate::kind::EnvKind;

/// Positions retained per agent trail.
pub const TRAIL_LEN: usize = 32;

/// A goal cell and whether it has been consumed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickup {
    /// The goal cell.
    pub cell: Cell,
    /// Set once an agent finishes on a consumable pickup.
    pub collected: bool,
}

/// A moving obstacle as seen on one tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingTile {
    /// Obstacle id.
    pub id: String,
    /// Interpolated position.
    pub position: Position,
    /// Occupied cell.
    pub cell: Cell,
}

/// Obstacle layout on one tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileState {
    /// Grid side length.
    pub grid_size: u32,
    /// Static obstacle cells.
    pub static_obstacles: Vec<Cell>,
    /// Moving obstacles.
    pub moving_obstacles: Vec<MovingTile>,
}

/// A deep copy of everything a renderer or recorder needs.
///
/// Frames own their data; holding one never keeps engine state alive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Tick the frame was taken at.
    pub tick: TickId,
    /// Which environment produced it.
    pub kind: EnvKind,
    /// Agents.
    pub agents: Vec<Agent>,
    /// Reward per agent on the last tick.
    pub rewards: Vec<f32>,
    /// Cumulative return per agent.
    pub returns: Vec<f32>,
    /// Done flag per agent.
    pub dones: Vec<bool>,
    /// Goal cells.
    pub pickups: Vec<Pickup>,
    /// Obstacles.
    pub tiles: TileState,
    /// Up to [`TRAIL_LEN`] recent positions per agent, oldest first.
    pub trails: Vec<Vec<Position>>,
}

impl Frame {
    /// Whether every agent is done.
    pub fn all_done(&self) -> bool {
        self.dones.iter().all(|&d| d)
    }
}
