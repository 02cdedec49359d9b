//! Player lanes: moving agents that spawn collisions in the trigger band.

use glam::Vec2;

use crate::params::{PlayerColor, PlayerSpec};

/// Stable index into the roster (also the id used on the wire)
pub type PlayerId = usize;

/// Anything that accepts collision spawn requests.
///
/// Players never own collisions; they only ask their owner to create one.
pub trait CollisionSink {
    fn add_collision(&mut self, position: Vec2, player: PlayerId);
}

/// Horizontal band whose entry spawns a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerZone {
    pub top: f32,
    pub bottom: f32,
}

impl TriggerZone {
    /// Band of `half_height` either side of the canvas' vertical centre
    pub fn centered(canvas_height: u32, half_height: f32) -> Self {
        let mid = canvas_height as f32 / 2.0;
        Self {
            top: mid - half_height,
            bottom: mid + half_height,
        }
    }

    pub fn contains(&self, y: f32) -> bool {
        self.top <= y && y <= self.bottom
    }
}

/// One roster entry.
///
/// The position is a cell index into a `columns` x `rows` grid whose cell
/// size is fixed per player. Movement is vertical, one cell per tick, and
/// bounces off the top and bottom rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    id: PlayerId,
    color: PlayerColor,
    cell_size: u32,
    columns: u32,
    rows: u32,
    index: u32,
    /// `true` moves down (increasing row), `false` moves up
    direction: bool,
    active: bool,
}

impl Player {
    pub fn new(id: PlayerId, spec: PlayerSpec, canvas_width: u32, canvas_height: u32) -> Self {
        let cell_size = spec.cell_size.max(1);
        Self {
            id,
            color: spec.color,
            cell_size,
            columns: (canvas_width / cell_size).max(1),
            rows: (canvas_height / cell_size).max(1),
            index: 0,
            direction: true,
            active: false,
        }
    }

    /// Jump to cell `index`. Indices outside the grid wrap around it.
    pub fn set_position_from_index(&mut self, index: i64) {
        let cells = self.columns as i64 * self.rows as i64;
        self.index = index.rem_euclid(cells) as u32;
    }

    pub fn set_direction(&mut self, direction: bool) {
        self.direction = direction;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Advance one cell if active; ask `sink` for a collision when this step
    /// carried the player into `zone`.
    pub fn update(&mut self, zone: &TriggerZone, sink: &mut impl CollisionSink) {
        if !self.active {
            return;
        }

        let was_inside = zone.contains(self.center().y);
        self.step();
        if !was_inside && zone.contains(self.center().y) {
            sink.add_collision(self.center(), self.id);
        }
    }

    fn step(&mut self) {
        if self.rows < 2 {
            return;
        }
        let row = self.row();
        let last = self.rows - 1;
        let next = match (self.direction, row) {
            (true, r) if r >= last => {
                self.direction = false;
                r - 1
            }
            (true, r) => r + 1,
            (false, 0) => {
                self.direction = true;
                1
            }
            (false, r) => r - 1,
        };
        self.index = next * self.columns + self.column();
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn color(&self) -> PlayerColor {
        self.color
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn column(&self) -> u32 {
        self.index % self.columns
    }

    pub fn row(&self) -> u32 {
        self.index / self.columns
    }

    pub fn direction(&self) -> bool {
        self.direction
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Top-left corner of the player's cell (pixels)
    pub fn position(&self) -> Vec2 {
        Vec2::new(
            (self.column() * self.cell_size) as f32,
            (self.row() * self.cell_size) as f32,
        )
    }

    /// Centre of the player's cell (pixels)
    pub fn center(&self) -> Vec2 {
        self.position() + Vec2::splat(self.cell_size as f32 / 2.0)
    }
}
