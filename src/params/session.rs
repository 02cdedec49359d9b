//! Session state machine and player roster parameters.

use crate::error::ConfigError;

/// Mode state machine timing
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Opacity added per tick during `Transition` (shutter fade-in from white)
    pub fade_step: f32,

    /// Capacity of the inbound message queue (audio thread -> visual tick).
    /// Messages beyond this are dropped by the audio thread, never blocked on.
    pub inbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fade_step: 0.01,
            inbox_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Largest tick count `n` with `n * fade_step <= 1`. The mode leaves
    /// `Transition` on the tick after this one, the first whose opacity
    /// exceeds 1.
    pub fn ticks_to_opaque(&self) -> u32 {
        // Absorb f32 error so that 1 / 0.01 still counts as 100
        (1.0 / self.fade_step + 1e-4).floor() as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fade_step > 0.0 && self.fade_step <= 1.0) {
            return Err(ConfigError::FadeStep(self.fade_step));
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::Zero {
                name: "inbox capacity",
            });
        }
        Ok(())
    }
}

/// Colour tag of a player lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerColor {
    Green,
    Orange,
    Red,
    Blue,
}

impl PlayerColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            PlayerColor::Green => [0, 255, 0],
            PlayerColor::Orange => [255, 165, 0],
            PlayerColor::Red => [255, 0, 0],
            PlayerColor::Blue => [0, 0, 255],
        }
    }
}

/// Fixed parameters of one roster entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSpec {
    pub color: PlayerColor,
    /// Movement grid granularity (pixels per cell)
    pub cell_size: u32,
}

/// Player roster, trigger zone and collision timing
#[derive(Debug, Clone)]
pub struct PlayerRosterConfig {
    /// Fixed roster; index in this list is the player's id on the wire
    pub players: Vec<PlayerSpec>,

    /// Half height of the horizontal trigger band centred on the canvas (pixels)
    pub trigger_half_height: f32,

    /// Ticks a collision stays alive (30 = 0.5 s at 60 Hz)
    pub collision_lifetime_ticks: u32,

    /// Ring radius reached at the end of a collision's life (pixels)
    pub collision_max_radius: f32,
}

impl Default for PlayerRosterConfig {
    fn default() -> Self {
        Self {
            players: vec![
                PlayerSpec {
                    color: PlayerColor::Green,
                    cell_size: 16,
                },
                PlayerSpec {
                    color: PlayerColor::Orange,
                    cell_size: 32,
                },
                PlayerSpec {
                    color: PlayerColor::Red,
                    cell_size: 48,
                },
                PlayerSpec {
                    color: PlayerColor::Blue,
                    cell_size: 96,
                },
            ],
            trigger_half_height: 50.0,
            collision_lifetime_ticks: 30,
            collision_max_radius: 64.0,
        }
    }
}

impl PlayerRosterConfig {
    pub fn validate(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        if self.players.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        for (index, spec) in self.players.iter().enumerate() {
            if spec.cell_size == 0 || spec.cell_size > width || spec.cell_size > height {
                return Err(ConfigError::CellSize {
                    index,
                    cell_size: spec.cell_size,
                    width,
                    height,
                });
            }
        }
        if self.collision_lifetime_ticks == 0 {
            return Err(ConfigError::CollisionLifetime);
        }
        Ok(())
    }
}
