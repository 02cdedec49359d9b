//! Short-lived collision markers and the collection that owns them.

use glam::Vec2;

use crate::player::{CollisionSink, PlayerId};

/// A transient marker spawned where a player entered the trigger band
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    position: Vec2,
    /// Non-owning back-reference into the roster (colour lookup only)
    player: PlayerId,
    age: u32,
    lifetime: u32,
}

impl Collision {
    pub fn new(position: Vec2, player: PlayerId, lifetime: u32) -> Self {
        Self {
            position,
            player,
            age: 0,
            lifetime: lifetime.max(1),
        }
    }

    /// Advance the lifecycle by one tick
    pub fn update(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    pub fn is_dead(&self) -> bool {
        self.age >= self.lifetime
    }

    /// Lifecycle progress in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.age as f32 / self.lifetime as f32).min(1.0)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }
}

/// Exclusive owner of every live collision.
///
/// Newly spawned collisions are also queued for reporting so the session can
/// tell the audio engine about each one exactly once.
#[derive(Debug, Default)]
pub struct CollisionField {
    live: Vec<Collision>,
    spawned: Vec<(PlayerId, Vec2)>,
    lifetime: u32,
}

impl CollisionField {
    pub fn new(lifetime: u32) -> Self {
        Self {
            live: Vec::new(),
            spawned: Vec::new(),
            lifetime,
        }
    }

    pub fn update_all(&mut self) {
        for collision in &mut self.live {
            collision.update();
        }
    }

    /// Drop dead collisions, returning how many were removed
    pub fn sweep(&mut self) -> usize {
        let before = self.live.len();
        self.live.retain(|c| !c.is_dead());
        before - self.live.len()
    }

    /// Spawns since the last call
    pub fn take_spawned(&mut self) -> Vec<(PlayerId, Vec2)> {
        std::mem::take(&mut self.spawned)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collision> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl CollisionSink for CollisionField {
    fn add_collision(&mut self, position: Vec2, player: PlayerId) {
        self.live.push(Collision::new(position, player, self.lifetime));
        self.spawned.push((player, position));
    }
}
