//! Session controller: the mode state machine.
//!
//! ```text
//! Wait --waitTime 0--> Capture --1 tick--> Transition --fade > 1--> Sonification
//! ```
//!
//! The controller is only ever mutated from the visual tick. Messages from the
//! audio engine arrive through the [`Inbox`] and are applied at the start of
//! each tick, before the mode's own work.

use image::{GrayImage, Luma};

use crate::audio::AudioEngine;
use crate::camera::FrameSource;
use crate::collision::CollisionField;
use crate::error::{ConfigError, MessageError};
use crate::messages::{ControlMessage, Inbox, OutboundMessage, PlayerField, RawMessage};
use crate::params::audio_constants::IMAGE_ARRAY;
use crate::params::{PlayerRosterConfig, ScoreConfig, SessionConfig};
use crate::player::{Player, TriggerZone};
use crate::score::{ScoreAnalyzer, ScoreBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Showing the live camera while the countdown runs
    Wait,
    /// One tick: analyze the held frame and publish the score
    Capture,
    /// Fading the score in
    Transition,
    /// Players and collisions run against the score
    Sonification,
}

/// Orchestrates one installation session
pub struct SessionController<E: AudioEngine> {
    mode: Mode,
    fade_ticks: u32,
    fade_step: f32,
    ticks_to_opaque: u32,
    countdown: u32,
    frame: GrayImage,
    score: ScoreBuffer,
    analyzer: ScoreAnalyzer,
    background: u8,
    players: Vec<Player>,
    collisions: CollisionField,
    collision_max_radius: f32,
    zone: TriggerZone,
    inbox: Inbox,
    engine: E,
    tick_count: u64,
}

impl<E: AudioEngine> SessionController<E> {
    pub fn new(
        score_config: &ScoreConfig,
        session_config: &SessionConfig,
        roster: &PlayerRosterConfig,
        initial_countdown: u32,
        engine: E,
        inbox: Inbox,
    ) -> Result<Self, ConfigError> {
        score_config.validate()?;
        session_config.validate()?;
        roster.validate(score_config.width, score_config.height)?;

        let (width, height) = (score_config.width, score_config.height);
        let players = roster
            .players
            .iter()
            .enumerate()
            .map(|(id, spec)| Player::new(id, *spec, width, height))
            .collect();

        Ok(Self {
            mode: Mode::Wait,
            fade_ticks: 0,
            fade_step: session_config.fade_step,
            ticks_to_opaque: session_config.ticks_to_opaque(),
            countdown: initial_countdown,
            frame: GrayImage::from_pixel(width, height, Luma([score_config.background])),
            score: ScoreBuffer::new(width, height, score_config.background),
            analyzer: ScoreAnalyzer::new(score_config),
            background: score_config.background,
            players,
            collisions: CollisionField::new(roster.collision_lifetime_ticks),
            collision_max_radius: roster.collision_max_radius,
            zone: TriggerZone::centered(height, roster.trigger_half_height),
            inbox,
            engine,
            tick_count: 0,
        })
    }

    /// One visual-update tick
    pub fn tick(&mut self, camera: &mut dyn FrameSource) {
        self.tick_count += 1;
        for raw in self.inbox.drain() {
            self.handle_raw(&raw);
        }

        match self.mode {
            Mode::Wait => self.acquire_frame(camera),
            Mode::Capture => self.capture(),
            Mode::Transition => self.advance_fade(),
            Mode::Sonification => self.advance_simulation(),
        }
    }

    /// Parse and apply one engine message; malformed input is logged and
    /// dropped.
    pub fn handle_raw(&mut self, raw: &RawMessage) {
        match ControlMessage::parse(raw) {
            Ok(message) => self.handle_message(message),
            Err(err) => tracing::warn!(%err, ?raw, "ignoring inbound message"),
        }
    }

    pub fn handle_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::WaitTime(remaining) => {
                if self.mode != Mode::Wait {
                    tracing::debug!(remaining, mode = ?self.mode, "waitTime outside Wait ignored");
                    return;
                }
                self.countdown = remaining;
                tracing::debug!(remaining, "countdown");
                if remaining == 0 {
                    self.enter(Mode::Capture);
                }
            }
            ControlMessage::Player { index, field } => {
                let len = self.players.len();
                let Some(player) = self.players.get_mut(index) else {
                    let err = MessageError::PlayerIndex {
                        index: index as f32,
                        len,
                    };
                    tracing::warn!(%err, "ignoring player message");
                    return;
                };
                match field {
                    PlayerField::Position(i) => player.set_position_from_index(i),
                    PlayerField::Direction(d) => player.set_direction(d),
                    PlayerField::Active(a) => player.set_active(a),
                }
            }
        }
    }

    fn enter(&mut self, mode: Mode) {
        tracing::info!(from = ?self.mode, to = ?mode, tick = self.tick_count, "mode change");
        self.mode = mode;
    }

    fn acquire_frame(&mut self, camera: &mut dyn FrameSource) {
        match camera.next_frame() {
            Ok(frame) if frame.dimensions() == self.frame.dimensions() => self.frame = frame,
            Ok(frame) => tracing::warn!(
                got = ?frame.dimensions(),
                expected = ?self.frame.dimensions(),
                "frame size mismatch, keeping previous frame"
            ),
            Err(err) => tracing::warn!(%err, "frame acquisition failed, keeping previous frame"),
        }
    }

    fn capture(&mut self) {
        let array = match self.analyzer.analyze(&self.frame, &mut self.score) {
            Ok(array) => array,
            Err(err) => {
                tracing::warn!(%err, "score analysis failed, publishing blank score");
                self.score.set_color(self.background);
                self.score.shared_normalized()
            }
        };
        if let Err(err) = self.engine.write_array(IMAGE_ARRAY, array) {
            tracing::warn!(%err, "failed to publish score");
        }

        self.fade_ticks = 0;
        self.enter(Mode::Transition);
    }

    fn advance_fade(&mut self) {
        self.fade_ticks += 1;
        if self.fade_ticks > self.ticks_to_opaque {
            self.enter(Mode::Sonification);
            if let Err(err) = self.engine.send(OutboundMessage::Start) {
                tracing::warn!(%err, "failed to send start");
            }
        }
    }

    fn advance_simulation(&mut self) {
        self.collisions.update_all();
        for player in &mut self.players {
            player.update(&self.zone, &mut self.collisions);
        }
        for (player, position) in self.collisions.take_spawned() {
            if let Err(err) = self.engine.send(OutboundMessage::Collision { player, position }) {
                tracing::warn!(%err, "failed to report collision");
            }
        }
        self.collisions.sweep();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Fade progress; meaningful from `Transition` on
    pub fn alpha(&self) -> f32 {
        self.fade_ticks as f32 * self.fade_step
    }

    /// Last countdown received; meaningful in `Wait`
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Most recent grayscale camera frame
    pub fn frame(&self) -> &GrayImage {
        &self.frame
    }

    pub fn score(&self) -> &ScoreBuffer {
        &self.score
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn collisions(&self) -> &CollisionField {
        &self.collisions
    }

    pub fn collision_max_radius(&self) -> f32 {
        self.collision_max_radius
    }

    pub fn trigger_zone(&self) -> TriggerZone {
        self.zone
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::{AudioError, CameraError};
    use crate::messages::{Atom, InboxSender};
    use crate::params::audio_constants::TO_SESSION;

    #[derive(Default)]
    struct RecordingEngine {
        arrays: Vec<(String, Arc<Vec<f32>>)>,
        sent: Vec<OutboundMessage>,
    }

    impl AudioEngine for RecordingEngine {
        fn write_array(&mut self, name: &str, data: Arc<Vec<f32>>) -> Result<(), AudioError> {
            self.arrays.push((name.to_string(), data));
            Ok(())
        }

        fn send(&mut self, message: OutboundMessage) -> Result<(), AudioError> {
            self.sent.push(message);
            Ok(())
        }
    }

    struct FixedFrame(GrayImage);

    impl FrameSource for FixedFrame {
        fn next_frame(&mut self) -> Result<GrayImage, CameraError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    const W: u32 = 192;
    const H: u32 = 192;

    fn session() -> (SessionController<RecordingEngine>, InboxSender) {
        let score = ScoreConfig {
            width: W,
            height: H,
            ..ScoreConfig::default()
        };
        let roster = PlayerRosterConfig {
            trigger_half_height: 20.0,
            ..PlayerRosterConfig::default()
        };
        let (tx, inbox) = Inbox::channel(64);
        let session = SessionController::new(
            &score,
            &SessionConfig::default(),
            &roster,
            3,
            RecordingEngine::default(),
            inbox,
        )
        .unwrap();
        (session, tx)
    }

    fn camera() -> FixedFrame {
        // Three vertical bands: the dark pair forms a moderate edge, the bright
        // one a saturated edge after stretching
        FixedFrame(GrayImage::from_fn(W, H, |x, _| {
            let level = if x < W / 3 {
                0
            } else if x < 2 * W / 3 {
                20
            } else {
                255
            };
            Luma([level])
        }))
    }

    fn wait_time(value: f32) -> RawMessage {
        RawMessage::new(TO_SESSION, "waitTime", vec![Atom::Float(value)])
    }

    fn player_msg(index: f32, field: &str, value: f32) -> RawMessage {
        RawMessage::new(
            TO_SESSION,
            "player",
            vec![Atom::Float(index), Atom::Symbol(field.to_string()), Atom::Float(value)],
        )
    }

    /// Drive a fresh session to the first Sonification tick
    fn into_sonification(session: &mut SessionController<RecordingEngine>, cam: &mut FixedFrame) {
        session.tick(cam);
        session.handle_raw(&wait_time(0.0));
        while session.mode() != Mode::Sonification {
            session.tick(cam);
        }
    }

    #[test]
    fn test_countdown_triggers_capture_only_on_zero() {
        let (mut session, _tx) = session();
        assert_eq!(session.mode(), Mode::Wait);
        for value in [3.0, 2.0, 1.0] {
            session.handle_raw(&wait_time(value));
            assert_eq!(session.mode(), Mode::Wait);
            assert_eq!(session.countdown(), value as u32);
        }
        session.handle_raw(&wait_time(0.0));
        assert_eq!(session.mode(), Mode::Capture);
    }

    #[test]
    fn test_countdown_through_inbox() {
        let (mut session, tx) = session();
        let mut cam = camera();
        for value in [3.0, 2.0, 1.0] {
            tx.post(wait_time(value));
            session.tick(&mut cam);
            assert_eq!(session.mode(), Mode::Wait);
        }
        assert!(session.engine().arrays.is_empty());

        // Drained at the start of the tick, so the capture runs in the same tick
        tx.post(wait_time(0.0));
        session.tick(&mut cam);
        assert_eq!(session.mode(), Mode::Transition);
        assert_eq!(session.engine().arrays.len(), 1);
    }

    #[test]
    fn test_wait_time_ignored_after_wait() {
        let (mut session, _tx) = session();
        let mut cam = camera();
        session.handle_raw(&wait_time(0.0));
        session.tick(&mut cam);
        session.handle_raw(&wait_time(0.0));
        session.handle_raw(&wait_time(5.0));
        assert_eq!(session.mode(), Mode::Transition);
        assert_eq!(session.countdown(), 0);
        session.tick(&mut cam);
        assert_eq!(session.engine().arrays.len(), 1);
    }

    #[test]
    fn test_capture_publishes_full_normalized_score() {
        let (mut session, _tx) = session();
        let mut cam = camera();
        session.tick(&mut cam);
        session.handle_raw(&wait_time(0.0));
        session.tick(&mut cam);

        let (name, array) = &session.engine().arrays[0];
        assert_eq!(name, "imageData");
        assert_eq!(array.len(), (W * H) as usize);
        assert_eq!(array.as_slice(), session.score().normalized());
        // The step edge in the camera frame shows up in the score
        assert!(array.iter().any(|&v| v > 0.0));
        assert_eq!(session.alpha(), 0.0);
    }

    #[test]
    fn test_transition_takes_101_ticks_and_starts_once() {
        let (mut session, _tx) = session();
        let mut cam = camera();
        session.handle_raw(&wait_time(0.0));
        session.tick(&mut cam); // capture
        assert_eq!(session.mode(), Mode::Transition);

        let mut last = session.alpha();
        for tick in 1..=100 {
            session.tick(&mut cam);
            assert_eq!(session.mode(), Mode::Transition, "tick {}", tick);
            assert!(session.alpha() > last);
            assert!((session.alpha() - last - 0.01).abs() < 1e-5);
            last = session.alpha();
        }
        assert!(session.engine().sent.is_empty());

        session.tick(&mut cam);
        assert_eq!(session.mode(), Mode::Sonification);
        assert!(session.alpha() > 1.0);
        assert_eq!(session.engine().sent, vec![OutboundMessage::Start]);

        for _ in 0..10 {
            session.tick(&mut cam);
        }
        let starts = session
            .engine()
            .sent
            .iter()
            .filter(|m| **m == OutboundMessage::Start)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_coarse_fade_switches_on_first_tick_past_opaque() {
        let score = ScoreConfig {
            width: W,
            height: H,
            ..ScoreConfig::default()
        };
        let fade = SessionConfig {
            fade_step: 0.4,
            ..SessionConfig::default()
        };
        let roster = PlayerRosterConfig {
            trigger_half_height: 20.0,
            ..PlayerRosterConfig::default()
        };
        let (_tx, inbox) = Inbox::channel(8);
        let mut session =
            SessionController::new(&score, &fade, &roster, 0, RecordingEngine::default(), inbox)
                .unwrap();
        let mut cam = camera();

        session.handle_raw(&wait_time(0.0));
        session.tick(&mut cam); // capture
        session.tick(&mut cam);
        session.tick(&mut cam);
        assert_eq!(session.mode(), Mode::Transition);
        assert!((session.alpha() - 0.8).abs() < 1e-5);

        session.tick(&mut cam);
        assert_eq!(session.mode(), Mode::Sonification);
        assert_eq!(session.engine().sent, vec![OutboundMessage::Start]);
    }

    #[test]
    fn test_player_message_touches_only_its_entry() {
        let (mut session, _tx) = session();
        let before: Vec<Player> = session.players().to_vec();
        session.handle_raw(&player_msg(2.0, "active", 1.0));

        for (i, (old, new)) in before.iter().zip(session.players()).enumerate() {
            if i == 2 {
                assert!(new.is_active());
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_out_of_range_player_index_is_ignored() {
        let (mut session, _tx) = session();
        let before: Vec<Player> = session.players().to_vec();
        session.handle_raw(&player_msg(99.0, "active", 1.0));
        session.handle_raw(&player_msg(-1.0, "position", 4.0));
        session.handle_raw(&player_msg(1.0, "velocity", 4.0));
        assert_eq!(session.players(), before.as_slice());
    }

    #[test]
    fn test_player_fields_apply() {
        let (mut session, _tx) = session();
        session.handle_raw(&player_msg(1.0, "position", 13.0));
        session.handle_raw(&player_msg(1.0, "direction", 0.0));
        let p = &session.players()[1];
        assert_eq!(p.index(), 13);
        assert!(!p.direction());
    }

    #[test]
    fn test_players_only_move_in_sonification() {
        let (mut session, _tx) = session();
        let mut cam = camera();
        session.handle_raw(&player_msg(0.0, "active", 1.0));
        session.tick(&mut cam);
        assert_eq!(session.players()[0].index(), 0);

        into_sonification(&mut session, &mut cam);
        session.tick(&mut cam);
        assert_eq!(session.players()[0].row(), 1);
    }

    #[test]
    fn test_collision_lifecycle_in_session() {
        let (mut session, _tx) = session();
        let mut cam = camera();
        into_sonification(&mut session, &mut cam);

        // 16 px lane: rows centred at 8 + 16k; the band [76, 116] holds rows 5 and 6
        session.handle_raw(&player_msg(0.0, "position", (4 * 12) as f32));
        session.handle_raw(&player_msg(0.0, "active", 1.0));

        session.tick(&mut cam); // tick T: row 4 -> 5 enters band
        assert_eq!(session.collisions().len(), 1);
        let reported = session
            .engine()
            .sent
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Collision { player: 0, .. }))
            .count();
        assert_eq!(reported, 1);

        // Freeze the player so no new collisions appear
        session.handle_raw(&player_msg(0.0, "active", 0.0));
        let lifetime = PlayerRosterConfig::default().collision_lifetime_ticks;
        for _ in 1..lifetime {
            session.tick(&mut cam);
            assert_eq!(session.collisions().len(), 1);
            assert!(session.collisions().iter().all(|c| !c.is_dead()));
        }
        session.tick(&mut cam); // tick T + N
        assert!(session.collisions().is_empty());
    }

    #[test]
    fn test_blank_frame_gives_background_score() {
        let (mut session, _tx) = session();
        let mut cam = FixedFrame(GrayImage::from_pixel(W, H, Luma([90])));
        session.tick(&mut cam);
        session.handle_raw(&wait_time(0.0));
        session.tick(&mut cam);
        assert!(session.score().grid().as_raw().iter().all(|&p| p == 255));
        assert!(session.engine().arrays[0].1.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_wrong_size_frame_is_not_held() {
        let (mut session, _tx) = session();
        let mut cam = FixedFrame(GrayImage::from_pixel(10, 10, Luma([0])));
        session.tick(&mut cam);
        assert_eq!(session.frame().dimensions(), (W, H));
    }
}
