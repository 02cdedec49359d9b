//! Block-rate control logic of the sonification patch.
//!
//! Runs inside the audio callback. It owns the countdown that gates capture,
//! drives the player lanes once sonification starts, and turns the published
//! score into lane voices for the synthesis engine. Everything it tells the
//! session goes through the inbox as `toOF` messages.

use std::sync::Arc;

use super::synthesis::{compose, LaneVoice, SILENCE};
use crate::messages::{Atom, InboxSender, OutboundMessage, RawMessage};
use crate::params::audio_constants::TO_SESSION;
use crate::params::{AudioConfig, PlayerRosterConfig, ScoreConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPhase {
    /// Counting the wait time down, one `waitTime` message per second
    Counting,
    /// Countdown reached zero; waiting for `start`
    Armed,
    /// Driving the lanes from the score
    Playing,
}

#[derive(Debug, Clone)]
struct Lane {
    cell_size: u32,
    columns: u32,
    rows: u32,
    column: u32,
    /// Mean density of the current column strip
    density: f32,
    hit: bool,
}

/// Per-row mean density of one cell-wide column strip of the score,
/// sampling every `stride`-th pixel in both directions
pub fn column_profile(
    score: &[f32],
    width: u32,
    height: u32,
    cell_size: u32,
    column: u32,
    stride: usize,
) -> Vec<f32> {
    let stride = stride.max(1);
    let (w, h, cell) = (width as usize, height as usize, cell_size.max(1) as usize);
    if score.len() < w * h {
        return Vec::new();
    }
    let rows = h / cell;
    let x0 = column as usize * cell;
    let x1 = (x0 + cell).min(w);

    (0..rows)
        .map(|row| {
            let y0 = row * cell;
            let mut sum = 0.0;
            let mut count = 0usize;
            for y in (y0..y0 + cell).step_by(stride) {
                for x in (x0..x1).step_by(stride) {
                    sum += score[y * w + x];
                    count += 1;
                }
            }
            if count == 0 {
                0.0
            } else {
                sum / count as f32
            }
        })
        .collect()
}

/// Control state of the sonification patch
pub struct SonifyPatch {
    phase: PatchPhase,
    remaining: u32,
    announced: bool,
    frames_in_period: usize,
    frames_per_second: usize,
    frames_per_step: usize,
    base_pitch_hz: f32,
    profile_stride: usize,
    silence_density: f32,
    voice_floor: f32,
    voice_gain: f32,
    hit_boost: f32,
    score_width: u32,
    score_height: u32,
    sample_count: usize,
    score: Option<Arc<Vec<f32>>>,
    lanes: Vec<Lane>,
    outbox: InboxSender,
    pending_code: Option<String>,
}

impl SonifyPatch {
    pub fn new(
        audio: &AudioConfig,
        score: &ScoreConfig,
        roster: &PlayerRosterConfig,
        outbox: InboxSender,
    ) -> Self {
        let lanes = roster
            .players
            .iter()
            .map(|spec| {
                let cell = spec.cell_size.max(1);
                Lane {
                    cell_size: cell,
                    columns: (score.width / cell).max(1),
                    rows: (score.height / cell).max(1),
                    column: 0,
                    density: 0.0,
                    hit: false,
                }
            })
            .collect();

        Self {
            phase: PatchPhase::Counting,
            remaining: audio.wait_seconds,
            announced: false,
            frames_in_period: 0,
            frames_per_second: audio.sample_rate_hz.max(1),
            frames_per_step: ((audio.sample_rate_hz as f32 * audio.lane_step_s) as usize).max(1),
            base_pitch_hz: audio.base_pitch_hz,
            profile_stride: audio.profile_stride,
            silence_density: audio.silence_density,
            voice_floor: audio.voice_floor,
            voice_gain: audio.voice_gain,
            hit_boost: audio.hit_boost,
            score_width: score.width,
            score_height: score.height,
            sample_count: score.sample_count(),
            score: None,
            lanes,
            outbox,
            pending_code: None,
        }
    }

    pub fn phase(&self) -> PatchPhase {
        self.phase
    }

    /// Adopt the latest published score array. Arrays that do not cover the
    /// whole canvas are refused and the previous score stays.
    pub fn set_score(&mut self, score: Arc<Vec<f32>>) -> bool {
        if score.len() != self.sample_count {
            return false;
        }
        self.score = Some(score);
        true
    }

    pub fn score(&self) -> Option<&Arc<Vec<f32>>> {
        self.score.as_ref()
    }

    /// Handle a message from the session
    pub fn receive(&mut self, message: &OutboundMessage) {
        match message {
            OutboundMessage::Start => {
                if self.phase == PatchPhase::Playing {
                    return;
                }
                self.phase = PatchPhase::Playing;
                self.frames_in_period = 0;
                let lane_count = self.lanes.len() as u32;
                for i in 0..self.lanes.len() {
                    let lane = &mut self.lanes[i];
                    // Spread the lanes across the canvas width
                    lane.column = lane.columns * i as u32 / lane_count.max(1);
                    self.step_lane(i);
                }
                self.pending_code = Some(self.composition());
            }
            OutboundMessage::Collision { player, .. } => {
                if let Some(lane) = self.lanes.get_mut(*player) {
                    lane.hit = true;
                    self.pending_code = Some(self.composition());
                }
            }
        }
    }

    /// Advance by `frames` audio frames. Returns new synthesis code when the
    /// composition changed.
    pub fn advance(&mut self, frames: usize) -> Option<String> {
        if !self.announced {
            self.announced = true;
            self.post_wait_time();
            if self.remaining == 0 {
                self.phase = PatchPhase::Armed;
            }
            self.pending_code = Some(SILENCE.to_string());
        }

        match self.phase {
            PatchPhase::Counting => {
                self.frames_in_period += frames;
                while self.frames_in_period >= self.frames_per_second && self.remaining > 0 {
                    self.frames_in_period -= self.frames_per_second;
                    self.remaining -= 1;
                    self.post_wait_time();
                }
                if self.remaining == 0 {
                    self.phase = PatchPhase::Armed;
                }
            }
            PatchPhase::Armed => {}
            PatchPhase::Playing => {
                self.frames_in_period += frames;
                let mut stepped = false;
                while self.frames_in_period >= self.frames_per_step {
                    self.frames_in_period -= self.frames_per_step;
                    for i in 0..self.lanes.len() {
                        self.lanes[i].hit = false;
                        self.lanes[i].column = (self.lanes[i].column + 1) % self.lanes[i].columns;
                        self.step_lane(i);
                    }
                    stepped = true;
                }
                if stepped {
                    self.pending_code = Some(self.composition());
                }
            }
        }

        self.pending_code.take()
    }

    /// Place lane `i`'s player on the densest cell of its current column and
    /// steer it toward the trigger band.
    fn step_lane(&mut self, i: usize) {
        let lane = &self.lanes[i];
        let profile = match &self.score {
            Some(score) => column_profile(
                score,
                self.score_width,
                self.score_height,
                lane.cell_size,
                lane.column,
                self.profile_stride,
            ),
            None => Vec::new(),
        };

        let (row, peak) = profile
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (r, d)| if d > best.1 { (r, d) } else { best });
        let density = if profile.is_empty() {
            0.0
        } else {
            profile.iter().sum::<f32>() / profile.len() as f32
        };
        let row = if peak > 0.0 { row as u32 } else { 0 };
        let row = row.min(lane.rows.saturating_sub(1));
        let index = row * lane.columns + lane.column;
        let heading_down = row < lane.rows / 2;
        let active = density >= self.silence_density;

        self.lanes[i].density = density;
        self.post_player(i, "position", index as f32);
        self.post_player(i, "direction", if heading_down { 1.0 } else { 0.0 });
        self.post_player(i, "active", if active { 1.0 } else { 0.0 });
    }

    fn composition(&self) -> String {
        let voices: Vec<LaneVoice> = self
            .lanes
            .iter()
            .enumerate()
            .map(|(i, lane)| self.voice(i, lane))
            .collect();
        compose(&voices)
    }

    fn voice(&self, i: usize, lane: &Lane) -> LaneVoice {
        let ratio = (i as f32 + 2.0) / 2.0;
        let mut amplitude = if lane.density >= self.silence_density {
            self.voice_floor + self.voice_gain * lane.density.min(1.0)
        } else {
            0.0
        };
        if lane.hit {
            amplitude += self.hit_boost;
        }
        LaneVoice {
            pitch_hz: self.base_pitch_hz * ratio * 2f32.powf(2.0 * lane.density.min(1.0)),
            amplitude,
        }
    }

    fn post_wait_time(&self) {
        self.outbox.post(RawMessage::new(
            TO_SESSION,
            "waitTime",
            vec![Atom::Float(self.remaining as f32)],
        ));
    }

    fn post_player(&self, lane: usize, field: &str, value: f32) {
        self.outbox.post(RawMessage::new(
            TO_SESSION,
            "player",
            vec![
                Atom::Float(lane as f32),
                Atom::Symbol(field.to_string()),
                Atom::Float(value),
            ],
        ));
    }
}
