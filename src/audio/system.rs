//! Audio system: cpal output stream rendering the sonification patch.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use glicol::Engine;

use super::patch::SonifyPatch;
use super::AudioEngine;
use crate::error::AudioError;
use crate::messages::{InboxSender, OutboundMessage};
use crate::params::audio_constants::{BLOCK_SIZE, CHANNELS, IMAGE_ARRAY};
use crate::params::{AudioConfig, PlayerRosterConfig, ScoreConfig};

/// Capacity of the session -> audio message queue
const OUTBOUND_CAPACITY: usize = 64;

/// Audio system owning the output stream and the patch running inside it
pub struct AudioSystem {
    /// Last published score array; swapped whole, never written in place
    image_data: Arc<ArcSwapOption<Vec<f32>>>,

    /// Messages for the patch, drained once per device buffer
    outbound: Sender<OutboundMessage>,

    /// Length every published score must have
    sample_count: usize,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioSystem {
    /// Open the default output device and start the patch.
    ///
    /// `inbox` receives every message the patch sends to the session.
    pub fn new(
        config: &AudioConfig,
        score: &ScoreConfig,
        roster: &PlayerRosterConfig,
        inbox: InboxSender,
    ) -> Result<Self, AudioError> {
        config
            .validate()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(config.sample_rate_hz);
        engine.update_with_code(super::synthesis::SILENCE);
        engine
            .update()
            .map_err(|e| AudioError::Synthesis(format!("{:?}", e)))?;

        let mut patch = SonifyPatch::new(config, score, roster, inbox);

        let image_data = Arc::new(ArcSwapOption::<Vec<f32>>::empty());
        let image_data_audio = Arc::clone(&image_data);
        let (outbound, outbound_rx): (Sender<OutboundMessage>, Receiver<OutboundMessage>) =
            bounded(OUTBOUND_CAPACITY);

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let mut stream_config: cpal::StreamConfig = supported.into();
        stream_config.channels = CHANNELS as u16;
        stream_config.sample_rate = cpal::SampleRate(config.sample_rate_hz as u32);
        stream_config.buffer_size = cpal::BufferSize::Fixed(config.buffer_frames() as u32);

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = config.sample_rate_hz,
            buffer_frames = config.buffer_frames(),
            "audio output"
        );

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for message in outbound_rx.try_iter() {
                        patch.receive(&message);
                    }

                    // Pick up a newly published score; the Arc is either the
                    // previous array or a complete new one.
                    if let Some(latest) = image_data_audio.load_full() {
                        let stale = patch
                            .score()
                            .map_or(true, |current| !Arc::ptr_eq(current, &latest));
                        if stale && !patch.set_score(latest) {
                            tracing::warn!("published score has the wrong length, ignored");
                        }
                    }

                    let frames_needed = data.len() / CHANNELS;
                    let mut frame_idx = 0;

                    // Generate multiple blocks if needed to fill the entire buffer
                    while frame_idx < frames_needed {
                        if let Some(code) = patch.advance(BLOCK_SIZE) {
                            engine.update_with_code(&code);
                        }
                        let (buffers, _) = engine.next_block(vec![]);

                        let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                        for i in 0..samples_to_copy {
                            // Safety limiter: hard clip to ±0.5
                            let left = buffers[0][i].clamp(-0.5, 0.5);
                            let right = buffers[1][i].clamp(-0.5, 0.5);

                            let out_idx = (frame_idx + i) * CHANNELS;
                            data[out_idx] = left;
                            data[out_idx + 1] = right;
                        }

                        frame_idx += samples_to_copy;
                    }
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;

        Ok(Self {
            image_data,
            outbound,
            sample_count: score.sample_count(),
            _stream: stream,
        })
    }
}

impl AudioEngine for AudioSystem {
    fn write_array(&mut self, name: &str, data: Arc<Vec<f32>>) -> Result<(), AudioError> {
        if name != IMAGE_ARRAY {
            return Err(AudioError::UnknownArray(name.to_string()));
        }
        if data.len() != self.sample_count {
            return Err(AudioError::ArrayLength {
                name: name.to_string(),
                expected: self.sample_count,
                got: data.len(),
            });
        }
        tracing::debug!(len = data.len(), "publishing {}", name);
        self.image_data.store(Some(data));
        Ok(())
    }

    fn send(&mut self, message: OutboundMessage) -> Result<(), AudioError> {
        tracing::debug!(raw = ?message.to_raw(), "to engine");
        match self.outbound.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                tracing::warn!(?message, "audio engine queue full, message dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(AudioError::Disconnected),
        }
    }
}
