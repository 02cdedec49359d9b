//! Message protocol between the session and the audio engine, and the
//! queues that carry it across threads.
//!
//! The audio thread only ever `try_send`s into an [`Inbox`]; the visual tick
//! drains it once per tick before advancing the simulation. Nothing on the
//! audio side blocks or touches session state directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use glam::Vec2;

use crate::error::MessageError;
use crate::params::audio_constants::{FROM_SESSION, TO_SESSION};
use crate::player::PlayerId;

/// One message argument
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(String),
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(value.to_string())
    }
}

/// Unparsed message as delivered by the engine: destination channel,
/// selector and argument list
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub dest: String,
    pub selector: String,
    pub args: Vec<Atom>,
}

impl RawMessage {
    pub fn new(dest: &str, selector: &str, args: Vec<Atom>) -> Self {
        Self {
            dest: dest.to_string(),
            selector: selector.to_string(),
            args,
        }
    }
}

/// Which player field a `player` message sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerField {
    Position(i64),
    Direction(bool),
    Active(bool),
}

/// Validated inbound control message
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Remaining countdown before capture
    WaitTime(u32),
    /// Per-player field update; `index` is not yet checked against the roster
    Player { index: usize, field: PlayerField },
}

impl ControlMessage {
    /// Validate a raw engine message.
    ///
    /// Numbers are truncated toward zero the way the engine's integer
    /// arguments are meant to be read.
    pub fn parse(raw: &RawMessage) -> Result<Self, MessageError> {
        if raw.dest != TO_SESSION {
            return Err(MessageError::UnknownChannel(raw.dest.clone()));
        }

        match raw.selector.as_str() {
            "waitTime" => {
                expect_arity("waitTime", &raw.args, 1)?;
                let value = float_arg("waitTime", &raw.args, 0)?;
                if value < 0.0 {
                    return Err(MessageError::NegativeCountdown(value));
                }
                Ok(ControlMessage::WaitTime(value.trunc() as u32))
            }
            "player" => {
                expect_arity("player", &raw.args, 3)?;
                let index = float_arg("player", &raw.args, 0)?;
                let field = symbol_arg("player", &raw.args, 1)?;
                let value = float_arg("player", &raw.args, 2)?;

                // Negative indices can never address the roster; upper bound is
                // checked by the session against the actual roster length.
                if index < 0.0 {
                    return Err(MessageError::PlayerIndex { index, len: 0 });
                }

                let field = match field {
                    "position" => PlayerField::Position(value.trunc() as i64),
                    "direction" => PlayerField::Direction(value.trunc() != 0.0),
                    "active" => PlayerField::Active(value.trunc() != 0.0),
                    other => return Err(MessageError::PlayerField(other.to_string())),
                };
                Ok(ControlMessage::Player {
                    index: index.trunc() as usize,
                    field,
                })
            }
            other => Err(MessageError::UnknownSelector(other.to_string())),
        }
    }
}

fn expect_arity(selector: &'static str, args: &[Atom], expected: usize) -> Result<(), MessageError> {
    if args.len() != expected {
        return Err(MessageError::Arity {
            selector,
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn float_arg(selector: &'static str, args: &[Atom], position: usize) -> Result<f32, MessageError> {
    match args.get(position) {
        Some(Atom::Float(v)) if v.is_finite() => Ok(*v),
        Some(Atom::Float(_)) => Err(MessageError::NotFinite { selector, position }),
        _ => Err(MessageError::AtomKind {
            selector,
            position,
            expected: "number",
        }),
    }
}

fn symbol_arg<'a>(
    selector: &'static str,
    args: &'a [Atom],
    position: usize,
) -> Result<&'a str, MessageError> {
    match args.get(position) {
        Some(Atom::Symbol(s)) => Ok(s.as_str()),
        _ => Err(MessageError::AtomKind {
            selector,
            position,
            expected: "symbol",
        }),
    }
}

/// Messages the session sends to the engine on the `fromOF` channel
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Sonification has begun
    Start,
    /// A player entered the trigger band at `position`
    Collision { player: PlayerId, position: Vec2 },
}

impl OutboundMessage {
    /// Wire form of the message
    pub fn to_raw(&self) -> RawMessage {
        match self {
            OutboundMessage::Start => RawMessage::new(FROM_SESSION, "start", Vec::new()),
            OutboundMessage::Collision { player, position } => RawMessage::new(
                FROM_SESSION,
                "collision",
                vec![
                    Atom::Float(*player as f32),
                    Atom::Float(position.x),
                    Atom::Float(position.y),
                ],
            ),
        }
    }
}

/// Producer half of the inbound queue, held by the audio thread
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: Sender<RawMessage>,
    dropped: Arc<AtomicU64>,
}

impl InboxSender {
    /// Enqueue without blocking. A full or closed queue drops the message.
    pub fn post(&self, message: RawMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Consumer half of the inbound queue, drained by the visual tick
#[derive(Debug)]
pub struct Inbox {
    rx: Receiver<RawMessage>,
    dropped: Arc<AtomicU64>,
    reported_drops: u64,
}

impl Inbox {
    /// Bounded single-producer/single-consumer style queue
    pub fn channel(capacity: usize) -> (InboxSender, Inbox) {
        let (tx, rx) = bounded(capacity);
        let dropped = Arc::new(AtomicU64::new(0));
        (
            InboxSender {
                tx,
                dropped: Arc::clone(&dropped),
            },
            Inbox {
                rx,
                dropped,
                reported_drops: 0,
            },
        )
    }

    /// Everything queued right now, oldest first
    pub fn drain(&mut self) -> Vec<RawMessage> {
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_drops {
            tracing::warn!(
                count = dropped - self.reported_drops,
                "inbound queue full, messages dropped"
            );
            self.reported_drops = dropped;
        }
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(selector: &str, args: Vec<Atom>) -> RawMessage {
        RawMessage::new(TO_SESSION, selector, args)
    }

    #[test]
    fn test_parse_wait_time() {
        let msg = ControlMessage::parse(&raw("waitTime", vec![Atom::Float(3.0)])).unwrap();
        assert_eq!(msg, ControlMessage::WaitTime(3));
        let msg = ControlMessage::parse(&raw("waitTime", vec![Atom::Float(0.9)])).unwrap();
        assert_eq!(msg, ControlMessage::WaitTime(0));
    }

    #[test]
    fn test_parse_player_fields() {
        let msg = ControlMessage::parse(&raw("player", vec![Atom::Float(2.0), "active".into(), Atom::Float(1.0)]));
        assert_eq!(
            msg,
            Ok(ControlMessage::Player {
                index: 2,
                field: PlayerField::Active(true)
            })
        );

        let msg = ControlMessage::parse(&raw(
            "player",
            vec![Atom::Float(0.0), "position".into(), Atom::Float(117.0)],
        ));
        assert_eq!(
            msg,
            Ok(ControlMessage::Player {
                index: 0,
                field: PlayerField::Position(117)
            })
        );

        let msg = ControlMessage::parse(&raw(
            "player",
            vec![Atom::Float(1.0), "direction".into(), Atom::Float(0.0)],
        ));
        assert_eq!(
            msg,
            Ok(ControlMessage::Player {
                index: 1,
                field: PlayerField::Direction(false)
            })
        );
    }

    #[test]
    fn test_reject_wrong_channel() {
        let msg = RawMessage::new("elsewhere", "waitTime", vec![Atom::Float(1.0)]);
        assert_eq!(
            ControlMessage::parse(&msg),
            Err(MessageError::UnknownChannel("elsewhere".to_string()))
        );
    }

    #[test]
    fn test_reject_malformed_shapes() {
        assert!(matches!(
            ControlMessage::parse(&raw("waitTime", vec![])),
            Err(MessageError::Arity { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("waitTime", vec!["soon".into()])),
            Err(MessageError::AtomKind { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("waitTime", vec![f32::NAN.into()])),
            Err(MessageError::NotFinite { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("waitTime", vec![Atom::Float(-1.0)])),
            Err(MessageError::NegativeCountdown(_))
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("player", vec![Atom::Float(1.0), Atom::Float(2.0), Atom::Float(3.0)])),
            Err(MessageError::AtomKind { position: 1, .. })
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("player", vec![Atom::Float(1.0), "colour".into(), Atom::Float(3.0)])),
            Err(MessageError::PlayerField(_))
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("player", vec![Atom::Float(-2.0), "active".into(), Atom::Float(1.0)])),
            Err(MessageError::PlayerIndex { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(&raw("bang", vec![])),
            Err(MessageError::UnknownSelector(_))
        ));
    }

    #[test]
    fn test_outbound_wire_form() {
        let start = OutboundMessage::Start.to_raw();
        assert_eq!(start.dest, "fromOF");
        assert_eq!(start.selector, "start");
        assert!(start.args.is_empty());

        let hit = OutboundMessage::Collision {
            player: 1,
            position: Vec2::new(10.0, 20.0),
        }
        .to_raw();
        assert_eq!(hit.args, vec![Atom::Float(1.0), Atom::Float(10.0), Atom::Float(20.0)]);
    }

    #[test]
    fn test_inbox_preserves_order_and_drops_when_full() {
        let (tx, mut inbox) = Inbox::channel(2);
        tx.post(raw("waitTime", vec![Atom::Float(2.0)]));
        tx.post(raw("waitTime", vec![Atom::Float(1.0)]));
        tx.post(raw("waitTime", vec![Atom::Float(0.0)]));

        let drained = inbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].args, vec![Atom::Float(2.0)]);
        assert_eq!(drained[1].args, vec![Atom::Float(1.0)]);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_inbox_crosses_threads() {
        let (tx, mut inbox) = Inbox::channel(64);
        let handle = std::thread::spawn(move || {
            for i in (0..10).rev() {
                tx.post(raw("waitTime", vec![(i as f32).into()]));
            }
        });
        handle.join().unwrap();
        let values: Vec<_> = inbox
            .drain()
            .iter()
            .map(|m| ControlMessage::parse(m).unwrap())
            .collect();
        assert_eq!(values.len(), 10);
        assert_eq!(values.last(), Some(&ControlMessage::WaitTime(0)));
    }
}
