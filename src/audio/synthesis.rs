//! Glicol composition generated from the lane voices.

use std::fmt::Write;

/// Glicol code for silence (used until sonification starts)
pub const SILENCE: &str = "o: sin 0.0 >> mul 0.0\n";

/// One sine voice per player lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneVoice {
    pub pitch_hz: f32,
    pub amplitude: f32,
}

/// Render the lane voices as a Glicol composition: one named chain per
/// lane, mixed and sent through a short plate reverb.
pub fn compose(voices: &[LaneVoice]) -> String {
    if voices.is_empty() {
        return SILENCE.to_string();
    }

    let mut code = String::new();
    for (i, voice) in voices.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            code,
            "~lane{}: sin {:.2} >> mul {:.4}",
            i, voice.pitch_hz, voice.amplitude
        );
    }
    let refs: Vec<String> = (0..voices.len()).map(|i| format!("~lane{}", i)).collect();
    let _ = writeln!(code, "o: mix {} >> plate 0.1", refs.join(" "));
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_names_every_lane() {
        let code = compose(&[
            LaneVoice {
                pitch_hz: 110.0,
                amplitude: 0.1,
            },
            LaneVoice {
                pitch_hz: 220.5,
                amplitude: 0.05,
            },
        ]);
        assert!(code.contains("~lane0: sin 110.00 >> mul 0.1000"));
        assert!(code.contains("~lane1: sin 220.50 >> mul 0.0500"));
        assert!(code.ends_with("o: mix ~lane0 ~lane1 >> plate 0.1\n"));
    }

    #[test]
    fn test_compose_without_lanes_is_silent() {
        assert_eq!(compose(&[]), SILENCE);
    }
}
