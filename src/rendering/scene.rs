//! Compose one frame of the installation from session state.

use crate::audio::AudioEngine;
use crate::params::RenderConfig;
use crate::session::{Mode, SessionController};

use super::canvas::{Canvas, WHITE};

/// Draw the current session state into `canvas`
pub fn compose<E: AudioEngine>(
    canvas: &mut Canvas,
    session: &SessionController<E>,
    style: &RenderConfig,
) {
    match session.mode() {
        Mode::Wait => draw_wait(canvas, session, style),
        Mode::Capture => canvas.clear(WHITE),
        Mode::Transition => draw_score(canvas, session),
        Mode::Sonification => {
            draw_score(canvas, session);
            draw_players(canvas, session);
            draw_collisions(canvas, session, style);
        }
    }
}

/// Camera frame with the trigger band tinted over it and the countdown as a
/// row of pips inside the band
fn draw_wait<E: AudioEngine>(
    canvas: &mut Canvas,
    session: &SessionController<E>,
    style: &RenderConfig,
) {
    canvas.clear(WHITE);
    canvas.draw_gray(session.frame(), 1.0);

    let zone = session.trigger_zone();
    let band_height = zone.bottom - zone.top;
    canvas.fill_rect(0.0, zone.top, canvas.width() as f32, band_height, style.band_rgba);

    let (size, gap) = (style.pip_size_px, style.pip_gap_px);
    let pips = session.countdown();
    let row_width = pips as f32 * (size + gap) - gap;
    let mut x = (canvas.width() as f32 - row_width) / 2.0;
    let y = zone.top + (band_height - size) / 2.0;
    for _ in 0..pips {
        canvas.fill_rect(x, y, size, size, style.pip_rgba);
        x += size + gap;
    }
}

fn draw_score<E: AudioEngine>(canvas: &mut Canvas, session: &SessionController<E>) {
    canvas.clear(WHITE);
    canvas.draw_gray(session.score().grid(), session.alpha());
}

fn draw_players<E: AudioEngine>(canvas: &mut Canvas, session: &SessionController<E>) {
    for player in session.players().iter().filter(|p| p.is_active()) {
        let [r, g, b] = player.color().rgb();
        let pos = player.position();
        let size = player.cell_size() as f32;
        canvas.fill_rect(pos.x, pos.y, size, size, [r, g, b, 255]);
    }
}

fn draw_collisions<E: AudioEngine>(
    canvas: &mut Canvas,
    session: &SessionController<E>,
    style: &RenderConfig,
) {
    let players = session.players();
    for collision in session.collisions().iter() {
        let Some(player) = players.get(collision.player()) else {
            continue;
        };
        let [r, g, b] = player.color().rgb();
        let progress = collision.progress();
        let alpha = ((1.0 - progress) * 255.0).round() as u8;
        let radius = session.collision_max_radius() * progress;
        canvas.stroke_ring(
            collision.position(),
            radius,
            style.ring_thickness_px,
            [r, g, b, alpha],
        );
    }
}
