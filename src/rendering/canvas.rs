//! CPU framebuffer the scene is composed into before upload.

use glam::Vec2;
use image::GrayImage;

/// RGBA8 pixel
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];

/// Straight-alpha RGBA8 framebuffer
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![WHITE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Raw bytes for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Draw a grayscale image over the whole canvas at `alpha` opacity.
    /// The image must match the canvas size; anything else is skipped.
    pub fn draw_gray(&mut self, image: &GrayImage, alpha: f32) {
        if image.dimensions() != (self.width, self.height) {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        for (dst, &g) in self.pixels.iter_mut().zip(image.as_raw()) {
            *dst = blend(*dst, [g, g, g], a);
        }
    }

    /// Alpha-blended axis-aligned rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let x0 = x.max(0.0) as u32;
        let y0 = y.max(0.0) as u32;
        let x1 = ((x + w).max(0.0) as u32).min(self.width);
        let y1 = ((y + h).max(0.0) as u32).min(self.height);
        let a = color[3] as f32 / 255.0;
        let rgb = [color[0], color[1], color[2]];

        for py in y0..y1 {
            let row = (py * self.width) as usize;
            for px in x0..x1 {
                let dst = &mut self.pixels[row + px as usize];
                *dst = blend(*dst, rgb, a);
            }
        }
    }

    /// Alpha-blended ring of the given radius and thickness
    pub fn stroke_ring(&mut self, center: Vec2, radius: f32, thickness: f32, color: Rgba) {
        let outer = radius + thickness / 2.0;
        let inner = (radius - thickness / 2.0).max(0.0);
        let x0 = (center.x - outer).floor().max(0.0) as u32;
        let y0 = (center.y - outer).floor().max(0.0) as u32;
        let x1 = ((center.x + outer).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((center.y + outer).ceil().max(0.0) as u32).min(self.height);
        let a = color[3] as f32 / 255.0;
        let rgb = [color[0], color[1], color[2]];

        for py in y0..y1 {
            for px in x0..x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5).distance(center);
                if d >= inner && d <= outer {
                    let dst = &mut self.pixels[(py * self.width + px) as usize];
                    *dst = blend(*dst, rgb, a);
                }
            }
        }
    }
}

fn blend(dst: Rgba, src: [u8; 3], alpha: f32) -> Rgba {
    let mix = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * alpha).round() as u8;
    [
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        255,
    ]
}
