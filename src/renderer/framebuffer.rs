//! CPU framebuffer
//!
//! Pixels are `Pod` so the whole buffer can be handed to the canvas as RGBA
//! bytes without copying.

use bytemuck::{Pod, Zeroable};

/// 8-bit RGBA pixel
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Multiply RGB by `k` (clamped to [0, 1])
    pub fn scale(self, k: f32) -> Self {
        let k = k.clamp(0.0, 1.0);
        let f = |c: u8| (c as f32 * k) as u8;
        Self::rgb(f(self.r), f(self.g), f(self.b))
    }

    /// Linear mix toward `other` by `t` in [0, 1]
    pub fn mix(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let f = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::rgb(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }
}

pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; (width * height) as usize],
        }
    }

    /// Reallocate for a new size; contents are cleared
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgba::BLACK; (width * height) as usize];
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Blend `color` over the existing pixel with opacity `alpha`
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, alpha: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].mix(color, alpha);
        }
    }

    /// Vertical span `[y0, y1)` in column `x`, clipped
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, color: Rgba) {
        let y0 = y0.max(0);
        let y1 = y1.min(self.height as i32);
        for y in y0..y1 {
            self.set_pixel(x, y, color);
        }
    }

    /// Rows `[y0, y1)` filled with one color
    pub fn fill_rows(&mut self, y0: u32, y1: u32, color: Rgba) {
        let w = self.width as usize;
        let start = (y0.min(self.height) as usize) * w;
        let end = (y1.min(self.height) as usize) * w;
        self.pixels[start..end].fill(color);
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA bytes, row-major, for `ImageData`
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}
