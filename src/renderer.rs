// src/renderer.rs
use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use image::{Rgba, RgbaImage};

use crate::layer::{Layer, TRANSPARENT};

/// Merges visible layers bottom to top into `target`
///
/// `target` is cleared first. Each layer's opacity scales its own alpha uniformly;
/// hidden layers contribute nothing.
pub fn composite(layers: &[Layer], target: &mut RgbaImage) {
    for pixel in target.pixels_mut() {
        *pixel = TRANSPARENT;
    }
    composite_over(layers, target);
}

/// Draws visible layers over whatever `target` already holds
pub fn composite_over(layers: &[Layer], target: &mut RgbaImage) {
    for layer in layers.iter().filter(|layer| layer.visible) {
        let opacity = layer.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            continue;
        }
        for (dst, src) in target.pixels_mut().zip(layer.buffer.pixels()) {
            if src[3] == 0 {
                continue;
            }
            *dst = blend_over(*dst, *src, opacity);
        }
    }
}

/// Straight-alpha source-over with an extra opacity multiplier on the source
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0 * opacity;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        let c = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Keeps the on-screen composite of a document's layers
///
/// Recomposites every frame, whether or not anything changed, and keeps egui
/// repainting continuously.
pub struct Renderer {
    display: RgbaImage,
    texture: Option<TextureHandle>,
    frames: u64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("display", &format_args!("{}x{}", self.display.width(), self.display.height()))
            .field("texture", &self.texture.as_ref().map(|t| t.id()))
            .field("frames", &self.frames)
            .finish()
    }
}

impl Renderer {
    /// Creates a renderer with a display buffer of the canvas size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: RgbaImage::from_pixel(width, height, TRANSPARENT),
            texture: None,
            frames: 0,
        }
    }

    /// The most recently composited frame
    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Recomposites the layers into the display buffer
    pub fn composite_frame(&mut self, layers: &[Layer]) {
        if let Some(first) = layers.first() {
            if first.buffer.dimensions() != self.display.dimensions() {
                let (width, height) = first.buffer.dimensions();
                self.display = RgbaImage::from_pixel(width, height, TRANSPARENT);
            }
        }
        composite(layers, &mut self.display);
        self.frames += 1;
    }

    /// Composites, uploads and paints the canvas into `rect`
    ///
    /// Args:
    ///     ctx (egui::Context): The egui context for the current frame
    ///     painter (egui::Painter): The painter to draw with
    ///     rect (egui::Rect): Screen rectangle the canvas is stretched over
    ///     layers (&[Layer]): Layers in bottom-to-top order
    pub fn render(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect, layers: &[Layer]) {
        self.composite_frame(layers);

        let size = [self.display.width() as usize, self.display.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, self.display.as_raw());

        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR)),
        }

        painter.rect_filled(rect, 0.0, Color32::from_gray(200));
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // Request continuous rendering
        ctx.request_repaint();
    }
}
