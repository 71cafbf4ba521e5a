use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Blur radius of the pencil's halo, in pixels
const PENCIL_BLUR: f32 = 1.5;

/// The closed set of brushes the stroke renderer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushType {
    #[default]
    Pen,
    Pencil,
    Airbrush,
    Marker,
    Eraser,
}

impl BrushType {
    pub const ALL: [BrushType; 5] = [
        BrushType::Pen,
        BrushType::Pencil,
        BrushType::Airbrush,
        BrushType::Marker,
        BrushType::Eraser,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BrushType::Pen => "Pen",
            BrushType::Pencil => "Pencil",
            BrushType::Airbrush => "Airbrush",
            BrushType::Marker => "Marker",
            BrushType::Eraser => "Eraser",
        }
    }
}

/// Brush configuration owned by the UI and handed to the core per stroke call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    #[serde(rename = "type")]
    pub brush_type: BrushType,
    /// Nominal stroke width in pixels, always > 0
    pub size: f32,
    /// 0.0..=1.0
    pub opacity: f32,
    pub color: Rgb,
    /// 0..=100, higher values drop more closely spaced pointer samples
    pub smoothing: u8,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            brush_type: BrushType::Pen,
            size: 8.0,
            opacity: 1.0,
            color: Rgb::BLACK,
            smoothing: 50,
        }
    }
}

impl BrushSettings {
    pub fn new(brush_type: BrushType, size: f32, color: Rgb) -> Self {
        Self {
            brush_type,
            size,
            color,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_smoothing(mut self, smoothing: u8) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Width before pressure is applied; the eraser works at double size
    pub fn base_size(&self) -> f32 {
        let size = self.size.max(0.0);
        match self.brush_type {
            BrushType::Eraser => size * 2.0,
            _ => size,
        }
    }

    /// Pressure-scaled stroke width. Devices reporting no pressure count as half pressure.
    pub fn width_at(&self, pressure: f32) -> f32 {
        let pressure = if pressure > 0.0 { pressure.min(1.0) } else { 0.5 };
        self.base_size() * (0.5 + pressure * 0.5)
    }

    /// Minimum distance between consecutive samples that still get rendered
    pub fn min_sample_spacing(&self) -> f32 {
        self.size.max(0.0) * f32::from(self.smoothing.min(100)) / 100.0 * 0.25
    }

    /// Rendering parameters derived from the brush type
    pub fn style(&self) -> BrushStyle {
        let opacity = self.opacity.clamp(0.0, 1.0);
        match self.brush_type {
            BrushType::Pen => BrushStyle::paint(opacity, 0.0),
            BrushType::Pencil => BrushStyle::paint(opacity, PENCIL_BLUR),
            BrushType::Airbrush => BrushStyle::paint(opacity * 0.3, self.size.max(0.0) * 0.5),
            BrushType::Marker => BrushStyle::paint(opacity * 0.7, 0.0),
            BrushType::Eraser => BrushStyle {
                alpha: opacity,
                softness: 0.0,
                erase: true,
            },
        }
    }
}

/// How a single segment is composited onto the layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStyle {
    /// Peak alpha of the segment's coverage
    pub alpha: f32,
    /// Blur radius of the halo around the hard edge, 0 for a crisp edge
    pub softness: f32,
    /// Clear alpha instead of painting colour
    pub erase: bool,
}

impl BrushStyle {
    fn paint(alpha: f32, softness: f32) -> Self {
        Self {
            alpha,
            softness,
            erase: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eraser_doubles_base_size() {
        let pen = BrushSettings::new(BrushType::Pen, 10.0, Rgb::BLACK);
        let eraser = BrushSettings::new(BrushType::Eraser, 10.0, Rgb::BLACK);
        assert_eq!(pen.base_size(), 10.0);
        assert_eq!(eraser.base_size(), 20.0);
    }

    #[test]
    fn width_scales_with_pressure() {
        let pen = BrushSettings::new(BrushType::Pen, 8.0, Rgb::BLACK);
        assert_eq!(pen.width_at(1.0), 8.0);
        assert_eq!(pen.width_at(0.5), 6.0);
        // Missing pressure behaves like half pressure
        assert_eq!(pen.width_at(0.0), 6.0);
    }

    #[test]
    fn styles_follow_brush_type() {
        let brush = |t| BrushSettings::new(t, 10.0, Rgb::BLACK).with_opacity(1.0).style();

        assert_eq!(brush(BrushType::Pen).alpha, 1.0);
        assert_eq!(brush(BrushType::Pencil).softness, 1.5);
        assert_eq!(brush(BrushType::Pen).softness, 0.0);
        assert!((brush(BrushType::Airbrush).alpha - 0.3).abs() < 1e-6);
        assert_eq!(brush(BrushType::Airbrush).softness, 5.0);
        assert!((brush(BrushType::Marker).alpha - 0.7).abs() < 1e-6);
        assert!(brush(BrushType::Eraser).erase);
        assert!(!brush(BrushType::Pen).erase);
    }

    #[test]
    fn zero_smoothing_keeps_every_sample() {
        let brush = BrushSettings::default().with_smoothing(0);
        assert_eq!(brush.min_sample_spacing(), 0.0);
        let brush = BrushSettings::default().with_smoothing(100);
        assert_eq!(brush.min_sample_spacing(), 2.0);
    }

    #[test]
    fn settings_serialize_with_hex_colour() {
        let brush = BrushSettings::new(BrushType::Marker, 4.0, Rgb::new(255, 0, 0));
        let json = serde_json::to_value(&brush).unwrap();
        assert_eq!(json["type"], "marker");
        assert_eq!(json["color"], "#ff0000");

        let back: BrushSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, brush);
    }
}
