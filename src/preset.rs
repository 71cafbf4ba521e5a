use egui::{Pos2, pos2};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::brush::{BrushSettings, BrushType};
use crate::color::Rgb;
use crate::stroke::{Segment, render_segment};

/// Figure height as a fraction of the canvas height
const FIGURE_SCALE: f32 = 0.6;
/// Line width of the stamped figure, in figure units (100 x 200 box)
const LINE_WIDTH: f32 = 2.0;
const HEAD_SEGMENTS: usize = 32;

/// Mannequin outlines that can be stamped onto the active layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Male,
    Female,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Male, Preset::Female];

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Male => "Male",
            Preset::Female => "Female",
        }
    }

    /// Limb lines in a 100 x 200 box, head excluded
    fn limbs(&self) -> &'static [[f32; 4]] {
        match self {
            // Broader shoulders
            Preset::Male => &[
                [50.0, 32.0, 50.0, 90.0],
                [50.0, 45.0, 20.0, 75.0],
                [50.0, 45.0, 80.0, 75.0],
                [50.0, 90.0, 30.0, 150.0],
                [50.0, 90.0, 70.0, 150.0],
                [30.0, 150.0, 25.0, 190.0],
                [70.0, 150.0, 75.0, 190.0],
            ],
            // Narrower shoulders, wider hips
            Preset::Female => &[
                [50.0, 32.0, 50.0, 90.0],
                [50.0, 42.0, 28.0, 68.0],
                [50.0, 42.0, 72.0, 68.0],
                [50.0, 90.0, 25.0, 150.0],
                [50.0, 90.0, 75.0, 150.0],
                [25.0, 150.0, 22.0, 190.0],
                [75.0, 150.0, 78.0, 190.0],
            ],
        }
    }

    /// Segments of the figure in figure units
    fn outline(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .limbs()
            .iter()
            .map(|&[x0, y0, x1, y1]| Segment::line(pos2(x0, y0), pos2(x1, y1), LINE_WIDTH))
            .collect();

        let head_centre = pos2(50.0, 18.0);
        let head_radius = 14.0;
        let rim = |i: usize| {
            let angle = i as f32 / HEAD_SEGMENTS as f32 * std::f32::consts::TAU;
            head_centre + egui::vec2(angle.cos(), angle.sin()) * head_radius
        };
        segments.extend((0..HEAD_SEGMENTS).map(|i| Segment::line(rim(i), rim(i + 1), LINE_WIDTH)));

        if *self == Preset::Female {
            // Hip curve
            segments.push(Segment {
                start: pos2(40.0, 75.0),
                control: pos2(50.0, 95.0),
                end: pos2(60.0, 75.0),
                width: LINE_WIDTH,
            });
        }
        segments
    }

    /// Draws the figure centred on `buffer` with a black pen
    pub fn stamp(&self, buffer: &mut RgbaImage) {
        let (width, height) = buffer.dimensions();
        let scale = height as f32 * FIGURE_SCALE / 200.0;
        let origin = pos2(
            width as f32 * 0.5 - 50.0 * scale,
            height as f32 * 0.5 - 100.0 * scale,
        );
        let place = |p: Pos2| origin + p.to_vec2() * scale;

        let pen = BrushSettings::new(BrushType::Pen, LINE_WIDTH * scale, Rgb::BLACK);
        for segment in self.outline() {
            let placed = Segment {
                start: place(segment.start),
                control: place(segment.control),
                end: place(segment.end),
                width: (segment.width * scale).max(1.0),
            };
            render_segment(buffer, &placed, &pen);
        }
    }
}
