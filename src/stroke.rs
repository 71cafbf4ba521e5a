use egui::{Pos2, pos2};
use image::{Rgba, RgbaImage, imageops};

use crate::brush::{BrushSettings, BrushStyle};
use crate::layer::TRANSPARENT;

/// Upper bound on the number of line pieces a curve is flattened into
const MAX_CURVE_PIECES: usize = 64;

/// A sampled pointer position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    /// Normalized pen pressure, 0.0..=1.0
    pub pressure: f32,
    pub tilt_x: Option<f32>,
    pub tilt_y: Option<f32>,
}

impl Point {
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure,
            tilt_x: None,
            tilt_y: None,
        }
    }

    pub fn pos(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

/// One piece of a stroke: a quadratic curve drawn at a fixed width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Pos2,
    pub control: Pos2,
    pub end: Pos2,
    pub width: f32,
}

impl Segment {
    pub fn line(start: Pos2, end: Pos2, width: f32) -> Self {
        Self {
            start,
            control: start,
            end,
            width,
        }
    }

    fn point_at(&self, t: f32) -> Pos2 {
        let u = 1.0 - t;
        (self.start.to_vec2() * (u * u)
            + self.control.to_vec2() * (2.0 * u * t)
            + self.end.to_vec2() * (t * t))
            .to_pos2()
    }

    /// Flattens the curve into a polyline
    pub fn flatten(&self) -> Vec<Pos2> {
        let estimate = self.start.distance(self.control) + self.control.distance(self.end);
        let pieces = ((estimate / 2.0).ceil() as usize).clamp(1, MAX_CURVE_PIECES);
        (0..=pieces)
            .map(|i| self.point_at(i as f32 / pieces as f32))
            .collect()
    }
}

/// Pixels saved from under the provisional lead-out, put back before the stroke moves on
#[derive(Debug, Clone)]
struct Backing {
    x: u32,
    y: u32,
    pixels: RgbaImage,
}

impl Backing {
    fn capture(buffer: &RgbaImage, bounds: PixelBounds) -> Self {
        let pixels = imageops::crop_imm(buffer, bounds.x0, bounds.y0, bounds.width(), bounds.height())
            .to_image();
        Self {
            x: bounds.x0,
            y: bounds.y0,
            pixels,
        }
    }

    fn restore(&self, buffer: &mut RgbaImage) {
        imageops::replace(buffer, &self.pixels, i64::from(self.x), i64::from(self.y));
    }
}

/// The in-progress gesture
#[derive(Debug, Clone)]
struct ActiveStroke {
    path: Vec<Point>,
    /// Where the next curve starts: the first point, then each midpoint
    tail: Pos2,
    /// Pixels under the straight piece from `tail` to the last sample
    backing: Option<Backing>,
}

/// Per-stroke state machine: `Idle -> Drawing -> Idle`
///
/// Every accepted sample is drawn right away. The stroke is smoothed with quadratic
/// curves through the midpoints of consecutive samples; the stretch between the last
/// midpoint and the newest sample is drawn as a straight lead-out and replaced by the
/// curve once the next sample arrives.
#[derive(Debug, Clone, Default)]
pub struct StrokeState {
    active: Option<ActiveStroke>,
}

impl StrokeState {
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Points recorded for the current stroke, empty when idle
    pub fn path(&self) -> &[Point] {
        match &self.active {
            Some(stroke) => &stroke.path,
            None => &[],
        }
    }

    /// Begins a new stroke at `point`, replacing any stroke in progress
    pub fn start(&mut self, point: Point) {
        self.active = Some(ActiveStroke {
            path: vec![point],
            tail: point.pos(),
            backing: None,
        });
    }

    /// Records `point` and draws the stroke up to it onto `buffer`
    ///
    /// Samples closer to the last point than the brush's smoothing spacing are dropped.
    /// Returns true if anything was drawn.
    pub fn extend(&mut self, point: Point, brush: &BrushSettings, buffer: &mut RgbaImage) -> bool {
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        let Some(last) = stroke.path.last().copied() else {
            return false;
        };

        let spacing = brush.min_sample_spacing();
        if spacing > 0.0 && last.pos().distance(point.pos()) < spacing {
            return false;
        }

        if let Some(backing) = stroke.backing.take() {
            backing.restore(buffer);
        }

        let width = brush.width_at(point.pressure);
        let mid = last.pos().lerp(point.pos(), 0.5);
        let curve = Segment {
            start: stroke.tail,
            control: last.pos(),
            end: mid,
            width,
        };
        render_segment(buffer, &curve, brush);

        let lead = Segment::line(mid, point.pos(), width);
        stroke.backing = stroke_bounds(buffer.dimensions(), &lead.flatten(), width, &brush.style())
            .map(|bounds| Backing::capture(buffer, bounds));
        render_segment(buffer, &lead, brush);

        stroke.path.push(point);
        stroke.tail = mid;
        true
    }

    /// Returns to idle, keeping everything drawn so far. Yields the recorded samples.
    pub fn finish(&mut self) -> Option<Vec<Point>> {
        self.active.take().map(|stroke| stroke.path)
    }
}

/// Pixel rectangle `x0..x1` by `y0..y1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelBounds {
    fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Pixels a stroke along `polyline` can touch, clipped to the buffer
fn stroke_bounds(
    (width, height): (u32, u32),
    polyline: &[Pos2],
    stroke_width: f32,
    style: &BrushStyle,
) -> Option<PixelBounds> {
    let first = *polyline.first()?;
    let (min, max) = polyline
        .iter()
        .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));

    let reach = stroke_width * 0.5 + style.softness.max(1.0);
    let bounds = PixelBounds {
        x0: (min.x - reach).floor().max(0.0) as u32,
        y0: (min.y - reach).floor().max(0.0) as u32,
        x1: ((max.x + reach).ceil().max(0.0) as u32).min(width),
        y1: ((max.y + reach).ceil().max(0.0) as u32).min(height),
    };
    (bounds.x0 < bounds.x1 && bounds.y0 < bounds.y1).then_some(bounds)
}

/// Rasterizes one segment onto `buffer` with round caps
///
/// Coverage is evaluated once per pixel for the whole segment, so a segment never
/// darkens itself where it overlaps.
pub fn render_segment(buffer: &mut RgbaImage, segment: &Segment, brush: &BrushSettings) {
    let style = brush.style();
    if style.alpha <= 0.0 || segment.width <= 0.0 {
        return;
    }

    let polyline = segment.flatten();
    let Some(bounds) = stroke_bounds(buffer.dimensions(), &polyline, segment.width, &style) else {
        return;
    };
    let radius = segment.width * 0.5;
    let source = brush.color.with_alpha(255);

    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            let center = pos2(x as f32 + 0.5, y as f32 + 0.5);
            let distance = distance_to_polyline(center, &polyline);
            let alpha = coverage(distance, radius, &style) * style.alpha;
            if alpha <= 0.0 {
                continue;
            }
            let pixel = buffer.get_pixel_mut(x, y);
            *pixel = if style.erase {
                erase(*pixel, alpha)
            } else {
                source_over(*pixel, source, alpha)
            };
        }
    }
}

fn distance_to_polyline(p: Pos2, polyline: &[Pos2]) -> f32 {
    if polyline.len() == 1 {
        return p.distance(polyline[0]);
    }
    polyline
        .windows(2)
        .map(|w| distance_to_line(p, w[0], w[1]))
        .fold(f32::INFINITY, f32::min)
}

fn distance_to_line(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Fraction of a pixel at `distance` from the stroke centre line that the brush covers
fn coverage(distance: f32, radius: f32, style: &BrushStyle) -> f32 {
    // One pixel of antialiasing on the hard edge
    let hard = (radius + 0.5 - distance).clamp(0.0, 1.0);
    if style.softness <= 0.0 {
        return hard;
    }
    // Blurred halo spreading `softness` pixels to either side of the edge
    let halo = 1.0 - smoothstep(radius - style.softness, radius + style.softness, distance);
    hard.max(halo)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Straight-alpha source-over of an opaque colour at `alpha`
fn source_over(dst: Rgba<u8>, src: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let da = f32::from(dst[3]) / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        let c = (f32::from(s) * alpha + f32::from(d) * da * (1.0 - alpha)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Destination-out: removes `alpha` worth of the existing pixel
fn erase(dst: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let out_a = (f32::from(dst[3]) * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
    if out_a == 0 {
        TRANSPARENT
    } else {
        Rgba([dst[0], dst[1], dst[2], out_a])
    }
}
