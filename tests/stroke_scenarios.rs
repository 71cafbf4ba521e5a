use raster_paint::{BrushSettings, BrushType, CanvasConfig, LayerUpdate, PaintSession, Point, Rgb};

// Helper to create a small session with a white background
fn create_test_session() -> PaintSession {
    PaintSession::new(CanvasConfig::with_size(64, 48))
}

fn brush(brush_type: BrushType, size: f32) -> BrushSettings {
    BrushSettings::new(brush_type, size, Rgb::BLACK).with_smoothing(0)
}

fn draw_line(session: &mut PaintSession, from: (f32, f32), to: (f32, f32), brush: &BrushSettings) {
    session.start_stroke(Point::new(from.0, from.1, 1.0), brush);
    session.continue_stroke(Point::new(to.0, to.1, 1.0), brush);
    session.end_stroke();
}

fn opaque_pixels(session: &PaintSession, index: usize) -> usize {
    session.layers()[index]
        .buffer
        .pixels()
        .filter(|p| p[3] == 255)
        .count()
}

fn visible_pixels(session: &PaintSession, index: usize) -> usize {
    session.layers()[index]
        .buffer
        .pixels()
        .filter(|p| p[3] > 0)
        .count()
}

#[test]
fn test_pen_streak_on_fresh_canvas() {
    let mut session = create_test_session();
    let pen = BrushSettings::new(BrushType::Pen, 8.0, "#000000".parse().unwrap());

    session.start_stroke(Point::new(10.0, 10.0, 1.0), &pen);
    session.continue_stroke(Point::new(20.0, 10.0, 1.0), &pen);
    session.end_stroke();

    let buffer = &session.layers()[0].buffer;
    // Black along the streak, about 8px tall around y = 10
    for x in 10..20 {
        assert_eq!(buffer.get_pixel(x, 10).0, [0, 0, 0, 255], "x = {}", x);
    }
    assert_eq!(buffer.get_pixel(15, 7).0, [0, 0, 0, 255]);
    assert_eq!(buffer.get_pixel(15, 12).0, [0, 0, 0, 255]);
    // White outside of it
    assert_eq!(buffer.get_pixel(15, 20).0, [255, 255, 255, 255]);
    assert_eq!(buffer.get_pixel(30, 10).0, [255, 255, 255, 255]);

    assert!(session.can_undo());
    assert!(!session.is_drawing());
    assert!(session.stroke_path().is_empty());
}

#[test]
fn test_pen_increases_opaque_pixels() {
    let mut session = create_test_session();
    session.add_layer();
    let before = opaque_pixels(&session, 1);
    assert_eq!(before, 0);

    draw_line(&mut session, (5.0, 20.0), (40.0, 20.0), &brush(BrushType::Pen, 6.0));
    assert!(opaque_pixels(&session, 1) > before);
    // The background stays untouched
    assert_eq!(opaque_pixels(&session, 0), 64 * 48);
}

#[test]
fn test_eraser_decreases_visible_pixels() {
    let mut session = create_test_session();
    let before = visible_pixels(&session, 0);

    draw_line(&mut session, (5.0, 20.0), (40.0, 20.0), &brush(BrushType::Eraser, 6.0));
    let after = visible_pixels(&session, 0);
    assert!(after < before);
    assert_eq!(session.layers()[0].buffer.get_pixel(20, 20)[3], 0);
}

#[test]
fn test_every_brush_marks_the_layer() {
    for brush_type in [BrushType::Pen, BrushType::Pencil, BrushType::Airbrush, BrushType::Marker] {
        let mut session = create_test_session();
        let id = session.add_layer();
        draw_line(&mut session, (10.0, 24.0), (50.0, 24.0), &brush(brush_type, 10.0));
        assert!(!session.layer(id).unwrap().is_transparent(), "{:?}", brush_type);
    }
}

#[test]
fn test_stroke_on_locked_layer_is_ignored() {
    let mut session = create_test_session();
    let id = session.active_layer_id();
    session.update_layer(id, LayerUpdate::locked(true));
    let before = session.layers()[0].buffer.clone();

    draw_line(&mut session, (5.0, 5.0), (30.0, 5.0), &brush(BrushType::Pen, 6.0));
    assert_eq!(session.layers()[0].buffer, before);
    assert!(!session.can_undo());
}

#[test]
fn test_stroke_draws_on_active_layer_only() {
    let mut session = create_test_session();
    let background = session.active_layer_id();
    let top = session.add_layer();
    session.set_active_layer(background);

    draw_line(&mut session, (5.0, 5.0), (30.0, 5.0), &brush(BrushType::Pen, 4.0));
    assert!(session.layer(top).unwrap().is_transparent());
    assert_eq!(session.layer(background).unwrap().buffer.get_pixel(15, 5).0, [0, 0, 0, 255]);
}

#[test]
fn test_smoothing_skips_jitter() {
    let mut session = create_test_session();
    let id = session.add_layer();
    let smooth = BrushSettings::new(BrushType::Pen, 40.0, Rgb::BLACK).with_smoothing(100);

    session.start_stroke(Point::new(30.0, 24.0, 1.0), &smooth);
    // Closer than 10px to the last sample: dropped entirely
    session.continue_stroke(Point::new(33.0, 24.0, 1.0), &smooth);
    assert_eq!(session.stroke_path().len(), 1);
    session.end_stroke();

    assert!(session.layer(id).unwrap().is_transparent());
}
