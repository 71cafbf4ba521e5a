use raster_paint::{
    BrushSettings, BrushType, CanvasConfig, ExportFormat, LayerUpdate, PaintSession, Point, Rgb,
    renderer,
};

fn create_test_session() -> PaintSession {
    PaintSession::new(CanvasConfig::with_size(32, 24))
}

#[test]
fn test_add_layer_twice() {
    let mut session = create_test_session();
    session.add_layer();
    let second = session.add_layer();

    assert_eq!(session.layers().len(), 3);
    assert!(session.layers()[1].is_transparent());
    assert!(session.layers()[2].is_transparent());
    assert_eq!(session.layers()[2].name, "Layer 3");
    assert_eq!(session.active_layer_id(), second);
}

#[test]
fn test_layer_count_never_drops_below_one() {
    let mut session = create_test_session();
    let extra = session.add_layer();
    session.delete_layer(extra);
    assert_eq!(session.layers().len(), 1);

    let last = session.active_layer_id();
    session.delete_layer(last);
    assert_eq!(session.layers().len(), 1);
    assert_eq!(session.active_layer_id(), last);
}

#[test]
fn test_active_layer_falls_back_after_delete() {
    let mut session = create_test_session();
    let background = session.active_layer_id();
    let top = session.add_layer();
    session.delete_layer(top);
    assert_eq!(session.active_layer_id(), background);
    assert!(session.layer(session.active_layer_id()).is_some());
}

#[test]
fn test_reorder_out_of_range_is_defined() {
    let mut session = create_test_session();
    let background = session.active_layer_id();
    let top = session.add_layer();

    session.reorder_layers(7, 0);
    assert_eq!(session.layers()[0].id, background);

    session.reorder_layers(0, 7);
    assert_eq!(session.layers()[0].id, top);
    assert_eq!(session.layers()[1].id, background);
}

#[test]
fn test_clear_background_makes_it_transparent() {
    let mut session = create_test_session();
    let background = session.active_layer_id();
    session.clear_layer(background);
    assert!(session.layer(background).unwrap().is_transparent());
}

#[test]
fn test_export_png_skips_hidden_top_layer() {
    let mut session = create_test_session();
    let top = session.add_layer();
    let pen = BrushSettings::new(BrushType::Pen, 10.0, Rgb::new(0, 0, 255)).with_smoothing(0);
    session.start_stroke(Point::new(2.0, 12.0, 1.0), &pen);
    session.continue_stroke(Point::new(30.0, 12.0, 1.0), &pen);
    session.end_stroke();
    session.update_layer(top, LayerUpdate::visible(false));

    let exported = session.export_canvas(ExportFormat::Png).unwrap();
    assert_eq!(exported.file_name(), "drawing.png");
    assert_eq!((exported.width, exported.height), (32, 24));

    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    let mut expected = image::RgbaImage::new(32, 24);
    renderer::composite(&session.layers()[..1], &mut expected);
    assert_eq!(decoded, expected);
    assert_eq!(decoded.get_pixel(16, 12).0, [255, 255, 255, 255]);
}

#[test]
fn test_export_png_includes_locked_visible_layers() {
    let mut session = create_test_session();
    let top = session.add_layer();
    session.stamp_preset(raster_paint::Preset::Male);
    session.update_layer(top, LayerUpdate::locked(true));

    let exported = session.export_canvas(ExportFormat::Png).unwrap();
    let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    let flat = raster_paint::export::flatten(session.layers(), 32, 24);
    assert_eq!(decoded, flat);
}

#[test]
fn test_export_jpeg() {
    let session = create_test_session();
    let exported = session.export_canvas(ExportFormat::Jpeg).unwrap();
    assert_eq!(exported.file_name(), "drawing.jpeg");

    let decoded = image::load_from_memory(&exported.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 24));
}

#[test]
fn test_save_export_to_directory() {
    let session = create_test_session();
    let exported = session.export_canvas(ExportFormat::Png).unwrap();

    let dir = std::env::temp_dir().join(format!("raster_paint_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = exported.save_to(&dir).unwrap();
    assert_eq!(path.file_name().unwrap(), "drawing.png");
    assert_eq!(std::fs::read(&path).unwrap(), exported.bytes);
    std::fs::remove_dir_all(&dir).unwrap();
}
