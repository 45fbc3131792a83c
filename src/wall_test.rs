use super::*;

fn item(url: &str, x: f64, y: f64, width: f64, height: f64) -> WallItem {
    WallItem { url: url.into(), state: ImageState { x, y, width, height, ..ImageState::default() } }
}

fn wall_with(items: Vec<WallItem>) -> Wall {
    Wall { items, ..Wall::default() }
}

// =============================================================================
// clamping
// =============================================================================

#[test]
fn resize_pulls_overhanging_images_flush_with_new_edge() {
    let mut wall = wall_with(vec![
        item("a.png", 400.0, 10.0, 200.0, 100.0),
        item("b.png", 450.0, 10.0, 120.0, 100.0),
        item("c.png", 10.0, 10.0, 100.0, 100.0),
    ]);

    wall.resize(500.0, 600.0).unwrap();

    let a = &wall.items[0].state;
    let b = &wall.items[1].state;
    assert!((a.x + a.width - 500.0).abs() < f64::EPSILON);
    assert!((a.x - 300.0).abs() < f64::EPSILON);
    assert!((b.x + b.width - 500.0).abs() < f64::EPSILON);
    // Fully inside: untouched.
    assert_eq!(wall.items[2], item("c.png", 10.0, 10.0, 100.0, 100.0));
}

#[test]
fn resize_shrinks_images_wider_than_the_wall() {
    let mut wall = wall_with(vec![item("wide.png", 50.0, 0.0, 900.0, 100.0)]);
    wall.resize(500.0, 600.0).unwrap();
    let s = &wall.items[0].state;
    assert!((s.width - 500.0).abs() < f64::EPSILON);
    assert!(s.x.abs() < f64::EPSILON);
}

#[test]
fn resize_clamps_vertical_axis() {
    let mut wall = wall_with(vec![item("tall.png", 0.0, 350.0, 100.0, 200.0)]);
    wall.resize(800.0, 400.0).unwrap();
    let s = &wall.items[0].state;
    assert!((s.y + s.height - 400.0).abs() < f64::EPSILON);
}

#[test]
fn clamp_moves_negative_origin_to_zero() {
    let mut state = ImageState { x: -30.0, y: -5.0, width: 50.0, height: 50.0, ..ImageState::default() };
    state.clamp_to(800.0, 600.0);
    assert!(state.x.abs() < f64::EPSILON);
    assert!(state.y.abs() < f64::EPSILON);
}

#[test]
fn resize_rejects_out_of_range_dimensions() {
    let mut wall = Wall::default();
    assert_eq!(wall.resize(150.0, 600.0), Err(WallError::InvalidDimensions));
    assert_eq!(wall.resize(800.0, 2500.0), Err(WallError::InvalidDimensions));
    assert_eq!(wall.resize(f64::NAN, 600.0), Err(WallError::InvalidDimensions));
    assert!((wall.width - DEFAULT_WALL_WIDTH).abs() < f64::EPSILON);
}

// =============================================================================
// settle
// =============================================================================

#[test]
fn settle_resizes_when_dimensions_change() {
    let previous = Wall::default();
    let mut wall = wall_with(vec![item("a.png", 550.0, 10.0, 100.0, 100.0)]);
    wall.width = 600.0;

    assert_eq!(wall.settle(&previous), Ok(true));
    let s = &wall.items[0].state;
    assert!((s.x - 500.0).abs() < f64::EPSILON);
}

#[test]
fn settle_clamps_in_place_when_size_is_unchanged() {
    let previous = Wall::default();
    let mut wall = wall_with(vec![item("a.png", 790.0, -20.0, 150.0, 150.0)]);

    assert_eq!(wall.settle(&previous), Ok(false));
    let s = &wall.items[0].state;
    assert!((s.x + s.width - 800.0).abs() < f64::EPSILON);
    assert!(s.y.abs() < f64::EPSILON);
}

#[test]
fn settle_rejects_out_of_range_dimensions() {
    let mut wall = Wall { width: 5000.0, ..Wall::default() };
    assert_eq!(wall.settle(&Wall::default()), Err(WallError::InvalidDimensions));
}

// =============================================================================
// wire format
// =============================================================================

#[test]
fn deserializes_parallel_arrays_into_items() {
    let json = serde_json::json!({
        "wallColor": "#abcdef",
        "wallWidth": 1000,
        "wallHeight": 700,
        "images": ["a.png", "b.png"],
        "imageStates": [
            {"x": 1, "y": 2, "width": 3, "height": 4, "shape": "circle"},
            {"x": 5, "y": 6, "width": 7, "height": 8, "isDecor": true, "zIndex": 2}
        ]
    });
    let wall: Wall = serde_json::from_value(json).unwrap();
    assert_eq!(wall.color, "#abcdef");
    assert_eq!(wall.items.len(), 2);
    assert_eq!(wall.items[0].state.shape, "circle");
    assert_eq!(wall.items[1].url, "b.png");
    assert!(wall.items[1].state.is_decor);
    assert_eq!(wall.items[1].state.z_index, 2);
}

#[test]
fn rejects_misaligned_arrays() {
    let json = serde_json::json!({
        "images": ["a.png", "b.png"],
        "imageStates": [{"x": 1, "y": 2, "width": 3, "height": 4}]
    });
    let err = serde_json::from_value::<Wall>(json).unwrap_err();
    assert!(err.to_string().contains("same length"));
}

#[test]
fn serializes_back_to_parallel_arrays() {
    let wall = wall_with(vec![item("a.png", 100.0, 100.0, 150.0, 150.0)]);
    let value = serde_json::to_value(&wall).unwrap();
    assert_eq!(value["images"], serde_json::json!(["a.png"]));
    assert_eq!(value["imageStates"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["wallWidth"], serde_json::json!(800.0));
}

#[test]
fn empty_object_is_the_default_wall() {
    let wall: Wall = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(wall, Wall::default());
}
