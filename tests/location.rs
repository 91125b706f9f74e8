//! Tests for location and landuse modules

use crowdtrack::{
    loc_prob, probability, CrowdError, LandUseClass, LandUseLayer, LandUseLookup, LocationTable,
    MovementModel, Point,
};

const HALF_PLANES: &str = r#"[
    { "class": "urban", "exterior": [[0, -100], [100, -100], [100, 100], [0, 100]] },
    { "class": "rural", "exterior": [[-100, -100], [0, -100], [0, 100], [-100, 100]] }
]"#;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_layer_from_json() {
    let layer = LandUseLayer::from_json_str(HALF_PLANES).unwrap();
    assert_eq!(layer.len(), 2);
    assert_eq!(
        layer.classify(&Point::new(50.0, 0.0), 0.0),
        Some(LandUseClass::from("urban"))
    );
    assert_eq!(
        layer.classify(&Point::new(-50.0, 0.0), 0.0),
        Some(LandUseClass::from("rural"))
    );
    assert_eq!(layer.classify(&Point::new(500.0, 0.0), 10.0), None);
}

#[test]
fn test_layer_radius_reaches_nearby_polygon() {
    let layer = LandUseLayer::from_json_str(HALF_PLANES).unwrap();
    let outside = Point::new(105.0, 0.0);
    assert_eq!(layer.classify(&outside, 1.0), None);
    assert_eq!(
        layer.classify(&outside, 10.0),
        Some(LandUseClass::from("urban"))
    );
}

#[test]
fn test_layer_holes_are_not_covered() {
    let json = r#"[{
        "class": "park",
        "exterior": [[0, 0], [10, 0], [10, 10], [0, 10]],
        "interiors": [[[4, 4], [6, 4], [6, 6], [4, 6]]]
    }]"#;
    let layer = LandUseLayer::from_json_str(json).unwrap();
    assert_eq!(layer.classify(&Point::new(5.0, 5.0), 0.0), None);
    assert!(layer.classify(&Point::new(2.0, 2.0), 0.0).is_some());
}

#[test]
fn test_layer_rejects_bad_records() {
    let short = r#"[{ "class": "x", "exterior": [[0, 0], [1, 1]] }]"#;
    assert!(matches!(
        LandUseLayer::from_json_str(short),
        Err(CrowdError::InvalidLandUse(_))
    ));
    assert!(matches!(
        LandUseLayer::from_json_str("not json"),
        Err(CrowdError::Json(_))
    ));
}

#[test]
fn test_table_probabilities_sum_to_one() {
    let layer = LandUseLayer::from_json_str(HALF_PLANES).unwrap();
    let track = vec![
        Point::new(-40.0, 0.0),
        Point::new(20.0, 0.0),
        Point::new(20.0, 30.0),
    ];
    let table = LocationTable::from_track(&track, &layer, 5.0, 0.5).unwrap();
    let total: f64 = table.iter().map(|(_, p)| p).sum();
    assert!(approx_eq(total, 1.0, 1e-9));
    assert!(table.iter().all(|(_, p)| p > 0.0));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_table_shares_follow_buffer_area() {
    // Straight segment from x = -30 to x = 10 across the class boundary at 0
    let layer = LandUseLayer::from_json_str(HALF_PLANES).unwrap();
    let track = vec![Point::new(-30.0, 0.0), Point::new(10.0, 0.0)];
    let lag = 5.0;
    let table = LocationTable::from_track(&track, &layer, lag, 0.25).unwrap();

    let half_cap = std::f64::consts::PI * lag * lag / 2.0;
    let rural = 30.0 * 2.0 * lag + half_cap;
    let urban = 10.0 * 2.0 * lag + half_cap;
    let expected = urban / (urban + rural);
    assert!(approx_eq(table.get(&LandUseClass::from("urban")), expected, 0.01));
}

#[test]
fn test_unclassified_buffer_is_excluded() {
    // Half the buffer falls off the layer; probabilities are still shares of
    // the classified part
    let layer = LandUseLayer::from_json_str(HALF_PLANES).unwrap();
    let track = vec![Point::new(50.0, 100.0), Point::new(60.0, 100.0)];
    let table = LocationTable::from_track(&track, &layer, 5.0, 0.5).unwrap();
    assert_eq!(table.get(&LandUseClass::from("urban")), 1.0);
    assert!(table.class_area(&LandUseClass::from("urban")) < table.buffer_area());
}

#[test]
fn test_table_needs_classified_area() {
    let nowhere = |_: &Point, _: f64| -> Option<LandUseClass> { None };
    let track = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
    assert!(matches!(
        LocationTable::from_track(&track, &nowhere, 5.0, 1.0),
        Err(CrowdError::InsufficientData { .. })
    ));
    assert!(LocationTable::from_track(&track[..1], &nowhere, 5.0, 1.0).is_err());
}

#[test]
fn test_loc_prob_and_probability() {
    let split = |p: &Point, _: f64| -> Option<LandUseClass> {
        if p.x > p.y {
            Some(LandUseClass::from("urban"))
        } else {
            Some(LandUseClass::from("rural"))
        }
    };
    let table = LocationTable::from_areas(vec![
        (LandUseClass::from("urban"), 0.7),
        (LandUseClass::from("rural"), 0.3),
    ])
    .unwrap();
    let track = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
    ];
    let movement = MovementModel::from_track(&track, 1.0).unwrap();
    let end = Point::new(1.0, 1.0);
    let east = Point::new(1.0, 0.0);
    let north = Point::new(0.0, 1.0);

    assert!(approx_eq(loc_prob(&east, &end, &table, &split, 1.0), 0.7, 1e-12));
    assert!(approx_eq(loc_prob(&north, &end, &table, &split, 1.0), 0.3, 1e-12));
    assert!(approx_eq(
        probability(&east, &movement, &end, &table, &split, 1.0),
        0.35,
        1e-12
    ));
}

#[test]
fn test_loc_prob_unknown_class_is_zero() {
    let table = LocationTable::from_areas(vec![(LandUseClass::from("urban"), 1.0)]).unwrap();
    let water = |_: &Point, _: f64| -> Option<LandUseClass> { Some(LandUseClass::from("water")) };
    let nowhere = |_: &Point, _: f64| -> Option<LandUseClass> { None };
    let v = Point::new(1.0, 0.0);
    assert_eq!(loc_prob(&v, &Point::ORIGIN, &table, &water, 1.0), 0.0);
    assert_eq!(loc_prob(&v, &Point::ORIGIN, &table, &nowhere, 1.0), 0.0);
}

#[test]
fn test_layer_missing_file() {
    assert!(matches!(
        LandUseLayer::from_json_file("/nonexistent/landuse.json"),
        Err(CrowdError::Io(_))
    ));
}
