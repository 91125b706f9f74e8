//! Tests for geo_utils module

use crowdtrack::geo_utils::*;
use crowdtrack::{CrowdError, CrowdParameters, Point};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_max_step_distance() {
    let track = vec![
        Point::new(0.0, 0.0),
        Point::new(3.0, 4.0),
        Point::new(4.0, 4.0),
    ];
    assert_eq!(max_step_distance(&track).unwrap(), 5.0);
    assert_eq!(step_distances(&track), vec![5.0, 1.0]);
}

#[test]
fn test_max_step_distance_needs_two_points() {
    let single = vec![Point::new(1.0, 1.0)];
    assert!(matches!(
        max_step_distance(&single),
        Err(CrowdError::InsufficientData { .. })
    ));
}

#[test]
fn test_grid_size_formula() {
    // d = 130, k = 10: 130 / sqrt(20/pi) = 51.52...
    assert_eq!(grid_size(130.0, 10), 51.0);
}

#[test]
fn test_grid_size_clamps_to_one() {
    // Track [(0,0), (1,0), (2,0)] with k = 4: floor(1.3 / 1.596) = 0
    assert_eq!(grid_size(1.3, 4), 1.0);
}

#[test]
fn test_template_radius() {
    assert_eq!(template_radius(1), 1);
    assert_eq!(template_radius(4), 2);
    assert_eq!(template_radius(10), 3);
    assert_eq!(template_radius(12), 3);
    assert_eq!(template_radius(13), 4);
}

#[test]
fn test_template_size() {
    assert_eq!(template_size(0), 1);
    assert_eq!(template_size(1), 5);
    assert_eq!(template_size(2), 13);
}

#[test]
fn test_derive_scenario_parameters() {
    let track = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(2.0, 0.0),
    ];
    let params = CrowdParameters::derive(&track, 4).unwrap();
    assert!(approx_eq(params.d, 1.3, 1e-12));
    assert_eq!(params.m, 1.0);
    assert_eq!(params.r, 2);
}

#[test]
fn test_derive_rejects_stationary_track() {
    let track = vec![Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
    assert!(CrowdParameters::derive(&track, 10).is_err());
}
