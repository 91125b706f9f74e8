//! Tests for movement module

use crowdtrack::synthetic::SyntheticScenario;
use crowdtrack::{rasterize, CrowdError, MovementModel, Point};

#[test]
fn test_scenario_two_vectors() {
    let track = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
    ];
    let model = MovementModel::from_track(&track, 1.0).unwrap();
    assert_eq!(
        model.vector_set(),
        &[Point::new(1.0, 0.0), Point::new(0.0, 1.0)]
    );
    assert_eq!(model.move_prob(&Point::new(1.0, 0.0)), 0.5);
    assert_eq!(model.move_prob(&Point::new(0.0, 1.0)), 0.5);
}

#[test]
fn test_distribution_sums_to_one() {
    let dataset = SyntheticScenario::winding_ride().generate();
    let raster = rasterize(&dataset.track, 20.0).unwrap();
    let model = MovementModel::from_track(raster.points(), 20.0).unwrap();

    let dist = model.distribution();
    assert_eq!(dist.len(), model.vector_set().len());
    let total: f64 = dist.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(dist.iter().all(|(_, p)| *p >= 0.0));
}

#[test]
fn test_vector_set_keeps_first_occurrence_order() {
    let track = vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 2.0),
        Point::new(2.0, 2.0),
        Point::new(2.0, 4.0),
        Point::new(0.0, 4.0),
    ];
    let model = MovementModel::from_track(&track, 2.0).unwrap();
    assert_eq!(model.displacements().len(), 4);
    assert_eq!(
        model.vector_set(),
        &[
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(-2.0, 0.0)
        ]
    );
    assert_eq!(model.count(&Point::new(0.0, 2.0)), 2);
}

#[test]
fn test_empty_displacements_rejected() {
    let result = MovementModel::from_track(&[Point::new(3.0, 3.0)], 1.0);
    assert!(matches!(result, Err(CrowdError::InsufficientData { .. })));
}
