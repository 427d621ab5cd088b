use crate::error::{FuzzyError, Result};
use crate::linspace::Linspace;

/// A discretized, strictly increasing numeric domain.
///
/// Membership functions are sampled over it and the aggregated output set
/// is integrated over it during defuzzification.
#[derive(Clone, Debug, PartialEq)]
pub struct Universe {
    points: Vec<f64>,
}

impl Universe {
    /// Largest number of sample points a universe may hold
    pub const MAX_POINTS: usize = 1_000_000;

    /// Samples `[min, max]` every `step`, starting at `min`. `max` is
    /// included when it falls on the grid.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        let invalid = |reason| FuzzyError::InvalidUniverse { min, max, step, reason };

        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(invalid("bounds and step must be finite"));
        }
        if max <= min {
            return Err(invalid("max must be greater than min"));
        }
        if step <= 0. {
            return Err(invalid("step must be positive"));
        }
        if (max - min) / step >= Self::MAX_POINTS as f64 {
            return Err(invalid("too many points"));
        }

        Self::from_points(Linspace::arange(min, max, step)).ok_or_else(|| invalid("fewer than two points"))
    }

    /// `n` evenly spaced points from `min` to `max`, both included.
    pub fn linspace(min: f64, max: f64, n: usize) -> Result<Self> {
        let step = if n > 1 { (max - min) / (n - 1) as f64 } else { 0. };
        let invalid = |reason| FuzzyError::InvalidUniverse { min, max, step, reason };

        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(invalid("bounds must be finite with max greater than min"));
        }
        if n > Self::MAX_POINTS {
            return Err(invalid("too many points"));
        }

        Self::from_points(Linspace::new(min, max, n)).ok_or_else(|| invalid("fewer than two points"))
    }

    fn from_points(points: impl IntoIterator<Item = f64>) -> Option<Self> {
        let points: Vec<f64> = points.into_iter().collect();

        if points.len() < 2 || points.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }

        Some(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn min(&self) -> f64 {
        self.points[0]
    }

    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a universe holds at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[test]
fn test_universe_sampling() {
    let voltage = Universe::new(0., 20., 1.).unwrap();

    assert_eq!(voltage.len(), 21);
    assert_eq!(voltage.min(), 0.);
    assert_eq!(voltage.max(), 20.);
    assert!(voltage.points().windows(2).all(|w| w[0] < w[1]));

    let unit = Universe::linspace(0., 1., 3).unwrap();

    assert_eq!(unit.points(), &[0., 0.5, 1.]);
}

#[test]
fn test_universe_rejects_degenerate_domains() {
    let cases = [
        Universe::new(5., 5., 1.),
        Universe::new(10., 0., 1.),
        Universe::new(0., 1., 0.),
        Universe::new(0., 1., -0.5),
        Universe::new(0., f64::INFINITY, 1.),
        Universe::new(0., 1., 2.),
        Universe::linspace(0., 1., 1),
    ];

    for case in cases {
        assert!(matches!(case, Err(FuzzyError::InvalidUniverse { .. })), "{case:?}");
    }
}

#[test]
fn test_universe_caps_point_count() {
    let too_many = |result: Result<Universe>| {
        matches!(result, Err(FuzzyError::InvalidUniverse { reason: "too many points", .. }))
    };

    assert!(too_many(Universe::new(0., 1e300, 1e-300)));
    assert!(too_many(Universe::new(0., 1e6, 1.)));
    assert!(too_many(Universe::linspace(0., 1., Universe::MAX_POINTS + 1)));
    assert_eq!(Universe::new(0., 1e6 - 1., 1.).unwrap().len(), Universe::MAX_POINTS);
}
