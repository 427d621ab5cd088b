use crate::error::{FuzzyError, Result};
use crate::universe::Universe;

/// Triangular membership function with feet at `a` and `c` and its peak at `b`.
///
/// `a == b` gives a right ramp (shoulder on the left edge), `b == c` a left
/// ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangularMf {
    a: f64,
    b: f64,
    c: f64,
}

impl TriangularMf {
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) || a > b || b > c {
            return Err(FuzzyError::InvalidMembership { a, b, c });
        }

        Ok(Self { a, b, c })
    }

    pub fn params(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    /// Degree of membership of `x`, always within [0, 1]. NaN maps to 0.
    pub fn degree(&self, x: f64) -> f64 {
        let Self { a, b, c } = *self;

        if x == b {
            1.
        } else if !(x > a && x < c) {
            0.
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        }
    }

    /// Evaluates the function at every point of `universe`
    pub fn sample(&self, universe: &Universe) -> Vec<f64> {
        universe.points().iter().map(|&u| self.degree(u)).collect()
    }
}

impl TryFrom<[f64; 3]> for TriangularMf {
    type Error = FuzzyError;

    fn try_from([a, b, c]: [f64; 3]) -> Result<Self> {
        Self::new(a, b, c)
    }
}

/// Labelled membership functions of a single variable, in insertion order.
///
/// Duplicate labels are kept here and rejected when the terms are attached
/// to a variable, where the variable's name is known.
#[derive(Clone, Debug, Default)]
pub struct Terms(pub(crate) Vec<(String, TriangularMf)>);

impl Terms {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn insert(&mut self, label: impl Into<String>, mf: TriangularMf) {
        self.0.push((label.into(), mf));
    }

    /// Shorthand for inserting `TriangularMf::new(a, b, c)`
    pub fn triangle(&mut self, label: impl Into<String>, a: f64, b: f64, c: f64) -> Result<&mut Self> {
        self.insert(label, TriangularMf::new(a, b, c)?);

        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, TriangularMf)> for Terms {
    fn from_iter<I: IntoIterator<Item = (S, TriangularMf)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(label, mf)| (label.into(), mf)).collect())
    }
}

#[test]
fn test_triangle_degree() {
    let medium = TriangularMf::new(5., 10., 15.).unwrap();

    assert_eq!(medium.degree(5.), 0.);
    assert_eq!(medium.degree(7.5), 0.5);
    assert_eq!(medium.degree(10.), 1.);
    assert_eq!(medium.degree(12.5), 0.5);
    assert_eq!(medium.degree(15.), 0.);
    assert_eq!(medium.degree(-3.), 0.);
    assert_eq!(medium.degree(40.), 0.);
    assert_eq!(medium.degree(f64::NAN), 0.);
}

#[test]
fn test_triangle_shoulders() {
    let low = TriangularMf::new(0., 0., 6.).unwrap();
    let high = TriangularMf::new(13., 20., 20.).unwrap();

    assert_eq!(low.degree(0.), 1.);
    assert_eq!(low.degree(3.), 0.5);
    assert_eq!(low.degree(-1.), 0.);
    assert_eq!(high.degree(20.), 1.);
    assert_eq!(high.degree(16.5), 0.5);
    assert_eq!(high.degree(21.), 0.);

    let spike = TriangularMf::new(4., 4., 4.).unwrap();

    assert_eq!(spike.degree(4.), 1.);
    assert_eq!(spike.degree(4.000001), 0.);
}

#[test]
fn test_triangle_rejects_unordered_params() {
    assert_eq!(
        TriangularMf::new(5., 3., 10.),
        Err(FuzzyError::InvalidMembership { a: 5., b: 3., c: 10. })
    );
    assert!(TriangularMf::new(0., 1., f64::NAN).is_err());
    assert!(TriangularMf::try_from([0., 1., 0.5]).is_err());
}

#[test]
fn test_triangle_sample() {
    let universe = Universe::new(0., 30., 10.).unwrap();
    let low = TriangularMf::new(0., 0., 30.).unwrap();
    let sampled = low.sample(&universe);

    assert_eq!(sampled.len(), 4);
    assert_eq!(sampled[0], 1.);
    assert!((sampled[1] - 2. / 3.).abs() < 1e-12);
    assert_eq!(sampled[3], 0.);
}
