use std::iter::Sum;
use std::ops::AddAssign;

use num::Float;
use serde::{Deserialize, Serialize};

use crate::math::interp;

/// And operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndOp {
    /// Zadeh AND
    #[default]
    Min,
    Prod,
    BoundedProd,
}

impl AndOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Min => F::min(u, v),
            Self::Prod => u * v,
            Self::BoundedProd => F::max(F::zero(), u + v - F::one()),
        }
    }
}

/// Or operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrOp {
    /// Zadeh OR
    #[default]
    Max,
    ProbOr,
    BoundedSum,
}

impl OrOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => ProductionLink::Max.call(u, v),
            Self::ProbOr => ProductionLink::ProbOr.call(u, v),
            Self::BoundedSum => ProductionLink::BoundedSum.call(u, v),
        }
    }
}

/// Implication operator: shapes a consequent's membership function by the
/// firing strength of its rule.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplicationOp {
    /// Mamdani clipping, `min(s, m)`
    #[default]
    Min,
    /// Larsen scaling, `s * m`
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, strength: F, membership: &[F]) -> impl Iterator<Item = F> + '_ {
        membership.iter().map(move |&m| match self {
            Self::Min => F::min(strength, m),
            Self::Prod => strength * m,
        })
    }
}

/// Method for aggregating the consequences of the fuzzy rules.
///
/// Every variant has zero as its identity, so aggregation can start from an
/// all-zero set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionLink {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
}

impl ProductionLink {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::BoundedSum => F::min(F::one(), u + v),
        }
    }

    /// Folds `set` into `agg` sample by sample
    pub fn accumulate<F: Float>(self, agg: &mut [F], set: impl IntoIterator<Item = F>) {
        for (a, v) in agg.iter_mut().zip(set) {
            *a = self.call(*a, v);
        }
    }
}

/// Method for defuzzificating the resulting membership function.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefuzzificationOp {
    /// Sample-weighted mean, `Σ u·m / Σ m`
    #[default]
    Centroid,
    /// Center of gravity of the piecewise-linear area under the samples
    AreaCentroid,
    /// Bisector of area
    Bisector,
    /// Mean of the values for which the membership function is maximum
    MeanOfMaximum,
    /// Smallest value for which the membership function is maximum
    SmallestOfMaximum,
    /// Largest value for which the membership function is maximum
    LargestOfMaximum,
}

impl DefuzzificationOp {
    /// Returns `None` when `membership` carries no mass, i.e. nothing fired.
    pub fn call<F: Float + Sum + AddAssign>(self, universe: &[F], membership: &[F]) -> Option<F> {
        debug_assert_eq!(universe.len(), membership.len());

        if universe.len() < 2 || membership.iter().all(|m| *m <= F::zero()) {
            return None;
        }

        match self {
            Self::Centroid => {
                let den = membership.iter().copied().sum::<F>();
                let num = universe
                    .iter()
                    .zip(membership)
                    .map(|(u, m)| *u * *m)
                    .sum::<F>();

                Some(num / den)
            },
            Self::AreaCentroid => {
                let n_areas = universe.len() - 1;
                let mut areas = Vec::with_capacity(n_areas);
                let mut centroids = Vec::with_capacity(n_areas);
                let two = F::one() + F::one();
                let three = two + F::one();

                for i in 0..n_areas {
                    let base = universe[i + 1] - universe[i];
                    let area_rect = F::min(membership[i], membership[i + 1]) * base;
                    let center_rect = universe[i] + base / two;
                    let (area_tria, center_tri) = if membership[i + 1] == membership[i] {
                        (F::zero(), F::zero())
                    } else if membership[i + 1] > membership[i] {
                        (
                            base * F::abs(membership[i + 1] - membership[i]) / two,
                            universe[i] + two / three * base,
                        )
                    } else {
                        (
                            base * F::abs(membership[i + 1] - membership[i]) / two,
                            universe[i] + F::one() / three * base,
                        )
                    };
                    let area = area_rect + area_tria;
                    let center = if area == F::zero() {
                        F::zero()
                    } else {
                        (area_rect * center_rect + area_tria * center_tri) / area
                    };

                    areas.push(area);
                    centroids.push(center);
                }

                let den = areas.iter().copied().sum::<F>();
                let num = areas
                    .into_iter()
                    .zip(centroids)
                    .map(|(area, cent)| area * cent)
                    .sum::<F>();

                Some(num / den)
            },
            Self::Bisector => {
                let two = F::one() + F::one();
                let areas: Vec<F> = universe
                    .windows(2)
                    .zip(membership.windows(2))
                    .map(|(u, m)| (m[0] + m[1]) * (u[1] - u[0]) / two)
                    .collect();
                let target = areas.iter().copied().sum::<F>() / two;
                let mut cum_area = F::zero();

                for (i, area) in areas.iter().copied().enumerate() {
                    let before = cum_area;

                    cum_area += area;

                    if cum_area >= target {
                        return Some(interp(target, &[before, cum_area], &universe[i..=i + 1]));
                    }
                }

                universe.last().copied()
            },
            Self::MeanOfMaximum => {
                let (len, sum) = Self::maxima(universe, membership).fold((0usize, F::zero()), |(len, sum), u| (len + 1, sum + u));

                Some(sum / F::from(len)?)
            },
            Self::SmallestOfMaximum => Self::maxima(universe, membership).reduce(F::min),
            Self::LargestOfMaximum => Self::maxima(universe, membership).reduce(F::max),
        }
    }

    fn maxima<'a, F: Float>(universe: &'a [F], membership: &'a [F]) -> impl Iterator<Item = F> + 'a {
        let maximum = membership.iter().copied().fold(F::neg_infinity(), F::max);

        universe
            .iter()
            .copied()
            .zip(membership.iter().copied())
            .filter_map(move |(u, m)| if m == maximum { Some(u) } else { None })
    }
}

#[test]
fn test_premise_operators() {
    assert_eq!(AndOp::Min.call(0.3, 0.8), 0.3);
    assert_eq!(AndOp::Prod.call(0.5, 0.5), 0.25);
    assert_eq!(AndOp::BoundedProd.call(0.25, 0.5), 0.);
    assert_eq!(OrOp::Max.call(0.3, 0.8), 0.8);
    assert_eq!(OrOp::ProbOr.call(0.5, 0.5), 0.75);
    assert_eq!(OrOp::BoundedSum.call(0.75, 0.5), 1.);
}

#[test]
fn test_implication_clips_or_scales() {
    let membership = [0., 0.5, 1., 0.5, 0.];

    assert_eq!(
        ImplicationOp::Min.call(0.6, &membership).collect::<Vec<_>>(),
        vec![0., 0.5, 0.6, 0.5, 0.]
    );
    assert_eq!(
        ImplicationOp::Prod.call(0.5, &membership).collect::<Vec<_>>(),
        vec![0., 0.25, 0.5, 0.25, 0.]
    );
}

#[test]
fn test_production_link_accumulates_from_zero() {
    let mut agg = [0.; 4];

    ProductionLink::Max.accumulate(&mut agg, [0., 0.5, 1., 0.]);
    ProductionLink::Max.accumulate(&mut agg, [0.25, 0.25, 0.5, 0.5]);

    assert_eq!(agg, [0.25, 0.5, 1., 0.5]);

    let mut agg = [0.; 2];

    ProductionLink::ProbOr.accumulate(&mut agg, [0.5, 1.]);
    ProductionLink::ProbOr.accumulate(&mut agg, [0.5, 0.]);

    assert_eq!(agg, [0.75, 1.]);
}

#[test]
fn test_defuzzification() {
    let universe = [0., 1., 2., 3., 4.];
    let symmetric = [0., 0.5, 1., 0.5, 0.];

    for op in [
        DefuzzificationOp::Centroid,
        DefuzzificationOp::AreaCentroid,
        DefuzzificationOp::Bisector,
        DefuzzificationOp::MeanOfMaximum,
        DefuzzificationOp::SmallestOfMaximum,
        DefuzzificationOp::LargestOfMaximum,
    ] {
        assert_eq!(op.call(&universe, &symmetric), Some(2.), "{op:?}");
        assert_eq!(op.call(&universe, &[0.; 5]), None, "{op:?}");
    }

    let plateau = [0., 1., 1., 1., 0.];

    assert_eq!(DefuzzificationOp::SmallestOfMaximum.call(&universe, &plateau), Some(1.));
    assert_eq!(DefuzzificationOp::LargestOfMaximum.call(&universe, &plateau), Some(3.));
    assert_eq!(DefuzzificationOp::MeanOfMaximum.call(&universe, &plateau), Some(2.));

    let ramp = [0., 0., 0., 0., 1.];

    assert_eq!(DefuzzificationOp::Centroid.call(&universe, &ramp), Some(4.));
    let area = DefuzzificationOp::AreaCentroid.call(&universe, &ramp).unwrap();
    assert!((area - (3. + 2. / 3.)).abs() < 1e-12);
}
