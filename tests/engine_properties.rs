use grid_severity::grid::GridModel;
use grid_severity::severity::Reading;
use grid_severity::{AndOp, FuzzyError, OrOp, TriangularMf};
use proptest::prelude::*;

fn arb_triangle() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, 0.0f64..50.0, 0.0f64..50.0).prop_map(|(a, left, right)| (a, a + left, a + left + right))
}

fn arb_reading() -> impl Strategy<Value = Reading> {
    (0.0f64..=20.0, 0.0f64..=2.0, 0.0f64..=100.0).prop_map(|(v, f, l)| Reading::new(v, f, l))
}

// ── Triangular membership ────────────────────────────────────────────────

proptest! {
    #[test]
    fn triangle_feet_and_peak((a, b, c) in arb_triangle()) {
        let mf = TriangularMf::new(a, b, c).unwrap();

        prop_assert_eq!(mf.degree(b), 1.0);
        if a < b {
            prop_assert_eq!(mf.degree(a), 0.0);
        }
        if b < c {
            prop_assert_eq!(mf.degree(c), 0.0);
        }
    }

    #[test]
    fn triangle_stays_in_unit_interval((a, b, c) in arb_triangle(), x in -200.0f64..200.0) {
        let degree = TriangularMf::new(a, b, c).unwrap().degree(x);

        prop_assert!((0.0..=1.0).contains(&degree), "degree({}) = {}", x, degree);
    }

    #[test]
    fn triangle_rises_then_falls((a, b, c) in arb_triangle(), s in 0.0f64..1.0, t in 0.0f64..1.0) {
        let mf = TriangularMf::new(a, b, c).unwrap();
        let (lo, hi) = if s <= t { (s, t) } else { (t, s) };

        let x1 = (a + lo * (b - a)).min(b);
        let x2 = (a + hi * (b - a)).min(b);
        prop_assert!(mf.degree(x1) <= mf.degree(x2));

        let y1 = (b + lo * (c - b)).clamp(b, c);
        let y2 = (b + hi * (c - b)).clamp(b, c);
        prop_assert!(mf.degree(y1) >= mf.degree(y2));
    }

    #[test]
    fn triangle_rejects_unordered(a in -10.0f64..10.0, gap in 0.001f64..10.0) {
        prop_assert!(
            matches!(TriangularMf::new(a + gap, a, a + 2. * gap), Err(FuzzyError::InvalidMembership { .. })),
            "peak left of the left foot must be rejected"
        );
        prop_assert!(TriangularMf::new(a, a + 2. * gap, a + gap).is_err());
    }
}

// ── Connectives ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn min_max_commutative(u in 0.0f64..=1.0, v in 0.0f64..=1.0) {
        prop_assert_eq!(AndOp::Min.call(u, v), AndOp::Min.call(v, u));
        prop_assert_eq!(OrOp::Max.call(u, v), OrOp::Max.call(v, u));
        prop_assert_eq!(AndOp::Min.call(u, v), u.min(v));
        prop_assert_eq!(OrOp::Max.call(u, v), u.max(v));
    }

    #[test]
    fn min_max_associative(u in 0.0f64..=1.0, v in 0.0f64..=1.0, w in 0.0f64..=1.0) {
        let and = AndOp::Min;
        let or = OrOp::Max;

        prop_assert_eq!(and.call(and.call(u, v), w), and.call(u, and.call(v, w)));
        prop_assert_eq!(or.call(or.call(u, v), w), or.call(u, or.call(v, w)));
    }

    #[test]
    fn alternative_norms_commute(u in 0.0f64..=1.0, v in 0.0f64..=1.0) {
        for and in [AndOp::Prod, AndOp::BoundedProd] {
            prop_assert!((and.call(u, v) - and.call(v, u)).abs() < 1e-12);
        }
        for or in [OrOp::ProbOr, OrOp::BoundedSum] {
            prop_assert!((or.call(u, v) - or.call(v, u)).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&or.call(u, v)));
        }
    }
}

// ── Grid model ───────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn inference_is_idempotent(reading in arb_reading()) {
        let model = GridModel::new().unwrap();

        prop_assert_eq!(model.severity(&reading), model.severity(&reading));
    }

    #[test]
    fn score_stays_in_output_universe(reading in arb_reading()) {
        let model = GridModel::new().unwrap();

        match model.severity(&reading) {
            Ok(score) => prop_assert!((0.0..=100.0).contains(&score), "score {}", score),
            Err(e) => prop_assert!(matches!(e, FuzzyError::NoRuleFired { .. }), "unexpected {:?}", e),
        }
    }

    #[test]
    fn severity_grows_with_voltage(v1 in 13.1f64..=20.0, v2 in 13.1f64..=20.0) {
        let model = GridModel::new().unwrap();
        let (lo, hi) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };

        let low = model.severity(&Reading::new(lo, 2.0, 100.0)).unwrap();
        let high = model.severity(&Reading::new(hi, 2.0, 100.0)).unwrap();

        prop_assert!(low <= high + 1e-9, "severity({}) = {} > severity({}) = {}", lo, low, hi, high);
    }
}
