use num::Float;

/// Piecewise-linear interpolation of `x` over the points `(xs[i], ys[i])`,
/// like numpy.interp.
///
/// `xs` must be sorted ascending. `x` left (right) of the points takes the
/// first (last) y value; NaN or an empty table gives NaN.
pub(crate) fn interp<F: Float>(x: F, xs: &[F], ys: &[F]) -> F {
    let len = xs.len().min(ys.len());

    if len == 0 || x.is_nan() {
        return F::nan();
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[len - 1] {
        return ys[len - 1];
    }

    // First point strictly right of x; 1..len by the checks above
    let hi = xs[..len].partition_point(|&p| p <= x);
    let (x0, x1) = (xs[hi - 1], xs[hi]);
    let (y0, y1) = (ys[hi - 1], ys[hi]);

    if x1 == x0 {
        return y0;
    }

    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

#[test]
fn test_interp() {
    let xs = [1., 2., 3.];
    let ys = [3., 2., 0.];
    let got: Vec<_> = [0., 1., 1.5, 2.72, 3.24].into_iter().map(|x| interp(x, &xs, &ys)).collect();

    assert_eq!(got, vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let xs = [0., 1., 2., 3., 4.5];
    let ys = [0., 2., 5., 3., 2.];
    let got: Vec<_> = [2.5, -1., 7.5].into_iter().map(|x| interp(x, &xs, &ys)).collect();

    assert_eq!(got, vec![4., 0., 2.]);
}

#[test]
fn test_interp_degenerate_input() {
    let xs = [0., 1.];
    let ys = [0., 10.];

    assert!(interp(f64::NAN, &xs, &ys).is_nan());
    assert!(interp(0.5, &[], &[]).is_nan());
    assert_eq!(interp(0.25, &xs, &ys), 2.5);
    assert_eq!(interp(1., &[1., 1.], &[4., 6.]), 4.);
}
