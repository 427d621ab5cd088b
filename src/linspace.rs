pub struct Linspace {
    start: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Linspace {
    pub fn new(min: f64, max: f64, n: usize) -> Self {
        let step = if n > 1 {
            let num_steps = (n - 1) as f64;
            (max - min) / num_steps
        } else {
            0.
        };
        Linspace {
            start: min,
            step,
            index: 0,
            len: n,
        }
    }

    /// Like numpy.arange, but `stop` is inclusive when it lies on the grid
    pub fn arange(start: f64, stop: f64, step: f64) -> Self {
        // Absorb float noise such as (2.0 - 0.0) / 0.1 == 20.000000000000004 or
        // 19.999999999999996 so the endpoint is neither dropped nor duplicated
        let num = ((stop - start) / step + 1e-9).floor() as usize + 1;

        Linspace {
            start,
            step,
            index: 0,
            len: num,
        }
    }
}

impl Iterator for Linspace {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            None
        } else {
            // Calculate the value just like numpy.linspace does
            let i = self.index;
            self.index += 1;
            Some(self.start + self.step * i as f64)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Linspace {}

#[test]
fn test_linspace() {
    let points: Vec<_> = Linspace::new(0., 1., 5).collect();

    assert_eq!(points, vec![0., 0.25, 0.5, 0.75, 1.]);
    assert_eq!(Linspace::new(3., 3., 1).collect::<Vec<_>>(), vec![3.]);
}

#[test]
fn test_arange_keeps_inclusive_stop() {
    assert_eq!(Linspace::arange(0., 20., 1.).len(), 21);
    assert_eq!(Linspace::arange(0., 100., 1.).len(), 101);

    let frequency: Vec<_> = Linspace::arange(0., 2., 0.1).collect();

    assert_eq!(frequency.len(), 21);
    assert!((frequency[20] - 2.).abs() < 1e-12);
    // Off-grid stop is not reached
    assert_eq!(Linspace::arange(0., 2.05, 0.1).len(), 21);
}
