//! Internal testing utilities for the tenfac crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

use rten_tensor::RandomSource;

/// Utility for creating parametrized (aka. table-driven) tests.
///
/// To create a table driven test:
///
/// 1. Import the `TestCases` trait
/// 2. Create a struct, conventionally named `Case`, that holds the inputs and
///    expected output of one case. It must implement `Debug`.
/// 3. Create a collection of `Case` instances, conventionally named `cases`.
/// 4. Call `cases.test_each`, passing the test function as a closure
///
/// All cases are run, even if earlier ones fail. If any case panics,
/// `test_each` panics afterwards with the number of failures and the debug
/// representation of each failing case.
///
/// ## Example
///
/// ```
/// use tenfac_testing::TestCases;
///
/// // Add #[test] attribute
/// fn test_offsets() {
///   #[derive(Debug)]
///   struct Case {
///     sizes: Vec<usize>,
///     total: usize,
///   }
///
///   let cases = [
///     Case { sizes: vec![2, 3], total: 5 },
///   ];
///
///   cases.test_each(|case| {
///     assert_eq!(case.sizes.iter().sum::<usize>(), case.total);
///   });
/// }
/// # test_offsets();
/// ```
///
/// ## Unwind safety
///
/// Test cases and the test function must be
/// [unwind safe](https://doc.rust-lang.org/std/panic/fn.catch_unwind.html).
/// Values with interior mutability should be created inside the test function
/// rather than stored in the case, or wrapped with
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe).
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call test function `test` with each test case in `self`, catching any panics.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes test cases
    /// to the test function by value.
    ///
    /// Each case is formatted before the test function is called, so that it
    /// can be reported if the function panics.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| std::panic::catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            let test = &test;
            let case_str = format!("{:?}", case);
            if std::panic::catch_unwind(move || test(case)).is_err() {
                failures.push(case_str);
            }
        }
        report_failures(&failures);
    }
}

fn report_failures<T: Debug>(failures: &[T]) {
    assert_eq!(
        failures.len(),
        0,
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}

/// Trait for comparing floating point values with a tolerance.
pub trait ApproxEq {
    /// Return true if `self` and `other` differ by at most `tolerance`.
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &f64, tolerance: f64) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        self == other || (self - other).abs() <= tolerance
    }
}

impl ApproxEq for [f64] {
    fn approx_eq(&self, other: &[f64], tolerance: f64) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }
}

/// Assert that two values are equal within a tolerance.
///
/// ```
/// use tenfac_testing::assert_approx_eq;
///
/// assert_approx_eq!(0.1 + 0.2, 0.3, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        assert!(
            $crate::ApproxEq::approx_eq(&left, &right, tolerance),
            "assertion `left ≈ right` failed (tolerance {:?})\n  left: {:?}\n right: {:?}",
            tolerance,
            left,
            right
        );
    }};
}

/// Source of random floats in `[0, 1)`, for use with
/// [`NdTensor::rand`](rten_tensor::NdTensor::rand).
pub struct FloatRng {
    rng: fastrand::Rng,
}

impl FloatRng {
    /// Create a generator with a fixed seed, so tests are reproducible.
    pub fn with_seed(seed: u64) -> FloatRng {
        FloatRng {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl RandomSource<f64> for FloatRng {
    fn next(&mut self) -> f64 {
        self.rng.f64()
    }
}

#[cfg(test)]
mod tests {
    use rten_tensor::RandomSource;

    use super::{ApproxEq, FloatRng, TestCases};

    #[test]
    fn test_test_cases_success() {
        #[derive(Clone, Debug)]
        struct Case {
            x: i32,
        }

        let cases = [Case { x: 1 }, Case { x: 2 }];
        cases.clone().test_each(|case| _ = case.x);
        cases.clone().test_each_value(|case| _ = case.x);
    }

    #[test]
    #[should_panic(expected = "2 test cases failed")]
    fn test_test_each_failure() {
        #[derive(Debug)]
        struct Case {
            x: i32,
        }

        let cases = [Case { x: 1 }, Case { x: 2 }];
        cases.test_each(|case| {
            _ = case.x;
            panic!("oh no");
        })
    }

    #[test]
    #[should_panic(expected = "1 test cases failed")]
    fn test_test_each_value_failure() {
        #[derive(Debug)]
        struct Case {
            x: i32,
        }

        let cases = [Case { x: 1 }, Case { x: 2 }];
        cases.test_each_value(|case| {
            assert_eq!(case.x, 1);
        })
    }

    #[test]
    fn test_approx_eq() {
        assert!(1.0f64.approx_eq(&(1.0 + 1e-10), 1e-9));
        assert!(!1.0f64.approx_eq(&1.1, 1e-9));
        assert!(!f64::NAN.approx_eq(&f64::NAN, 1.0));
        assert!(f64::INFINITY.approx_eq(&f64::INFINITY, 0.));
        assert!([1.0, 2.0][..].approx_eq(&[1.0, 2.0 + 1e-12][..], 1e-9));
        assert_approx_eq!(0.1 + 0.2, 0.3, 1e-12);
    }

    #[test]
    #[should_panic(expected = "assertion `left ≈ right` failed")]
    fn test_assert_approx_eq_failure() {
        assert_approx_eq!(1.0, 2.0, 0.5);
    }

    #[test]
    fn test_float_rng() {
        let mut a = FloatRng::with_seed(1);
        let mut b = FloatRng::with_seed(1);
        for _ in 0..10 {
            let x = a.next();
            assert!((0. ..1.).contains(&x));
            assert_eq!(x, b.next());
        }
    }
}
