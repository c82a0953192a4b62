//! Position vectors: one integer coordinate per tensor mode.

use std::fmt;
use std::ops::{Add, Index, IndexMut};

use smallvec::SmallVec;

/// An ordered tuple of mode coordinates.
///
/// `PVec` is used both for points inside a tensor and for extents (the size of
/// a tensor along each mode). The length is fixed when the vector is created
/// and is expected to match across all vectors that are combined or compared
/// with each other.
///
/// Coordinates are stored inline for up to 4 modes, which covers matrices and
/// the common low-order tensors without a heap allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PVec {
    coords: SmallVec<[usize; 4]>,
}

impl PVec {
    /// Create a vector with `nmodes` coordinates, all zero.
    pub fn zeros(nmodes: usize) -> PVec {
        PVec {
            coords: SmallVec::from_elem(0, nmodes),
        }
    }

    /// Create a vector from a slice of coordinates.
    pub fn from_slice(coords: &[usize]) -> PVec {
        PVec {
            coords: SmallVec::from_slice(coords),
        }
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Return the coordinate for `mode`.
    ///
    /// # Panics
    ///
    /// Panics if `mode >= self.len()`.
    pub fn at(&self, mode: usize) -> usize {
        self.coords[mode]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.coords
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.coords.iter().copied()
    }

    /// Product of all coordinates, ie. the number of cells in a tensor with
    /// this vector as its shape.
    pub fn product(&self) -> u64 {
        self.coords.iter().map(|&c| c as u64).product()
    }

    /// Return true if `lo[i] <= self[i] < hi[i]` for every mode.
    pub fn in_range(&self, lo: &PVec, hi: &PVec) -> bool {
        debug_assert_eq!(self.len(), lo.len());
        debug_assert_eq!(self.len(), hi.len());
        self.coords
            .iter()
            .zip(lo.iter().zip(hi.iter()))
            .all(|(&p, (lo, hi))| lo <= p && p < hi)
    }

    /// Return true if every coordinate of `self` is `<=` the coordinate of
    /// `other` in the same mode.
    pub fn all_le(&self, other: &PVec) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.iter().zip(other.iter()).all(|(a, b)| a <= b)
    }

    /// Return true if every coordinate of `self` is `<` the coordinate of
    /// `other` in the same mode.
    pub fn all_lt(&self, other: &PVec) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.iter().zip(other.iter()).all(|(a, b)| a < b)
    }
}

impl<const N: usize> From<[usize; N]> for PVec {
    fn from(coords: [usize; N]) -> PVec {
        PVec::from_slice(&coords)
    }
}

impl From<&[usize]> for PVec {
    fn from(coords: &[usize]) -> PVec {
        PVec::from_slice(coords)
    }
}

impl FromIterator<usize> for PVec {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> PVec {
        PVec {
            coords: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for PVec {
    type Output = usize;

    fn index(&self, mode: usize) -> &usize {
        &self.coords[mode]
    }
}

impl IndexMut<usize> for PVec {
    fn index_mut(&mut self, mode: usize) -> &mut usize {
        &mut self.coords[mode]
    }
}

impl Add for &PVec {
    type Output = PVec;

    fn add(self, rhs: &PVec) -> PVec {
        assert_eq!(self.len(), rhs.len(), "mode count mismatch");
        self.iter().zip(rhs.iter()).map(|(a, b)| a + b).collect()
    }
}

impl Add for PVec {
    type Output = PVec;

    fn add(self, rhs: PVec) -> PVec {
        &self + &rhs
    }
}

impl fmt::Display for PVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for c in self.iter() {
            write!(f, "{} ", c)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use tenfac_testing::TestCases;

    use super::PVec;

    #[test]
    fn test_add() {
        let a = PVec::from([1, 2]);
        let b = PVec::from([3, 4]);
        assert_eq!(&a + &b, PVec::from([4, 6]));
        assert_eq!(a + b, PVec::from([4, 6]));
    }

    #[test]
    #[should_panic(expected = "mode count mismatch")]
    fn test_add_mismatched_len() {
        let _ = PVec::from([1, 2]) + PVec::from([1, 2, 3]);
    }

    #[test]
    fn test_in_range() {
        #[derive(Debug)]
        struct Case {
            point: [usize; 2],
            expected: bool,
        }

        let lo = PVec::from([2, 0]);
        let hi = PVec::from([5, 3]);

        let cases = [
            Case {
                point: [2, 0],
                expected: true,
            },
            Case {
                point: [4, 2],
                expected: true,
            },
            // End is exclusive.
            Case {
                point: [5, 2],
                expected: false,
            },
            Case {
                point: [4, 3],
                expected: false,
            },
            Case {
                point: [1, 1],
                expected: false,
            },
        ];

        cases.test_each(|case| {
            let p = PVec::from(case.point);
            assert_eq!(p.in_range(&lo, &hi), case.expected);
        });
    }

    #[test]
    fn test_comparisons() {
        let a = PVec::from([1, 2]);
        let b = PVec::from([1, 3]);
        assert!(a.all_le(&b));
        assert!(!a.all_lt(&b));
        assert!(PVec::from([0, 2]).all_lt(&b));
    }

    #[test]
    fn test_product_and_display() {
        let dims = PVec::from([2, 3, 4]);
        assert_eq!(dims.product(), 24);
        assert_eq!(dims.to_string(), "[ 2 3 4 ]");
        assert_eq!(PVec::zeros(3), PVec::from([0, 0, 0]));
    }
}
