//! Small dense accumulation kernels used by the leaf containers.

use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, NdTensorView};

/// Compute `U Uᵀ` for a `K x N` factor matrix `U`.
pub fn gram(u: &NdTensorView<f64, 2>) -> NdTensor<f64, 2> {
    let [k, n] = u.shape();
    let mut out = NdTensor::zeros([k, k]);
    for j in 0..n {
        for a in 0..k {
            let ua = u[[a, j]];
            for b in 0..k {
                out[[a, b]] += ua * u[[b, j]];
            }
        }
    }
    out
}

/// Compute `sum(a * b)` over all elements of two equally sized matrices.
pub fn frobenius_dot(a: &NdTensor<f64, 2>, b: &NdTensor<f64, 2>) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Update `mm += alpha * v vᵀ`.
pub fn add_outer(mm: &mut NdTensor<f64, 2>, v: &[f64], alpha: f64) {
    for (a, &va) in v.iter().enumerate() {
        let scaled = alpha * va;
        for (b, &vb) in v.iter().enumerate() {
            mm[[a, b]] += scaled * vb;
        }
    }
}

/// Update `rr += scale * v`.
pub fn add_scaled(rr: &mut NdTensor<f64, 1>, v: &[f64], scale: f64) {
    for (k, &vk) in v.iter().enumerate() {
        rr[[k]] += scale * vk;
    }
}

/// Update `mm += alpha * other`.
pub fn add_matrix(mm: &mut NdTensor<f64, 2>, other: &NdTensor<f64, 2>, alpha: f64) {
    for (dst, src) in mm.iter_mut().zip(other.iter()) {
        *dst += alpha * src;
    }
}

/// Copy column `j` of `u` into `out`.
pub fn column(u: &NdTensorView<f64, 2>, j: usize, out: &mut [f64]) {
    for (k, x) in out.iter_mut().enumerate() {
        *x = u[[k, j]];
    }
}
