//! Fixed F(2,3) transform matrices, row-major.
//!
//! U = G g G^T, V = B^T d B and Y = A^T M A.

use crate::geometry::{ALPHA, FILTER_SIZE, OUTPUT_TILE};

/// Filter transform, 4x3
#[rustfmt::skip]
pub const G: [f32; ALPHA * FILTER_SIZE] = [
    1.0, 0.0, 0.0,
    0.5, 0.5, 0.5,
    0.5, -0.5, 0.5,
    0.0, 0.0, 1.0,
];

/// Data transform, 4x4
#[rustfmt::skip]
pub const B: [f32; ALPHA * ALPHA] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, -1.0, 1.0,
    -1.0, 1.0, 1.0, 0.0,
    0.0, 0.0, 0.0, -1.0,
];

/// Inverse transform, 4x2
#[rustfmt::skip]
pub const A: [f32; ALPHA * OUTPUT_TILE] = [
    1.0, 0.0,
    1.0, 1.0,
    1.0, -1.0,
    0.0, -1.0,
];

/// `lhs (n x k) * rhs (k x m)`
pub fn matmul(lhs: &[f32], rhs: &[f32], n: usize, k: usize, m: usize, out: &mut [f32]) {
    for i in 0..n {
        for j in 0..m {
            let mut sum = 0.0;
            for t in 0..k {
                sum += lhs[i * k + t] * rhs[t * m + j];
            }
            out[i * m + j] = sum;
        }
    }
}

/// `lhs (n x k) * rhs^T`, where `rhs` is stored `m x k`
pub fn matmul_transposed_rhs(lhs: &[f32], rhs: &[f32], n: usize, k: usize, m: usize, out: &mut [f32]) {
    for i in 0..n {
        for j in 0..m {
            let mut sum = 0.0;
            for t in 0..k {
                sum += lhs[i * k + t] * rhs[j * k + t];
            }
            out[i * m + j] = sum;
        }
    }
}

/// `lhs^T * rhs`, where `lhs` is stored `k x n` and `rhs` is `k x m`
pub fn matmul_transposed_lhs(lhs: &[f32], rhs: &[f32], n: usize, k: usize, m: usize, out: &mut [f32]) {
    for i in 0..n {
        for j in 0..m {
            let mut sum = 0.0;
            for t in 0..k {
                sum += lhs[t * n + i] * rhs[t * m + j];
            }
            out[i * m + j] = sum;
        }
    }
}

/// U = G g G^T for one 3x3 filter
pub fn filter_tile(g_matrix: &[f32], filter: &[f32]) -> [f32; ALPHA * ALPHA] {
    let mut tmp = [0.0f32; ALPHA * FILTER_SIZE];
    matmul(g_matrix, filter, ALPHA, FILTER_SIZE, FILTER_SIZE, &mut tmp);
    let mut u = [0.0f32; ALPHA * ALPHA];
    matmul_transposed_rhs(&tmp, g_matrix, ALPHA, FILTER_SIZE, ALPHA, &mut u);
    u
}

/// V = B^T d B for one 4x4 patch
pub fn data_tile(b_matrix: &[f32], patch: &[f32]) -> [f32; ALPHA * ALPHA] {
    let mut tmp = [0.0f32; ALPHA * ALPHA];
    matmul_transposed_lhs(b_matrix, patch, ALPHA, ALPHA, ALPHA, &mut tmp);
    let mut v = [0.0f32; ALPHA * ALPHA];
    matmul(&tmp, b_matrix, ALPHA, ALPHA, ALPHA, &mut v);
    v
}

/// Y = A^T m A for one 4x4 transform-domain tile
pub fn output_tile(a_matrix: &[f32], tile: &[f32]) -> [f32; OUTPUT_TILE * OUTPUT_TILE] {
    let mut tmp = [0.0f32; OUTPUT_TILE * ALPHA];
    matmul_transposed_lhs(a_matrix, tile, OUTPUT_TILE, ALPHA, ALPHA, &mut tmp);
    let mut y = [0.0f32; OUTPUT_TILE * OUTPUT_TILE];
    matmul(&tmp, a_matrix, OUTPUT_TILE, ALPHA, OUTPUT_TILE, &mut y);
    y
}
