//! Direct (non-Winograd) valid convolution used to verify pipeline output.

use ndarray::{Array3, ArrayView3, ArrayView4};

/// Valid 3x3 cross-correlation, stride 1, no padding.
///
/// `filters` is `[K, C, r, r]`, `image` is `[C, H, W]`; the result is
/// `[K, H - r + 1, W - r + 1]`, empty along any axis shorter than the filter.
pub fn direct_conv(filters: ArrayView4<f32>, image: ArrayView3<f32>) -> Array3<f32> {
    let (k_count, c_count, kh, kw) = filters.dim();
    let (_, in_h, in_w) = image.dim();
    let out_h = (in_h + 1).saturating_sub(kh);
    let out_w = (in_w + 1).saturating_sub(kw);

    let mut output = Array3::zeros((k_count, out_h, out_w));
    for k in 0..k_count {
        for oh in 0..out_h {
            for ow in 0..out_w {
                let mut sum = 0.0;
                for c in 0..c_count {
                    for i in 0..kh {
                        for j in 0..kw {
                            sum += image[[c, oh + i, ow + j]] * filters[[k, c, i, j]];
                        }
                    }
                }
                output[[k, oh, ow]] = sum;
            }
        }
    }
    output
}

/// Largest absolute elementwise difference; infinite on shape mismatch
pub fn max_abs_diff(a: &Array3<f32>, b: &Array3<f32>) -> f32 {
    if a.dim() != b.dim() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}
