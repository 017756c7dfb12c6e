//! Plain-text tensor input and output.
//!
//! Input: `K C H W`, then K·C·9 filter coefficients in (k, c, row, col) order,
//! then C·H·W image values in (c, row, col) order, all whitespace-delimited.
//!
//! Output: `K C out_H out_W`, then per output channel a blank line followed
//! by `out_H` rows of `out_W` fixed-point values with four decimals.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;
use ndarray::Array3;
use crate::error::{Result, WinogradError};
use crate::problem::{Problem, ProblemShape};

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    consumed: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
            consumed: 0,
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str> {
        let token = self.inner.next().ok_or_else(|| {
            WinogradError::Parse(format!("unexpected end of input while reading {} (after {} values)", what, self.consumed))
        })?;
        self.consumed += 1;
        Ok(token)
    }

    fn dimension(&mut self, name: &str) -> Result<usize> {
        let token = self.next_token(name)?;
        token
            .parse::<usize>()
            .map_err(|_| WinogradError::Parse(format!("dimension {} must be a non-negative integer, got '{}'", name, token)))
    }

    fn values(&mut self, what: &str, count: usize) -> Result<Vec<f32>> {
        (0..count)
            .map(|i| {
                let token = self.next_token(what)?;
                token
                    .parse::<f32>()
                    .map_err(|_| WinogradError::Parse(format!("{} value {} is not a number: '{}'", what, i, token)))
            })
            .collect()
    }
}

/// Parse the leading `K C H W` line only
pub fn parse_shape(text: &str) -> Result<ProblemShape> {
    let mut tokens = Tokens::new(text);
    read_shape(&mut tokens)
}

fn read_shape(tokens: &mut Tokens<'_>) -> Result<ProblemShape> {
    let k = tokens.dimension("K")?;
    let c = tokens.dimension("C")?;
    let h = tokens.dimension("H")?;
    let w = tokens.dimension("W")?;
    ProblemShape::new(k, c, h, w)
}

/// Parse a full problem from text
pub fn parse_problem(text: &str) -> Result<Problem> {
    let mut tokens = Tokens::new(text);
    let shape = read_shape(&mut tokens)?;
    let filters = tokens.values("filter", shape.filter_len()?)?;
    let image = tokens.values("image", shape.image_len()?)?;
    if tokens.inner.next().is_some() {
        log::warn!("ignoring trailing values after the image");
    }
    Problem::from_vecs(shape, filters, image)
}

/// Read and parse a problem file
pub fn read_problem<P: AsRef<Path>>(path: P) -> Result<Problem> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| WinogradError::File(format!("Failed to open {}: {}", path.display(), e)))?;
    parse_problem(&text)
}

/// Render the output tensor `Y[K][out_H][out_W]`
pub fn format_output(shape: &ProblemShape, output: &Array3<f32>) -> String {
    let (k, out_h, out_w) = output.dim();
    let mut text = String::with_capacity(16 + k * out_h * out_w * 12);
    let _ = writeln!(text, "{} {} {} {}", shape.k, shape.c, out_h, out_w);
    for channel in output.outer_iter() {
        text.push('\n');
        for row in channel.rows() {
            for value in row {
                let _ = write!(text, "   {:5.4}", value);
            }
            text.push('\n');
        }
    }
    text
}

/// Write the output tensor to `path`, truncating any existing file
pub fn write_output<P: AsRef<Path>>(path: P, shape: &ProblemShape, output: &Array3<f32>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_output(shape, output))
        .map_err(|e| WinogradError::File(format!("Failed to write {}: {}", path.display(), e)))
}

/// Parse text produced by [`format_output`].
///
/// Returns the header `(K, C, out_H, out_W)` and the output tensor.
pub fn parse_output(text: &str) -> Result<((usize, usize, usize, usize), Array3<f32>)> {
    let mut tokens = Tokens::new(text);
    let k = tokens.dimension("K")?;
    let c = tokens.dimension("C")?;
    let out_h = tokens.dimension("out_H")?;
    let out_w = tokens.dimension("out_W")?;
    let count = k
        .checked_mul(out_h)
        .and_then(|n| n.checked_mul(out_w))
        .ok_or_else(|| WinogradError::Parse(format!("output header {} x {} x {} overflows usize", k, out_h, out_w)))?;
    let values = tokens.values("output", count)?;
    let output = Array3::from_shape_vec((k, out_h, out_w), values)
        .map_err(|e| WinogradError::Parse(e.to_string()))?;
    Ok(((k, c, out_h, out_w), output))
}
