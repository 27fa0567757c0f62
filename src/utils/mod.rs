use itertools::Itertools;
use ndarray::Array2;

/// Render a matrix with whole-number cells, one row per line.
///
/// Cells are truncated toward zero.
pub fn format_matrix(matrix: &Array2<f64>) -> String {
    matrix
        .outer_iter()
        .map(|row| row.iter().map(|value| value.trunc() as i64).join(" "))
        .join("\n")
}
