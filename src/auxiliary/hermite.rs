//! Hermite normal forms of integer lattices.

use anyhow::{self, bail, format_err};
use nalgebra::{Matrix3, Vector3};

#[cfg(test)]
#[path = "hermite_tests.rs"]
mod hermite_tests;

/// Computes a basis of the lattice spanned by a set of integer vectors in column-style Hermite
/// normal form.
///
/// The columns of the returned matrix $`H`$ generate the same lattice as `columns`, $`H`$ is
/// lower triangular with positive diagonal elements, and every element to the left of a diagonal
/// element $`H_{ii}`$ lies in $`[0, H_{ii})`$. $`H`$ is the leading $`3 \times 3`$ block of
/// $`AU`$ where $`A`$ has `columns` as its columns and $`U`$ is unimodular.
///
/// # Arguments
///
/// * `columns` - The generating vectors.
///
/// # Errors
///
/// Errors if the generating vectors do not span a three-dimensional lattice or if the result
/// overflows `i32`.
pub fn column_style_hermite_normal_form(
    columns: &[Vector3<i32>],
) -> Result<Matrix3<i32>, anyhow::Error> {
    let mut cols = columns
        .iter()
        .map(|col| col.map(i64::from))
        .collect::<Vec<_>>();
    let m = cols.len();
    for row in 0..3 {
        loop {
            let pivot = (row..m)
                .filter(|&j| cols[j][row] != 0)
                .min_by_key(|&j| cols[j][row].abs());
            let Some(pivot) = pivot else {
                bail!("The vectors {columns:?} do not span a three-dimensional lattice.");
            };
            cols.swap(row, pivot);
            let pivot_col = cols[row];
            let mut reduced = true;
            for col in cols.iter_mut().skip(row + 1) {
                let q = col[row] / pivot_col[row];
                *col -= pivot_col * q;
                if col[row] != 0 {
                    reduced = false;
                }
            }
            if reduced {
                break;
            }
        }
        if cols[row][row] < 0 {
            cols[row] = -cols[row];
        }
        let pivot_col = cols[row];
        for col in cols.iter_mut().take(row) {
            let q = col[row].div_euclid(pivot_col[row]);
            *col -= pivot_col * q;
        }
    }

    let hnf = Matrix3::from_columns(&[cols[0], cols[1], cols[2]]);
    hnf.iter()
        .map(|&x| i32::try_from(x))
        .collect::<Result<Vec<_>, _>>()
        .map(|elements| Matrix3::from_column_slice(&elements))
        .map_err(|_| format_err!("The Hermite normal form {hnf} overflows `i32`."))
}
