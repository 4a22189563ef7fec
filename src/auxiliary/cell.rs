//! Crystal structures.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "cell_tests.rs"]
mod cell_tests;

/// A structure containing a periodic crystal structure.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Cell {
    /// The lattice. Row `i` is the $`i`$-th basis vector in Cartesian coordinates.
    lattice: Matrix3<f64>,

    /// The fractional coordinates of the sites with respect to [`Self::lattice`].
    positions: Vec<Vector3<f64>>,

    /// The species labels of the sites. Labels are arbitrary but must be consistent.
    numbers: Vec<i32>,
}

impl CellBuilder {
    fn validate(&self) -> Result<(), String> {
        let n_positions = self.positions.as_ref().map(Vec::len);
        let n_numbers = self.numbers.as_ref().map(Vec::len);
        if n_positions != n_numbers {
            return Err(format!(
                "The numbers of positions ({n_positions:?}) and species labels \
                ({n_numbers:?}) do not match."
            ));
        }
        if let Some(lattice) = self.lattice.as_ref() {
            if lattice.determinant().abs() < f64::EPSILON {
                return Err(format!("The lattice {lattice} is singular."));
            }
        }
        Ok(())
    }
}

impl Cell {
    /// Returns a builder to construct a new [`Cell`].
    #[must_use]
    pub fn builder() -> CellBuilder {
        CellBuilder::default()
    }

    /// Constructs a cell from raw arrays.
    ///
    /// # Arguments
    ///
    /// * `lattice` - The basis vectors as rows.
    /// * `positions` - The fractional coordinates of the sites.
    /// * `numbers` - The species labels of the sites.
    ///
    /// # Errors
    ///
    /// Errors if the lattice is singular or if the numbers of positions and labels differ.
    pub fn new(
        lattice: [[f64; 3]; 3],
        positions: &[[f64; 3]],
        numbers: &[i32],
    ) -> Result<Self, anyhow::Error> {
        Self::builder()
            .lattice(Matrix3::from_row_slice(&lattice.concat()))
            .positions(positions.iter().map(|&p| Vector3::from(p)).collect())
            .numbers(numbers.to_vec())
            .build()
            .map_err(|err| format_err!(err))
    }

    pub fn lattice(&self) -> &Matrix3<f64> {
        &self.lattice
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn numbers(&self) -> &[i32] {
        &self.numbers
    }

    /// The number of sites in the cell.
    pub fn num_sites(&self) -> usize {
        self.positions.len()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lattice (rows):")?;
        for row in self.lattice.row_iter() {
            writeln!(f, "  {:>+12.7} {:>+12.7} {:>+12.7}", row[0], row[1], row[2])?;
        }
        writeln!(f, "Sites (fractional):")?;
        for (position, number) in self.positions.iter().zip(self.numbers.iter()) {
            writeln!(
                f,
                "  {:>4} {:>+12.7} {:>+12.7} {:>+12.7}",
                number, position[0], position[1], position[2]
            )?;
        }
        Ok(())
    }
}
