//! Driver for spin space group detection.

use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use log;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::cell::Cell;
use crate::drivers::SpinSpgDriver;
use crate::io::format::{log_subtitle, log_title, spinspg_output, write_subtitle, SpinSpgOutput};
use crate::io::{write_spinspg_binary, SpinSpgFileType};
use crate::symmetry::moyo_search::MoyoSymmetrySearch;
use crate::symmetry::nonmagnetic::{NonmagneticSymmetry, SymmetrySearch};
use crate::symmetry::spin_space_group::{SpinSpaceGroup, SpinSymmetryOperations};


// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_symprec() -> f64 {
    1e-5
}

fn default_angle_tolerance() -> f64 {
    -1.0
}

/// A structure containing control parameters for spin space group detection.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SpinSymmetryDetectionParams {
    /// Distance tolerance for the nonmagnetic symmetry search and the site matching.
    #[builder(default = "default_symprec()")]
    #[serde(default = "default_symprec")]
    pub symprec: f64,

    /// Angle tolerance in degrees for the lattice metric comparison. A negative value indicates
    /// that only [`Self::symprec`] is to be used.
    #[builder(default = "default_angle_tolerance()")]
    #[serde(default = "default_angle_tolerance")]
    pub angle_tolerance: f64,

    /// Tolerance on magnetic moment deviations. If `None`, [`Self::symprec`] is used.
    #[builder(default = "None")]
    #[serde(default)]
    pub mag_symprec: Option<f64>,

    /// Optional name for saving the result as a binary file of type [`SpinSpgFileType::Ssg`].
    /// If `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

impl SpinSymmetryDetectionParamsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(symprec) = self.symprec {
            if symprec <= 0.0 {
                return Err(format!("`symprec` must be positive, but is {symprec}."));
            }
        }
        if let Some(Some(mag_symprec)) = self.mag_symprec {
            if mag_symprec <= 0.0 {
                return Err(format!("`mag_symprec` must be positive, but is {mag_symprec}."));
            }
        }
        Ok(())
    }
}

impl SpinSymmetryDetectionParams {
    /// Returns a builder to construct a [`SpinSymmetryDetectionParams`] structure.
    pub fn builder() -> SpinSymmetryDetectionParamsBuilder {
        SpinSymmetryDetectionParamsBuilder::default()
    }

    /// The tolerance on magnetic moment deviations actually used.
    pub fn effective_mag_symprec(&self) -> f64 {
        self.mag_symprec.unwrap_or(self.symprec)
    }
}

impl Default for SpinSymmetryDetectionParams {
    fn default() -> Self {
        Self {
            symprec: default_symprec(),
            angle_tolerance: default_angle_tolerance(),
            mag_symprec: None,
            result_save_name: None,
        }
    }
}

impl fmt::Display for SpinSymmetryDetectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distance tolerance: {:.3e}", self.symprec)?;
        if self.angle_tolerance > 0.0 {
            writeln!(f, "Angle tolerance: {:.3}°", self.angle_tolerance)?;
        } else {
            writeln!(f, "Angle tolerance: unset")?;
        }
        writeln!(
            f,
            "Magnetic moment tolerance: {:.3e}{}",
            self.effective_mag_symprec(),
            if self.mag_symprec.is_none() {
                " (same as distance tolerance)"
            } else {
                ""
            }
        )?;
        writeln!(
            f,
            "Save spin-symmetry detection results to file: {}",
            self.result_save_name.as_ref().map_or("no".to_string(), |name| {
                format!("{name}.{}", SpinSpgFileType::Ssg.ext())
            })
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain spin space group detection results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct SpinSymmetryDetectionResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: SpinSymmetryDetectionParams,

    /// The spin space group in its coset decomposition.
    pub spin_space_group: SpinSpaceGroup,

    /// The spin symmetry operations with respect to the input cell.
    pub operations: SpinSymmetryOperations,
}

impl SpinSymmetryDetectionResult {
    /// Returns a builder to construct a [`SpinSymmetryDetectionResult`] structure.
    fn builder() -> SpinSymmetryDetectionResultBuilder {
        SpinSymmetryDetectionResultBuilder::default()
    }
}

impl fmt::Display for SpinSymmetryDetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ssg = &self.spin_space_group;
        writeln!(f, "Spin-only group: {}", ssg.spin_only_group())?;
        writeln!(
            f,
            "Nontrivial coset size: {}",
            ssg.nontrivial_coset().len()
        )?;
        writeln!(
            f,
            "Spin-translation coset size: {}",
            ssg.spin_translation_coset().len()
        )?;
        writeln!(f, "Centerings in input cell: {}", ssg.prim_centerings().len())?;
        writeln!(
            f,
            "Spin symmetry operations in input cell: {}",
            self.operations.len()
        )?;
        writeln!(f)?;

        write_subtitle(f, "Spin symmetry operations {W || R | t}")?;
        writeln!(f)?;
        let width = self.operations.len().max(1).ilog10() as usize + 1;
        for (i, op) in self.operations.operations.iter().enumerate() {
            writeln!(f, "{:>width$} {op}", i + 1)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for spin space group detection.
#[derive(Clone, Builder)]
pub struct SpinSymmetryDetectionDriver<'a> {
    /// The control parameters for spin space group detection.
    parameters: &'a SpinSymmetryDetectionParams,

    /// The crystal structure.
    cell: &'a Cell,

    /// The magnetic moments of the sites in [`Self::cell`], in Cartesian coordinates.
    magmoms: &'a [Vector3<f64>],

    /// The nonmagnetic symmetry finder.
    #[builder(default = "&MoyoSymmetrySearch")]
    symmetry_search: &'a dyn SymmetrySearch,

    /// The result of the spin space group detection.
    #[builder(setter(skip), default = "None")]
    result: Option<SpinSymmetryDetectionResult>,
}

impl<'a> SpinSymmetryDetectionDriver<'a> {
    /// Returns a builder to construct a [`SpinSymmetryDetectionDriver`] structure.
    pub fn builder() -> SpinSymmetryDetectionDriverBuilder<'a> {
        SpinSymmetryDetectionDriverBuilder::default()
    }

    /// Executes spin space group detection.
    fn detect_spin_symmetry(&mut self) -> Result<(), anyhow::Error> {
        log_title("Spin Space Group Detection");
        spinspg_output!("");
        let params = self.parameters;
        params.log_output_display();

        ensure!(
            self.magmoms.len() == self.cell.num_sites(),
            "{} magnetic moments are given for {} sites.",
            self.magmoms.len(),
            self.cell.num_sites()
        );
        spinspg_output!("Magnetic structure:");
        self.cell.log_output_display();
        spinspg_output!("Magnetic moments (Cartesian):");
        for (i, m) in self.magmoms.iter().enumerate() {
            spinspg_output!("  {:>4} {:>+12.7} {:>+12.7} {:>+12.7}", i, m[0], m[1], m[2]);
        }
        spinspg_output!("");

        log_subtitle("Nonmagnetic symmetry");
        spinspg_output!("");
        let nonmagnetic_symmetry = NonmagneticSymmetry::from_cell(
            self.cell,
            self.symmetry_search,
            params.symprec,
            params.angle_tolerance,
        )?;
        spinspg_output!(
            "Distinct rotations: {}",
            nonmagnetic_symmetry.operations().len()
        );
        spinspg_output!("Centerings: {}", nonmagnetic_symmetry.centerings().len());
        spinspg_output!("");

        log_subtitle("Spin symmetry");
        spinspg_output!("");
        let spin_space_group = SpinSpaceGroup::from_nonmagnetic_symmetry(
            &nonmagnetic_symmetry,
            self.magmoms,
            params.effective_mag_symprec(),
        )?;
        let operations = spin_space_group.operations_in_input_cell()?;
        log::debug!(
            "{} spin symmetry operations found in the input cell.",
            operations.len()
        );

        let result = SpinSymmetryDetectionResult::builder()
            .parameters(params.clone())
            .spin_space_group(spin_space_group)
            .operations(operations)
            .build()
            .map_err(|err| format_err!(err))?;
        result.log_output_display();

        // Save spin-symmetry detection result, if requested
        if let Some(name) = params.result_save_name.as_ref() {
            write_spinspg_binary(name, SpinSpgFileType::Ssg, &result)?;
            spinspg_output!(
                "Spin-symmetry detection results saved as {name}.{}.",
                SpinSpgFileType::Ssg.ext()
            );
            spinspg_output!("");
        }

        self.result = Some(result);
        Ok(())
    }
}

impl SpinSpgDriver for SpinSymmetryDetectionDriver<'_> {
    type Params = SpinSymmetryDetectionParams;

    type Outcome = SpinSymmetryDetectionResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No spin-symmetry detection results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.detect_spin_symmetry().map_err(|err| {
            log::error!("{err}");
            err
        })
    }
}

// =========
// Functions
// =========

/// Returns the spin symmetry operations of a magnetic structure with respect to its input cell.
///
/// # Arguments
///
/// * `cell` - The crystal structure.
/// * `magmoms` - The magnetic moments of the sites in `cell`, in Cartesian coordinates.
/// * `symprec` - Distance tolerance, also used as the tolerance on moment deviations.
/// * `angle_tolerance` - Angle tolerance in degrees, or a negative value to rely on `symprec`
/// alone.
///
/// # Returns
///
/// The spin-only group and the spin symmetry operations. Their rotation parts and translations
/// are with respect to the lattice of `cell`, and their spin rotations are in Cartesian
/// coordinates.
///
/// # Errors
///
/// Errors if the number of moments does not match the number of sites, or if the symmetry
/// search yields inconsistent results.
pub fn get_spin_symmetry(
    cell: &Cell,
    magmoms: &[Vector3<f64>],
    symprec: f64,
    angle_tolerance: f64,
) -> Result<SpinSymmetryOperations, anyhow::Error> {
    let params = SpinSymmetryDetectionParams::builder()
        .symprec(symprec)
        .angle_tolerance(angle_tolerance)
        .build()
        .map_err(|err| format_err!(err))?;
    let mut driver = SpinSymmetryDetectionDriver::builder()
        .parameters(&params)
        .cell(cell)
        .magmoms(magmoms)
        .build()
        .map_err(|err| format_err!(err))?;
    driver.run()?;
    Ok(driver.result()?.operations.clone())
}
