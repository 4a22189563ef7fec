//! # spinspg: Spin Space Group Detection
//!
//! `spinspg` determines the **spin space group** of a periodic crystal carrying magnetic moments:
//! the group of combined operations $`\{W \| R | \mathbf{t}\}`$, where $`(R, \mathbf{t})`$ acts
//! on the crystal coordinates and $`W \in O(3)`$ acts on the moment vectors, that map the
//! lattice, the atomic sites, and the moments onto themselves.
//!
//! The computation proceeds in the following stages:
//! - a nonmagnetic symmetry search on the bare structure, consumed through the
//!   [`symmetry::nonmagnetic::SymmetrySearch`] trait (a default implementation backed by `moyo`,
//!   [`symmetry::moyo_search::MoyoSymmetrySearch`], is provided),
//! - normalisation of the nonmagnetic operations into a primitive basis with induced site
//!   permutations,
//! - classification of the continuous spin-only group of the moment arrangement,
//! - construction of the spin space group as a coset decomposition over the maximal space
//!   subgroup compatible with the magnetic order, and
//! - flattening of the coset decomposition back into the input cell.
//!
//! ## Examples and usage
//!
//! The simplest entry point is [`drivers::spin_symmetry_detection::get_spin_symmetry`]. Finer
//! control, including logging of the intermediate results and saving of the results, is
//! available through [`drivers::spin_symmetry_detection::SpinSymmetryDetectionDriver`]. Usages
//! of most items are illustrated in their test functions.
//!
//! ## Logging
//!
//! Progress and result summaries are emitted through the [`log`] facade on the
//! `spinspg-output` target. Diagnostic messages use the default targets. No logger is installed
//! by this crate.
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod auxiliary;
pub mod drivers;
pub mod io;
pub mod permutation;
pub mod symmetry;
