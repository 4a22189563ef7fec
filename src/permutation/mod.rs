//! Permutations of sites in a crystal structure.

use std::fmt;
use std::ops::Mul;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub mod site_matching;


// ==================
// Struct definitions
// ==================

/// A structure to manage permutation actions of a finite set of sites.
#[derive(Builder, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Permutation {
    /// The rank of the permutation, *i.e.* the number of sites on which the permutation acts.
    rank: usize,

    /// If the permutation is to act on the ordered sequence of sites $`0, 1, \ldots, n - 1`$
    /// where $`n`$ is [`Self::rank`], then `image[i]` is the site onto which site `i` is moved.
    #[builder(setter(custom))]
    image: Vec<usize>,

    /// The cycle representation of the permutation, each cycle starting with its smallest
    /// element, sorted by decreasing length then lexicographically.
    #[builder(setter(skip), default = "self.calc_cycles()")]
    cycles: Vec<Vec<usize>>,
}

impl PermutationBuilder {
    fn image(&mut self, perm: &[usize]) -> &mut Self {
        self.image = Some(perm.to_vec());
        self
    }

    fn validate(&self) -> Result<(), String> {
        let rank = self.rank.ok_or("Permutation rank has not been set.")?;
        let image = self
            .image
            .as_ref()
            .ok_or("Permutation image has not been set.")?;
        if image.len() != rank {
            return Err(format!(
                "The permutation image `{image:?}` does not contain {rank} elements."
            ));
        }
        let distinct = image.iter().collect::<IndexSet<_>>();
        if distinct.len() != rank || image.iter().any(|&i| i >= rank) {
            return Err(format!(
                "The permutation image `{image:?}` is not a bijection on 0..{rank}."
            ));
        }
        Ok(())
    }

    fn calc_cycles(&self) -> Vec<Vec<usize>> {
        cycles_of(self.image.as_deref().unwrap_or_default())
    }
}

/// Decomposes a bijection on $`\{0, \ldots, n - 1\}`$ into cycles, each starting with its
/// smallest element, sorted by decreasing length then lexicographically.
fn cycles_of(image: &[usize]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; image.len()];
    let mut cycles = (0..image.len())
        .filter_map(|start| {
            if visited[start] {
                return None;
            }
            let cycle = std::iter::successors(Some(start), |&idx| {
                Some(image[idx]).filter(|&next| next != start)
            })
            .inspect(|&idx| visited[idx] = true)
            .collect_vec();
            Some(cycle)
        })
        .collect_vec();
    cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    cycles
}

impl Permutation {
    /// Returns a builder to construct a new permutation.
    #[must_use]
    fn builder() -> PermutationBuilder {
        PermutationBuilder::default()
    }

    /// Constructs a permutation from its image.
    ///
    /// # Arguments
    ///
    /// * `image` - The image of the ordered sequence $`0, 1, \ldots, n - 1`$.
    ///
    /// # Errors
    ///
    /// Errors if `image` is not a bijection on $`\{0, \ldots, n - 1\}`$.
    pub fn from_image(image: &[usize]) -> Result<Self, anyhow::Error> {
        Self::builder()
            .rank(image.len())
            .image(image)
            .build()
            .map_err(|err| format_err!(err))
    }

    /// Wraps an image already known to be a bijection.
    fn from_bijection(image: Vec<usize>) -> Self {
        Self {
            rank: image.len(),
            cycles: cycles_of(&image),
            image,
        }
    }

    /// Constructs the identity permutation of a given rank.
    #[must_use]
    pub fn identity(rank: usize) -> Self {
        Self::from_bijection((0..rank).collect_vec())
    }

    /// The number of sites on which this permutation acts.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn image(&self) -> &Vec<usize> {
        &self.image
    }

    /// Obtains the cycle representation of the permutation.
    pub fn cycles(&self) -> &Vec<Vec<usize>> {
        &self.cycles
    }

    /// Returns the site onto which site `idx` is moved.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not smaller than the rank.
    pub fn apply(&self, idx: usize) -> usize {
        self.image[idx]
    }

    /// Returns `true` if this permutation is the identity permutation for this rank.
    pub fn is_identity(&self) -> bool {
        self.image.iter().enumerate().all(|(i, &img)| i == img)
    }

    /// Gathers a sequence of per-site values through this permutation: entry `i` of the result
    /// is the value at site `self.apply(i)`.
    ///
    /// # Errors
    ///
    /// Errors if the length of `values` does not match the rank.
    pub fn gather<T: Clone>(&self, values: &[T]) -> Result<Vec<T>, anyhow::Error> {
        ensure!(
            values.len() == self.rank,
            "Unable to gather {} values with a permutation of rank {}.",
            values.len(),
            self.rank
        );
        Ok(self.image.iter().map(|&j| values[j].clone()).collect())
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.cycles
                .iter()
                .map(|cycle| format!("({})", cycle.iter().join(" ")))
                .join("")
        )
    }
}

// ---
// Mul
// ---
impl Mul<&'_ Permutation> for &Permutation {
    type Output = Permutation;

    /// Composes two permutations such that `(self * rhs).apply(i) == self.apply(rhs.apply(i))`.
    fn mul(self, rhs: &Permutation) -> Self::Output {
        assert_eq!(
            self.rank, rhs.rank,
            "The ranks of two multiplying permutations do not match."
        );
        Permutation::from_bijection(rhs.image.iter().map(|&ri| self.image[ri]).collect_vec())
    }
}

impl Mul<&'_ Permutation> for Permutation {
    type Output = Permutation;

    fn mul(self, rhs: &Permutation) -> Self::Output {
        &self * rhs
    }
}

impl Mul<Permutation> for Permutation {
    type Output = Permutation;

    fn mul(self, rhs: Permutation) -> Self::Output {
        &self * &rhs
    }
}

impl Mul<Permutation> for &Permutation {
    type Output = Permutation;

    fn mul(self, rhs: Permutation) -> Self::Output {
        self * &rhs
    }
}
