use super::lattice::Lattice;
use super::site::Site;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// A periodic crystal structure: a lattice plus the sites of one unit cell.
///
/// This is the value handed to and returned from the SQS workflow. The input
/// structure is expected to be disordered; the structures produced by the
/// search are ordered supercells approximating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub lattice: Lattice,
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self { lattice, sites }
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if every site is fully occupied by a single species.
    pub fn is_ordered(&self) -> bool {
        self.sites.iter().all(Site::is_ordered)
    }

    /// Returns `true` if at least one site carries a fractional occupancy.
    pub fn is_disordered(&self) -> bool {
        !self.is_ordered()
    }

    /// Total occupancy of each element over the cell, keyed by element symbol.
    pub fn composition(&self) -> BTreeMap<String, f64> {
        let mut composition = BTreeMap::new();
        for species in self.sites.iter().flat_map(|s| &s.species) {
            *composition.entry(species.element.clone()).or_insert(0.0) += species.occupancy;
        }
        composition
    }

    /// Number of sites in the `a × b × c` supercell, or `None` if it does not
    /// fit in a `usize`.
    pub fn supercell_site_count(&self, multipliers: [u32; 3]) -> Option<usize> {
        multipliers
            .iter()
            .try_fold(self.sites.len(), |count, &m| count.checked_mul(m as usize))
    }

    /// Builds the `a × b × c` supercell of this structure.
    ///
    /// The lattice vectors are multiplied by the given factors and every site
    /// is replicated into each image, with fractional coordinates rescaled
    /// into the enlarged cell. The result has `a * b * c * num_sites()` sites.
    ///
    /// # Arguments
    ///
    /// * `multipliers` - The repetition count along each lattice vector.
    ///   Callers are expected to reject zero multipliers and multipliers for
    ///   which [`Structure::supercell_site_count`] is `None`.
    pub fn supercell(&self, multipliers: [u32; 3]) -> Self {
        let [na, nb, nc] = multipliers;
        let scale = multipliers.map(f64::from);
        let capacity = self.supercell_site_count(multipliers).unwrap_or(0);
        let mut sites = Vec::with_capacity(capacity);

        for i in 0..na {
            for j in 0..nb {
                for k in 0..nc {
                    let shift = [i, j, k].map(f64::from);
                    for site in &self.sites {
                        let f = site.frac_coords;
                        let frac_coords = Point3::new(
                            (f.x + shift[0]) / scale[0],
                            (f.y + shift[1]) / scale[1],
                            (f.z + shift[2]) / scale[2],
                        );
                        sites.push(Site {
                            label: site.label.clone(),
                            species: site.species.clone(),
                            frac_coords,
                        });
                    }
                }
            }
        }

        Self {
            lattice: self.lattice.scaled(multipliers),
            sites,
        }
    }
}
