use nalgebra::Point3;

/// Occupancies closer to 1.0 than this are treated as full occupation.
pub const OCCUPANCY_TOLERANCE: f64 = 1e-8;

/// A chemical species occupying a crystallographic site with a given probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    /// The element symbol (e.g., "Au", "Cu").
    pub element: String,
    /// The fractional occupancy of the site by this element, in `(0, 1]`.
    pub occupancy: f64,
}

impl Species {
    pub fn new(element: &str, occupancy: f64) -> Self {
        Self {
            element: element.to_string(),
            occupancy,
        }
    }
}

/// A crystallographic site: a position in fractional coordinates and the
/// species that may occupy it.
///
/// A site with a single fully occupying species is *ordered*. Anything else,
/// including a single species with partial occupancy (a vacancy), is
/// *disordered* and is what the SQS search approximates.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// An optional label carried over from the source file (e.g., "Au1").
    pub label: Option<String>,
    /// The species on this site, sorted by element symbol.
    pub species: Vec<Species>,
    /// The position of the site in fractional coordinates of its lattice.
    pub frac_coords: Point3<f64>,
}

impl Site {
    /// Creates a site, sorting its species by element symbol.
    pub fn new(species: Vec<Species>, frac_coords: Point3<f64>) -> Self {
        let mut species = species;
        species.sort_by(|a, b| a.element.cmp(&b.element));
        Self {
            label: None,
            species,
            frac_coords,
        }
    }

    /// Creates a site fully occupied by a single element.
    pub fn ordered(element: &str, frac_coords: Point3<f64>) -> Self {
        Self::new(vec![Species::new(element, 1.0)], frac_coords)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn is_ordered(&self) -> bool {
        match self.species.as_slice() {
            [only] => (only.occupancy - 1.0).abs() < OCCUPANCY_TOLERANCE,
            _ => false,
        }
    }

    /// The sum of all species occupancies on this site.
    pub fn total_occupancy(&self) -> f64 {
        self.species.iter().map(|s| s.occupancy).sum()
    }
}
