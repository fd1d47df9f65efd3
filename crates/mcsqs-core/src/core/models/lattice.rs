use nalgebra::{Matrix3, Point3, Vector3};

/// A periodic lattice described by three lattice vectors.
///
/// The vectors are stored as the rows of a 3×3 matrix in Angstroms, so a
/// fractional coordinate `f` maps to the Cartesian position `matrixᵀ · f`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from a matrix whose rows are the lattice vectors.
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Creates a lattice from three lattice vectors.
    pub fn from_vectors(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]),
        }
    }

    /// Creates a lattice from its six cell parameters.
    ///
    /// Lengths are in Angstroms, angles in degrees. The `a` vector is placed
    /// along x and `b` in the xy-plane, the convention used by CIF readers.
    ///
    /// # Arguments
    ///
    /// * `abc` - The lattice vector lengths `(a, b, c)`.
    /// * `angles` - The interaxial angles `(alpha, beta, gamma)`.
    pub fn from_parameters(abc: [f64; 3], angles: [f64; 3]) -> Self {
        let [a, b, c] = abc;
        let [alpha, beta, gamma] = angles.map(f64::to_radians);

        let (cos_alpha, cos_beta, cos_gamma) = (alpha.cos(), beta.cos(), gamma.cos());
        let sin_gamma = gamma.sin();

        let cx = c * cos_beta;
        let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

        Self::from_vectors(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(cx, cy, cz),
        )
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Returns the lattice vector at `index` (0 = a, 1 = b, 2 = c).
    pub fn vector(&self, index: usize) -> Vector3<f64> {
        self.matrix.row(index).transpose()
    }

    /// The lengths of the three lattice vectors.
    pub fn abc(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.vector(i).norm())
    }

    /// The interaxial angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let (a, b, c) = (self.vector(0), self.vector(1), self.vector(2));
        [angle_between(&b, &c), angle_between(&a, &c), angle_between(&a, &b)]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Converts fractional coordinates into Cartesian coordinates.
    pub fn to_cartesian(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * frac.coords)
    }

    /// Converts Cartesian coordinates into fractional coordinates.
    ///
    /// Returns `None` for a degenerate (singular) lattice.
    pub fn to_fractional(&self, cart: &Point3<f64>) -> Option<Point3<f64>> {
        self.matrix
            .transpose()
            .try_inverse()
            .map(|inv| Point3::from(inv * cart.coords))
    }

    /// Returns a lattice whose vectors are multiplied by the given factors.
    pub fn scaled(&self, multipliers: [u32; 3]) -> Self {
        let mut matrix = self.matrix;
        for (i, &m) in multipliers.iter().enumerate() {
            let row = matrix.row(i) * f64::from(m);
            matrix.set_row(i, &row);
        }
        Self { matrix }
    }
}

fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let cos = (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn cubic_parameters_produce_diagonal_matrix() {
        let lattice = Lattice::from_parameters([4.0, 4.0, 4.0], [90.0, 90.0, 90.0]);
        let m = lattice.matrix();
        assert!(approx(m[(0, 0)], 4.0));
        assert!(approx(m[(1, 1)], 4.0));
        assert!(approx(m[(2, 2)], 4.0));
        assert!(approx(m[(1, 0)], 0.0));
        assert!(approx(lattice.volume(), 64.0));
    }

    #[test]
    fn parameters_survive_matrix_conversion() {
        let lattice = Lattice::from_parameters([3.0, 4.0, 5.0], [80.0, 95.0, 110.0]);
        let [a, b, c] = lattice.abc();
        let [alpha, beta, gamma] = lattice.angles();
        assert!(approx(a, 3.0) && approx(b, 4.0) && approx(c, 5.0));
        assert!((alpha - 80.0).abs() < 1e-6);
        assert!((beta - 95.0).abs() < 1e-6);
        assert!((gamma - 110.0).abs() < 1e-6);
    }

    #[test]
    fn hexagonal_gamma_is_recovered() {
        let lattice = Lattice::from_parameters([2.5, 2.5, 4.0], [90.0, 90.0, 120.0]);
        assert!((lattice.angles()[2] - 120.0).abs() < 1e-6);
    }

    #[test]
    fn scaled_multiplies_each_vector_independently() {
        let lattice = Lattice::from_parameters([2.0, 3.0, 4.0], [90.0, 90.0, 90.0]);
        let scaled = lattice.scaled([2, 1, 3]);
        let [a, b, c] = scaled.abc();
        assert!(approx(a, 4.0) && approx(b, 3.0) && approx(c, 12.0));
        assert!(approx(scaled.volume(), lattice.volume() * 6.0));
    }

    #[test]
    fn fractional_and_cartesian_conversions_are_inverse() {
        let lattice = Lattice::from_parameters([3.0, 4.0, 5.0], [80.0, 95.0, 110.0]);
        let frac = Point3::new(0.25, 0.5, 0.75);
        let cart = lattice.to_cartesian(&frac);
        let back = lattice.to_fractional(&cart).unwrap();
        assert!((back - frac).norm() < 1e-9);
    }

    #[test]
    fn singular_lattice_has_no_fractional_coordinates() {
        let lattice = Lattice::new(Matrix3::zeros());
        assert!(lattice.to_fractional(&Point3::origin()).is_none());
    }
}
