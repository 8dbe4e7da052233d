/// 2D point in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Edge function used in rasterization
pub fn edge_function(a: &[f64; 2], b: &[f64; 2], c: &[f64; 2]) -> f64 {
    (c[0] - a[0]) * (b[1] - a[1]) - (c[1] - a[1]) * (b[0] - a[0])
}

/// Multiplies a 3x3 matrix by a 3-dimensional vector
pub fn multiply_matrix_vector(matrix: &[[f64; 3]; 3], vector: &[f64; 3]) -> [f64; 3] {
    let mut result = [0.0; 3];
    for (row, out) in matrix.iter().zip(result.iter_mut()) {
        *out = row[0] * vector[0] + row[1] * vector[1] + row[2] * vector[2];
    }
    result
}

/// Multiplies two 3x3 matrices
pub fn multiply_matrices(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut result = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

/// Rotation about the X axis
pub fn rotation_x(angle: f64) -> [[f64; 3]; 3] {
    let (sin, cos) = angle.sin_cos();
    [[1.0, 0.0, 0.0], [0.0, cos, -sin], [0.0, sin, cos]]
}

/// Rotation about the Y axis.
///
/// Sign convention matches screen space with Y pointing down: a positive angle
/// swings +X toward +Z.
pub fn rotation_y(angle: f64) -> [[f64; 3]; 3] {
    let (sin, cos) = angle.sin_cos();
    [[cos, 0.0, -sin], [0.0, 1.0, 0.0], [sin, 0.0, cos]]
}

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Pseudo-random but deterministic value in [0, 1) for a 2D position.
///
/// Classic shader hash; neighbouring inputs give unrelated outputs, which keeps
/// per-position animation phases out of sync with each other.
pub fn position_hash(x: f64, y: f64) -> f64 {
    let v = (x * 12.9898 + y * 78.233).sin() * 43758.5453;
    v - v.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_is_orthonormal() {
        let m = multiply_matrices(&rotation_x(0.7), &rotation_y(1.3));
        let v = multiply_matrix_vector(&m, &[1.0, 2.0, 3.0]);
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((len - 14f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let v = multiply_matrix_vector(&rotation_y(std::f64::consts::FRAC_PI_2), &[1.0, 0.0, 0.0]);
        assert!(v[0].abs() < 1e-9);
        assert!((v[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_hash_range_and_determinism() {
        for i in 0..200 {
            let h = position_hash(i as f64 * 8.0, (i % 7) as f64 * 7.0 + 5.0);
            assert!((0.0..1.0).contains(&h));
            assert_eq!(h, position_hash(i as f64 * 8.0, (i % 7) as f64 * 7.0 + 5.0));
        }
    }
}
