use jvol_core::AffineRows;

const BOTTOM_ROW: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Affine map from voxel indices `(i, j, k)` to physical RAS coordinates.
///
/// Only the top three rows are stored in a `.jvol` file; the bottom row is
/// always `[0, 0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IjkToRas {
    matrix: [[f64; 4]; 4],
}

impl Default for IjkToRas {
    fn default() -> Self {
        Self::identity()
    }
}

impl IjkToRas {
    pub fn identity() -> Self {
        let mut matrix = [[0.0; 4]; 4];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { matrix }
    }

    /// Rebuild the full matrix from its stored top rows.
    pub fn from_top_rows(rows: AffineRows) -> Self {
        Self {
            matrix: [rows[0], rows[1], rows[2], BOTTOM_ROW],
        }
    }

    /// Wrap a full 4×4 matrix. Fails unless the bottom row is `[0, 0, 0, 1]`.
    pub fn from_matrix(matrix: [[f64; 4]; 4]) -> anyhow::Result<Self> {
        if matrix[3] != BOTTOM_ROW {
            anyhow::bail!("not an affine transform: bottom row is {:?}", matrix[3]);
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &[[f64; 4]; 4] {
        &self.matrix
    }

    /// The three rows written to disk.
    pub fn top_rows(&self) -> AffineRows {
        [self.matrix[0], self.matrix[1], self.matrix[2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_rows_round_trip() {
        let rows = [[2.0, 0.0, 0.0, -10.0], [0.0, 2.0, 0.0, 5.0], [0.0, 0.0, 3.0, 1.5]];
        let t = IjkToRas::from_top_rows(rows);
        assert_eq!(t.matrix()[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.top_rows(), rows);
    }

    #[test]
    fn projective_matrix_is_rejected() {
        let mut m = *IjkToRas::identity().matrix();
        m[3][0] = 0.5;
        assert!(IjkToRas::from_matrix(m).is_err());
        let default = IjkToRas::from_matrix(*IjkToRas::default().matrix()).unwrap();
        assert_eq!(default, IjkToRas::identity());
    }
}
