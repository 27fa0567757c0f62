//! # Geography
//!
//! Great-circle distances on a spherical Earth. Every function works on
//! whole coordinate arrays so the pairwise matrix is built one origin row
//! at a time.

use ndarray::{Array1, Array2, ArrayView1, Zip};

use crate::error::{NetworkError, Result};

/// Mean Earth radius in km, treating the planet as a perfect sphere
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance (km) from one origin to every target point.
///
/// All coordinates are in radians. Uses the spherical law of cosines with the
/// cosine argument clamped to [-1, 1] so rounding never yields NaN. A target
/// identical to the origin is exactly zero.
pub fn distance_to_all(
    origin_lat: f64,
    origin_lon: f64,
    lats: ArrayView1<f64>,
    lons: ArrayView1<f64>,
) -> Result<Array1<f64>> {
    if lats.len() != lons.len() {
        return Err(NetworkError::DimensionMismatch {
            context: "longitudes per latitude",
            expected: lats.len(),
            actual: lons.len(),
        });
    }

    let (sin_origin, cos_origin) = origin_lat.sin_cos();
    let distances = Zip::from(&lats)
        .and(&lons)
        .map_collect(|&lat, &lon| {
            if lat == origin_lat && lon == origin_lon {
                return 0.0;
            }
            let cos_angle =
                sin_origin * lat.sin() + cos_origin * lat.cos() * (lon - origin_lon).cos();
            EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
        });

    Ok(distances)
}

/// Pairwise great-circle distance matrix (km) for points given in radians.
///
/// Each row is computed independently from the shared coordinate arrays.
pub fn distance_matrix(lats: ArrayView1<f64>, lons: ArrayView1<f64>) -> Result<Array2<f64>> {
    let n = lats.len();
    if lons.len() != n {
        return Err(NetworkError::DimensionMismatch {
            context: "longitudes per latitude",
            expected: n,
            actual: lons.len(),
        });
    }

    let mut matrix = Array2::<f64>::zeros((n, n));
    for (i, mut row) in matrix.outer_iter_mut().enumerate() {
        let distances = distance_to_all(lats[i], lons[i], lats, lons)?;
        row.assign(&distances);
    }
    Ok(matrix)
}

/// Same as [`distance_matrix`] but takes coordinates in degrees
pub fn distance_matrix_degrees(
    lats_deg: ArrayView1<f64>,
    lons_deg: ArrayView1<f64>,
) -> Result<Array2<f64>> {
    let lats = lats_deg.mapv(f64::to_radians);
    let lons = lons_deg.mapv(f64::to_radians);
    distance_matrix(lats.view(), lons.view())
}

/// Great-circle distance (km) between two points given in degrees
pub fn distance_degrees(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    if lat_a == lat_b && lon_a == lon_b {
        return 0.0;
    }
    let (lat_a, lon_a, lat_b, lon_b) = (
        lat_a.to_radians(),
        lon_a.to_radians(),
        lat_b.to_radians(),
        lon_b.to_radians(),
    );
    let cos_angle = lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * (lon_b - lon_a).cos();
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    const ONE_DEGREE_KM: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = distance_degrees(0.0, 0.0, 0.0, 1.0);
        assert!((d - ONE_DEGREE_KM).abs() < 1e-6);
        assert!((d - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_coincident_points_are_zero_not_nan() {
        let lat = 0.7853981633974483_f64;
        let lon = 2.356194490192345_f64;
        let lats = array![lat, lat, lat + 1e-15];
        let lons = array![lon, lon, lon - 1e-15];

        let distances = distance_to_all(lat, lon, lats.view(), lons.view()).unwrap();
        assert!(distances.iter().all(|d| !d.is_nan()));
        assert_eq!(distances[0], 0.0);
        assert_eq!(distances[1], 0.0);
        assert!(distances[2] < 1e-3);
    }

    #[test]
    fn test_antipodal_points() {
        let d = distance_degrees(0.0, 0.0, 0.0, 180.0);
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_shape_and_diagonal() {
        let lats = array![0.0, 0.0, 1.0, -33.87];
        let lons = array![0.0, 1.0, 0.0, 151.21];
        let matrix = distance_matrix_degrees(lats.view(), lons.view()).unwrap();

        assert_eq!(matrix.dim(), (4, 4));
        for i in 0..4 {
            assert_eq!(matrix[[i, i]], 0.0);
        }
        assert!((matrix[[0, 1]] - ONE_DEGREE_KM).abs() < 1e-6);
        assert!((matrix[[0, 2]] - ONE_DEGREE_KM).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input_gives_empty_matrix() {
        let empty = Array1::<f64>::zeros(0);
        let matrix = distance_matrix(empty.view(), empty.view()).unwrap();
        assert_eq!(matrix.dim(), (0, 0));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let lats = array![0.0, 1.0];
        let lons = array![0.0];
        let err = distance_matrix(lats.view(), lons.view()).unwrap_err();
        assert!(matches!(err, NetworkError::DimensionMismatch { expected: 2, actual: 1, .. }));
    }

    fn coordinates() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 1..12)
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            a in (-90.0f64..=90.0, -180.0f64..=180.0),
            b in (-90.0f64..=90.0, -180.0f64..=180.0),
        ) {
            let ab = distance_degrees(a.0, a.1, b.0, b.1);
            let ba = distance_degrees(b.0, b.1, a.0, a.1);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert_eq!(distance_degrees(a.0, a.1, a.0, a.1), 0.0);
        }

        #[test]
        fn prop_matrix_symmetric_zero_diagonal_no_nan(points in coordinates()) {
            let lats: Array1<f64> = points.iter().map(|p| p.0).collect();
            let lons: Array1<f64> = points.iter().map(|p| p.1).collect();
            let matrix = distance_matrix_degrees(lats.view(), lons.view()).unwrap();
            let n = points.len();

            for i in 0..n {
                prop_assert_eq!(matrix[[i, i]], 0.0);
                for j in 0..n {
                    prop_assert!(!matrix[[i, j]].is_nan());
                    prop_assert!(matrix[[i, j]] >= 0.0);
                    prop_assert!((matrix[[i, j]] - matrix[[j, i]]).abs() < 1e-6);
                }
            }
        }
    }
}
