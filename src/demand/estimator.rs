use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::error::{NetworkError, Result};

/// Tunable constants of the gravity model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct DemandParams {
    /// Annual passenger (thousand) km generated per million dollars of GDP
    #[validate(range(min = 0.0, message = "km_per_million_gdp must be non-negative"))]
    pub km_per_million_gdp: f64,
    /// Friction distance added to every trip so zero distances stay finite
    #[validate(range(exclusive_min = 0.0, message = "constant_km must be positive"))]
    pub constant_km: f64,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            km_per_million_gdp: 100.0,
            constant_km: 50.0,
        }
    }
}

impl DemandParams {
    pub fn check(&self) -> Result<()> {
        if !self.km_per_million_gdp.is_finite() || !self.constant_km.is_finite() {
            return Err(NetworkError::validation(
                "demand parameters",
                vec!["parameters must be finite numbers".to_string()],
            ));
        }
        self.validate()
            .map_err(|e| NetworkError::invalid_fields("demand parameters", &e))
    }
}

/// Reciprocal distance-decay metric `1 / (D + constant_km)`.
///
/// Willingness to travel to a destination falls linearly with trip length.
pub fn distance_metric(distances: ArrayView2<f64>, constant_km: f64) -> Array2<f64> {
    distances.mapv(|d| (d + constant_km).recip())
}

/// Origin-destination demand, in passenger-km per year
#[derive(Debug, Clone, Serialize)]
pub struct DemandMatrix {
    values: Array2<f64>,
    nominal_totals: Array1<f64>,
}

impl DemandMatrix {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of airports along each axis
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, origin: usize, destination: usize) -> Option<f64> {
        self.values.get((origin, destination)).copied()
    }

    /// Nominal demand generated at each origin, `km_per_million_gdp x GDP`
    pub fn nominal_totals(&self) -> &Array1<f64> {
        &self.nominal_totals
    }

    /// Demand actually distributed from `origin`
    pub fn row_total(&self, origin: usize) -> Option<f64> {
        (origin < self.len()).then(|| self.values.row(origin).sum())
    }

    /// Share of the nominal origin total that the matrix row carries.
    ///
    /// `None` when the origin is out of range or generates no demand.
    pub fn coverage(&self, origin: usize) -> Option<f64> {
        let nominal = *self.nominal_totals.get(origin)?;
        if nominal == 0.0 {
            return None;
        }
        self.row_total(origin).map(|total| total / nominal)
    }

    pub fn total(&self) -> f64 {
        self.values.sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemandEstimator {
    params: DemandParams,
}

impl DemandEstimator {
    pub fn new(params: DemandParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DemandParams {
        &self.params
    }

    /// Estimate demand using the reciprocal distance metric derived from `distances`
    pub fn estimate(&self, gdp: ArrayView1<f64>, distances: ArrayView2<f64>) -> Result<DemandMatrix> {
        let metric = distance_metric(distances, self.params.constant_km);
        self.estimate_with_metric(gdp, distances, metric.view())
    }

    /// Estimate demand with a precomputed distance-decay metric.
    ///
    /// Rows are independent: each origin reads the shared inputs and writes
    /// only its own output row.
    pub fn estimate_with_metric(
        &self,
        gdp: ArrayView1<f64>,
        distances: ArrayView2<f64>,
        metric: ArrayView2<f64>,
    ) -> Result<DemandMatrix> {
        self.params.check()?;
        let n = gdp.len();
        check_square("distance matrix", distances, n)?;
        check_square("distance metric", metric, n)?;
        if let Some((i, value)) = gdp
            .iter()
            .enumerate()
            .find(|(_, g)| !g.is_finite() || **g < 0.0)
        {
            return Err(NetworkError::DegenerateInput(format!(
                "GDP of airport {i} is {value}, expected a non-negative number"
            )));
        }

        let constant_km = self.params.constant_km;
        let nominal_totals = gdp.mapv(|g| self.params.km_per_million_gdp * g);
        let mut values = Array2::<f64>::zeros((n, n));

        for (origin, mut row) in values.axis_iter_mut(Axis(0)).enumerate() {
            let mut pull = &gdp * &metric.row(origin);
            pull[origin] = 0.0;

            let total_pull = pull.sum();
            if !total_pull.is_finite() || total_pull <= 0.0 {
                return Err(NetworkError::DegenerateInput(format!(
                    "airport {origin} has a total relative pull of {total_pull}; \
                     at least two airports with positive GDP are required"
                )));
            }

            let mut adjusted = (pull / total_pull) / &distances.row(origin).mapv(|d| d + constant_km);
            adjusted[origin] = 0.0;

            row.assign(&(adjusted * nominal_totals[origin]));
        }

        debug!(airports = n, total = values.sum(), "estimated travel demand");
        Ok(DemandMatrix {
            values,
            nominal_totals,
        })
    }
}

fn check_square(context: &'static str, matrix: ArrayView2<f64>, n: usize) -> Result<()> {
    let (rows, cols) = matrix.dim();
    if rows != n {
        return Err(NetworkError::DimensionMismatch {
            context,
            expected: n,
            actual: rows,
        });
    }
    if cols != n {
        return Err(NetworkError::DimensionMismatch {
            context,
            expected: n,
            actual: cols,
        });
    }
    Ok(())
}
