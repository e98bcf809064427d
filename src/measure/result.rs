use ndarray::Array2;
use serde::Serialize;

/// Two-axis density result: replicates × time points
///
/// Freshly allocated per call and owned by the caller after return. The axes
/// are labeled `"rep"` and `"time"`; values are exactly what the evaluation
/// loop wrote, NaN standing for an undefined density.
#[derive(Debug, Clone, Serialize)]
pub struct DensityArray {
    values: Array2<f64>,
    axes: [&'static str; 2],
}

impl DensityArray {
    pub(crate) fn filled(nreps: usize, ntimes: usize, fill: f64) -> Self {
        DensityArray {
            values: Array2::from_elem((nreps, ntimes), fill),
            axes: ["rep", "time"],
        }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    pub fn axis_names(&self) -> [&'static str; 2] {
        self.axes
    }

    pub fn nreps(&self) -> usize {
        self.values.nrows()
    }

    pub fn ntimes(&self) -> usize {
        self.values.ncols()
    }

    /// Density for replicate `rep` at time index `k`
    #[inline]
    pub fn get(&self, rep: usize, k: usize) -> f64 {
        self.values[[rep, k]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_axis_labels() {
        let result = DensityArray::filled(4, 3, f64::NAN);
        assert_eq!(result.nreps(), 4);
        assert_eq!(result.ntimes(), 3);
        assert_eq!(result.axis_names(), ["rep", "time"]);
        assert!(result.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn serializes_with_axis_labels() {
        let result = DensityArray::filled(1, 2, 0.5);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["axes"], serde_json::json!(["rep", "time"]));
        assert_eq!(json["values"]["dim"], serde_json::json!([1, 2]));
    }
}
