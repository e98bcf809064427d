use ndarray::{Array2, Array3, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::data::shapes::DimensionError;

fn check_names(names: &[String], rows: usize) -> Result<(), DimensionError> {
    if names.len() != rows {
        return Err(DimensionError::NameCount {
            names: names.len(),
            rows,
        });
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(DimensionError::DuplicateName { name: name.clone() });
        }
    }
    Ok(())
}

/// Observation matrix: one named row per observed variable, one column per time point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observations {
    names: Vec<String>,
    values: Array2<f64>,
}

impl Observations {
    /// `values` is `nobs × ntimes`; `names` labels the rows
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, DimensionError> {
        check_names(&names, values.nrows())?;
        Ok(Observations { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nobs(&self) -> usize {
        self.values.nrows()
    }

    pub fn ntimes(&self) -> usize {
        self.values.ncols()
    }

    /// Observation vector at time index `k`
    #[inline]
    pub fn at_time(&self, k: usize) -> ArrayView1<'_, f64> {
        self.values.column(k)
    }
}

/// State array: state variables × replicates × time points
///
/// The replicate axis may be shorter than the working replicate count and is
/// then recycled by modular indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct States {
    names: Vec<String>,
    values: Array3<f64>,
}

impl States {
    /// `values` is `nvars × nrepsx × ntimes`; `names` labels the first axis
    pub fn new(names: Vec<String>, values: Array3<f64>) -> Result<Self, DimensionError> {
        check_names(&names, values.shape()[0])?;
        Ok(States { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn nvars(&self) -> usize {
        self.values.shape()[0]
    }

    pub fn nreps(&self) -> usize {
        self.values.shape()[1]
    }

    pub fn ntimes(&self) -> usize {
        self.values.shape()[2]
    }

    /// State slice for replicate `rep` at time index `k`
    #[inline]
    pub fn slice(&self, rep: usize, k: usize) -> ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![.., rep, k])
    }
}

/// Parameter matrix: one named row per parameter, one column per replicate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    names: Vec<String>,
    values: Array2<f64>,
}

impl Parameters {
    /// `values` is `npars × nrepsp`; `names` labels the rows
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, DimensionError> {
        check_names(&names, values.nrows())?;
        Ok(Parameters { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn npars(&self) -> usize {
        self.values.nrows()
    }

    pub fn nreps(&self) -> usize {
        self.values.ncols()
    }

    /// Parameter slice for replicate `rep`
    #[inline]
    pub fn slice(&self, rep: usize) -> ArrayView1<'_, f64> {
        self.values.column(rep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array3};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn observations_row_access() {
        let y = Observations::new(
            names(&["cases", "deaths"]),
            arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]),
        )
        .unwrap();
        assert_eq!(y.nobs(), 2);
        assert_eq!(y.ntimes(), 3);
        assert_eq!(y.at_time(1).to_vec(), vec![2.0, 5.0]);
    }

    #[test]
    fn name_count_mismatch_is_rejected() {
        let result = Observations::new(names(&["cases"]), arr2(&[[1.0], [2.0]]));
        assert!(matches!(result, Err(DimensionError::NameCount { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = Parameters::new(names(&["beta", "beta"]), arr2(&[[1.0], [2.0]]));
        assert!(matches!(result, Err(DimensionError::DuplicateName { .. })));
    }

    #[test]
    fn state_slice_selects_replicate_and_time() {
        // 2 vars, 2 reps, 2 times
        let mut values = Array3::zeros((2, 2, 2));
        values[[0, 1, 1]] = 7.0;
        values[[1, 1, 1]] = 8.0;
        let x = States::new(names(&["s", "i"]), values).unwrap();
        assert_eq!(x.slice(1, 1).to_vec(), vec![7.0, 8.0]);
    }
}
