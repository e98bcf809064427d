use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for covariate operations
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CovariateError {
    #[error("Observation already exists at time {time}")]
    ObservationExists { time: f64 },
    #[error("Covariate build required")]
    BuildRequired,
    #[error("No segments available for interpolation")]
    MissingSegments,
    #[error("Output buffer holds {buffer} values but the table has {ncovars} covariates")]
    BufferLength { buffer: usize, ncovars: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CovariateObservation {
    time: f64,
    value: f64,
}

/// Method used to interpolate covariate values between observations
#[derive(Serialize, Clone, Debug, Deserialize)]
pub enum Interpolation {
    /// Linear interpolation between two points with slope and intercept
    Linear { slope: f64, intercept: f64 },
    /// Constant value carried forward
    CarryForward { value: f64 },
}

/// A segment of a piecewise interpolation function for a covariate
#[derive(Serialize, Clone, Debug, Deserialize)]
struct CovariateSegment {
    from: f64,
    to: f64,
    method: Interpolation,
}

impl CovariateSegment {
    #[inline]
    fn interpolate(&self, time: f64) -> Option<f64> {
        if !self.in_interval(time) {
            return None;
        }

        match self.method {
            Interpolation::Linear { slope, intercept } => Some(slope * time + intercept),
            Interpolation::CarryForward { value } => Some(value),
        }
    }

    #[inline]
    fn in_interval(&self, time: f64) -> bool {
        self.from <= time && time < self.to
    }
}

/// A single time-varying covariate: raw observations plus interpolation segments
///
/// Segments are rebuilt lazily after observations change. A `fixed` covariate
/// always uses carry-forward interpolation.
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Covariate {
    name: String,
    observations: Vec<CovariateObservation>,
    segments: Vec<CovariateSegment>,
    segments_dirty: bool,
    fixed: bool,
}

impl Covariate {
    pub fn new(name: impl Into<String>, fixed: bool) -> Self {
        Covariate {
            name: name.into(),
            observations: Vec::new(),
            segments: Vec::new(),
            segments_dirty: false,
            fixed,
        }
    }

    /// Add a raw observation at `time`
    pub fn add_observation(&mut self, time: f64, value: f64) -> Result<(), CovariateError> {
        if self.observations.iter().any(|obs| obs.time == time) {
            return Err(CovariateError::ObservationExists { time });
        }

        self.observations.push(CovariateObservation { time, value });
        self.segments_dirty = true;
        Ok(())
    }

    fn build_segments(&mut self) {
        self.segments.clear();

        if self.observations.is_empty() {
            self.segments_dirty = false;
            return;
        }

        self.observations
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());

        for i in 0..self.observations.len() {
            let current = self.observations[i].clone();
            let next = self.observations.get(i + 1).cloned();
            let to_time = next.as_ref().map_or(f64::INFINITY, |next| next.time);

            if self.fixed {
                self.segments.push(CovariateSegment {
                    from: current.time,
                    to: to_time,
                    method: Interpolation::CarryForward {
                        value: current.value,
                    },
                });
            } else if let Some(next) = next {
                let slope = (next.value - current.value) / (next.time - current.time);
                self.segments.push(CovariateSegment {
                    from: current.time,
                    to: next.time,
                    method: Interpolation::Linear {
                        slope,
                        intercept: current.value - slope * current.time,
                    },
                });
            }
        }
        self.segments_dirty = false;
    }

    fn build(&mut self) {
        if self.segments_dirty {
            self.build_segments();
        }
    }

    /// Interpolate the covariate value at `time`
    ///
    /// Times before the first observation carry the first value backwards;
    /// times at or after the last observation carry the last value forward.
    #[inline]
    pub fn interpolate(&self, time: f64) -> Result<f64, CovariateError> {
        if self.segments_dirty {
            return Err(CovariateError::BuildRequired);
        }

        if let Some(value) = self
            .segments
            .iter()
            .find(|segment| segment.in_interval(time))
            .and_then(|segment| segment.interpolate(time))
        {
            return Ok(value);
        }

        if let Some(first) = self.observations.first() {
            if time < first.time {
                return Ok(first.value);
            }
        }
        if let Some(last) = self.observations.last() {
            if time >= last.time {
                return Ok(last.value);
            }
        }

        Err(CovariateError::MissingSegments)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixed(&self) -> bool {
        self.fixed
    }
}

impl fmt::Display for Covariate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Covariate '{}':", self.name)?;
        for (index, segment) in self.segments.iter().enumerate() {
            write!(
                f,
                "  Segment {}: from {:.2} to {:.2}, ",
                index + 1,
                segment.from,
                segment.to
            )?;
            match &segment.method {
                Interpolation::Linear { slope, intercept } => {
                    writeln!(
                        f,
                        "Linear, Slope: {:.2}, Intercept: {:.2}",
                        slope, intercept
                    )
                }
                Interpolation::CarryForward { value } => {
                    writeln!(f, "Carry Forward, Value: {:.2}", value)
                }
            }?;
        }
        Ok(())
    }
}

/// Query contract of a time-indexed covariate lookup table
///
/// This is all the evaluation engine sees of covariates: a count fixing the
/// buffer layout, ordered names, and a lookup writing the covariate vector
/// valid at a time into a caller-owned buffer, pure in `(table, time)`.
pub trait CovariateLookup {
    fn ncovars(&self) -> usize;
    fn names(&self) -> Vec<&str>;
    fn interpolate_into(&self, time: f64, out: &mut [f64]) -> Result<(), CovariateError>;
}

/// An ordered, time-indexed covariate lookup table
///
/// The evaluation engine only queries the table: [`CovariateTable::ncovars`],
/// [`CovariateTable::names`] and [`CovariateTable::interpolate_into`], which
/// fills a caller-owned buffer with the covariate vector valid at a given
/// time. Covariate order is insertion order and fixes the buffer layout.
#[derive(Serialize, Clone, Debug, Deserialize, Default)]
pub struct CovariateTable {
    covariates: Vec<Covariate>,
}

impl CovariateTable {
    pub fn new() -> Self {
        CovariateTable {
            covariates: Vec::new(),
        }
    }

    /// Rebuild all interpolation segments; must be called after the last
    /// observation is added and before the table is queried.
    pub fn build(&mut self) {
        for covariate in &mut self.covariates {
            covariate.build();
        }
    }

    /// Add an observation, creating the covariate if it does not exist yet
    pub fn add_observation(
        &mut self,
        name: &str,
        time: f64,
        value: f64,
    ) -> Result<(), CovariateError> {
        if let Some(covariate) = self.covariates.iter_mut().find(|c| c.name() == name) {
            covariate.add_observation(time, value)
        } else {
            let mut covariate = Covariate::new(name, false);
            covariate.add_observation(time, value)?;
            self.covariates.push(covariate);
            Ok(())
        }
    }

    /// Set a covariate to carry-forward interpolation
    pub fn set_fixed(&mut self, name: &str, fixed: bool) -> bool {
        if let Some(covariate) = self.covariates.iter_mut().find(|c| c.name() == name) {
            covariate.fixed = fixed;
            covariate.segments_dirty = true;
            true
        } else {
            false
        }
    }

    pub fn get_covariate(&self, name: &str) -> Option<&Covariate> {
        self.covariates.iter().find(|c| c.name() == name)
    }
}

impl CovariateLookup for CovariateTable {
    /// Number of covariates, and therefore the required query buffer length
    fn ncovars(&self) -> usize {
        self.covariates.len()
    }

    /// Covariate names, in buffer order
    fn names(&self) -> Vec<&str> {
        self.covariates.iter().map(|c| c.name()).collect()
    }

    /// Write the covariate vector valid at `time` into `out`
    ///
    /// The buffer length must equal [`CovariateLookup::ncovars`].
    #[inline]
    fn interpolate_into(&self, time: f64, out: &mut [f64]) -> Result<(), CovariateError> {
        if out.len() != self.covariates.len() {
            return Err(CovariateError::BufferLength {
                buffer: out.len(),
                ncovars: self.covariates.len(),
            });
        }
        for (slot, covariate) in out.iter_mut().zip(&self.covariates) {
            *slot = covariate.interpolate(time)?;
        }
        Ok(())
    }
}

impl fmt::Display for CovariateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Covariates:")?;
        for covariate in &self.covariates {
            writeln!(f, "{}", covariate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_interpolation_between_observations() {
        let mut table = CovariateTable::new();
        table.add_observation("weight", 0.0, 70.0).unwrap();
        table.add_observation("weight", 12.0, 72.0).unwrap();
        table.add_observation("weight", 24.0, 75.0).unwrap();
        table.build();

        let weight = table.get_covariate("weight").unwrap();
        assert_eq!(weight.interpolate(0.0).unwrap(), 70.0);
        assert_eq!(weight.interpolate(6.0).unwrap(), 71.0);
        assert_eq!(weight.interpolate(18.0).unwrap(), 73.5);
        assert_eq!(weight.interpolate(30.0).unwrap(), 75.0); // carried forward
    }

    #[test]
    fn fixed_covariate_carries_forward() {
        let mut table = CovariateTable::new();
        table.add_observation("age", 0.0, 35.0).unwrap();
        table.set_fixed("age", true);
        table.build();

        let age = table.get_covariate("age").unwrap();
        assert_eq!(age.interpolate(0.0).unwrap(), 35.0);
        assert_eq!(age.interpolate(100.0).unwrap(), 35.0);
    }

    #[test]
    fn interpolate_before_first_observation_carries_backwards() {
        let mut table = CovariateTable::new();
        table.add_observation("temp", 5.0, 20.0).unwrap();
        table.add_observation("temp", 10.0, 30.0).unwrap();
        table.build();

        let temp = table.get_covariate("temp").unwrap();
        assert_eq!(temp.interpolate(0.0).unwrap(), 20.0);
    }

    #[test]
    fn duplicate_observation_time_is_rejected() {
        let mut table = CovariateTable::new();
        table.add_observation("weight", 0.0, 70.0).unwrap();
        assert!(matches!(
            table.add_observation("weight", 0.0, 71.0),
            Err(CovariateError::ObservationExists { .. })
        ));
    }

    #[test]
    fn interpolate_into_fills_buffer_in_table_order() {
        let mut table = CovariateTable::new();
        table.add_observation("a", 0.0, 1.0).unwrap();
        table.add_observation("a", 10.0, 2.0).unwrap();
        table.add_observation("b", 0.0, 100.0).unwrap();
        table.build();

        let mut buf = [0.0; 2];
        table.interpolate_into(5.0, &mut buf).unwrap();
        assert_eq!(buf, [1.5, 100.0]);
    }

    #[test]
    fn interpolate_into_rejects_wrong_buffer_length() {
        let mut table = CovariateTable::new();
        table.add_observation("a", 0.0, 1.0).unwrap();
        table.build();

        let mut buf = [0.0; 3];
        assert!(matches!(
            table.interpolate_into(0.0, &mut buf),
            Err(CovariateError::BufferLength { .. })
        ));
    }

    #[test]
    fn querying_a_dirty_covariate_fails() {
        let mut table = CovariateTable::new();
        table.add_observation("a", 0.0, 1.0).unwrap();
        table.add_observation("a", 1.0, 2.0).unwrap();

        let mut buf = [0.0; 1];
        assert!(matches!(
            table.interpolate_into(0.5, &mut buf),
            Err(CovariateError::BuildRequired)
        ));
    }
}
