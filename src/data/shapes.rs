use thiserror::Error;

use crate::data::structs::{Observations, Parameters, States};

/// Shape and length mismatches; always fatal to the call
#[derive(Error, Debug, Clone)]
pub enum DimensionError {
    #[error("length('times') = 0, no work to do")]
    NoTimes,
    #[error("length of 'times' ({ntimes}) and the time axis of '{what}' ({got}) do not agree")]
    TimeAxisMismatch {
        what: &'static str,
        ntimes: usize,
        got: usize,
    },
    #[error("larger number of replicates ({nreps}) is not a multiple of smaller (states: {nrepsx}, parameters: {nrepsp})")]
    ReplicateMismatch {
        nreps: usize,
        nrepsx: usize,
        nrepsp: usize,
    },
    #[error("{names} names supplied for {rows} rows")]
    NameCount { names: usize, rows: usize },
    #[error("duplicate name '{name}'")]
    DuplicateName { name: String },
    #[error("'units' is empty but the measurement callback consumes a unit")]
    EmptyUnits,
}

/// Resolved dimensions of one evaluation call
///
/// Derived once per call from the observation, state and parameter arrays and
/// the time vector, after which every count is trusted by the evaluation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub ntimes: usize,
    pub nobs: usize,
    pub nvars: usize,
    pub npars: usize,
    pub nrepsx: usize,
    pub nrepsp: usize,
    /// Working replicate count, `max(nrepsx, nrepsp)`
    pub nreps: usize,
}

impl Layout {
    /// Validate input shapes and derive the working replicate count
    ///
    /// The larger of the two replicate counts must be an exact multiple of the
    /// smaller; anything else is an error, never a silent truncation.
    pub fn resolve(
        y: &Observations,
        x: &States,
        params: &Parameters,
        times: &[f64],
    ) -> Result<Self, DimensionError> {
        let ntimes = times.len();
        if ntimes < 1 {
            return Err(DimensionError::NoTimes);
        }

        if y.ntimes() != ntimes {
            return Err(DimensionError::TimeAxisMismatch {
                what: "y",
                ntimes,
                got: y.ntimes(),
            });
        }

        if x.ntimes() != ntimes {
            return Err(DimensionError::TimeAxisMismatch {
                what: "x",
                ntimes,
                got: x.ntimes(),
            });
        }

        let nrepsx = x.nreps();
        let nrepsp = params.nreps();
        let nreps = nrepsx.max(nrepsp);

        if nrepsx == 0 || nrepsp == 0 || nreps % nrepsx != 0 || nreps % nrepsp != 0 {
            return Err(DimensionError::ReplicateMismatch {
                nreps,
                nrepsx,
                nrepsp,
            });
        }

        Ok(Layout {
            ntimes,
            nobs: y.nobs(),
            nvars: x.nvars(),
            npars: params.npars(),
            nrepsx,
            nrepsp,
            nreps,
        })
    }
}
