pub mod context;
mod eval;
pub mod frame;
pub mod result;
pub mod userdata;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::data::{CovariateLookup, CovariateTable, Observations, Parameters, States};
use crate::error::SpatdensError;
use crate::measure::context::ContextError;
use crate::measure::frame::ArgFrame;
use crate::measure::result::DensityArray;

pub use eval::EvalError;

/// Interpreted measurement callback
///
/// Receives the bound argument frame and returns the density values it
/// computed. The contract is a single scalar; the returned length is checked
/// on the very first invocation of a call and trusted afterwards.
pub type InterpretedFn = Box<dyn Fn(&ArgFrame) -> Vec<f64> + Send + Sync>;

/// Compiled measurement callback with the fixed native calling convention
///
/// Writes one scalar density (or log-density, per `give_log`) through `f`.
/// The index tables translate the positions declared by the callback's
/// specification into the caller's row order; `cov` holds the `ncovars`
/// interpolated covariates at `t`. This argument order is the public ABI and
/// is stable across all compiled user models.
pub type UnitDensityFn = unsafe extern "C" fn(
    f: *mut f64,
    y: *const f64,
    x: *const f64,
    p: *const f64,
    give_log: c_int,
    oidx: *const c_int,
    sidx: *const c_int,
    pidx: *const c_int,
    cidx: *const c_int,
    ncovars: c_int,
    cov: *const f64,
    t: f64,
    unit: c_int,
);

/// Resolved evaluation mode of a measurement specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Unspecified,
    Interpreted,
    Compiled,
}

impl Mode {
    /// Decode a raw mode discriminant, e.g. one read from a plugin library
    pub fn from_raw(raw: i32) -> Result<Self, ContextError> {
        match raw {
            0 => Ok(Mode::Unspecified),
            1 => Ok(Mode::Interpreted),
            2 => Ok(Mode::Compiled),
            raw => Err(ContextError::UnrecognizedMode { raw }),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Mode::Unspecified => 0,
            Mode::Interpreted => 1,
            Mode::Compiled => 2,
        }
    }
}

/// Names a compiled callback declares for its observation, state, parameter
/// and covariate arguments, in the positional order its code expects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasureDecl {
    observables: Vec<String>,
    states: Vec<String>,
    parameters: Vec<String>,
    covariates: Vec<String>,
}

impl MeasureDecl {
    pub fn new(
        observables: Vec<String>,
        states: Vec<String>,
        parameters: Vec<String>,
        covariates: Vec<String>,
    ) -> Self {
        MeasureDecl {
            observables,
            states,
            parameters,
            covariates,
        }
    }

    pub fn observables(&self) -> &[String] {
        &self.observables
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn covariates(&self) -> &[String] {
        &self.covariates
    }
}

/// Interpreted measurement specification
pub struct InterpretedSpec {
    f: InterpretedFn,
    bind_unit: bool,
}

impl InterpretedSpec {
    pub fn new(f: InterpretedFn) -> Self {
        InterpretedSpec { f, bind_unit: true }
    }

    /// Whether the `unit` slot of the argument frame is filled with the
    /// evaluated unit identifier; when disabled the slot holds NaN. Kept
    /// configurable because historical engines disagreed on it.
    pub fn bind_unit(&self) -> bool {
        self.bind_unit
    }

    pub fn with_bind_unit(mut self, bind_unit: bool) -> Self {
        self.bind_unit = bind_unit;
        self
    }

    pub(crate) fn callback(&self) -> &InterpretedFn {
        &self.f
    }
}

/// Compiled measurement specification: callback plus declared names
#[derive(Clone)]
pub struct CompiledSpec {
    f: UnitDensityFn,
    decl: MeasureDecl,
}

impl std::fmt::Debug for CompiledSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSpec")
            .field("f", &(self.f as *const ()))
            .field("decl", &self.decl)
            .finish()
    }
}

impl CompiledSpec {
    pub fn new(f: UnitDensityFn, decl: MeasureDecl) -> Self {
        CompiledSpec { f, decl }
    }

    pub fn decl(&self) -> &MeasureDecl {
        &self.decl
    }

    pub(crate) fn callback(&self) -> UnitDensityFn {
        self.f
    }
}

/// The model's stored measurement-density specification
///
/// Resolved once per call; the variant selects which of the two code paths
/// executes for the entire call. `Unspecified` is a legal terminal state that
/// yields an all-NaN result with a warning rather than an error.
pub enum MeasureSpec {
    Unspecified,
    Interpreted(InterpretedSpec),
    Compiled(CompiledSpec),
}

impl MeasureSpec {
    pub fn mode(&self) -> Mode {
        match self {
            MeasureSpec::Unspecified => Mode::Unspecified,
            MeasureSpec::Interpreted(_) => Mode::Interpreted,
            MeasureSpec::Compiled(_) => Mode::Compiled,
        }
    }
}

/// Cooperative cancellation handle, polled once per time step
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A spatiotemporal state-space model, reduced to what the measurement
/// density engine needs: the measurement specification, the covariate table,
/// optional opaque userdata and an optional cancellation token
pub struct Model<C: CovariateLookup = CovariateTable> {
    measure: MeasureSpec,
    covariates: C,
    userdata: Option<Arc<dyn Any + Send + Sync>>,
    cancel: Option<CancelToken>,
}

impl<C: CovariateLookup> Model<C> {
    pub fn new(measure: MeasureSpec, covariates: C) -> Self {
        Model {
            measure,
            covariates,
            userdata: None,
            cancel: None,
        }
    }

    /// Attach opaque read-only context made available to compiled callbacks
    /// through [`userdata::userdata`] for the duration of each call
    pub fn with_userdata(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.userdata = Some(data);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn measure(&self) -> &MeasureSpec {
        &self.measure
    }

    pub fn covariates(&self) -> &C {
        &self.covariates
    }

    pub(crate) fn userdata_cloned(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.userdata.clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Evaluate the unit-level measurement density
    ///
    /// Returns the `nreps × ntimes` density array, where
    /// `nreps = max(nrepsx, nrepsp)` and the state and parameter replicate
    /// axes are recycled by modular indexing. `units` supplies the evaluated
    /// unit identifier; the compiled path consumes its first element. Fatal
    /// errors abort the call with no partial output.
    pub fn evaluate_unit_density(
        &self,
        y: &Observations,
        x: &States,
        times: &[f64],
        units: &[i32],
        params: &Parameters,
        log_scale: bool,
    ) -> Result<DensityArray, SpatdensError> {
        eval::evaluate(self, y, x, times, units, params, log_scale)
    }
}
