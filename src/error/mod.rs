use thiserror::Error;

use crate::data::covariate::CovariateError;
use crate::data::shapes::DimensionError;
use crate::measure::context::ContextError;
use crate::measure::EvalError;

#[derive(Error, Debug)]
pub enum SpatdensError {
    #[error("Error in the input dimensions: {0}")]
    DimensionError(#[from] DimensionError),
    #[error("Error in the covariate table: {0}")]
    CovariateError(#[from] CovariateError),
    #[error("Error in the callback context: {0}")]
    ContextError(#[from] ContextError),
    #[error("Error in the evaluation loop: {0}")]
    EvalError(#[from] EvalError),
}
