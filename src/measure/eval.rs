use std::os::raw::c_int;
use thiserror::Error;

use crate::data::{CovariateLookup, DimensionError, Layout, Observations, Parameters, States};
use crate::error::SpatdensError;
use crate::measure::context::{self, EvalContext};
use crate::measure::result::DensityArray;
use crate::measure::userdata::UserdataGuard;
use crate::measure::Model;

/// Errors raised inside the evaluation loop
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("measurement callback returns a vector of length {len} when it should return a scalar")]
    NonScalarReturn { len: usize },
    #[error("evaluation interrupted")]
    Interrupted,
}

/// The density evaluation engine: validate, build the context, run the
/// double loop over time points and replicates, fill the result array
pub(crate) fn evaluate<C: CovariateLookup>(
    model: &Model<C>,
    y: &Observations,
    x: &States,
    times: &[f64],
    units: &[i32],
    params: &Parameters,
    log_scale: bool,
) -> Result<DensityArray, SpatdensError> {
    let layout = Layout::resolve(y, x, params, times)?;

    let cnames: Vec<String> = model
        .covariates()
        .names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let context = context::build(
        model.measure(),
        y.names(),
        x.names(),
        params.names(),
        &cnames,
        log_scale,
    )?;

    tracing::trace!(
        ntimes = layout.ntimes,
        nreps = layout.nreps,
        mode = ?model.measure().mode(),
        "evaluating unit measurement density"
    );

    let mut result = DensityArray::filled(layout.nreps, layout.ntimes, f64::NAN);
    let mut cov = vec![0.0; model.covariates().ncovars()];

    match context {
        EvalContext::Undefined => {
            tracing::warn!("measurement density unspecified: likelihood undefined");
            Ok(result)
        }

        EvalContext::Interpreted {
            mut frame,
            f,
            bind_unit,
        } => {
            let unit = if bind_unit {
                let unit = units.first().ok_or(DimensionError::EmptyUnits)?;
                Some(f64::from(*unit))
            } else {
                None
            };

            let mut first = true;
            for (k, &t) in times.iter().enumerate() {
                if model.is_cancelled() {
                    return Err(EvalError::Interrupted.into());
                }
                model.covariates().interpolate_into(t, &mut cov)?;
                let ys = y.at_time(k);

                for j in 0..layout.nreps {
                    frame.bind(
                        t,
                        ys,
                        x.slice(j % layout.nrepsx, k),
                        unit,
                        params.slice(j % layout.nrepsp),
                        &cov,
                    );
                    let ans = f(&frame);
                    if first {
                        if ans.len() != 1 {
                            return Err(EvalError::NonScalarReturn { len: ans.len() }.into());
                        }
                        first = false;
                    }
                    // arity already validated; assumed stable across the call
                    result.values_mut()[[j, k]] = ans[0];
                }
            }
            Ok(result)
        }

        EvalContext::Compiled {
            f,
            oidx,
            sidx,
            pidx,
            cidx,
        } => {
            let unit = *units.first().ok_or(DimensionError::EmptyUnits)?;
            let give_log = c_int::from(log_scale);
            let ncovars = cov.len() as c_int;

            // contiguous scratch copies; row slices of the input arrays are
            // strided and cannot be handed to the callback directly
            let mut ybuf = vec![0.0; layout.nobs];
            let mut xbuf = vec![0.0; layout.nvars];
            let mut pbuf = vec![0.0; layout.npars];

            let _guard = UserdataGuard::install(model.userdata_cloned());

            for (k, &t) in times.iter().enumerate() {
                if model.is_cancelled() {
                    return Err(EvalError::Interrupted.into());
                }
                model.covariates().interpolate_into(t, &mut cov)?;
                for (slot, value) in ybuf.iter_mut().zip(y.at_time(k).iter()) {
                    *slot = *value;
                }

                for j in 0..layout.nreps {
                    for (slot, value) in xbuf.iter_mut().zip(x.slice(j % layout.nrepsx, k).iter())
                    {
                        *slot = *value;
                    }
                    for (slot, value) in pbuf.iter_mut().zip(params.slice(j % layout.nrepsp).iter())
                    {
                        *slot = *value;
                    }

                    let mut density = f64::NAN;
                    unsafe {
                        f(
                            &mut density,
                            ybuf.as_ptr(),
                            xbuf.as_ptr(),
                            pbuf.as_ptr(),
                            give_log,
                            oidx.as_ptr(),
                            sidx.as_ptr(),
                            pidx.as_ptr(),
                            cidx.as_ptr(),
                            ncovars,
                            cov.as_ptr(),
                            t,
                            unit,
                        )
                    };
                    result.values_mut()[[j, k]] = density;
                }
            }
            Ok(result)
        }
    }
}
