use std::os::raw::c_int;
use thiserror::Error;

use crate::measure::frame::ArgFrame;
use crate::measure::{InterpretedFn, MeasureSpec, UnitDensityFn};

/// Errors raised while building the callback invocation context
#[derive(Error, Debug, Clone)]
pub enum ContextError {
    #[error("the name '{name}' is not among the {kind}")]
    UnknownName { kind: &'static str, name: String },
    #[error("duplicate argument name '{name}'")]
    DuplicateName { name: String },
    #[error("unrecognized measurement mode ({raw})")]
    UnrecognizedMode { raw: i32 },
}

/// The per-call invocation scaffold, one variant per evaluation mode
///
/// Each variant carries only what its code path needs: the interpreted path a
/// mutable named-argument frame, the compiled path the function pointer and
/// the four name-to-position index tables.
pub(crate) enum EvalContext<'a> {
    Interpreted {
        frame: ArgFrame,
        f: &'a InterpretedFn,
        bind_unit: bool,
    },
    Compiled {
        f: UnitDensityFn,
        oidx: Vec<c_int>,
        sidx: Vec<c_int>,
        pidx: Vec<c_int>,
        cidx: Vec<c_int>,
    },
    Undefined,
}

/// Map declared names onto positions in the caller's row order
fn name_index(
    declared: &[String],
    available: &[String],
    kind: &'static str,
) -> Result<Vec<c_int>, ContextError> {
    declared
        .iter()
        .map(|name| {
            available
                .iter()
                .position(|a| a == name)
                .map(|i| i as c_int)
                .ok_or_else(|| ContextError::UnknownName {
                    kind,
                    name: name.clone(),
                })
        })
        .collect()
}

/// Build the invocation context for one evaluation call
pub(crate) fn build<'a>(
    spec: &'a MeasureSpec,
    onames: &[String],
    snames: &[String],
    pnames: &[String],
    cnames: &[String],
    log_scale: bool,
) -> Result<EvalContext<'a>, ContextError> {
    match spec {
        MeasureSpec::Unspecified => Ok(EvalContext::Undefined),
        MeasureSpec::Interpreted(spec) => Ok(EvalContext::Interpreted {
            frame: ArgFrame::new(onames, snames, pnames, cnames, log_scale)?,
            f: spec.callback(),
            bind_unit: spec.bind_unit(),
        }),
        MeasureSpec::Compiled(spec) => Ok(EvalContext::Compiled {
            f: spec.callback(),
            oidx: name_index(spec.decl().observables(), onames, "observables")?,
            sidx: name_index(spec.decl().states(), snames, "state variables")?,
            pidx: name_index(spec.decl().parameters(), pnames, "parameters")?,
            cidx: name_index(spec.decl().covariates(), cnames, "covariates")?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{CompiledSpec, MeasureDecl};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    unsafe extern "C" fn noop(
        _f: *mut f64,
        _y: *const f64,
        _x: *const f64,
        _p: *const f64,
        _give_log: c_int,
        _oidx: *const c_int,
        _sidx: *const c_int,
        _pidx: *const c_int,
        _cidx: *const c_int,
        _ncovars: c_int,
        _cov: *const f64,
        _t: f64,
        _unit: c_int,
    ) {
    }

    #[test]
    fn index_tables_follow_declared_order() {
        let decl = MeasureDecl::new(
            names(&["cases"]),
            names(&["i", "s"]), // declared out of storage order
            names(&["beta"]),
            names(&[]),
        );
        let spec = MeasureSpec::Compiled(CompiledSpec::new(noop, decl));

        let context = build(
            &spec,
            &names(&["cases"]),
            &names(&["s", "i", "r"]),
            &names(&["beta", "gamma"]),
            &names(&[]),
            false,
        )
        .unwrap();

        match context {
            EvalContext::Compiled {
                oidx, sidx, pidx, ..
            } => {
                assert_eq!(oidx, vec![0]);
                assert_eq!(sidx, vec![1, 0]);
                assert_eq!(pidx, vec![0]);
            }
            _ => panic!("expected compiled context"),
        }
    }

    #[test]
    fn unknown_declared_name_fails() {
        let decl = MeasureDecl::new(names(&["cases"]), names(&["z"]), names(&[]), names(&[]));
        let spec = MeasureSpec::Compiled(CompiledSpec::new(noop, decl));

        let result = build(
            &spec,
            &names(&["cases"]),
            &names(&["s", "i"]),
            &names(&[]),
            &names(&[]),
            false,
        );
        assert!(matches!(
            result,
            Err(ContextError::UnknownName {
                kind: "state variables",
                ..
            })
        ));
    }

    #[test]
    fn unspecified_mode_builds_an_undefined_context() {
        let context = build(
            &MeasureSpec::Unspecified,
            &names(&[]),
            &names(&[]),
            &names(&[]),
            &names(&[]),
            false,
        )
        .unwrap();
        assert!(matches!(context, EvalContext::Undefined));
    }
}
