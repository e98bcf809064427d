pub mod data;
pub mod error;
pub mod measure;
#[cfg(feature = "plugin")]
pub mod plugin;

pub use crate::data::covariate::{
    Covariate, CovariateError, CovariateLookup, CovariateTable, Interpolation,
};
pub use crate::data::shapes::{DimensionError, Layout};
pub use crate::data::structs::{Observations, Parameters, States};
pub use crate::measure::context::ContextError;
pub use crate::measure::frame::ArgFrame;
pub use crate::measure::result::DensityArray;
pub use crate::measure::userdata::userdata;
pub use crate::measure::{
    CancelToken, CompiledSpec, EvalError, InterpretedFn, InterpretedSpec, MeasureDecl,
    MeasureSpec, Mode, Model, UnitDensityFn,
};
pub use error::SpatdensError;
#[cfg(feature = "plugin")]
pub use plugin::*;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            Covariate, CovariateLookup, CovariateTable, DimensionError, Layout, Observations,
            Parameters, States,
        };
    }
    pub mod measure {
        pub use crate::measure::{
            result::DensityArray, userdata::userdata, CancelToken, CompiledSpec, InterpretedSpec,
            MeasureDecl, MeasureSpec, Mode, Model,
        };
    }

    pub use crate::measure::frame::ArgFrame;
    pub use crate::SpatdensError;

    /// Extract named argument values from an [`ArgFrame`] in an interpreted
    /// measurement callback.
    ///
    /// ```ignore
    /// use spatdens::prelude::*;
    /// let f = |frame: &ArgFrame| {
    ///     fetch_args!(frame, cases, rho, pop);
    ///     vec![/* density of cases given rho and pop */ 0.0]
    /// };
    /// ```
    #[macro_export]
    macro_rules! fetch_args {
        ($frame:expr, $($name:ident),* $(,)?) => {
            $(
                let $name = match $frame.get(stringify!($name)) {
                    Some(value) => value,
                    None => panic!("Argument {} not found", stringify!($name)),
                };
            )*
        };
    }
}
