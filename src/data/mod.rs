pub mod covariate;
pub mod shapes;
pub mod structs;

pub use covariate::{Covariate, CovariateError, CovariateLookup, CovariateTable, Interpolation};
pub use shapes::{DimensionError, Layout};
pub use structs::{Observations, Parameters, States};
