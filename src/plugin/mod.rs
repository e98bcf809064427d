//! The `plugin` module loads compiled measurement callbacks from shared
//! libraries built as Rust `cdylib`s.
//!
//! A plugin exports three symbols: `measure_mode` (a raw mode discriminant),
//! `measure_decl_ptr` (a pointer to its [`crate::MeasureDecl`]) and
//! `unit_density` (the callback itself, with the fixed calling convention of
//! [`crate::UnitDensityFn`]).

pub mod load;

pub use load::{load, PluginError};
