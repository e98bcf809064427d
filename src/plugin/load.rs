use libloading::{Library, Symbol};
use std::os::raw::{c_int, c_void};
use std::path::PathBuf;
use thiserror::Error;

use crate::measure::context::ContextError;
use crate::measure::{CompiledSpec, MeasureDecl, Mode, UnitDensityFn};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("failed to load plugin library: {0}")]
    Library(#[from] libloading::Error),
    #[error("{0}")]
    Mode(#[from] ContextError),
    #[error("plugin declares mode {0:?}, expected a compiled callback")]
    NotCompiled(Mode),
}

/// Load a compiled measurement callback and its declaration from a library.
///
/// # Safety
///
/// This function is unsafe because:
/// - It involves FFI calls and raw pointer manipulation.
/// - The returned `CompiledSpec` holds a function pointer into the library
///   and becomes invalid if the `Library` is dropped. The caller must keep
///   the `Library` alive as long as the spec is in use.
///
/// # Arguments
///
/// * `model_path` - Path to the compiled plugin library file.
///
/// # Returns
///
/// A tuple of the `Library` and the `CompiledSpec` resolved from it. The
/// `Library` must outlive the spec.
pub unsafe fn load(model_path: PathBuf) -> Result<(Library, CompiledSpec), PluginError> {
    let lib = unsafe { Library::new(model_path)? };

    let raw_mode: Symbol<unsafe extern "C" fn() -> c_int> = unsafe { lib.get(b"measure_mode")? };
    let mode = Mode::from_raw(unsafe { raw_mode() })?;
    if mode != Mode::Compiled {
        return Err(PluginError::NotCompiled(mode));
    }

    let decl_ptr: Symbol<unsafe extern "C" fn() -> *mut c_void> =
        unsafe { lib.get(b"measure_decl_ptr")? };
    let decl = unsafe { (*(decl_ptr() as *mut MeasureDecl)).clone() };

    let f: UnitDensityFn = unsafe { *lib.get::<UnitDensityFn>(b"unit_density")? };

    Ok((lib, CompiledSpec::new(f, decl)))
}
