use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static USERDATA: RefCell<Option<Arc<dyn Any + Send + Sync>>> = const { RefCell::new(None) };
}

/// Scoped installation of the opaque per-call userdata
///
/// Installed before the compiled evaluation loop starts and released when the
/// guard drops, which happens on every exit path including early errors.
pub(crate) struct UserdataGuard(());

impl UserdataGuard {
    pub(crate) fn install(data: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        USERDATA.with(|slot| *slot.borrow_mut() = data);
        UserdataGuard(())
    }
}

impl Drop for UserdataGuard {
    fn drop(&mut self) {
        USERDATA.with(|slot| slot.borrow_mut().take());
    }
}

/// Fetch the userdata installed for the current evaluation call
///
/// Available to compiled callbacks for auxiliary read-only context that the
/// fixed positional arguments cannot express. Returns `None` outside an
/// evaluation call, or when the installed value is not a `T`.
pub fn userdata<T: Any + Send + Sync>() -> Option<Arc<T>> {
    USERDATA.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|data| Arc::clone(data).downcast::<T>().ok())
    })
}
