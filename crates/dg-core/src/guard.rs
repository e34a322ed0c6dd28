//! Lock recovery and sink-call containment.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dg_telemetry::SinkError;

/// Lock `mutex`, taking the data even if a previous holder panicked.
pub fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run a sink call, turning a panic into `SinkError::Panicked`.
pub fn contain<F>(f: F) -> Result<(), SinkError>
where
    F: FnOnce() -> Result<(), SinkError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(SinkError::Panicked(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn contain_passes_results_through() {
        assert!(contain(|| Ok(())).is_ok());
        let err = contain(|| Err(SinkError::Rejected("no".into()))).unwrap_err();
        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn contain_catches_panics() {
        let err = contain(|| panic!("disk on fire")).unwrap_err();
        match err {
            SinkError::Panicked(msg) => assert_eq!(msg, "disk on fire"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let m = Arc::new(Mutex::new(1));
        let m2 = Arc::clone(&m);
        let _ = thread::spawn(move || {
            let _g = m2.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(m.is_poisoned());
        assert_eq!(*lock_or_recover(&m), 1);
    }
}
