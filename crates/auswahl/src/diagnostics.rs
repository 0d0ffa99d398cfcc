//! Scoped suppression of non-fatal diagnostic output.
//!
//! Estimators report recoverable problems (e.g. clamped component counts)
//! through `log::warn!`. While thousands of submodels are evaluated these
//! messages are noise, so the evaluator silences everything below `Error`
//! for the duration of a batch.
use std::sync::{Mutex, MutexGuard};

use log::LevelFilter;

struct Scope {
    depth: usize,
    saved: LevelFilter,
}

// The log level is process-global, so all guards share one scope. The level
// is saved when the first guard opens it and restored when the last one closes.
static SCOPE: Mutex<Scope> = Mutex::new(Scope {
    depth: 0,
    saved: LevelFilter::Off,
});

fn scope() -> MutexGuard<'static, Scope> {
    SCOPE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Guard lowering the global `log` level to `Error` until it is dropped.
///
/// Guards may overlap across threads and be dropped in any order; the level
/// in effect before the first of them is restored once the last one is
/// dropped, including during unwinding.
#[must_use = "diagnostics are only suppressed while the guard is alive"]
pub struct QuietDiagnostics {
    _private: (),
}

impl QuietDiagnostics {
    pub fn new() -> Self {
        let mut scope = scope();
        if scope.depth == 0 {
            scope.saved = log::max_level();
            if scope.saved > LevelFilter::Error {
                log::set_max_level(LevelFilter::Error);
            }
        }
        scope.depth += 1;
        QuietDiagnostics { _private: () }
    }
}

impl Default for QuietDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QuietDiagnostics {
    fn drop(&mut self) {
        let mut scope = scope();
        scope.depth = scope.depth.saturating_sub(1);
        if scope.depth == 0 {
            log::set_max_level(scope.saved);
        }
    }
}

/// Run `f` with non-fatal diagnostics suppressed.
pub fn suppress_warnings<T>(f: impl FnOnce() -> T) -> T {
    let _guard = QuietDiagnostics::new();
    f()
}
