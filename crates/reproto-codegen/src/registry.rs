//! Registry for code generation backends.

use crate::traits::Backend;
use std::sync::{OnceLock, RwLock};

/// Global registry of backends.
static BACKENDS: RwLock<Vec<&'static dyn Backend>> = RwLock::new(Vec::new());
static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom backend.
///
/// Built-in backends are registered automatically on first use.
pub fn register_backend(backend: &'static dyn Backend) {
    init_builtin();
    BACKENDS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .push(backend);
}

/// Initialize built-in backends (called automatically on first use).
fn init_builtin() {
    INITIALIZED.get_or_init(|| {
        let mut backends = BACKENDS.write().unwrap_or_else(|e| e.into_inner());

        #[cfg(feature = "backend-csharp")]
        {
            backends.push(&crate::output::csharp::CSHARP_BACKEND);
        }

        #[cfg(feature = "backend-swift")]
        {
            backends.push(&crate::output::swift::SWIFT_BACKEND);
        }

        #[cfg(feature = "backend-js")]
        {
            backends.push(&crate::output::js::JS_BACKEND);
        }
    });
}

/// Get a backend by name.
pub fn get_backend(name: &str) -> Option<&'static dyn Backend> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .find(|b| b.name() == name)
        .copied()
}

/// List all registered backends.
pub fn backends() -> Vec<&'static dyn Backend> {
    init_builtin();
    BACKENDS.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// List all registered backend names.
pub fn backend_names() -> Vec<&'static str> {
    init_builtin();
    BACKENDS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .map(|b| b.name())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_backends() {
        let names = backend_names();
        assert!(names.contains(&"csharp") || cfg!(not(feature = "backend-csharp")));
        assert!(names.contains(&"swift") || cfg!(not(feature = "backend-swift")));
        assert!(names.contains(&"js") || cfg!(not(feature = "backend-js")));
        assert!(get_backend("cobol").is_none());
    }
}
