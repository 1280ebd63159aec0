//! Resolution of discovered files to controller modules.
//!
//! Rust has no runtime `import()`: a [`ModuleLoader`] maps a matched path to a
//! module that was linked into the binary. [`RegistryLoader`] keys modules by
//! file stem, so `src/controllers/*.rs` resolves `users.rs` to the module
//! registered as `"users"`.

use std::collections::HashMap;
use std::path::Path;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::controllers::{ControllerError, ControllerModule};

/// Asynchronous path → module resolution.
///
/// Return [`ControllerError::ModuleNotFound`] for a path that is not a
/// controller; the loader skips it. Any other error aborts registration.
pub trait ModuleLoader: Send + Sync {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<ControllerModule, ControllerError>>;
}

/// Module name for a path: its file stem.
pub fn module_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

/// Modules registered up front under their module name.
#[derive(Debug, Clone, Default)]
pub struct RegistryLoader {
    modules: HashMap<String, ControllerModule>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under `name` (builder form).
    pub fn module(mut self, name: impl Into<String>, module: impl Into<ControllerModule>) -> Self {
        self.insert(name, module);
        self
    }

    /// Register a module under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, module: impl Into<ControllerModule>) {
        self.modules.insert(name.into(), module.into());
    }

    /// Whether a module is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for RegistryLoader {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<ControllerModule, ControllerError>> {
        let result = module_name(path)
            .and_then(|name| self.modules.get(name))
            .cloned()
            .ok_or_else(|| ControllerError::ModuleNotFound {
                path: path.to_path_buf(),
            });
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::ControllerExport;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_registry_resolves_by_stem() {
        let loader = RegistryLoader::new().module("users", ControllerExport::empty().named("users"));

        let module = loader
            .load(&PathBuf::from("src/controllers/users.rs"))
            .await
            .unwrap();
        assert_eq!(module.normalize().display_name(), "users");
    }

    #[tokio::test]
    async fn test_registry_unknown_module() {
        let loader = RegistryLoader::new();
        let err = loader.load(Path::new("src/controllers/ghost.rs")).await.unwrap_err();
        assert!(matches!(err, ControllerError::ModuleNotFound { .. }));
    }
}
