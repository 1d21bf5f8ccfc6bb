//! Registry of named drives
//!
//! The host registers each additional drive under its name and resolves it
//! back when routing file operations. The registry holds `Arc<dyn Drive>`,
//! so host widgets and the registry can share one drive instance.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::drive::Drive;

/// Named collection of registered drives
#[derive(Default)]
pub struct DriveRegistry {
    drives: RwLock<HashMap<String, Arc<dyn Drive>>>,
}

impl DriveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drive under its own name
    ///
    /// Replaces and returns any drive previously registered under the same
    /// name.
    pub fn insert(&self, drive: Arc<dyn Drive>) -> Option<Arc<dyn Drive>> {
        let name = drive.name().to_string();
        self.drives.write().unwrap().insert(name, drive)
    }

    /// Look up a drive by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Drive>> {
        self.drives.read().unwrap().get(name).cloned()
    }

    /// Remove a drive, returning it if it was registered
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Drive>> {
        self.drives.write().unwrap().remove(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.drives.read().unwrap().contains_key(name)
    }

    /// Names of all registered drives
    pub fn names(&self) -> Vec<String> {
        self.drives.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.drives.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
