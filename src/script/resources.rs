// src/script/resources.rs

use std::fmt;
use std::sync::Mutex;

use anyhow::Result;
use tracing::{debug, error};

/// Something a running script allocated that must be released when the
/// script is terminated (listeners, timers, child processes, ...).
pub trait ScriptResource: Send {
    fn release(&mut self) -> Result<()>;
}

/// Any `FnMut` closure can act as a resource; the closure body performs the
/// release.
impl<F> ScriptResource for F
where
    F: FnMut() -> Result<()> + Send,
{
    fn release(&mut self) -> Result<()> {
        (self)()
    }
}

/// Scoped registry of everything a script allocates at runtime.
///
/// Closing the scope releases every entry. One entry failing to release
/// must not prevent the others from being released; failures are logged
/// per entry and counted, never propagated.
#[derive(Default)]
pub struct ResourceScope {
    entries: Mutex<Vec<(String, Box<dyn ScriptResource>)>>,
}

impl fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("ResourceScope").field("entries", &len).finish()
    }
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under a label used in release-failure logs.
    pub fn register(
        &self,
        label: impl Into<String>,
        resource: impl ScriptResource + 'static,
    ) {
        let mut entries = self.entries.lock().unwrap();
        entries.push((label.into(), Box::new(resource)));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every registered resource, in reverse registration order.
    ///
    /// Safe to call on an empty or already-closed scope. Returns the number
    /// of resources whose release failed.
    pub fn close_all(&self) -> usize {
        let mut entries = {
            let mut guard = self.entries.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        let mut failures = 0;
        while let Some((label, mut resource)) = entries.pop() {
            match resource.release() {
                Ok(()) => debug!(resource = %label, "released resource"),
                Err(err) => {
                    failures += 1;
                    error!(resource = %label, error = %err, "failed to release resource");
                }
            }
        }

        failures
    }
}
