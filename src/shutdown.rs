use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, warn};

type Hook = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Ordered collection of cleanup callbacks, run once at termination.
///
/// Owned by the application root and shared by `Arc` with the subsystems
/// that register hooks. Hooks run sequentially in registration order, each
/// to completion before the next starts, on whichever thread initiates the
/// sweep. A failing hook is logged and does not stop the rest.
pub struct ShutdownRegistry {
    hooks: Mutex<Vec<(String, Hook)>>,
    ran: AtomicBool,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            ran: AtomicBool::new(false),
        }
    }

    /// Append a named hook. Registration after the sweep has started is
    /// dropped with a warning; such a hook would never run.
    pub fn register(
        &self,
        name: &str,
        hook: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) {
        if self.ran.load(Ordering::SeqCst) {
            warn!("shutdown hook {name:?} registered after shutdown, dropping it");
            return;
        }
        self.hooks
            .lock()
            .unwrap()
            .push((name.to_string(), Box::new(hook)));
    }

    /// Run every registered hook, in order, exactly once. Racing callers
    /// return immediately; the first one does the work.
    pub fn run_all(&self) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap());
        for (name, hook) in hooks {
            debug!("running shutdown hook {name:?}");
            if let Err(err) = hook() {
                error!("shutdown hook {name:?} failed: {err:#}");
            }
        }
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn hooks_run_in_registration_order() {
        let registry = ShutdownRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = order.clone();
            registry.register(name, move || {
                order.lock().unwrap().push(name);
                Ok(())
            });
        }
        registry.run_all();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn a_failing_hook_does_not_block_the_rest() {
        let registry = ShutdownRegistry::new();
        let ran = Arc::new(AtomicBool::new(false));
        registry.register("broken", || Err(anyhow::anyhow!("boom")));
        {
            let ran = ran.clone();
            registry.register("after", move || {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            });
        }
        registry.run_all();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn concurrent_triggers_run_each_hook_once() {
        let registry = Arc::new(ShutdownRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            registry.register("counter", move || {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.run_all())
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.has_run());
    }

    #[test]
    fn late_registration_is_dropped() {
        let registry = ShutdownRegistry::new();
        registry.run_all();
        let ran = Arc::new(AtomicBool::new(false));
        {
            let ran = ran.clone();
            registry.register("too-late", move || {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            });
        }
        registry.run_all();
        assert!(!ran.load(Ordering::SeqCst));
    }
}
