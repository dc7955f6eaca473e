use std::sync::Mutex;

use tracing::debug;

use super::{EngineFactory, EngineState};

/// Reuse cache of idle interpreter states.
///
/// `acquire` never blocks: it pops an idle state or builds a new one, so
/// growth is unbounded. A burst of concurrent holders creates as many
/// states as it needs and the surplus stays idle afterwards; that is a
/// documented resource limitation, not backpressure.
///
/// The pool does not inspect returned states. A caller releasing a state it
/// corrupted is a caller bug that surfaces later as script errors.
pub struct StatePool {
    factory: EngineFactory,
    idle: Mutex<Vec<EngineState>>,
}

impl StatePool {
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn factory(&self) -> &EngineFactory {
        &self.factory
    }

    /// Hand out an idle state, or build a fresh one.
    pub fn acquire(&self) -> anyhow::Result<EngineState> {
        if let Some(state) = self.idle.lock().unwrap().pop() {
            debug!(id = state.id(), "reusing idle interpreter state");
            return Ok(state);
        }
        let state = self.factory.create()?;
        debug!(id = state.id(), "created interpreter state");
        Ok(state)
    }

    /// Return a state to the idle set.
    pub fn release(&self, state: EngineState) {
        debug!(id = state.id(), "released interpreter state");
        self.idle.lock().unwrap().push(state);
    }

    /// Close every idle state. States currently held by callers are the
    /// callers' responsibility to close.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.idle.lock().unwrap());
        debug!(count = drained.len(), "closing idle interpreter states");
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap().len()
    }
}
