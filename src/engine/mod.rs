use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use boa_engine::{Context, Source};

pub mod bindings;
pub mod bridge;
pub mod pool;

/// Where `print` and `pprint` send their output. Production uses stdout;
/// tests install a buffer.
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Evaluation failures, split the way the console cares about them: a
/// syntax error from a wrapped line triggers one unwrapped retry, anything
/// else is reported as-is.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Runtime(String),
}

static NEXT_STATE_ID: AtomicUsize = AtomicUsize::new(1);

/// An isolated script execution context with its own global bindings.
///
/// Not safe for concurrent use: exactly one caller may hold a state at a
/// time, and the pool only ever hands each state to one holder.
pub struct EngineState {
    id: usize,
    ctx: Context,
}

// SAFETY: the boa `Context` is not `Sync` and has no internal
// synchronization, but a state is only ever reached through exclusive
// ownership: the pool moves whole `EngineState` values between holders and
// all evaluation goes through `&mut self`. No reference to the inner
// context escapes, so moving a state to another thread transfers exclusive
// access along with it.
unsafe impl Send for EngineState {}

impl EngineState {
    fn new(ctx: Context) -> Self {
        Self {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            ctx,
        }
    }

    /// Process-unique id, for pool diagnostics.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Evaluate `src`, discarding its completion value. Output only happens
    /// through bindings like `print`.
    pub fn eval(&mut self, src: &str) -> Result<(), EvalError> {
        self.ctx
            .eval(Source::from_bytes(src))
            .map(|_| ())
            .map_err(|err| classify_error(err.to_string()))
    }

    /// Evaluate `src` and stringify its completion value.
    pub fn eval_to_string(&mut self, src: &str) -> Result<String, EvalError> {
        let value = self
            .ctx
            .eval(Source::from_bytes(src))
            .map_err(|err| classify_error(err.to_string()))?;
        value
            .to_string(&mut self.ctx)
            .map(|s| s.to_std_string_escaped())
            .map_err(|err| classify_error(err.to_string()))
    }
}

/// Boa reports parse failures as thrown `SyntaxError` values, so the error
/// display is the discriminator.
fn classify_error(message: String) -> EvalError {
    if message.starts_with("SyntaxError") {
        EvalError::Syntax(message)
    } else {
        EvalError::Runtime(message)
    }
}

/// Builds fresh interpreter states.
///
/// Every state gets the base binding set; the privileged `server.*`
/// namespace is installed only when the capability flag allows it. The
/// console-session extras (`pprint`, `serverdir`) are installed separately,
/// on the one state the console keeps for its whole session.
#[derive(Clone)]
pub struct EngineFactory {
    version: String,
    server_dir: PathBuf,
    privileged: bool,
    started: Instant,
    sink: OutputSink,
}

impl EngineFactory {
    pub fn new(version: &str, server_dir: PathBuf, privileged: bool) -> Self {
        Self {
            version: version.to_string(),
            server_dir,
            privileged,
            started: Instant::now(),
            sink: Arc::new(|line: &str| println!("{line}")),
        }
    }

    /// Replace the print sink. Used by tests to capture output.
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn create(&self) -> anyhow::Result<EngineState> {
        let mut ctx = Context::default();
        bindings::install_base(&mut ctx, self)?;
        if self.privileged {
            bindings::install_privileged(&mut ctx, self)?;
        }
        Ok(EngineState::new(ctx))
    }

    /// Install the console-session bindings on an already-built state.
    pub fn install_console_extras(&self, state: &mut EngineState) -> anyhow::Result<()> {
        bindings::install_console(&mut state.ctx, self)
    }
}
