use super::{EngineState, EvalError};

/// The call the console wraps bare expressions in so their value is shown.
pub const AUTO_PRINT: &str = "pprint";

/// Lines already printing on their own are evaluated unmodified.
fn prints_itself(line: &str) -> bool {
    line.starts_with("pprint(") || line.starts_with("print(")
}

/// Evaluate one console line.
///
/// Bare expressions are wrapped as `pprint(<line>)` so their value is
/// printed. If the wrapped form fails to parse (statements do), the
/// original line is retried exactly once and that attempt's outcome is what
/// gets reported. Runtime errors are reported without a retry. Nothing here
/// is fatal to the loop.
pub fn eval_line(state: &mut EngineState, line: &str) -> Result<(), EvalError> {
    if prints_itself(line) {
        return state.eval(line);
    }
    let wrapped = format!("{AUTO_PRINT}({line})");
    match state.eval(&wrapped) {
        Err(EvalError::Syntax(_)) => state.eval(line),
        outcome => outcome,
    }
}
