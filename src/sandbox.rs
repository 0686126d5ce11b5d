//! Isolated evaluation of learner code against test-argument tuples.
//!
//! A fresh `rhai::Engine` is built per `run` call, with nothing registered
//! beyond the language's standard package: no network, no filesystem, no host
//! state. The learner's script must define one designated entry point (by
//! default `foo`); it is invoked once per argument tuple, in order, and the
//! results are returned in the same order for position-wise grading.
//!
//! Runaway scripts are bounded three ways: an operation budget, a call-depth
//! limit, and a wall-clock deadline enforced through the engine's progress
//! callback.

use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, Scope};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::ArgTuple;
use crate::error::{Result, SessionError};
use crate::util::trunc_for_log;

/// Budgets applied to every evaluation.
#[derive(Clone, Debug)]
pub struct SandboxLimits {
    /// Name of the callable the learner's script must define.
    pub entry_point: String,
    /// Engine operation budget; exhaustion terminates the script.
    pub max_operations: u64,
    pub max_call_levels: usize,
    /// Wall-clock deadline across the whole run (all tuples together).
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            entry_point: "foo".into(),
            max_operations: 500_000,
            max_call_levels: 64,
            timeout: Duration::from_secs(2),
        }
    }
}

impl SandboxLimits {
    /// Tight budgets for untrusted bulk grading.
    pub fn strict() -> Self {
        Self {
            max_operations: 50_000,
            max_call_levels: 16,
            timeout: Duration::from_millis(250),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.entry_point.is_empty() {
            return Err(SessionError::Config("sandbox entry point must be named".into()));
        }
        // Zero would mean "unlimited" to the engine; the budget is mandatory.
        if self.max_operations == 0 {
            return Err(SessionError::Config("sandbox operation budget must be non-zero".into()));
        }
        if self.timeout.is_zero() {
            return Err(SessionError::Config("sandbox timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl From<&crate::config::SandboxConfig> for SandboxLimits {
    fn from(cfg: &crate::config::SandboxConfig) -> Self {
        Self {
            entry_point: cfg.entry_point.clone(),
            max_operations: cfg.max_operations,
            max_call_levels: cfg.max_call_levels,
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }
}

/// Sandbox facade. Holds only the limits; every `run` builds its own engine,
/// so no state survives between runs.
#[derive(Clone, Debug)]
pub struct Sandbox {
    limits: SandboxLimits,
}

impl Sandbox {
    pub fn new(limits: SandboxLimits) -> Result<Self> {
        limits.validate()?;
        Ok(Self { limits })
    }

    pub fn with_defaults() -> Self {
        Self { limits: SandboxLimits::default() }
    }

    /// Evaluate `code` once per argument tuple, in order.
    ///
    /// The blocking engine work runs under `spawn_blocking`; the engine's own
    /// deadline guarantees the blocking task finishes.
    #[instrument(level = "info", skip(self, code, test_arguments), fields(code_len = code.len(), cases = test_arguments.len()))]
    pub async fn run(&self, code: &str, test_arguments: &[ArgTuple]) -> Result<Vec<Value>> {
        let limits = self.limits.clone();
        let code = code.to_string();
        let tuples = test_arguments.to_vec();
        tokio::task::spawn_blocking(move || eval_all(&limits, &code, &tuples))
            .await
            .map_err(|e| SessionError::ExecutionFailed(format!("sandbox task failed: {e}")))?
    }
}

fn eval_all(limits: &SandboxLimits, code: &str, tuples: &[ArgTuple]) -> Result<Vec<Value>> {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);

    let deadline = Instant::now() + limits.timeout;
    engine.on_progress(move |_| {
        (Instant::now() >= deadline).then(|| Dynamic::from("time limit exceeded"))
    });

    let ast = engine.compile(code).map_err(|e| {
        debug!(target: "sandbox", error = %e, code = %trunc_for_log(code, 200), "Compile error");
        SessionError::ExecutionFailed(format!("compile error: {e}"))
    })?;

    // Entry point check up front so a missing `foo` is its own outcome,
    // not a wrong answer.
    let arities: Vec<usize> = ast
        .iter_functions()
        .filter(|f| f.name == limits.entry_point)
        .map(|f| f.params.len())
        .collect();
    if arities.is_empty() {
        return Err(SessionError::EntryPointMissing(limits.entry_point.clone()));
    }

    let mut results = Vec::with_capacity(tuples.len());
    for (i, tuple) in tuples.iter().enumerate() {
        if !arities.contains(&tuple.len()) {
            return Err(SessionError::ExecutionFailed(format!(
                "function '{}' does not take {} argument(s) (test case {})",
                limits.entry_point,
                tuple.len(),
                i + 1
            )));
        }

        let args: Vec<Dynamic> = tuple
            .iter()
            .map(rhai::serde::to_dynamic)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| SessionError::ExecutionFailed(format!("bad test argument: {e}")))?;

        // Fresh scope per invocation.
        let mut scope = Scope::new();
        let out = engine
            .call_fn::<Dynamic>(&mut scope, &ast, &limits.entry_point, args)
            .map_err(|e| {
                SessionError::ExecutionFailed(format!("test case {}: {}", i + 1, e))
            })?;

        let value: Value = rhai::serde::from_dynamic(&out).map_err(|e| {
            SessionError::ExecutionFailed(format!("unserializable result (test case {}): {}", i + 1, e))
        })?;
        results.push(value);
    }

    debug!(target: "sandbox", cases = results.len(), "Evaluation complete");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tuples(raw: &[&[i64]]) -> Vec<ArgTuple> {
        raw.iter()
            .map(|t| t.iter().map(|n| json!(n)).collect())
            .collect()
    }

    #[tokio::test]
    async fn doubling_entry_point_preserves_input_order() {
        let sb = Sandbox::with_defaults();
        let out = sb
            .run("fn foo(x) { x * 2 }", &tuples(&[&[1], &[2], &[3]]))
            .await
            .unwrap();
        assert_eq!(out, vec![json!(2), json!(4), json!(6)]);
    }

    #[tokio::test]
    async fn missing_entry_point_is_its_own_outcome() {
        let sb = Sandbox::with_defaults();
        let err = sb
            .run("fn bar(x) { x }", &tuples(&[&[1]]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::EntryPointMissing(name) if name == "foo"));
    }

    #[tokio::test]
    async fn compile_error_surfaces_as_execution_failed() {
        let sb = Sandbox::with_defaults();
        let err = sb.run("fn foo(x { x }", &tuples(&[&[1]])).await.unwrap_err();
        match err {
            SessionError::ExecutionFailed(msg) => assert!(msg.contains("compile error")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn runtime_fault_names_the_failing_case() {
        let sb = Sandbox::with_defaults();
        let err = sb
            .run(
                r#"fn foo(x) { if x > 1 { throw "boom" } x }"#,
                &tuples(&[&[1], &[2]]),
            )
            .await
            .unwrap_err();
        match err {
            SessionError::ExecutionFailed(msg) => assert!(msg.contains("test case 2")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn infinite_loop_hits_the_operation_budget() {
        let sb = Sandbox::new(SandboxLimits {
            max_operations: 10_000,
            timeout: Duration::from_secs(5),
            ..SandboxLimits::default()
        })
        .unwrap();
        let err = sb
            .run("fn foo(x) { loop { } }", &tuples(&[&[1]]))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn arity_mismatch_is_reported_not_a_wrong_answer() {
        let sb = Sandbox::with_defaults();
        let err = sb
            .run("fn foo(a, b) { a + b }", &tuples(&[&[1]]))
            .await
            .unwrap_err();
        match err {
            SessionError::ExecutionFailed(msg) => assert!(msg.contains("'foo'")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn runs_do_not_share_state() {
        let sb = Sandbox::with_defaults();
        // First run parks a value in its own scope.
        sb.run("fn foo(x) { let kept = x; kept }", &tuples(&[&[9]]))
            .await
            .unwrap();
        // Second run cannot see it.
        let err = sb.run("fn foo(x) { kept }", &tuples(&[&[1]])).await.unwrap_err();
        assert!(matches!(err, SessionError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn structured_results_round_through_json() {
        let sb = Sandbox::with_defaults();
        let out = sb
            .run(
                r#"fn foo(n) { let a = []; for i in 1..=n { a.push(i) } a }"#,
                &tuples(&[&[3]]),
            )
            .await
            .unwrap();
        assert_eq!(out, vec![json!([1, 2, 3])]);
    }

    #[test]
    fn limits_validation_rejects_zero_budgets() {
        assert!(SandboxLimits { max_operations: 0, ..SandboxLimits::default() }
            .validate()
            .is_err());
        assert!(SandboxLimits { timeout: Duration::ZERO, ..SandboxLimits::default() }
            .validate()
            .is_err());
        assert!(SandboxLimits::strict().validate().is_ok());
    }
}
