//! Sequential multi-step runs
//!
//! A run executes an ordered list of steps, each wrapping one adapter call.
//! Steps are closures that receive the [`RunContext`] at their own execution
//! time, so a later step can read the authorization or session values produced
//! by the steps that completed before it.
//!
//! ```
//! use gateway_core::multi_response::{MultiResponse, RunPolicy};
//! use gateway_core::types::{GatewayResponse, Params};
//!
//! let run = MultiResponse::run(RunPolicy::UseFirstResponse)
//!     .process(false, |_| {
//!         Ok(GatewayResponse::new(true, "Authorized", Params::new())
//!             .with_authorization(Some("auth_1".into())))
//!     })
//!     .process(true, |ctx| {
//!         let reference = ctx.authorization().unwrap_or_default().to_string();
//!         Ok(GatewayResponse::new(false, format!("Void of {reference} failed"), Params::new()))
//!     })
//!     .execute()
//!     .unwrap();
//!
//! assert!(run.success());
//! assert_eq!(run.all().len(), 2);
//! ```

use crate::types::GatewayResponse;
use crate::{GatewayError, Result};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Which response of a run is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    UseFirstResponse,
    #[default]
    UseLastResponse,
}

/// State visible to each step while a run executes
#[derive(Debug, Default)]
pub struct RunContext {
    responses: Vec<GatewayResponse>,
    session: HashMap<String, String>,
}

impl RunContext {
    /// Responses of the steps completed so far, in order
    pub fn responses(&self) -> &[GatewayResponse] {
        &self.responses
    }

    /// Most recently completed response
    pub fn last(&self) -> Option<&GatewayResponse> {
        self.responses.last()
    }

    /// Authorization of the most recently completed response
    pub fn authorization(&self) -> Option<&str> {
        self.last().and_then(GatewayResponse::authorization)
    }

    /// Record a value (bearer token, session id) for later steps
    pub fn set_session_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.session.insert(key.into(), value.into());
    }

    pub fn session_value(&self, key: &str) -> Option<&str> {
        self.session.get(key).map(String::as_str)
    }
}

type Operation<'a> = Box<dyn FnOnce(&mut RunContext) -> Result<GatewayResponse> + 'a>;

/// One unit of work in a run
pub struct Step<'a> {
    operation: Operation<'a>,
    ignore_failure: bool,
}

impl<'a> Step<'a> {
    /// Step whose failure halts the run
    pub fn new<F>(operation: F) -> Self
    where
        F: FnOnce(&mut RunContext) -> Result<GatewayResponse> + 'a,
    {
        Self {
            operation: Box::new(operation),
            ignore_failure: false,
        }
    }

    /// Step whose failure does not halt the run
    pub fn ignoring_failure<F>(operation: F) -> Self
    where
        F: FnOnce(&mut RunContext) -> Result<GatewayResponse> + 'a,
    {
        Self {
            operation: Box::new(operation),
            ignore_failure: true,
        }
    }

    pub fn ignore_failure(&self) -> bool {
        self.ignore_failure
    }
}

impl fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("operation", &"<closure>")
            .field("ignore_failure", &self.ignore_failure)
            .finish()
    }
}

/// Entry point for building runs
pub struct MultiResponse;

impl MultiResponse {
    /// Start building a run with the given policy
    ///
    /// Nothing can be executed until the first step is added.
    pub fn run<'a>(policy: RunPolicy) -> RunStart<'a> {
        RunStart {
            policy,
            _steps: PhantomData,
        }
    }

    /// Build a run from a prepared list of steps
    ///
    /// Fails with [`GatewayError::EmptyRun`] when `steps` is empty.
    pub fn from_steps<'a>(policy: RunPolicy, steps: Vec<Step<'a>>) -> Result<RunBuilder<'a>> {
        if steps.is_empty() {
            return Err(GatewayError::EmptyRun);
        }
        Ok(RunBuilder { policy, steps })
    }
}

/// A run that has no steps yet
#[derive(Debug, Clone, Copy)]
pub struct RunStart<'a> {
    policy: RunPolicy,
    _steps: PhantomData<&'a ()>,
}

impl<'a> RunStart<'a> {
    /// Add the first step built from a closure
    pub fn process<F>(self, ignore_failure: bool, operation: F) -> RunBuilder<'a>
    where
        F: FnOnce(&mut RunContext) -> Result<GatewayResponse> + 'a,
    {
        self.step(Step {
            operation: Box::new(operation),
            ignore_failure,
        })
    }

    /// Add the first prepared step
    pub fn step(self, step: Step<'a>) -> RunBuilder<'a> {
        RunBuilder {
            policy: self.policy,
            steps: vec![step],
        }
    }
}

/// Ordered, non-empty list of steps awaiting execution
#[derive(Debug)]
pub struct RunBuilder<'a> {
    policy: RunPolicy,
    steps: Vec<Step<'a>>,
}

impl<'a> RunBuilder<'a> {
    /// Append a step built from a closure
    pub fn process<F>(mut self, ignore_failure: bool, operation: F) -> Self
    where
        F: FnOnce(&mut RunContext) -> Result<GatewayResponse> + 'a,
    {
        self.steps.push(Step {
            operation: Box::new(operation),
            ignore_failure,
        });
        self
    }

    /// Append a prepared step
    pub fn step(mut self, step: Step<'a>) -> Self {
        self.steps.push(step);
        self
    }

    /// Number of steps added so far; never zero
    pub fn planned_steps(&self) -> usize {
        self.steps.len()
    }

    /// Execute the steps in order
    ///
    /// A failed step halts the run unless it was added with `ignore_failure`.
    /// An `Err` from a step aborts the run immediately and is returned as is.
    pub fn execute(self) -> Result<RunResult> {
        let planned = self.steps.len();
        let mut context = RunContext::default();
        let mut ignored = Vec::with_capacity(planned);

        for (index, step) in self.steps.into_iter().enumerate() {
            let response = (step.operation)(&mut context)?;
            let success = response.success();

            debug!(
                step = index,
                success,
                ignore_failure = step.ignore_failure,
                "step completed"
            );

            context.responses.push(response);
            ignored.push(step.ignore_failure);

            if !success {
                if step.ignore_failure {
                    warn!(step = index, "ignored step failed; continuing");
                } else {
                    if index + 1 < planned {
                        info!(
                            step = index,
                            skipped = planned - index - 1,
                            "step failed; halting run"
                        );
                    }
                    break;
                }
            }
        }

        let halted_early = context.responses.len() < planned;
        Ok(RunResult {
            policy: self.policy,
            responses: context.responses,
            ignored,
            planned,
            halted_early,
        })
    }
}

/// Outcome of an executed run
///
/// Always holds at least one response.
#[derive(Debug, Clone)]
pub struct RunResult {
    policy: RunPolicy,
    responses: Vec<GatewayResponse>,
    ignored: Vec<bool>,
    planned: usize,
    halted_early: bool,
}

impl RunResult {
    /// The authoritative response selected by the run policy
    pub fn primary(&self) -> &GatewayResponse {
        let index = match self.policy {
            RunPolicy::UseFirstResponse => 0,
            RunPolicy::UseLastResponse => self.responses.len() - 1,
        };
        &self.responses[index]
    }

    /// Consume into the primary response
    pub fn into_primary(mut self) -> GatewayResponse {
        match self.policy {
            RunPolicy::UseFirstResponse => self.responses.swap_remove(0),
            RunPolicy::UseLastResponse => self.responses.swap_remove(self.responses.len() - 1),
        }
    }

    /// Responses of every executed step, in order
    pub fn all(&self) -> &[GatewayResponse] {
        &self.responses
    }

    /// Whether steps were left unexecuted after a failure
    pub fn halted_early(&self) -> bool {
        self.halted_early
    }

    /// Number of steps the run was built with
    pub fn planned_steps(&self) -> usize {
        self.planned
    }

    /// Whether the step at `index` was executed with `ignore_failure`
    pub fn was_ignored(&self, index: usize) -> bool {
        self.ignored.get(index).copied().unwrap_or(false)
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    pub fn success(&self) -> bool {
        self.primary().success()
    }

    pub fn message(&self) -> &str {
        self.primary().message()
    }

    pub fn authorization(&self) -> Option<&str> {
        self.primary().authorization()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Params;

    fn ok(message: &str) -> Result<GatewayResponse> {
        Ok(GatewayResponse::new(true, message, Params::new()))
    }

    fn fail(message: &str) -> Result<GatewayResponse> {
        Ok(GatewayResponse::new(false, message, Params::new()))
    }

    #[test]
    fn test_empty_step_list_rejected_at_construction() {
        let err = MultiResponse::from_steps(RunPolicy::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyRun));
    }

    #[test]
    fn test_from_steps_executes_in_order() {
        let builder = MultiResponse::from_steps(
            RunPolicy::UseFirstResponse,
            vec![Step::new(|_| ok("a")), Step::new(|_| ok("b"))],
        )
        .unwrap();
        assert_eq!(builder.planned_steps(), 2);

        let run = builder.execute().unwrap();
        assert_eq!(run.message(), "a");
        assert_eq!(run.all().len(), 2);
    }

    #[test]
    fn test_default_policy_is_last() {
        assert_eq!(RunPolicy::default(), RunPolicy::UseLastResponse);

        let run = MultiResponse::run(RunPolicy::default())
            .process(false, |_| ok("first"))
            .process(false, |_| ok("second"))
            .execute()
            .unwrap();

        assert_eq!(run.message(), "second");
        assert!(!run.halted_early());
    }

    #[test]
    fn test_later_step_sees_previous_authorization() {
        let run = MultiResponse::run(RunPolicy::UseLastResponse)
            .process(false, |_| {
                Ok(GatewayResponse::new(true, "token", Params::new())
                    .with_authorization(Some("tok_1".to_string())))
            })
            .process(false, |ctx| {
                let token = ctx.authorization().unwrap_or_default().to_string();
                Ok(GatewayResponse::new(true, format!("charged with {token}"), Params::new())
                    .with_authorization(Some("ch_1".to_string())))
            })
            .execute()
            .unwrap();

        assert_eq!(run.message(), "charged with tok_1");
        assert_eq!(run.authorization(), Some("ch_1"));
    }

    #[test]
    fn test_session_values_flow_forward() {
        let run = MultiResponse::run(RunPolicy::UseLastResponse)
            .process(false, |ctx| {
                ctx.set_session_value("bearer", "abc");
                ok("login")
            })
            .process(false, |ctx| ok(ctx.session_value("bearer").unwrap_or("none")))
            .execute()
            .unwrap();

        assert_eq!(run.message(), "abc");
    }

    #[test]
    fn test_error_aborts_run() {
        let mut reached = false;
        let result = MultiResponse::run(RunPolicy::UseFirstResponse)
            .process(false, |_| Err(GatewayError::unexpected("connection reset")))
            .process(false, |_| {
                reached = true;
                ok("never")
            })
            .execute();

        assert!(result.is_err());
        assert!(!reached);
    }

    #[test]
    fn test_halt_on_last_step_is_not_early() {
        let run = MultiResponse::run(RunPolicy::UseLastResponse)
            .process(false, |_| ok("a"))
            .process(false, |_| fail("b"))
            .execute()
            .unwrap();

        assert!(!run.success());
        assert!(!run.halted_early());
        assert_eq!(run.planned_steps(), 2);
    }

    #[test]
    fn test_into_primary() {
        let run = MultiResponse::run(RunPolicy::UseFirstResponse)
            .step(Step::new(|_| ok("a")))
            .step(Step::ignoring_failure(|_| fail("b")))
            .step(Step::new(|_| ok("c")))
            .execute()
            .unwrap();

        assert!(run.was_ignored(1));
        assert!(!run.was_ignored(2));
        assert_eq!(run.into_primary().message(), "a");
    }
}
