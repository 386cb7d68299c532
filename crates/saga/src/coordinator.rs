//! Saga coordinator for orchestrating multi-step writes.

use std::time::{Duration, Instant};

use common::{SagaId, retry};
use rpc::RemoteError;

use crate::aggregate::{SagaInstance, SagaMetadata};
use crate::error::{Result, SagaOrchestrationError};
use crate::events::SagaEvent;
use crate::step::{Compensation, Step, StepResult};

/// Execution settings shared by every saga a coordinator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaConfig {
    /// Deadline for the whole forward phase. Compensation is not bounded by it.
    pub deadline: Option<Duration>,
    /// Attempts per compensation before it is recorded as failed.
    pub compensation_attempts: u32,
    /// Base backoff between compensation attempts.
    pub compensation_delay: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            deadline: None,
            compensation_attempts: 3,
            compensation_delay: Duration::from_millis(100),
        }
    }
}

/// Result of a saga that ran every step.
#[derive(Debug)]
pub struct SagaOutcome<C> {
    /// The context after the last step.
    pub context: C,
    pub metadata: SagaMetadata,
}

/// Runs sagas: forward steps strictly in order, then on failure the
/// compensations of already-executed steps strictly in reverse order.
///
/// Compensation is best effort. A compensation that still fails after
/// its retries is logged and recorded, and the remaining ones still run.
#[derive(Debug, Clone, Default)]
pub struct SagaCoordinator {
    config: SagaConfig,
}

impl SagaCoordinator {
    pub fn new(config: SagaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Executes `steps` over `ctx`.
    ///
    /// Returns the final context with saga metadata, or a
    /// [`SagaOrchestrationError`] once compensation has finished.
    #[tracing::instrument(skip(self, steps, ctx), fields(saga_id = tracing::field::Empty))]
    pub async fn execute<C: Send>(
        &self,
        saga_type: &'static str,
        steps: &[Box<dyn Step<C>>],
        mut ctx: C,
        idempotency_key: Option<String>,
    ) -> Result<SagaOutcome<C>> {
        metrics::counter!("saga_executions_total", "saga" => saga_type).increment(1);
        let saga_start = Instant::now();
        let deadline = self
            .config
            .deadline
            .map(|d| tokio::time::Instant::now() + d);

        let saga_id = SagaId::new();
        tracing::Span::current().record("saga_id", tracing::field::display(saga_id));

        let mut saga = SagaInstance::default();
        record(&mut saga, SagaEvent::saga_started(saga_id, saga_type, idempotency_key));

        let mut compensations: Vec<(&'static str, Box<dyn Compensation>)> = Vec::new();
        for step in steps {
            let name = step.name();
            tracing::info!(step = name, "saga step started");
            record(&mut saga, SagaEvent::step_started(name));

            match self.run_step(step.as_ref(), &mut ctx, deadline).await {
                Ok(compensation) => {
                    record(&mut saga, SagaEvent::step_completed(name));
                    if let Some(compensation) = compensation {
                        compensations.push((name, compensation));
                    }
                }
                Err(cause) => {
                    tracing::warn!(step = name, error = %cause, "saga step failed");
                    record(&mut saga, SagaEvent::step_failed(name, cause.to_string()));

                    self.compensate(&mut saga, name, compensations).await;

                    let duration = saga_start.elapsed();
                    metrics::histogram!("saga_duration_seconds", "saga" => saga_type)
                        .record(duration.as_secs_f64());
                    metrics::counter!("saga_failed", "saga" => saga_type).increment(1);
                    tracing::warn!(%saga_id, step = name, duration_ms = duration.as_millis() as u64, "saga failed");

                    return Err(SagaOrchestrationError {
                        saga_id,
                        saga_type: saga_type.to_string(),
                        step: name.to_string(),
                        executed_steps: saga.executed_steps().to_vec(),
                        compensated_steps: saga.compensated_steps().to_vec(),
                        failed_compensations: saga.failed_compensations().to_vec(),
                        duration_ms: duration.as_millis() as u64,
                        cause,
                    });
                }
            }
        }

        record(&mut saga, SagaEvent::saga_completed());

        let duration = saga_start.elapsed();
        metrics::histogram!("saga_duration_seconds", "saga" => saga_type)
            .record(duration.as_secs_f64());
        metrics::counter!("saga_completed", "saga" => saga_type).increment(1);
        tracing::info!(%saga_id, duration_ms = duration.as_millis() as u64, "saga completed successfully");

        Ok(SagaOutcome {
            context: ctx,
            metadata: saga.metadata(duration),
        })
    }

    async fn run_step<C: Send>(
        &self,
        step: &dyn Step<C>,
        ctx: &mut C,
        deadline: Option<tokio::time::Instant>,
    ) -> StepResult {
        let Some(deadline) = deadline else {
            return step.forward(ctx).await;
        };
        match tokio::time::timeout_at(deadline, step.forward(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                pattern: step.name().to_string(),
                timeout_ms: self
                    .config
                    .deadline
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default(),
            }),
        }
    }

    /// Runs compensations in reverse order of the completed steps.
    #[tracing::instrument(skip(self, saga, compensations))]
    async fn compensate(
        &self,
        saga: &mut SagaInstance,
        failed_step: &str,
        compensations: Vec<(&'static str, Box<dyn Compensation>)>,
    ) {
        record(saga, SagaEvent::compensation_started(failed_step));

        for (name, compensation) in compensations.into_iter().rev() {
            let compensation = &compensation;
            let result = retry(
                move || async move {
                    match compensation.compensate().await {
                        // already gone upstream: nothing left to undo
                        Err(e) if e.is_not_found() => {
                            tracing::info!(step = name, error = %e, "compensation target already absent");
                            Ok(())
                        }
                        other => other,
                    }
                },
                self.config.compensation_attempts,
                self.config.compensation_delay,
            )
            .await;
            match result {
                Ok(()) => {
                    tracing::info!(step = name, "compensation completed");
                    record(saga, SagaEvent::compensation_step_completed(name));
                }
                Err(e) => {
                    tracing::error!(step = name, error = %e, "compensation failed, continuing");
                    metrics::counter!("saga_compensations_failed", "step" => name).increment(1);
                    record(saga, SagaEvent::compensation_step_failed(name, e.to_string()));
                }
            }
        }

        record(saga, SagaEvent::saga_failed());
    }
}

/// Applies an engine event. The engine only emits legal transitions, so a
/// refusal is logged rather than raised.
fn record(saga: &mut SagaInstance, event: SagaEvent) {
    if let Err(e) = saga.apply(event) {
        tracing::error!(saga_id = ?saga.id(), error = %e, "saga event refused");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::SagaState;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recorded {
        name: &'static str,
        journal: Journal,
    }

    #[async_trait]
    impl Compensation for Recorded {
        async fn compensate(&self) -> std::result::Result<(), RemoteError> {
            self.journal.lock().unwrap().push(format!("undo:{}", self.name));
            Ok(())
        }
    }

    /// Appends its name to the context; fails when `fail` is set.
    struct Append {
        name: &'static str,
        fail: bool,
        journal: Journal,
    }

    #[async_trait]
    impl Step<Vec<&'static str>> for Append {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn forward(&self, ctx: &mut Vec<&'static str>) -> StepResult {
            if self.fail {
                return Err(RemoteError::rejected(self.name, 409, "conflict"));
            }
            ctx.push(self.name);
            Ok(Some(Box::new(Recorded {
                name: self.name,
                journal: self.journal.clone(),
            })))
        }
    }

    fn steps(
        names: &[&'static str],
        failing: Option<usize>,
        journal: &Journal,
    ) -> Vec<Box<dyn Step<Vec<&'static str>>>> {
        names
            .iter()
            .copied()
            .enumerate()
            .map(|(i, name)| {
                Box::new(Append {
                    name,
                    fail: failing == Some(i),
                    journal: journal.clone(),
                }) as Box<dyn Step<Vec<&'static str>>>
            })
            .collect()
    }

    const NAMES: [&str; 4] = ["one", "two", "three", "four"];

    #[tokio::test]
    async fn test_successful_saga_executes_every_step() {
        let journal = Journal::default();
        let coordinator = SagaCoordinator::default();

        let outcome = coordinator
            .execute("Test", &steps(&NAMES, None, &journal), Vec::new(), None)
            .await
            .unwrap();

        assert_eq!(outcome.context, NAMES);
        assert_eq!(outcome.metadata.executed_steps, NAMES);
        assert!(outcome.metadata.compensated_steps.is_empty());
        assert_eq!(outcome.metadata.state, SagaState::Completed);
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_at_every_position_compensates_in_reverse() {
        for k in 0..NAMES.len() {
            let journal = Journal::default();
            let coordinator = SagaCoordinator::default();

            let err = coordinator
                .execute("Test", &steps(&NAMES, Some(k), &journal), Vec::new(), None)
                .await
                .unwrap_err();

            assert_eq!(err.step, NAMES[k]);
            assert_eq!(err.executed_steps.len(), k);
            let mut reversed = err.executed_steps.clone();
            reversed.reverse();
            assert_eq!(err.compensated_steps, reversed);
            assert_eq!(err.status_code(), 409);

            let undo: Vec<String> = reversed.iter().map(|s| format!("undo:{s}")).collect();
            assert_eq!(*journal.lock().unwrap(), undo);
        }
    }

    struct Flaky {
        failures_left: Mutex<u32>,
        journal: Journal,
    }

    #[async_trait]
    impl Compensation for Flaky {
        async fn compensate(&self) -> std::result::Result<(), RemoteError> {
            let mut left = self.failures_left.lock().unwrap();
            self.journal.lock().unwrap().push("attempt".into());
            if *left > 0 {
                *left -= 1;
                return Err(RemoteError::unavailable("undo", "down"));
            }
            Ok(())
        }
    }

    struct WithCompensation<F: Fn() -> Box<dyn Compensation> + Send + Sync> {
        name: &'static str,
        make: F,
    }

    #[async_trait]
    impl<F: Fn() -> Box<dyn Compensation> + Send + Sync> Step<()> for WithCompensation<F> {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn forward(&self, _ctx: &mut ()) -> StepResult {
            Ok(Some((self.make)()))
        }
    }

    struct Failing;

    #[async_trait]
    impl Step<()> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn forward(&self, _ctx: &mut ()) -> StepResult {
            Err(RemoteError::unavailable("failing", "down"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_compensation_is_retried_then_recorded_as_failed() {
        let flaky_journal = Journal::default();
        let stuck_journal = Journal::default();
        let (fj, sj) = (flaky_journal.clone(), stuck_journal.clone());
        let steps: Vec<Box<dyn Step<()>>> = vec![
            Box::new(WithCompensation {
                name: "recovers",
                make: move || {
                    Box::new(Flaky {
                        failures_left: Mutex::new(2),
                        journal: fj.clone(),
                    }) as Box<dyn Compensation>
                },
            }),
            Box::new(WithCompensation {
                name: "stuck",
                make: move || {
                    Box::new(Flaky {
                        failures_left: Mutex::new(u32::MAX),
                        journal: sj.clone(),
                    }) as Box<dyn Compensation>
                },
            }),
            Box::new(Failing),
        ];

        let err = SagaCoordinator::default()
            .execute("Test", &steps, (), None)
            .await
            .unwrap_err();

        assert_eq!(err.step, "failing");
        assert_eq!(err.executed_steps, vec!["recovers", "stuck"]);
        // the stuck compensation does not stop the one before it
        assert_eq!(err.compensated_steps, vec!["recovers"]);
        assert_eq!(err.failed_compensations, vec!["stuck"]);
        assert_eq!(flaky_journal.lock().unwrap().len(), 3);
        assert_eq!(stuck_journal.lock().unwrap().len(), 3);
    }

    struct AlreadyGone {
        journal: Journal,
    }

    #[async_trait]
    impl Compensation for AlreadyGone {
        async fn compensate(&self) -> std::result::Result<(), RemoteError> {
            self.journal.lock().unwrap().push("attempt".into());
            Err(RemoteError::rejected("accounts.staff.delete", 404, "account not found"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_compensation_counts_as_compensated() {
        let journal = Journal::default();
        let j = journal.clone();
        let steps: Vec<Box<dyn Step<()>>> = vec![
            Box::new(WithCompensation {
                name: "createAccount",
                make: move || {
                    Box::new(AlreadyGone { journal: j.clone() }) as Box<dyn Compensation>
                },
            }),
            Box::new(Failing),
        ];

        let err = SagaCoordinator::default()
            .execute("Test", &steps, (), None)
            .await
            .unwrap_err();

        assert_eq!(err.compensated_steps, vec!["createAccount"]);
        assert!(err.failed_compensations.is_empty());
        assert_eq!(journal.lock().unwrap().len(), 1);
    }

    struct Slow;

    #[async_trait]
    impl Step<()> for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn forward(&self, _ctx: &mut ()) -> StepResult {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_current_step_with_timeout() {
        let journal = Journal::default();
        let j = journal.clone();
        let steps: Vec<Box<dyn Step<()>>> = vec![
            Box::new(WithCompensation {
                name: "fast",
                make: move || {
                    Box::new(Flaky {
                        failures_left: Mutex::new(0),
                        journal: j.clone(),
                    }) as Box<dyn Compensation>
                },
            }),
            Box::new(Slow),
        ];
        let coordinator = SagaCoordinator::new(SagaConfig {
            deadline: Some(Duration::from_secs(5)),
            ..Default::default()
        });

        let err = coordinator.execute("Test", &steps, (), None).await.unwrap_err();

        assert_eq!(err.step, "slow");
        assert!(err.is_timeout());
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.compensated_steps, vec!["fast"]);
        assert_eq!(journal.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_steps_without_compensation_are_skipped_when_undoing() {
        struct NoUndo;

        #[async_trait]
        impl Step<()> for NoUndo {
            fn name(&self) -> &'static str {
                "noUndo"
            }

            async fn forward(&self, _ctx: &mut ()) -> StepResult {
                Ok(None)
            }
        }

        let steps: Vec<Box<dyn Step<()>>> = vec![Box::new(NoUndo), Box::new(Failing)];
        let err = SagaCoordinator::default()
            .execute("Test", &steps, (), Some("idem".into()))
            .await
            .unwrap_err();

        assert_eq!(err.executed_steps, vec!["noUndo"]);
        assert!(err.compensated_steps.is_empty());
        assert!(err.failed_compensations.is_empty());
    }
}
