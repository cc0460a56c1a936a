//! The step executor: a scenario is an ordered list of "actor performs
//! action, then we know it worked because ..." entries, executed strictly
//! in order and aborted on the first unmet expectation.

use crate::{
    actor::Actor,
    poll,
    swap::{ActionKind, SwapState},
    swapd::{ActionResponse, UnexpectedResponse},
};
use anyhow::Context;
use std::fmt;

/// One scripted unit of a scenario.
///
/// Step order encodes the protocol's causal dependencies: Accept has to
/// come before Fund because the daemon will not offer Fund earlier.
#[derive(Debug)]
pub struct Step<'a> {
    actor: &'a Actor,
    action: ActionKind,
    confirmation: Confirmation,
}

/// How a step is confirmed as done. Exactly one mode per step.
pub enum Confirmation {
    /// The action's side effect is asserted by a later step.
    FireAndForget,
    /// Poll the swap's state until the predicate holds.
    ///
    /// The predicate must be monotone: once satisfied it stays satisfied,
    /// the executor does not re-check after advancing to the next step.
    WaitUntil(Box<dyn Fn(&SwapState) -> bool + Send + Sync>),
    /// Assert on the immediate HTTP response instead of polling; this is
    /// how steps that must fail synchronously are written.
    ExpectResponse(Box<dyn Fn(&ActionResponse) -> anyhow::Result<()> + Send + Sync>),
}

impl fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confirmation::FireAndForget => write!(f, "FireAndForget"),
            Confirmation::WaitUntil(_) => write!(f, "WaitUntil"),
            Confirmation::ExpectResponse(_) => write!(f, "ExpectResponse"),
        }
    }
}

impl<'a> Step<'a> {
    pub fn new(actor: &'a Actor, action: ActionKind) -> Self {
        Step {
            actor,
            action,
            confirmation: Confirmation::FireAndForget,
        }
    }

    pub fn wait_until<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&SwapState) -> bool + Send + Sync + 'static,
    {
        self.confirmation = Confirmation::WaitUntil(Box::new(predicate));
        self
    }

    pub fn expect_response<A>(mut self, assertion: A) -> Self
    where
        A: Fn(&ActionResponse) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.confirmation = Confirmation::ExpectResponse(Box::new(assertion));
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Executor {
    poll: poll::Settings,
}

impl Executor {
    pub fn new(poll: poll::Settings) -> Self {
        Executor { poll }
    }

    /// Run the steps in order, failing fast on the first unmet step.
    ///
    /// Partial protocol progress is not itself an error, but continuing
    /// past a broken step would turn one precise failure into a cascade
    /// of misleading ones, so the remaining steps do not run.
    pub async fn run(&self, steps: &[Step<'_>]) -> anyhow::Result<()> {
        for (index, step) in steps.iter().enumerate() {
            tracing::info!("running step {}: {} by {}", index, step.action, step.actor.name());

            self.execute(step).await.with_context(|| {
                format!(
                    "step {} ({} by {}) failed",
                    index,
                    step.action,
                    step.actor.name()
                )
            })?;
        }

        Ok(())
    }

    async fn execute(&self, step: &Step<'_>) -> anyhow::Result<()> {
        let response = step.actor.execute_action(step.action).await?;

        match &step.confirmation {
            Confirmation::ExpectResponse(assertion) => assertion(&response),
            Confirmation::WaitUntil(predicate) => {
                require_success(&response)?;

                poll::until(
                    || step.actor.swap_state(),
                    |state| predicate(state),
                    self.poll,
                )
                .await?;

                Ok(())
            }
            Confirmation::FireAndForget => require_success(&response),
        }
    }
}

fn require_success(response: &ActionResponse) -> anyhow::Result<()> {
    anyhow::ensure!(
        response.status.is_success(),
        UnexpectedResponse {
            status: response.status,
            body: response.body.to_string(),
        }
    );

    Ok(())
}
