// ABOUTME: The change-set orchestrator, driving one deployment to a
// ABOUTME: terminal stack state through create, confirm, execute, monitor.

use super::diff;
use super::error::DeployError;
use super::poll::PollSchedule;
use super::render;
use crate::cfn::{
    ChangeSetDescription, ChangeSetOps, ChangeSetType, CreateChangeSetInput, IdentityOps,
    ROLLBACK_COMPLETE, StackOps, StackStatus, is_no_changes_message,
};
use crate::manifest::Deployment;
use crate::output::Prompt;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::time::Duration;
use uuid::Uuid;

/// The full control-plane capability set the orchestrator needs.
pub trait CfnClient: StackOps + ChangeSetOps + IdentityOps {}

impl<T: StackOps + ChangeSetOps + IdentityOps> CfnClient for T {}

/// Drives a single deployment through the change-set lifecycle. Strictly
/// sequential: one stack converges (or aborts) before the caller moves on.
pub struct Deployer<'a, C: CfnClient> {
    client: &'a C,
    pub show_diff: bool,
    /// Fixed cadence while waiting for the change set to compute.
    pub change_set_interval: Duration,
    pub schedule: PollSchedule,
}

impl<'a, C: CfnClient> Deployer<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            show_diff: false,
            change_set_interval: Duration::from_secs(2),
            schedule: PollSchedule::default(),
        }
    }

    pub async fn deploy<W: Write, P: Prompt>(
        &self,
        deployment: &Deployment,
        w: &mut W,
        prompt: &mut P,
    ) -> Result<(), DeployError> {
        crate::output::field(w, "StackName", &deployment.stack_name)?;

        let exists = self.stack_exists(&deployment.stack_name).await?;

        if !exists {
            let question = format!(
                "\nStack {} does not exist. Create?",
                deployment.stack_name
            );
            if !prompt.confirm(&question)? {
                return Err(DeployError::AbortedByUser);
            }
        }

        if exists && self.show_diff {
            self.print_diff(deployment, w).await?;
        }

        // "No changes" surfaces either as a creation fault or as a FAILED
        // change set whose reason carries the same phrase.
        let change_set = match self.create_change_set(deployment, !exists).await {
            Ok(cs) => Some(cs),
            Err(DeployError::Cfn(e)) if e.is_no_changes() => None,
            Err(DeployError::ChangeSetFailed { reason }) if is_no_changes_message(&reason) => None,
            Err(e) => return Err(e),
        };

        match change_set {
            None => {
                writeln!(w, "\nNo change.")?;
            }
            Some(change_set) => {
                render::change_set(w, &change_set.changes)?;

                if deployment.protected && !prompt.confirm("\nExecute change set?")? {
                    return Err(DeployError::AbortedByUser);
                }

                let since = Utc::now();
                self.client.execute_change_set(&change_set.id).await?;

                let status = self
                    .monitor_stack(&deployment.stack_name, since, w)
                    .await?;

                if !exists && status.as_str() == ROLLBACK_COMPLETE {
                    let question = "\nStack failed creation, and must be deleted. Continue?";
                    if prompt.confirm(question)? {
                        self.client.delete_stack(&deployment.stack_name).await?;
                        self.monitor_stack(&deployment.stack_name, Utc::now(), w)
                            .await?;
                        return Ok(());
                    }
                    // Declined: the rolled-back stack stays, show its outputs.
                } else if status.is_failed() {
                    return Err(DeployError::StackUpdateFailed {
                        status: status.to_string(),
                    });
                }
            }
        }

        let stack = self.client.describe_stack(&deployment.stack_name).await?;
        for (i, output) in stack.outputs.iter().enumerate() {
            if i == 0 {
                writeln!(w)?;
            }
            render::stack_output(w, output)?;
        }

        Ok(())
    }

    async fn stack_exists(&self, name: &str) -> Result<bool, DeployError> {
        match self.client.describe_stack(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_exists() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn print_diff<W: Write>(
        &self,
        deployment: &Deployment,
        w: &mut W,
    ) -> Result<(), DeployError> {
        writeln!(w)?;
        let deployed = self.client.get_template(&deployment.stack_name).await?;
        if let Some(text) =
            diff::template_diff(&deployment.stack_name, &deployed, &deployment.template_body)
        {
            write!(w, "{text}")?;
        }
        Ok(())
    }

    async fn create_change_set(
        &self,
        deployment: &Deployment,
        create: bool,
    ) -> Result<ChangeSetDescription, DeployError> {
        let input = CreateChangeSetInput {
            stack_name: deployment.stack_name.clone(),
            change_set_name: format!("stack-update-{}", Uuid::new_v4()),
            template_body: deployment.template_body.clone(),
            parameters: deployment.parameters.clone(),
            change_set_type: if create {
                ChangeSetType::Create
            } else {
                ChangeSetType::Update
            },
        };

        tracing::debug!(name = %input.change_set_name, create, "creating change set");
        let id = self.client.create_change_set(&input).await?;

        loop {
            // The change set is never ready immediately, so wait first.
            tokio::time::sleep(self.change_set_interval).await;

            let description = self.client.describe_change_set(&id).await?;

            if description.status.is_create_complete() {
                return Ok(description);
            }
            if description.status.is_failed() {
                return Err(DeployError::ChangeSetFailed {
                    reason: description.status_reason.unwrap_or_default(),
                });
            }
            if description.status.is_delete_complete() {
                return Err(DeployError::ChangeSetRemoved);
            }
        }
    }

    /// Poll the stack until a terminal status. On every status change,
    /// print failed events from the window since the previous change and
    /// reset the backoff counter.
    async fn monitor_stack<W: Write>(
        &self,
        name: &str,
        start: DateTime<Utc>,
        w: &mut W,
    ) -> Result<StackStatus, DeployError> {
        let mut last_status: Option<StackStatus> = None;
        let mut since = start;
        let mut polls_since_change: u32 = 0;

        loop {
            let stack = match self.client.describe_stack(name).await {
                Ok(stack) => stack,
                // A stack deleted by name stops being describable; the
                // delete has finished.
                Err(e) if e.is_not_exists() => {
                    writeln!(w, "\nDELETE_COMPLETE")?;
                    return Ok(StackStatus::new("DELETE_COMPLETE"));
                }
                Err(e) => return Err(e.into()),
            };

            if last_status.as_ref() != Some(&stack.status) {
                writeln!(w)?;

                let now = Utc::now();
                let events = self.client.describe_stack_events(name).await?;
                for event in events
                    .iter()
                    .filter(|e| e.timestamp >= since && e.timestamp < now && e.is_failed())
                {
                    render::stack_event(w, event)?;
                }
                since = now;

                polls_since_change = 0;
                write!(w, "{}", stack.status)?;
                if !stack.status.is_terminal() {
                    write!(w, "...")?;
                }

                last_status = Some(stack.status.clone());
            }

            if stack.status.is_terminal() {
                writeln!(w)?;
                return Ok(stack.status);
            }

            tokio::time::sleep(self.schedule.interval(polls_since_change)).await;
            polls_since_change += 1;
            write!(w, ".")?;
            w.flush()?;
        }
    }
}
