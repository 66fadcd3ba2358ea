// ABOUTME: Orchestrator tests against a scripted in-memory control plane.
// ABOUTME: Covers the no-change, abort, create, failure and rollback paths.

use async_trait::async_trait;
use cirrus::cfn::{
    CallerIdentity, CfnError, ChangeAction, ChangeSetDescription, ChangeSetId, ChangeSetOps,
    ChangeSetStatus, CreateChangeSetInput, IdentityOps, ResourceChange, StackDescription,
    StackEvent, StackOps, StackOutput, StackStatus,
};
use cirrus::deploy::{DeployError, Deployer, PollSchedule};
use cirrus::manifest::Deployment;
use cirrus::output::ScriptedPrompt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct FakeClient {
    describe_stack: Mutex<VecDeque<Result<StackDescription, CfnError>>>,
    create_change_set: Mutex<VecDeque<Result<(), CfnError>>>,
    describe_change_set: Mutex<VecDeque<Result<ChangeSetDescription, CfnError>>>,
    events: Mutex<Vec<StackEvent>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeClient {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn push_stack(&self, response: Result<StackDescription, CfnError>) {
        self.describe_stack.lock().unwrap().push_back(response);
    }

    fn push_change_set(&self, response: Result<ChangeSetDescription, CfnError>) {
        self.describe_change_set.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl StackOps for FakeClient {
    async fn describe_stack(&self, _name: &str) -> Result<StackDescription, CfnError> {
        self.record("describe_stack");

        // Stamp pending events at poll time so they land inside the
        // monitor's event window.
        let now = chrono::Utc::now();
        for event in self.events.lock().unwrap().iter_mut() {
            event.timestamp = now;
        }

        self.describe_stack
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted describe_stack call")
    }

    async fn delete_stack(&self, _name: &str) -> Result<(), CfnError> {
        self.record("delete_stack");
        Ok(())
    }

    async fn get_template(&self, _name: &str) -> Result<String, CfnError> {
        self.record("get_template");
        Ok("Resources: {}\n".to_string())
    }

    async fn describe_stack_events(&self, _name: &str) -> Result<Vec<StackEvent>, CfnError> {
        self.record("describe_stack_events");
        Ok(self.events.lock().unwrap().clone())
    }
}

#[async_trait]
impl ChangeSetOps for FakeClient {
    async fn create_change_set(
        &self,
        input: &CreateChangeSetInput,
    ) -> Result<ChangeSetId, CfnError> {
        self.record("create_change_set");
        self.create_change_set
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))?;

        Ok(ChangeSetId {
            stack_name: input.stack_name.clone(),
            change_set_name: input.change_set_name.clone(),
        })
    }

    async fn describe_change_set(
        &self,
        _id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, CfnError> {
        self.record("describe_change_set");
        self.describe_change_set
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted describe_change_set call")
    }

    async fn execute_change_set(&self, _id: &ChangeSetId) -> Result<(), CfnError> {
        self.record("execute_change_set");
        Ok(())
    }
}

#[async_trait]
impl IdentityOps for FakeClient {
    async fn caller_identity(&self) -> Result<CallerIdentity, CfnError> {
        self.record("caller_identity");
        Ok(CallerIdentity {
            account_id: "222222222222".to_string(),
            arn: "arn:aws:iam::222222222222:user/test".to_string(),
        })
    }
}

fn stack(status: &str, outputs: &[(&str, &str)]) -> StackDescription {
    StackDescription {
        name: "mystack".to_string(),
        status: StackStatus::new(status),
        outputs: outputs
            .iter()
            .map(|(k, v)| StackOutput {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect(),
    }
}

fn not_exists() -> CfnError {
    CfnError::from_message("mystack", "Stack with id mystack does not exist".to_string())
}

fn change_set(status: &str, reason: Option<&str>, changes: Vec<ResourceChange>) -> ChangeSetDescription {
    ChangeSetDescription {
        id: ChangeSetId {
            stack_name: "mystack".to_string(),
            change_set_name: "stack-update-test".to_string(),
        },
        status: ChangeSetStatus::new(status),
        status_reason: reason.map(str::to_string),
        changes,
    }
}

fn add_bucket() -> ResourceChange {
    ResourceChange {
        action: ChangeAction::Add,
        resource_type: "AWS::S3::Bucket".to_string(),
        logical_id: "Bucket".to_string(),
        physical_id: None,
        replacement: false,
        details: Vec::new(),
    }
}

fn deployment(protected: bool) -> Deployment {
    Deployment {
        stack_name: "mystack".to_string(),
        template_body: "Resources: {}\n".to_string(),
        protected,
        ..Default::default()
    }
}

fn deployer(client: &FakeClient) -> Deployer<'_, FakeClient> {
    let mut deployer = Deployer::new(client);
    deployer.change_set_interval = Duration::from_millis(1);
    deployer.schedule = PollSchedule {
        fast: Duration::from_millis(1),
        slow: Duration::from_millis(1),
        threshold: 5,
    };
    deployer
}

#[tokio::test]
async fn no_change_skips_execution_and_fetches_outputs() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client
        .create_change_set
        .lock()
        .unwrap()
        .push_back(Err(CfnError::from_message(
            "mystack",
            "The submitted information didn't contain changes.".to_string(),
        )));
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[("Endpoint", "https://x")])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![]);

    deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("No change.\n"));
    assert!(text.contains("Endpoint: https://x\n"));
    assert!(!client.calls().contains(&"execute_change_set"));
    assert!(prompt.asked.is_empty());
}

#[tokio::test]
async fn no_change_reported_as_failed_change_set_also_short_circuits() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client.push_change_set(Ok(change_set(
        "FAILED",
        Some("The submitted information didn't contain changes."),
        Vec::new(),
    )));
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![]);

    deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap();

    assert!(String::from_utf8(out).unwrap().contains("No change.\n"));
    assert!(!client.calls().contains(&"execute_change_set"));
}

#[tokio::test]
async fn declined_creation_aborts_without_mutation() {
    let client = FakeClient::default();
    client.push_stack(Err(not_exists()));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![false]);

    let err = deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::AbortedByUser));
    assert_eq!(
        prompt.asked,
        vec!["\nStack mystack does not exist. Create?".to_string()]
    );
    assert!(!client.calls().contains(&"create_change_set"));
}

#[tokio::test]
async fn fresh_creation_runs_to_complete() {
    let client = FakeClient::default();
    client.push_stack(Err(not_exists()));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));
    client.push_stack(Ok(stack("CREATE_IN_PROGRESS", &[])));
    client.push_stack(Ok(stack("CREATE_COMPLETE", &[])));
    client.push_stack(Ok(stack("CREATE_COMPLETE", &[("BucketName", "mystack-test")])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![true]);

    deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("StackName: mystack\n"));
    assert!(text.contains("+ AWS::S3::Bucket Bucket\n"));
    assert!(text.contains("CREATE_IN_PROGRESS..."));
    assert!(text.contains("CREATE_COMPLETE\n"));
    assert!(text.contains("BucketName: mystack-test\n"));
    assert!(client.calls().contains(&"execute_change_set"));
}

#[tokio::test]
async fn protected_stack_requires_execution_confirmation() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![false]);

    let err = deployer(&client)
        .deploy(&deployment(true), &mut out, &mut prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::AbortedByUser));
    assert_eq!(prompt.asked, vec!["\nExecute change set?".to_string()]);
    assert!(!client.calls().contains(&"execute_change_set"));
}

#[tokio::test]
async fn rolled_back_creation_offers_deletion() {
    let client = FakeClient::default();
    client.push_stack(Err(not_exists()));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));
    client.push_stack(Ok(stack("ROLLBACK_COMPLETE", &[])));
    // Deletion monitor: the stack disappears from describe.
    client.push_stack(Err(not_exists()));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![true, true]);

    deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("ROLLBACK_COMPLETE"));
    assert!(text.contains("DELETE_COMPLETE"));
    assert!(client.calls().contains(&"delete_stack"));
    assert_eq!(
        prompt.asked[1],
        "\nStack failed creation, and must be deleted. Continue?"
    );
}

#[tokio::test]
async fn declined_deletion_still_shows_outputs() {
    let client = FakeClient::default();
    client.push_stack(Err(not_exists()));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));
    client.push_stack(Ok(stack("ROLLBACK_COMPLETE", &[])));
    client.push_stack(Ok(stack("ROLLBACK_COMPLETE", &[("Endpoint", "https://x")])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![true, false]);

    deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap();

    assert!(String::from_utf8(out).unwrap().contains("Endpoint: https://x\n"));
    assert!(!client.calls().contains(&"delete_stack"));
}

#[tokio::test]
async fn failed_update_surfaces_terminal_status() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));
    client.push_stack(Ok(stack("UPDATE_ROLLBACK_FAILED", &[])));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![]);

    let err = deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::StackUpdateFailed { status } if status == "UPDATE_ROLLBACK_FAILED"
    ));
}

#[tokio::test]
async fn removed_change_set_is_fatal() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client.push_change_set(Ok(change_set("DELETE_COMPLETE", None, Vec::new())));

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![]);

    let err = deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::ChangeSetRemoved));
}

#[tokio::test]
async fn failed_events_printed_during_monitoring() {
    let client = FakeClient::default();
    client.push_stack(Ok(stack("UPDATE_COMPLETE", &[])));
    client.push_change_set(Ok(change_set("CREATE_COMPLETE", None, vec![add_bucket()])));
    client.push_stack(Ok(stack("UPDATE_ROLLBACK_FAILED", &[])));

    *client.events.lock().unwrap() = vec![StackEvent {
        timestamp: chrono::Utc::now(),
        resource_type: "AWS::IAM::Role".to_string(),
        logical_id: "Role".to_string(),
        resource_status: "CREATE_FAILED".to_string(),
        reason: Some("not authorized".to_string()),
    }];

    let mut out = Vec::new();
    let mut prompt = ScriptedPrompt::new(vec![]);

    let _ = deployer(&client)
        .deploy(&deployment(false), &mut out, &mut prompt)
        .await;

    assert!(
        String::from_utf8(out)
            .unwrap()
            .contains("Error! AWS::IAM::Role Role: not authorized\n")
    );
}
