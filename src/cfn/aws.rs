// ABOUTME: AWS SDK implementation of the control-plane traits.
// ABOUTME: Wires the shared config loader and the on-disk credential cache.

use super::{
    CallerIdentity, CfnError, ChangeAction, ChangeSetDescription, ChangeSetId, ChangeSetOps,
    ChangeSetStatus, ChangeSetType, ChangeDetail, ChangeSource, CreateChangeSetInput, Evaluation,
    IdentityOps, Recreation, ResourceChange, StackDescription, StackEvent, StackOps, StackOutput,
    StackStatus,
};
use crate::credentials::{CachedCredentials, CredentialCache};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types as cfn;
use chrono::{DateTime, Utc};
use std::time::SystemTime;

#[derive(Debug, Clone, Default)]
pub struct AwsOptions {
    pub profile: Option<String>,
    pub region: Option<String>,
}

/// Live client over CloudFormation and STS.
pub struct AwsClient {
    cfn: aws_sdk_cloudformation::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsClient {
    pub async fn connect(opts: &AwsOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &opts.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &opts.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let cache = CredentialCache::open_default();
        let profile_key = opts.profile.clone().unwrap_or_else(|| "default".to_string());

        if let Some(cached) = cache.as_ref().and_then(|c| c.load(&profile_key)) {
            tracing::debug!(profile = %profile_key, "using cached credentials");
            loader = loader.credentials_provider(Credentials::new(
                cached.access_key_id,
                cached.secret_access_key,
                cached.session_token,
                None,
                "cirrus-credential-cache",
            ));
            let config = loader.load().await;
            return Self::from_config(&config);
        }

        let config = loader.load().await;

        // Cache the freshly resolved session when it carries an expiry;
        // long-lived static keys are never written to disk.
        if let (Some(cache), Some(provider)) = (&cache, config.credentials_provider()) {
            match provider.provide_credentials().await {
                Ok(creds) => {
                    if let Some(expiry) = creds.expiry() {
                        let entry = CachedCredentials {
                            access_key_id: creds.access_key_id().to_string(),
                            secret_access_key: creds.secret_access_key().to_string(),
                            session_token: creds.session_token().map(str::to_string),
                            expiration: system_time_to_utc(expiry),
                            profile: profile_key.clone(),
                        };
                        if let Err(e) = cache.store(&entry) {
                            tracing::debug!(error = %e, "failed to write credential cache");
                        }
                    }
                }
                Err(e) => tracing::debug!(error = %e, "credential resolution failed"),
            }
        }

        Self::from_config(&config)
    }

    fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self {
            cfn: aws_sdk_cloudformation::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }
}

fn system_time_to_utc(t: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(t)
}

fn smithy_time_to_utc(t: &aws_sdk_cloudformation::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos()).unwrap_or_default()
}

/// Pull the service message out of an SDK error, falling back to the
/// transport-level rendering, then classify it.
fn map_err<E>(stack_name: &str, err: SdkError<E>) -> CfnError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = err
        .as_service_error()
        .and_then(|e| e.message().map(str::to_string))
        .unwrap_or_else(|| err.to_string());
    CfnError::from_message(stack_name, message)
}

#[async_trait]
impl StackOps for AwsClient {
    async fn describe_stack(&self, name: &str) -> Result<StackDescription, CfnError> {
        let out = self
            .cfn
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| map_err(name, e))?;

        let stack = out
            .stacks()
            .first()
            .ok_or_else(|| CfnError::StackNotExists(name.to_string()))?;

        Ok(StackDescription {
            name: stack.stack_name().unwrap_or(name).to_string(),
            status: StackStatus::new(
                stack.stack_status().map(|s| s.as_str()).unwrap_or_default(),
            ),
            outputs: stack
                .outputs()
                .iter()
                .map(|o| StackOutput {
                    key: o.output_key().unwrap_or_default().to_string(),
                    value: o.output_value().unwrap_or_default().to_string(),
                })
                .collect(),
        })
    }

    async fn delete_stack(&self, name: &str) -> Result<(), CfnError> {
        self.cfn
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| map_err(name, e))?;
        Ok(())
    }

    async fn get_template(&self, name: &str) -> Result<String, CfnError> {
        let out = self
            .cfn
            .get_template()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| map_err(name, e))?;
        Ok(out.template_body().unwrap_or_default().to_string())
    }

    async fn describe_stack_events(&self, name: &str) -> Result<Vec<StackEvent>, CfnError> {
        let out = self
            .cfn
            .describe_stack_events()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| map_err(name, e))?;

        Ok(out
            .stack_events()
            .iter()
            .map(|e| StackEvent {
                timestamp: e.timestamp().map(smithy_time_to_utc).unwrap_or_default(),
                resource_type: e.resource_type().unwrap_or_default().to_string(),
                logical_id: e.logical_resource_id().unwrap_or_default().to_string(),
                resource_status: e
                    .resource_status()
                    .map(|s| s.as_str())
                    .unwrap_or_default()
                    .to_string(),
                reason: e.resource_status_reason().map(str::to_string),
            })
            .collect())
    }
}

#[async_trait]
impl ChangeSetOps for AwsClient {
    async fn create_change_set(
        &self,
        input: &CreateChangeSetInput,
    ) -> Result<ChangeSetId, CfnError> {
        let mut req = self
            .cfn
            .create_change_set()
            .stack_name(&input.stack_name)
            .change_set_name(&input.change_set_name)
            .template_body(&input.template_body)
            .capabilities(cfn::Capability::CapabilityIam)
            .capabilities(cfn::Capability::CapabilityNamedIam)
            .change_set_type(match input.change_set_type {
                ChangeSetType::Create => cfn::ChangeSetType::Create,
                ChangeSetType::Update => cfn::ChangeSetType::Update,
            });

        for (key, value) in &input.parameters {
            req = req.parameters(
                cfn::Parameter::builder()
                    .parameter_key(key)
                    .parameter_value(value)
                    .build(),
            );
        }

        req.send().await.map_err(|e| map_err(&input.stack_name, e))?;

        Ok(ChangeSetId {
            stack_name: input.stack_name.clone(),
            change_set_name: input.change_set_name.clone(),
        })
    }

    async fn describe_change_set(
        &self,
        id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, CfnError> {
        let out = self
            .cfn
            .describe_change_set()
            .stack_name(&id.stack_name)
            .change_set_name(&id.change_set_name)
            .send()
            .await
            .map_err(|e| map_err(&id.stack_name, e))?;

        Ok(ChangeSetDescription {
            id: id.clone(),
            status: ChangeSetStatus::new(
                out.status().map(|s| s.as_str()).unwrap_or_default(),
            ),
            status_reason: out.status_reason().map(str::to_string),
            changes: out
                .changes()
                .iter()
                .filter_map(|c| c.resource_change())
                .map(convert_resource_change)
                .collect(),
        })
    }

    async fn execute_change_set(&self, id: &ChangeSetId) -> Result<(), CfnError> {
        self.cfn
            .execute_change_set()
            .stack_name(&id.stack_name)
            .change_set_name(&id.change_set_name)
            .send()
            .await
            .map_err(|e| map_err(&id.stack_name, e))?;
        Ok(())
    }
}

#[async_trait]
impl IdentityOps for AwsClient {
    async fn caller_identity(&self) -> Result<CallerIdentity, CfnError> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_err("", e))?;

        Ok(CallerIdentity {
            account_id: out.account().unwrap_or_default().to_string(),
            arn: out.arn().unwrap_or_default().to_string(),
        })
    }
}

fn convert_resource_change(rc: &cfn::ResourceChange) -> ResourceChange {
    ResourceChange {
        action: match rc.action().map(|a| a.as_str()) {
            Some("Add") => ChangeAction::Add,
            Some("Modify") => ChangeAction::Modify,
            Some("Remove") => ChangeAction::Remove,
            _ => ChangeAction::Unknown,
        },
        resource_type: rc.resource_type().unwrap_or_default().to_string(),
        logical_id: rc.logical_resource_id().unwrap_or_default().to_string(),
        physical_id: rc.physical_resource_id().map(str::to_string),
        replacement: rc.replacement().map(|r| r.as_str()) == Some("True"),
        details: rc.details().iter().map(convert_change_detail).collect(),
    }
}

fn convert_change_detail(detail: &cfn::ResourceChangeDetail) -> ChangeDetail {
    let target = detail.target();

    ChangeDetail {
        attribute: target
            .and_then(|t| t.attribute())
            .map(|a| a.as_str().to_string()),
        property_name: target.and_then(|t| t.name()).map(str::to_string),
        evaluation: match detail.evaluation().map(|e| e.as_str()) {
            Some("Static") => Evaluation::Static,
            _ => Evaluation::Dynamic,
        },
        change_source: match detail.change_source().map(|s| s.as_str()) {
            Some("ResourceReference") => ChangeSource::ResourceReference,
            Some("ParameterReference") => ChangeSource::ParameterReference,
            Some("ResourceAttribute") => ChangeSource::ResourceAttribute,
            Some("DirectModification") => ChangeSource::DirectModification,
            Some("Automatic") => ChangeSource::Automatic,
            other => ChangeSource::Other(other.unwrap_or_default().to_string()),
        },
        causing_entity: detail.causing_entity().map(str::to_string),
        requires_recreation: match target.and_then(|t| t.requires_recreation()).map(|r| r.as_str())
        {
            Some("Always") => Recreation::Always,
            Some("Conditionally") => Recreation::Conditionally,
            _ => Recreation::Never,
        },
    }
}
