use std::{future::Future, sync::Arc, time::Instant};

use crate::{
    error::{AcmeError, AcmeResult},
    wire::challenge::ChallengeResource,
    wire::{
        authorization::{AuthorizationResource, AuthorizationStatus},
        common::ResourceStatus,
        identifier::AcmeIdentifier,
    },
};

use super::{
    account_context::AccountContext,
    challenge::Challenge,
    dns_identifier::DnsIdentifier,
    poll::{Cancel, PollingPolicy},
};

pub struct Authorization {
    context: Arc<AccountContext>,
    resource: AuthorizationResource,
    url: String,
    dns_identifier: Option<DnsIdentifier>,
    challenges: Vec<Arc<ChallengeResource>>,
}

impl Authorization {
    pub(crate) async fn get(context: Arc<AccountContext>, url: &str) -> AcmeResult<Self> {
        let mut resource = context_client_request!(context, get_authorization, url).await?;
        let dns_identifier =
            DnsIdentifier::from_acme_identifier(&resource.identifier, resource.wildcard);
        let challenges = (&mut resource.challenges).drain(..).map(Arc::new).collect();
        Ok(Self {
            context,
            resource,
            url: url.to_string(),
            dns_identifier,
            challenges,
        })
    }

    /// The bare identifier a challenge response is scoped to — for a
    /// wildcard authorization this is the base name with `*.` stripped,
    /// since DNS-01/HTTP-01/TLS-ALPN-01 are all published against the base
    /// name, never the literal `*.` form.
    fn materialize_identifier(&self) -> &str {
        self.dns_identifier
            .as_ref()
            .map(DnsIdentifier::without_wildcard)
            .unwrap_or(self.resource.identifier.value.as_str())
    }

    pub fn resource(&self) -> &AuthorizationResource {
        &self.resource
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.resource.status
    }

    pub fn status_result(&self) -> AcmeResult<AuthorizationStatus> {
        self.status().as_result()
    }

    pub fn identifier(&self) -> &AcmeIdentifier {
        &self.resource.identifier
    }

    pub fn dns_identifier(&self) -> Option<&DnsIdentifier> {
        self.dns_identifier.as_ref()
    }

    pub fn challenges(&self) -> impl Iterator<Item = Challenge> + '_ {
        let identifier = self.materialize_identifier().to_string();
        self.challenges.iter().map(move |resource| {
            Challenge::new(self.context.clone(), resource.clone(), identifier.clone())
        })
    }

    pub fn find_challenge_type(&self, challenge_type: &str) -> Option<Challenge> {
        let identifier = self.materialize_identifier().to_string();
        self.challenges.iter().find_map(|resource| {
            if resource.type_ == challenge_type {
                Some(Challenge::new(
                    self.context.clone(),
                    resource.clone(),
                    identifier.clone(),
                ))
            } else {
                None
            }
        })
    }

    pub async fn refresh(&mut self) -> AcmeResult<AuthorizationStatus> {
        self.refresh_with_retry_after().await.map(|(status, _)| status)
    }

    async fn refresh_with_retry_after(
        &mut self,
    ) -> AcmeResult<(AuthorizationStatus, Option<std::time::Duration>)> {
        let (mut resource, retry_after) = context_client_request!(
            self.context,
            get_authorization_with_retry_after,
            self.url()
        )
        .await?;
        self.challenges = (&mut resource.challenges).drain(..).map(Arc::new).collect();
        self.resource = resource;
        Ok((self.status(), retry_after))
    }

    /// Polls until the authorization reaches a terminal status (`valid`,
    /// `invalid`, `deactivated`, `expired`, or `revoked`), honoring the
    /// server's `Retry-After` header over `policy`'s own backoff.
    pub async fn poll_until_terminal<AsyncSleep, SleepFuture>(
        &mut self,
        policy: &PollingPolicy,
        cancel: &Cancel,
        mut sleep: AsyncSleep,
    ) -> AcmeResult<AuthorizationStatus>
    where
        AsyncSleep: FnMut(std::time::Duration) -> SleepFuture + Send,
        SleepFuture: Future<Output = ()> + Send,
    {
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(AcmeError::Cancelled);
            }
            let (status, retry_after) = self.refresh_with_retry_after().await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if policy.deadline_exceeded(started) {
                return Err(AcmeError::Timeout("authorization"));
            }
            sleep(policy.next_interval(attempt, retry_after)).await;
            attempt += 1;
        }
    }
}
