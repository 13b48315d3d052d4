use std::{future::Future, sync::Arc, time::Instant};

use crate::{
    base64url,
    error::{AcmeError, AcmeResult},
    pem,
    wire::order::{OrderResource, OrderStatus},
    wire::{
        common::{LocationResource, ResourceStatus},
        order::FinalizeOrder,
    },
};

use super::{
    account_context::AccountContext,
    authorization::Authorization,
    dns_identifier::DnsIdentifier,
    poll::{Cancel, PollingPolicy},
};

/// A downloaded certificate chain: the leaf certificate's DER is
/// `der_chain[0]`, followed by intermediates in the order the server sent
/// them. `alternate_urls` lists any other chains the server offered via
/// `Link: rel="alternate"` (RFC 8555 section 7.4.2) — callers that dislike
/// the default chain can re-fetch one of these through the same client.
pub struct CertificateChain {
    pub pem: String,
    pub der_chain: Vec<Vec<u8>>,
    pub alternate_urls: Vec<String>,
}

pub struct Order {
    context: Arc<AccountContext>,
    resource: OrderResource,
    url: String,
}

impl Order {
    pub(crate) fn from_resource(
        context: Arc<AccountContext>,
        mut resource: OrderResource,
    ) -> AcmeResult<Self> {
        let url = resource.take_location()?;
        Ok(Self {
            context,
            resource,
            url,
        })
    }

    pub fn resource(&self) -> &OrderResource {
        &self.resource
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> OrderStatus {
        self.resource.status
    }

    pub fn status_result(&self) -> AcmeResult<OrderStatus> {
        if let Some(ref problem) = self.resource.error {
            Err(AcmeError::AcmeProblem(problem.clone()))
        } else {
            self.status().as_result()
        }
    }

    pub fn state(&mut self) -> OrderState<'_> {
        use OrderStatus::*;
        match self.resource.status {
            Pending => OrderState::Pending(OrderStatePending(self)),
            Ready => OrderState::Ready(OrderStateReady(self)),
            Processing => OrderState::Processing,
            Valid => OrderState::Valid(OrderStateValid(self)),
            Invalid => OrderState::Invalid,
        }
    }

    pub fn state_result(&mut self) -> AcmeResult<OrderState<'_>> {
        self.status_result()?;
        Ok(self.state())
    }

    pub fn dns_name(&self) -> Option<DnsIdentifier> {
        DnsIdentifier::find_acme_identifier(&self.resource.identifiers, false)
    }

    pub async fn refresh(&mut self) -> AcmeResult<OrderStatus> {
        self.resource = context_client_request!(self.context, get_resource, self.url()).await?;
        Ok(self.status())
    }

    /// Polls until the order reaches `valid` or `invalid`, honoring the
    /// server's `Retry-After` header over `policy`'s own backoff, and
    /// stopping early if `cancel` is signalled or `policy.deadline` elapses.
    pub async fn poll_until_terminal<AsyncSleep, SleepFuture>(
        &mut self,
        policy: &PollingPolicy,
        cancel: &Cancel,
        mut sleep: AsyncSleep,
    ) -> AcmeResult<OrderStatus>
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
            let (resource, retry_after) =
                context_client_request!(self.context, get_resource_with_retry_after, self.url())
                    .await?;
            self.resource = resource;
            if self.status().is_terminal() {
                return Ok(self.status());
            }
            if policy.deadline_exceeded(started) {
                return Err(AcmeError::Timeout("order"));
            }
            sleep(policy.next_interval(attempt, retry_after)).await;
            attempt += 1;
        }
    }

    /// Submits the CSR to finalize this order, failing with
    /// `AcmeError::StateViolation` rather than panicking or silently no-oping
    /// if the order isn't `ready` yet. Prefer `state()`/`OrderStateReady`
    /// when the typestate is already in hand; this exists for callers
    /// (and tests) driving the order by URL alone.
    pub async fn finalize(&mut self, csr_der: impl AsRef<[u8]>) -> AcmeResult<OrderState<'_>> {
        if self.status() != OrderStatus::Ready {
            return Err(AcmeError::StateViolation {
                expected: "ready",
                actual: format!("{:?}", self.status()).to_ascii_lowercase(),
            });
        }
        match self.state() {
            OrderState::Ready(mut ready) => ready.finalize(csr_der).await,
            _ => unreachable!("status checked above"),
        }
    }
}

pub enum OrderState<'a> {
    Pending(OrderStatePending<'a>),
    Ready(OrderStateReady<'a>),
    Processing,
    Valid(OrderStateValid<'a>),
    Invalid,
}

pub struct OrderStatePending<'a>(&'a Order);

impl<'a> OrderStatePending<'a> {
    pub fn authorization_urls(&self) -> std::slice::Iter<'a, String> {
        self.0.resource.authorizations.iter()
    }

    pub fn only_authorization_url(&self) -> AcmeResult<&'a str> {
        let authzs = &self.0.resource.authorizations;
        if authzs.len() == 1 {
            Ok(&authzs[0])
        } else {
            Err(AcmeError::InvalidState(format!(
                "expected 1 item in authorizations list; got {}",
                authzs.len()
            )))
        }
    }

    pub fn get_authorizations(&self) -> impl Iterator + 'a {
        self.authorization_urls()
            .map(|authorization_url| Authorization::get(self.0.context.clone(), authorization_url))
    }

    pub async fn get_only_authorization(&self) -> AcmeResult<Authorization> {
        let authorization_url = self.only_authorization_url()?;
        Authorization::get(self.0.context.clone(), authorization_url).await
    }
}

pub struct OrderStateReady<'a>(&'a mut Order);

impl<'a> OrderStateReady<'a> {
    pub async fn finalize(&mut self, csr_der: impl AsRef<[u8]>) -> AcmeResult<OrderState<'_>> {
        let finalize_order = &FinalizeOrder {
            csr: base64url::encode(csr_der),
        };
        let finalize_url = self
            .0
            .resource
            .finalize
            .as_deref()
            .ok_or(AcmeError::MissingExpectedField("finalize"))?;
        self.0.resource =
            context_client_request!(self.0.context, finalize_order, finalize_url, finalize_order)
                .await?;
        Ok(self.0.state())
    }

    #[cfg(feature = "x509")]
    // Returns PEM-encoded private key
    pub async fn finalize_with_generated_key(&mut self) -> AcmeResult<String> {
        let dns_ident = self
            .0
            .dns_name()
            .ok_or(AcmeError::InvalidState("not a DNS order".to_string()))?;

        let (key_pem, csr_der) = crate::x509::generate_key_and_csr(dns_ident.as_ref())?;

        self.finalize(csr_der).await?;

        Ok(key_pem)
    }
}

pub struct OrderStateValid<'a>(&'a Order);

impl<'a> OrderStateValid<'a> {
    pub async fn get_certificate_chain(&self) -> AcmeResult<CertificateChain> {
        let certificate_url = self
            .0
            .resource
            .certificate
            .as_deref()
            .ok_or(AcmeError::MissingExpectedField("certificate"))?;
        let response =
            context_client_request!(self.0.context, get_certificate_chain, certificate_url)
                .await?;
        let der_chain = pem::split_certificate_chain(&response.pem)?;
        Ok(CertificateChain {
            pem: response.pem,
            der_chain,
            alternate_urls: response.alternate_urls,
        })
    }
}
