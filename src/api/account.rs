use std::sync::Arc;

use serde_json::value::RawValue;

use crate::{
    crypto::account_key::AccountKey,
    error::{AcmeError, AcmeResult},
    wire::{
        account::{AccountResource, AccountStatus},
        client::{AcmeClient, Auth},
        common::LocationResource,
        identifier::AcmeIdentifier,
        order::NewOrderResource,
    },
};

use super::{account_context::AccountContext, order::Order};

pub struct Account {
    context: Arc<AccountContext>,
    resource: AccountResource,
}

impl Account {
    pub(crate) fn from_resource(
        client: AcmeClient,
        account_key: impl AccountKey + 'static,
        mut resource: AccountResource,
    ) -> AcmeResult<Self> {
        let context = AccountContext {
            client,
            account_key: Box::new(account_key),
            account_url: resource.take_location()?,
        };
        Ok(Self {
            context: Arc::new(context),
            resource,
        })
    }

    pub fn client(&self) -> &AcmeClient {
        &self.context.client
    }

    pub fn key(&self) -> &impl AccountKey {
        &self.context.account_key
    }

    pub fn resource(&self) -> &AccountResource {
        &self.resource
    }

    pub fn url(&self) -> &str {
        &self.context.account_url
    }

    pub fn status(&self) -> AccountStatus {
        self.resource.status
    }

    pub async fn new_order(&self, new_order: &NewOrderResource) -> AcmeResult<Order> {
        let order = context_client_request!(self.context, new_order, new_order).await?;
        Order::from_resource(self.context.clone(), order)
    }

    pub async fn new_dns_order(&self, dns_name: impl Into<String>) -> AcmeResult<Order> {
        let new_order = &NewOrderResource {
            identifiers: vec![AcmeIdentifier::dns(dns_name)],
            ..Default::default()
        };
        self.new_order(new_order).await
    }

    pub async fn get_order(&self, order_url: impl AsRef<str>) -> AcmeResult<Order> {
        let order = context_client_request!(self.context, get_resource, order_url.as_ref()).await?;
        Order::from_resource(self.context.clone(), order)
    }

    pub async fn deactivate(&mut self) -> AcmeResult<()> {
        self.resource = context_client_request!(self.context, account_deactivate).await?;
        Ok(())
    }

    /// Updates the account's contact list. Only `contact` is updateable per
    /// RFC 8555 section 7.3.2; `terms_of_service_agreed` and
    /// `external_account_binding` are immutable once set.
    pub async fn update(&mut self, contacts: Vec<Contact>) -> AcmeResult<()> {
        let update = AccountResource {
            contact: contacts.into_iter().map(Contact::uri).collect(),
            ..Default::default()
        };
        self.resource = context_client_request!(self.context, update_account, &update).await?;
        Ok(())
    }

    /// Rolls this account over to `new_key`, per RFC 8555 section 7.3.5.
    /// The current key signs the outer request; `new_key` signs the inner
    /// proof-of-possession. Consumes `self` and returns the rekeyed account,
    /// since every in-flight `Order`/`Authorization`/`Challenge` still holds
    /// a reference to the old signing context and cannot be silently
    /// repointed at the new key — finish or drop those before rolling.
    pub async fn roll_key(self, new_key: impl AccountKey + 'static) -> AcmeResult<Account> {
        let old_public_jwk = self
            .context
            .account_key
            .public_jwk()
            .map_err(AcmeError::CryptoError)?;
        let old_public_jwk = RawValue::from_string(old_public_jwk)?;
        let new_public_jwk = new_key.public_jwk().map_err(AcmeError::CryptoError)?;
        let new_public_jwk = RawValue::from_string(new_public_jwk)?;

        let resource = self
            .context
            .client
            .key_change(
                &self.context.account_key,
                &old_public_jwk,
                &self.context.account_url,
                &new_key,
                &new_public_jwk,
            )
            .await?;

        let context = Arc::try_unwrap(self.context).map_err(|_| {
            AcmeError::InvalidState(
                "cannot roll an account key while orders or authorizations still hold it"
                    .to_string(),
            )
        })?;
        let context = AccountContext {
            client: context.client,
            account_key: Box::new(new_key),
            account_url: context.account_url,
        };
        Ok(Account {
            context: Arc::new(context),
            resource,
        })
    }

    /// Revokes a certificate issued to this account, authenticated with the
    /// account's own key. RFC 8555 section 7.6 also allows authenticating
    /// with the certificate's own private key instead — for that, use
    /// `Client::revoke_certificate_with_certificate_key`.
    pub async fn revoke_certificate(
        &self,
        certificate_der: &[u8],
        reason: Option<u32>,
    ) -> AcmeResult<()> {
        self.context
            .client
            .revoke_cert(
                &self.context.account_key,
                Auth::kid(&self.context.account_url),
                certificate_der,
                reason,
            )
            .await
    }
}

pub enum Contact {
    Email(String),
    Uri(String),
}

impl Contact {
    pub(crate) fn uri(self) -> String {
        match self {
            Self::Email(email) if !email.starts_with("mailto:") => format!("mailto:{}", email),
            Self::Email(email) => email,
            Self::Uri(uri) => uri,
        }
    }
}
