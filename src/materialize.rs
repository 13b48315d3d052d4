//! The challenge materializer (component G): a pure function from a
//! challenge + the account key that signed for it, to the bytes a verifier
//! must be able to observe. Publishing those bytes (serving the HTTP file,
//! publishing the DNS record, terminating the TLS-ALPN-01 handshake) is the
//! caller's problem — this module only derives *what* to publish.

use sha2::{Digest, Sha256};

use crate::{
    base64url,
    crypto::account_key::AccountKey,
    error::{AcmeError, AcmeResult},
    wire::challenge::{
        ChallengeResource, CHALLENGE_TYPE_DNS_01, CHALLENGE_TYPE_HTTP_01,
        CHALLENGE_TYPE_TLS_ALPN_01,
    },
};

/// `token || "." || JWK-thumbprint`, the building block every challenge
/// type's response is derived from (RFC 8555 section 8.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAuthorization(String);

impl KeyAuthorization {
    pub fn new(token: &str, account_key: &impl AccountKey) -> AcmeResult<Self> {
        let thumbprint = account_key.thumbprint().map_err(AcmeError::CryptoError)?;
        Ok(Self(format!("{token}.{thumbprint}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sha256(&self) -> [u8; 32] {
        Sha256::digest(self.0.as_bytes()).into()
    }
}

impl std::fmt::Display for KeyAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a verifier needs to be able to observe in order to validate one
/// challenge type. Modeled as a tagged variant per-type, not an inheritance
/// hierarchy: only the union of fields each type actually needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeResponse {
    /// Serve `body` with `Content-Type: application/octet-stream` at
    /// `http://{identifier}/.well-known/acme-challenge/{token}`.
    Http01 {
        token: String,
        body: String,
        well_known_path: String,
    },

    /// Publish a TXT record at `_acme-challenge.{identifier}` with this
    /// value (base64url, unpadded, exactly 43 characters).
    Dns01 {
        record_name: String,
        record_value: String,
    },

    /// Serve a self-signed certificate for `{identifier}` over a TLS
    /// handshake that negotiates ALPN protocol `acme-tls/1`, carrying a
    /// critical extension (OID 1.3.6.1.5.5.7.1.31) whose content is this
    /// DER-encoded OCTET STRING.
    TlsAlpn01 {
        identifier: String,
        extension_oid: &'static str,
        extension_der: Vec<u8>,
    },
}

pub static TLS_ALPN_01_EXTENSION_OID: &str = "1.3.6.1.5.5.7.1.31";
pub static TLS_ALPN_01_PROTOCOL: &str = "acme-tls/1";

/// Derives the publishable challenge response for `challenge`, scoped to
/// `identifier` (the DNS name the authorization is for) and signed by
/// `account_key`. Deterministic for fixed inputs.
pub fn materialize(
    challenge: &ChallengeResource,
    identifier: &str,
    account_key: &impl AccountKey,
) -> AcmeResult<ChallengeResponse> {
    let token = challenge
        .token
        .as_deref()
        .ok_or(AcmeError::MissingExpectedField("token"))?;
    let key_authz = KeyAuthorization::new(token, account_key)?;

    match challenge.type_.as_str() {
        t if t == CHALLENGE_TYPE_HTTP_01 => Ok(ChallengeResponse::Http01 {
            token: token.to_string(),
            body: key_authz.as_str().to_string(),
            well_known_path: format!("/.well-known/acme-challenge/{token}"),
        }),
        t if t == CHALLENGE_TYPE_DNS_01 => Ok(ChallengeResponse::Dns01 {
            record_name: format!("_acme-challenge.{identifier}"),
            record_value: base64url::encode(Sha256::digest(key_authz.as_str().as_bytes())),
        }),
        t if t == CHALLENGE_TYPE_TLS_ALPN_01 => Ok(ChallengeResponse::TlsAlpn01 {
            identifier: identifier.to_string(),
            extension_oid: TLS_ALPN_01_EXTENSION_OID,
            extension_der: octet_string_der(&key_authz.sha256()),
        }),
        other => Err(AcmeError::CryptoError(anyhow::anyhow!(
            "unsupported challenge type {other}"
        ))),
    }
}

/// Hand-rolled ASN.1 DER encoding of an OCTET STRING, short-form length
/// only (the 32-byte SHA-256 digest this is always called with never needs
/// long-form length).
fn octet_string_der(content: &[u8]) -> Vec<u8> {
    assert!(content.len() < 128, "long-form DER length not implemented");
    let mut der = Vec::with_capacity(2 + content.len());
    der.push(0x04); // OCTET STRING tag
    der.push(content.len() as u8);
    der.extend_from_slice(content);
    der
}
