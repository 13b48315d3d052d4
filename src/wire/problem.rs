use serde::{Deserialize, Serialize};

use super::identifier::AcmeIdentifier;

/// RFC 7807 problem document, as used throughout RFC 8555.
/// https://datatracker.ietf.org/doc/html/rfc8555#section-6.7
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AcmeProblem {
    /// A URI reference that identifies the problem type, e.g.
    /// "urn:ietf:params:acme:error:badNonce".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// A short, human-readable summary of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The HTTP status code generated by the origin server for this
    /// occurrence of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// The identifier that the error is scoped to, when the problem is
    /// reported as a subproblem of a compound request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<AcmeIdentifier>,

    /// Further, more specific errors, each scoped to one identifier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subproblems: Vec<AcmeProblem>,
}

impl AcmeProblem {
    pub const CONTENT_TYPE: &'static str = "application/problem+json";

    pub fn has_type(&self, problem_type: AcmeProblemType) -> bool {
        self.r#type.as_deref() == Some(problem_type.as_uri())
    }

    pub fn problem_type(&self) -> Option<AcmeProblemType> {
        AcmeProblemType::from_uri(self.r#type.as_deref()?)
    }
}

impl std::fmt::Display for AcmeProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.r#type, &self.detail) {
            (Some(t), Some(d)) => write!(f, "{t}: {d}"),
            (Some(t), None) => write!(f, "{t}"),
            (None, Some(d)) => write!(f, "{d}"),
            (None, None) => write!(f, "acme problem"),
        }
    }
}

/// The standard ACME error subtypes from RFC 8555 section 6.7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcmeProblemType {
    AccountDoesNotExist,
    AlreadyRevoked,
    BadCsr,
    BadNonce,
    BadPublicKey,
    BadRevocationReason,
    BadSignatureAlgorithm,
    Caa,
    Compound,
    Connection,
    Dns,
    ExternalAccountRequired,
    IncorrectResponse,
    InvalidContact,
    Malformed,
    OrderNotReady,
    RateLimited,
    RejectedIdentifier,
    ServerInternal,
    Tls,
    Unauthorized,
    UnsupportedContact,
    UnsupportedIdentifier,
    UserActionRequired,
}

impl AcmeProblemType {
    const PREFIX: &'static str = "urn:ietf:params:acme:error:";

    pub fn as_uri(self) -> &'static str {
        match self {
            Self::AccountDoesNotExist => "urn:ietf:params:acme:error:accountDoesNotExist",
            Self::AlreadyRevoked => "urn:ietf:params:acme:error:alreadyRevoked",
            Self::BadCsr => "urn:ietf:params:acme:error:badCSR",
            Self::BadNonce => "urn:ietf:params:acme:error:badNonce",
            Self::BadPublicKey => "urn:ietf:params:acme:error:badPublicKey",
            Self::BadRevocationReason => "urn:ietf:params:acme:error:badRevocationReason",
            Self::BadSignatureAlgorithm => "urn:ietf:params:acme:error:badSignatureAlgorithm",
            Self::Caa => "urn:ietf:params:acme:error:caa",
            Self::Compound => "urn:ietf:params:acme:error:compound",
            Self::Connection => "urn:ietf:params:acme:error:connection",
            Self::Dns => "urn:ietf:params:acme:error:dns",
            Self::ExternalAccountRequired => "urn:ietf:params:acme:error:externalAccountRequired",
            Self::IncorrectResponse => "urn:ietf:params:acme:error:incorrectResponse",
            Self::InvalidContact => "urn:ietf:params:acme:error:invalidContact",
            Self::Malformed => "urn:ietf:params:acme:error:malformed",
            Self::OrderNotReady => "urn:ietf:params:acme:error:orderNotReady",
            Self::RateLimited => "urn:ietf:params:acme:error:rateLimited",
            Self::RejectedIdentifier => "urn:ietf:params:acme:error:rejectedIdentifier",
            Self::ServerInternal => "urn:ietf:params:acme:error:serverInternal",
            Self::Tls => "urn:ietf:params:acme:error:tls",
            Self::Unauthorized => "urn:ietf:params:acme:error:unauthorized",
            Self::UnsupportedContact => "urn:ietf:params:acme:error:unsupportedContact",
            Self::UnsupportedIdentifier => "urn:ietf:params:acme:error:unsupportedIdentifier",
            Self::UserActionRequired => "urn:ietf:params:acme:error:userActionRequired",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        let suffix = uri.strip_prefix(Self::PREFIX)?;
        Some(match suffix {
            "accountDoesNotExist" => Self::AccountDoesNotExist,
            "alreadyRevoked" => Self::AlreadyRevoked,
            "badCSR" => Self::BadCsr,
            "badNonce" => Self::BadNonce,
            "badPublicKey" => Self::BadPublicKey,
            "badRevocationReason" => Self::BadRevocationReason,
            "badSignatureAlgorithm" => Self::BadSignatureAlgorithm,
            "caa" => Self::Caa,
            "compound" => Self::Compound,
            "connection" => Self::Connection,
            "dns" => Self::Dns,
            "externalAccountRequired" => Self::ExternalAccountRequired,
            "incorrectResponse" => Self::IncorrectResponse,
            "invalidContact" => Self::InvalidContact,
            "malformed" => Self::Malformed,
            "orderNotReady" => Self::OrderNotReady,
            "rateLimited" => Self::RateLimited,
            "rejectedIdentifier" => Self::RejectedIdentifier,
            "serverInternal" => Self::ServerInternal,
            "tls" => Self::Tls,
            "unauthorized" => Self::Unauthorized,
            "unsupportedContact" => Self::UnsupportedContact,
            "unsupportedIdentifier" => Self::UnsupportedIdentifier,
            "userActionRequired" => Self::UserActionRequired,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rfc8555_problem_example() {
        let problem = AcmeProblem::deserialize(json!({
            "type": "urn:ietf:params:acme:error:malformed",
            "detail": "Some of the identifiers requested were rejected",
            "subproblems": [
                {
                    "type": "urn:ietf:params:acme:error:malformed",
                    "detail": "Invalid underscore in DNS name \"_example.org\"",
                    "identifier": {
                        "type": "dns",
                        "value": "_example.org"
                    }
                }
            ]
        }))
        .unwrap();

        assert!(problem.has_type(AcmeProblemType::Malformed));
        assert_eq!(problem.subproblems.len(), 1);
        assert_eq!(
            problem.subproblems[0].identifier,
            Some(AcmeIdentifier::dns("_example.org"))
        );
    }

    #[test]
    fn bad_nonce_round_trips_through_uri() {
        let uri = AcmeProblemType::BadNonce.as_uri();
        assert_eq!(AcmeProblemType::from_uri(uri), Some(AcmeProblemType::BadNonce));
    }
}
