use serde::Serialize;

/// `revokeCert` request body.
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.6
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCertRequest {
    /// The certificate to be revoked, in the base64url-encoded version of
    /// the DER format.
    pub certificate: String,

    /// One of the CRLReason enum values from RFC 5280 Section 5.3.1, not
    /// interpreted by this crate — it is passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<u32>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn omits_reason_when_absent() {
        let req = RevokeCertRequest {
            certificate: "abc".to_string(),
            reason: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"certificate": "abc"})
        );
    }

    #[test]
    fn includes_reason_when_present() {
        let req = RevokeCertRequest {
            certificate: "abc".to_string(),
            reason: Some(1),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"certificate": "abc", "reason": 1})
        );
    }
}
