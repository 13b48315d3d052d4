//! Splits a PEM certificate chain into its DER-encoded entries, in the
//! order the server sent them (leaf first, per RFC 8555 section 7.4.2).
//! This crate never parses certificate contents — callers that need
//! subject names, validity periods, or key material should hand the DER
//! to a certificate-parsing crate of their own choosing.

use crate::error::{AcmeError, AcmeResult};

const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const END: &str = "-----END CERTIFICATE-----";

pub fn split_certificate_chain(pem: &str) -> AcmeResult<Vec<Vec<u8>>> {
    let mut der_entries = Vec::new();
    let mut rest = pem;
    while let Some(begin_at) = rest.find(BEGIN) {
        let after_begin = &rest[begin_at + BEGIN.len()..];
        let end_at = after_begin
            .find(END)
            .ok_or_else(|| AcmeError::CryptoError(anyhow::anyhow!("unterminated PEM block")))?;
        let body: String = after_begin[..end_at].chars().filter(|c| !c.is_whitespace()).collect();
        let der = base64::decode(body).map_err(|e| AcmeError::CryptoError(anyhow::anyhow!(e)))?;
        der_entries.push(der);
        rest = &after_begin[end_at + END.len()..];
    }
    if der_entries.is_empty() {
        return Err(AcmeError::CryptoError(anyhow::anyhow!(
            "no PEM CERTIFICATE blocks found"
        )));
    }
    Ok(der_entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pem_block(tag: u8) -> String {
        let der = [tag; 16];
        format!(
            "{}\n{}\n{}\n",
            BEGIN,
            base64::encode_config(der, base64::STANDARD),
            END
        )
    }

    #[test]
    fn splits_multiple_certificates_in_order() {
        let pem = format!("{}{}", fake_pem_block(1), fake_pem_block(2));
        let chain = split_certificate_chain(&pem).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], vec![1u8; 16]);
        assert_eq!(chain[1], vec![2u8; 16]);
    }

    #[test]
    fn single_certificate() {
        let pem = fake_pem_block(7);
        let chain = split_certificate_chain(&pem).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0], vec![7u8; 16]);
    }

    #[test]
    fn empty_input_errors() {
        split_certificate_chain("not a pem file").unwrap_err();
    }
}
