use openssl::{
    asn1::Asn1Object,
    asn1::Asn1OctetString,
    ec::{EcGroup, EcKey},
    error::ErrorStack,
    hash::MessageDigest,
    nid::Nid,
    pkey::PKey,
    stack::Stack,
    x509::{extension::SubjectAlternativeName, X509Extension, X509NameBuilder, X509ReqBuilder, X509},
};

use crate::{AcmeError, AcmeResult};

/// Generates an EC key and a DER-encoded CSR for `name`, for use in tests
/// and demos. Real callers are expected to bring their own key and CSR
/// (certificate private key generation and CSR encoding are explicitly
/// outside this crate's scope); this exists only because the teacher
/// repo's integration tests needed *something* to finalize an order with.
pub(crate) fn generate_key_and_csr(name: impl AsRef<str>) -> AcmeResult<(String, Vec<u8>)> {
    let ec_group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let key = PKey::from_ec_key(EcKey::generate(ec_group.as_ref())?)?;
    let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8()?).unwrap();

    let mut csr = X509ReqBuilder::new()?;
    csr.set_pubkey(key.as_ref())?;
    let mut extensions = Stack::new()?;
    extensions.push(
        SubjectAlternativeName::new()
            .dns(name.as_ref())
            .build(&csr.x509v3_context(None))?,
    )?;
    csr.add_extensions(extensions.as_ref())?;
    csr.sign(key.as_ref(), MessageDigest::sha256())?;
    let csr_der = csr.build().to_der()?;

    Ok((key_pem, csr_der))
}

/// Builds a self-signed certificate satisfying a TLS-ALPN-01 challenge:
/// subject `identifier`, and a single critical extension at `extension_oid`
/// whose content is `extension_der` (the DER-encoded OCTET STRING the
/// materializer already produced). The caller is responsible for serving
/// this certificate over a TLS handshake that negotiates the `acme-tls/1`
/// ALPN protocol; this crate only builds the bytes.
pub(crate) fn generate_tls_alpn01_certificate(
    identifier: &str,
    extension_oid: &str,
    extension_der: &[u8],
) -> AcmeResult<(String, Vec<u8>)> {
    let ec_group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let key = PKey::from_ec_key(EcKey::generate(ec_group.as_ref())?)?;
    let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8()?).unwrap();

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", identifier)?;
    let name = name.build();

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(key.as_ref())?;

    let not_before = openssl::asn1::Asn1Time::days_from_now(0)?;
    let not_after = openssl::asn1::Asn1Time::days_from_now(7)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;

    let san = SubjectAlternativeName::new()
        .dns(identifier)
        .build(&builder.x509v3_context(None, None))?;
    builder.append_extension(san)?;

    let oid = Asn1Object::from_str(extension_oid)?;
    let value = Asn1OctetString::new_from_bytes(extension_der)?;
    let acme_identifier_ext = X509Extension::new_from_der(&oid, true, &value)?;
    builder.append_extension(acme_identifier_ext)?;

    builder.sign(key.as_ref(), MessageDigest::sha256())?;
    let cert = builder.build();
    let cert_der = cert.to_der()?;

    Ok((key_pem, cert_der))
}

impl From<ErrorStack> for AcmeError {
    fn from(err: ErrorStack) -> Self {
        AcmeError::CryptoError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test() {
        generate_key_and_csr("example.com").unwrap();
    }

    #[test]
    fn tls_alpn01_certificate_smoke_test() {
        let extension_der = [0x04u8, 0x20].iter().chain([0u8; 32].iter()).copied().collect::<Vec<u8>>();
        generate_tls_alpn01_certificate(
            "example.com",
            crate::materialize::TLS_ALPN_01_EXTENSION_OID,
            &extension_der,
        )
        .unwrap();
    }
}
