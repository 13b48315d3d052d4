use rand::{CryptoRng, RngCore};
use rsa::pkcs1v15::SigningKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use sha2::Sha256;
use signature::Signer;
use zeroize::Zeroizing;

use crate::base64url;

use super::{
    account_key::{AccountKey, GenerateAccountKey},
    jwk::RsaJwk,
    jws::JwsSigner,
};

/// RSA key size used when generating a fresh account key. 2048 bits is the
/// floor RFC 8555 implementations accept in practice (Let's Encrypt's
/// Boulder rejects smaller keys).
const GENERATED_KEY_BITS: usize = 2048;

#[derive(Debug)]
pub struct Rs256AccountKey(RsaPrivateKey);

pub fn from_jwk(jwk: impl AsRef<str>) -> anyhow::Result<Rs256AccountKey> {
    let parsed: RsaJwk = serde_json::from_str(jwk.as_ref())?;
    if parsed.kty != "RSA" {
        anyhow::bail!("invalid JWK for RSA private key");
    }
    let d = parsed
        .d
        .ok_or_else(|| anyhow::anyhow!("JWK is missing private exponent \"d\""))?;
    let n = BigUint::from_bytes_be(&base64url::decode(parsed.n)?);
    let e = BigUint::from_bytes_be(&base64url::decode(parsed.e)?);
    let d = BigUint::from_bytes_be(&base64url::decode(d)?);
    let key = RsaPrivateKey::from_components(n, e, d, Vec::new())?;
    Ok(Rs256AccountKey(key))
}

impl GenerateAccountKey for Rs256AccountKey {
    fn generate_rng(mut rng: impl CryptoRng + RngCore) -> Self {
        let key =
            RsaPrivateKey::new(&mut rng, GENERATED_KEY_BITS).expect("RSA key generation failed");
        Rs256AccountKey(key)
    }
}

impl JwsSigner for Rs256AccountKey {
    fn jws_alg(&self) -> &str {
        "RS256"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        let signing_key = SigningKey::<Sha256>::new(self.0.clone());
        signing_key.sign(input).to_bytes().to_vec()
    }
}

impl AccountKey for Rs256AccountKey {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        let n = base64url::encode(self.0.n().to_bytes_be());
        let e = base64url::encode(self.0.e().to_bytes_be());
        let d = base64url::encode(self.0.d().to_bytes_be());
        let jwk = RsaJwk {
            e: e.as_ref(),
            kty: "RSA",
            n: n.as_ref(),
            d: Some(d.as_ref()),
        };
        Ok(Zeroizing::new(serde_json::to_string(&jwk)?))
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        let n = base64url::encode(self.0.n().to_bytes_be());
        let e = base64url::encode(self.0.e().to_bytes_be());
        let jwk = RsaJwk {
            e: e.as_ref(),
            kty: "RSA",
            n: n.as_ref(),
            d: None,
        };
        Ok(serde_json::to_string(&jwk)?)
    }
}

impl From<RsaPrivateKey> for Rs256AccountKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl From<Rs256AccountKey> for RsaPrivateKey {
    fn from(key: Rs256AccountKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_smoke_test() {
        Rs256AccountKey::generate();
    }

    #[test]
    fn sign_smoke_test() {
        Rs256AccountKey::generate().jws_sign(b"test");
    }

    #[test]
    fn jws_alg_is_rs256() {
        assert_eq!(Rs256AccountKey::generate().jws_alg(), "RS256");
    }

    #[test]
    fn public_jwk_field_order_is_canonical() {
        let key = Rs256AccountKey::generate();
        let jwk = key.public_jwk().unwrap();
        let e_pos = jwk.find("\"e\"").unwrap();
        let kty_pos = jwk.find("\"kty\"").unwrap();
        let n_pos = jwk.find("\"n\"").unwrap();
        assert!(e_pos < kty_pos);
        assert!(kty_pos < n_pos);
    }

    #[test]
    fn private_jwk_round_trips_through_from_jwk() {
        let key = Rs256AccountKey::generate();
        let private = key.private_jwk().unwrap();
        let reparsed = from_jwk(private.as_str()).unwrap();
        assert_eq!(reparsed.public_jwk().unwrap(), key.public_jwk().unwrap());
    }
}
