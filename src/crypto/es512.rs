use p521::{ecdsa::SigningKey, SecretKey};
use rand::{CryptoRng, RngCore};
use signature::Signer;
use zeroize::Zeroizing;

use super::{
    account_key::{AccountKey, GenerateAccountKey},
    jws::JwsSigner,
};

#[derive(Debug)]
pub struct Es512AccountKey(SecretKey);

pub fn from_jwk(jwk: impl AsRef<str>) -> anyhow::Result<Es512AccountKey> {
    Ok(SecretKey::from_jwk_str(jwk.as_ref())?.into())
}

impl GenerateAccountKey for Es512AccountKey {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self {
        SecretKey::random(rng).into()
    }
}

impl JwsSigner for Es512AccountKey {
    fn jws_alg(&self) -> &str {
        "ES512"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        SigningKey::from(&self.0).sign(input).as_ref().to_vec()
    }
}

impl AccountKey for Es512AccountKey {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        Ok(self.0.to_jwk_string())
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        Ok(self.0.public_key().to_jwk_string())
    }
}

impl From<SecretKey> for Es512AccountKey {
    fn from(secret: SecretKey) -> Self {
        Self(secret)
    }
}

impl From<Es512AccountKey> for SecretKey {
    fn from(key: Es512AccountKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_smoke_test() {
        Es512AccountKey::generate();
    }

    #[test]
    fn sign_smoke_test() {
        Es512AccountKey::generate().jws_sign(b"test");
    }

    #[test]
    fn jws_alg_is_es512() {
        assert_eq!(Es512AccountKey::generate().jws_alg(), "ES512");
    }

    #[test]
    fn private_jwk_round_trips_through_from_jwk() {
        let key = Es512AccountKey::generate();
        let private = key.private_jwk().unwrap();
        let reparsed = from_jwk(private.as_str()).unwrap();
        assert_eq!(reparsed.public_jwk().unwrap(), key.public_jwk().unwrap());
    }
}
