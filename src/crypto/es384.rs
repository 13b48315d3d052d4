use p384::{ecdsa::SigningKey, SecretKey};
use rand::{CryptoRng, RngCore};
use signature::Signer;
use zeroize::Zeroizing;

use super::{
    account_key::{AccountKey, GenerateAccountKey},
    jws::JwsSigner,
};

#[derive(Debug)]
pub struct Es384AccountKey(SecretKey);

pub fn from_jwk(jwk: impl AsRef<str>) -> anyhow::Result<Es384AccountKey> {
    Ok(SecretKey::from_jwk_str(jwk.as_ref())?.into())
}

impl GenerateAccountKey for Es384AccountKey {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self {
        SecretKey::random(rng).into()
    }
}

impl JwsSigner for Es384AccountKey {
    fn jws_alg(&self) -> &str {
        "ES384"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        SigningKey::from(&self.0).sign(input).as_ref().to_vec()
    }
}

impl AccountKey for Es384AccountKey {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        Ok(self.0.to_jwk_string())
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        Ok(self.0.public_key().to_jwk_string())
    }
}

impl From<SecretKey> for Es384AccountKey {
    fn from(secret: SecretKey) -> Self {
        Self(secret)
    }
}

impl From<Es384AccountKey> for SecretKey {
    fn from(key: Es384AccountKey) -> Self {
        key.0
    }
}
