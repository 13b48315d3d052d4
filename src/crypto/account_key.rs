use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use signature::rand_core::OsRng;
use zeroize::Zeroizing;

use crate::base64url;

use super::jws::JwsSigner;

pub trait AccountKey: JwsSigner + Send + Sync + std::fmt::Debug {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>>;
    fn public_jwk(&self) -> anyhow::Result<String>;

    /// RFC 7638 JWK thumbprint: SHA-256 over the canonical public JWK,
    /// base64url-encoded without padding. `public_jwk()` already produces
    /// the canonical (lexicographically key-ordered) serialization, so the
    /// thumbprint is just a hash of its bytes.
    fn thumbprint(&self) -> anyhow::Result<String> {
        let jwk = self.public_jwk()?;
        let digest = Sha256::digest(jwk.as_bytes());
        Ok(base64url::encode(digest))
    }
}

pub trait GenerateAccountKey: AccountKey + Sized {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self;

    fn generate() -> Self {
        Self::generate_rng(OsRng)
    }
}

impl JwsSigner for Box<dyn AccountKey> {
    fn jws_alg(&self) -> &str {
        self.as_ref().jws_alg()
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        self.as_ref().jws_sign(input)
    }
}

impl AccountKey for Box<dyn AccountKey> {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        self.as_ref().private_jwk()
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        self.as_ref().public_jwk()
    }

    fn thumbprint(&self) -> anyhow::Result<String> {
        self.as_ref().thumbprint()
    }
}
