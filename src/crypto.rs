pub mod account_key;
pub mod es256;
pub mod es384;
pub mod es512;
pub mod jws;
pub mod rs256;

pub(crate) mod jwk;

use account_key::{AccountKey, GenerateAccountKey};
use es256::Es256AccountKey;

use crate::{AcmeError, AcmeResult};

/// Generates a fresh account key using the algorithm this crate defaults
/// new accounts to. ES256 is the cheapest of the four supported algorithms
/// to generate and sign with, and what most ACME servers recommend.
pub fn generate_account_key() -> impl AccountKey {
    Es256AccountKey::generate()
}

pub fn account_key_from_jwk(jwk: impl AsRef<str>) -> AcmeResult<Box<dyn AccountKey>> {
    let jwk = jwk.as_ref();
    if let Ok(key) = es256::from_jwk(jwk) {
        Ok(Box::new(key))
    } else if let Ok(key) = es384::from_jwk(jwk) {
        Ok(Box::new(key))
    } else if let Ok(key) = es512::from_jwk(jwk) {
        Ok(Box::new(key))
    } else if let Ok(key) = rs256::from_jwk(jwk) {
        Ok(Box::new(key))
    } else {
        Err(AcmeError::CryptoError(anyhow::anyhow!(
            "couldn't decode account key from JWK"
        )))
    }
}
