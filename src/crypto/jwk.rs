use serde::{Deserialize, Serialize};

/// RSA JWK in the canonical (RFC 7638) lexicographic key order. The EC
/// curve crates (`p256`/`p384`/`p521`) already produce canonically-ordered
/// JWK JSON via their own `to_jwk_string`, so only RSA needs a hand-rolled
/// struct here.
#[derive(Serialize, Deserialize)]
pub struct RsaJwk<'a> {
    pub e: &'a str,
    pub kty: &'a str,
    pub n: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<&'a str>,
}
