use serde::Serialize;
use serde_json::value::RawValue;

/// The inner payload of a `keyChange` request.
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.3.5
#[derive(Serialize)]
pub struct KeyChangeRequest<'a> {
    pub account: &'a str,

    #[serde(rename = "oldKey")]
    pub old_key: &'a RawValue,
}
