//! MessagePack payloads for registry calls.
//!
//! Structs are written as maps keyed by field name so a registry built in
//! another language can read them without knowing field order.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::NetError;

/// # Errors
///
/// Returns [`NetError::Encode`] if `value` cannot be serialised.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, NetError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// # Errors
///
/// Returns [`NetError::Decode`] if `bytes` are not a valid `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NetError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
