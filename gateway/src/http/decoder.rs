//! Request body decoding.

use thiserror::Error;

use paymock_common::DisbursementRequest;

/// Body rejected by the decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json")]
    InvalidJson(#[source] serde_json::Error),
}

/// Decode a disbursement request body.
///
/// An empty body yields the placeholder request. Otherwise the first JSON
/// value is decoded and its blank fields are filled with placeholders.
pub fn decode_disbursement(body: &[u8]) -> Result<DisbursementRequest, DecodeError> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<DisbursementRequest>();

    match values.next() {
        None => Ok(DisbursementRequest::placeholder()),
        Some(Err(e)) => Err(DecodeError::InvalidJson(e)),
        Some(Ok(request)) => Ok(request.fill_defaults()),
    }
}
