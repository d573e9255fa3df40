//! Disbursement request, response and webhook payload types.

use serde::{Deserialize, Serialize};

use crate::{
    disbursement_id, format_rfc3339, format_rfc3339_nanos, now, null_as_default, short_hash,
    webhook_id, DisbursementStatus,
};

/// Placeholder values used when a request leaves a field blank.
pub mod defaults {
    /// Prefix of generated external ids.
    pub const EXTERNAL_ID_PREFIX: &str = "xamock_ext_";
    /// Amount in minor units.
    pub const AMOUNT: i64 = 10_000;
    /// Bank code.
    pub const BANK_CODE: &str = "BCA";
    /// Account holder name.
    pub const ACCOUNT_HOLDER_NAME: &str = "xamock user";
    /// Account number.
    pub const ACCOUNT_NUMBER: &str = "xamock-1234567890";
    /// Description, which doubles as the batch topup id.
    pub const DESCRIPTION: &str = "xamock disbursement";
}

/// Inbound disbursement request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisbursementRequest {
    /// Caller-chosen idempotency key.
    #[serde(deserialize_with = "null_as_default")]
    pub external_id: String,
    /// Amount in minor units.
    #[serde(deserialize_with = "null_as_default")]
    pub amount: i64,
    /// Destination bank code.
    #[serde(deserialize_with = "null_as_default")]
    pub bank_code: String,
    /// Destination account holder.
    #[serde(deserialize_with = "null_as_default")]
    pub account_holder_name: String,
    /// Destination account number.
    #[serde(deserialize_with = "null_as_default")]
    pub account_number: String,
    /// Free-form description. Scenario batches match on it as the topup id.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub email_to: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub email_cc: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub email_bcc: Vec<String>,
}

impl DisbursementRequest {
    /// Request used when the caller sends no body at all.
    ///
    /// The external id is derived from the current time so that every
    /// placeholder request is a new identity.
    pub fn placeholder() -> Self {
        Self {
            external_id: format!(
                "{}{}",
                defaults::EXTERNAL_ID_PREFIX,
                short_hash(&format_rfc3339_nanos(now()))
            ),
            amount: defaults::AMOUNT,
            bank_code: defaults::BANK_CODE.to_string(),
            account_holder_name: defaults::ACCOUNT_HOLDER_NAME.to_string(),
            account_number: defaults::ACCOUNT_NUMBER.to_string(),
            description: defaults::DESCRIPTION.to_string(),
            ..Default::default()
        }
    }

    /// Replace every blank or zero field with its placeholder value.
    pub fn fill_defaults(mut self) -> Self {
        let placeholder = Self::placeholder();

        if self.external_id.is_empty() {
            self.external_id = placeholder.external_id;
        }
        if self.amount == 0 {
            self.amount = placeholder.amount;
        }
        if self.bank_code.is_empty() {
            self.bank_code = placeholder.bank_code;
        }
        if self.account_holder_name.is_empty() {
            self.account_holder_name = placeholder.account_holder_name;
        }
        if self.account_number.is_empty() {
            self.account_number = placeholder.account_number;
        }
        if self.description.is_empty() {
            self.description = placeholder.description;
        }

        self
    }
}

/// Synchronous response to a disbursement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementResponse {
    pub id: String,
    pub user_id: String,
    pub external_id: String,
    pub amount: i64,
    pub bank_code: String,
    pub account_holder_name: String,
    pub disbursement_description: String,
    pub status: DisbursementStatus,
    pub created: String,
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_bcc: Vec<String>,
}

impl DisbursementResponse {
    /// Build the response for a decided request.
    pub fn build(request: &DisbursementRequest, status: DisbursementStatus, user_id: &str) -> Self {
        let timestamp = format_rfc3339(now());
        Self {
            id: disbursement_id(&request.external_id),
            user_id: user_id.to_string(),
            external_id: request.external_id.clone(),
            amount: request.amount,
            bank_code: request.bank_code.clone(),
            account_holder_name: request.account_holder_name.clone(),
            disbursement_description: request.description.clone(),
            status,
            created: timestamp.clone(),
            updated: timestamp,
            failure_code: None,
            email_to: request.email_to.clone(),
            email_cc: request.email_cc.clone(),
            email_bcc: request.email_bcc.clone(),
        }
    }
}

/// Webhook body delivered to the system under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub id: String,
    pub created: String,
    pub updated: String,
    pub external_id: String,
    pub user_id: String,
    pub amount: i64,
    pub bank_code: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub disbursement_description: String,
    pub status: DisbursementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<String>,
    pub is_instant: bool,
    #[serde(rename = "webhookId")]
    pub webhook_id: String,
}

impl CallbackPayload {
    /// Build the webhook body for a decided request.
    pub fn build(request: &DisbursementRequest, status: DisbursementStatus, user_id: &str) -> Self {
        let timestamp = format_rfc3339(now());
        let id = disbursement_id(&request.external_id);
        Self {
            webhook_id: webhook_id(&id, status),
            id,
            created: timestamp.clone(),
            updated: timestamp,
            external_id: request.external_id.clone(),
            user_id: user_id.to_string(),
            amount: request.amount,
            bank_code: request.bank_code.clone(),
            account_holder_name: request.account_holder_name.clone(),
            account_number: request.account_number.clone(),
            disbursement_description: request.description.clone(),
            status,
            failure_code: None,
            is_instant: false,
        }
    }
}
