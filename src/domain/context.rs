//! Sales-channel context resolved per storefront request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

/// Id of the live (non-draft) data version.
pub const LIVE_VERSION_ID: Uuid = Uuid::from_u128(0x0fa9_1ce3_e96a_4bc2_be4b_d9ce_752c_3425);

/// How prices are presented in a sales channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxState {
    Gross,
    Net,
    TaxFree,
}

impl TaxState {
    pub const fn as_str(self) -> &'static str {
        match self {
            TaxState::Gross => "gross",
            TaxState::Net => "net",
            TaxState::TaxFree => "tax-free",
        }
    }
}

impl fmt::Display for TaxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxState {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gross" => Ok(TaxState::Gross),
            "net" => Ok(TaxState::Net),
            "tax-free" => Ok(TaxState::TaxFree),
            other => Err(DomainError::unknown_variant("tax state", other)),
        }
    }
}

/// Everything about the current shopper session that can change what a page
/// looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesChannelContext {
    pub token: String,
    pub sales_channel_id: Uuid,
    pub domain_id: Option<Uuid>,
    pub language_id: Uuid,
    /// Requested language first, then its fallbacks.
    pub language_chain: Vec<Uuid>,
    pub currency_id: Uuid,
    pub customer_group_id: Uuid,
    pub country_id: Uuid,
    pub tax_state: TaxState,
    pub rule_ids: Vec<Uuid>,
    pub version_id: Uuid,
}

/// Input for resolving a [`SalesChannelContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextParameters {
    pub sales_channel_id: Uuid,
    pub token: String,
    pub language_id: Option<Uuid>,
    pub currency_id: Option<Uuid>,
    pub domain_id: Option<Uuid>,
}

impl ContextParameters {
    /// Parameters for a throwaway context that is not bound to any session.
    pub fn with_random_token(
        sales_channel_id: Uuid,
        language_id: Option<Uuid>,
        currency_id: Option<Uuid>,
        domain_id: Option<Uuid>,
    ) -> Self {
        Self {
            sales_channel_id,
            token: Uuid::new_v4().simple().to_string(),
            language_id,
            currency_id,
            domain_id,
        }
    }
}
