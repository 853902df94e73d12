//! Cache key and tag derivation for error pages.
//!
//! A key is the page name followed by a digest of every context field that can
//! change the rendered page. Tags are plain strings used for group revocation.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::context::{SalesChannelContext, TaxState};

/// Tag carried by every cached error page.
pub const ALL_TAG: &str = "error-page";

const NAME_PREFIX: &str = "error-page-";

/// Page name shared by the key prefix and the page-specific tag.
///
/// Missing ids contribute an empty segment.
pub fn build_name(
    sales_channel_id: Option<Uuid>,
    domain_id: Option<Uuid>,
    language_id: Option<Uuid>,
) -> String {
    let mut name = String::with_capacity(NAME_PREFIX.len() + 3 * 32);
    name.push_str(NAME_PREFIX);
    for id in [sales_channel_id, domain_id, language_id].into_iter().flatten() {
        name.push_str(&id.simple().to_string());
    }
    name
}

/// Cache key for a page name and a context digest.
pub fn build_key(name: &str, context_hash: &str) -> String {
    format!("{name}{context_hash}")
}

#[derive(Serialize)]
struct ContextFingerprint<'a> {
    sales_channel_id: &'a Uuid,
    domain_id: &'a Option<Uuid>,
    language_chain: &'a [Uuid],
    currency_id: &'a Uuid,
    customer_group_id: &'a Uuid,
    country_id: &'a Uuid,
    tax_state: TaxState,
    rule_ids: Vec<&'a Uuid>,
    version_id: &'a Uuid,
}

/// Hex digest over the content-relevant fields of a context.
///
/// The session token is excluded; rule order does not matter.
pub fn context_hash(context: &SalesChannelContext) -> String {
    let mut rule_ids: Vec<&Uuid> = context.rule_ids.iter().collect();
    rule_ids.sort();
    rule_ids.dedup();

    let fingerprint = ContextFingerprint {
        sales_channel_id: &context.sales_channel_id,
        domain_id: &context.domain_id,
        language_chain: &context.language_chain,
        currency_id: &context.currency_id,
        customer_group_id: &context.customer_group_id,
        country_id: &context.country_id,
        tax_state: context.tax_state,
        rule_ids,
        version_id: &context.version_id,
    };

    // Serializing plain ids and enums cannot fail.
    let encoded = serde_json::to_vec(&fingerprint).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    hex::encode(hasher.finalize().to_vec())
}

/// Deduplicate tags keeping first occurrences and drop empty values.
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        if tag.is_empty() || normalized.contains(&tag) {
            continue;
        }
        normalized.push(tag);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::LIVE_VERSION_ID;

    fn context() -> SalesChannelContext {
        SalesChannelContext {
            token: "token-a".to_string(),
            sales_channel_id: Uuid::from_u128(1),
            domain_id: Some(Uuid::from_u128(2)),
            language_id: Uuid::from_u128(3),
            language_chain: vec![Uuid::from_u128(3)],
            currency_id: Uuid::from_u128(4),
            customer_group_id: Uuid::from_u128(5),
            country_id: Uuid::from_u128(6),
            tax_state: TaxState::Gross,
            rule_ids: vec![Uuid::from_u128(7), Uuid::from_u128(8)],
            version_id: LIVE_VERSION_ID,
        }
    }

    #[test]
    fn name_concatenates_simple_ids() {
        let name = build_name(
            Some(Uuid::from_u128(1)),
            Some(Uuid::from_u128(2)),
            Some(Uuid::from_u128(3)),
        );
        assert_eq!(
            name,
            format!(
                "error-page-{}{}{}",
                Uuid::from_u128(1).simple(),
                Uuid::from_u128(2).simple(),
                Uuid::from_u128(3).simple()
            )
        );
    }

    #[test]
    fn name_tolerates_missing_ids() {
        assert_eq!(build_name(None, None, None), "error-page-");
    }

    #[test]
    fn context_hash_is_deterministic() {
        assert_eq!(context_hash(&context()), context_hash(&context()));
    }

    #[test]
    fn context_hash_ignores_token_and_rule_order() {
        let mut other = context();
        other.token = "token-b".to_string();
        other.rule_ids.reverse();
        assert_eq!(context_hash(&context()), context_hash(&other));
    }

    #[test]
    fn context_hash_tracks_content_fields() {
        let mut other = context();
        other.currency_id = Uuid::from_u128(40);
        assert_ne!(context_hash(&context()), context_hash(&other));

        let mut other = context();
        other.tax_state = TaxState::Net;
        assert_ne!(context_hash(&context()), context_hash(&other));
    }

    #[test]
    fn key_is_name_followed_by_hash() {
        let key = build_key("error-page-x", "abc");
        assert_eq!(key, "error-page-xabc");
    }

    #[test]
    fn normalize_keeps_first_occurrence_and_drops_empty() {
        let tags = normalize_tags(
            ["b", "", "a", "b", ALL_TAG, "a"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(tags, vec!["b", "a", ALL_TAG]);
    }
}
