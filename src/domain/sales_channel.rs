//! Sales-channel records and their category entry points.

use uuid::Uuid;

use super::context::TaxState;

/// Entity name used in write events for sales channels.
pub const SALES_CHANNEL_ENTITY: &str = "sales_channel";

/// Properties holding the categories a sales channel navigation starts from.
pub const ENTRY_POINT_PROPERTIES: [&str; 3] =
    ["navigationCategoryId", "footerCategoryId", "serviceCategoryId"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesChannelRecord {
    pub id: Uuid,
    pub name: String,
    pub language_id: Uuid,
    pub currency_id: Uuid,
    pub customer_group_id: Uuid,
    pub country_id: Uuid,
    pub tax_state: TaxState,
    pub entry_points: EntryPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoints {
    pub navigation_category_id: Uuid,
    pub footer_category_id: Option<Uuid>,
    pub service_category_id: Option<Uuid>,
}

impl EntryPoints {
    /// Apply `update` and report the property names whose value changed.
    pub fn apply(&mut self, update: &EntryPointsUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(id) = update.navigation_category_id
            && id != self.navigation_category_id
        {
            self.navigation_category_id = id;
            changed.push(ENTRY_POINT_PROPERTIES[0]);
        }
        if let Some(id) = update.footer_category_id
            && id != self.footer_category_id
        {
            self.footer_category_id = id;
            changed.push(ENTRY_POINT_PROPERTIES[1]);
        }
        if let Some(id) = update.service_category_id
            && id != self.service_category_id
        {
            self.service_category_id = id;
            changed.push(ENTRY_POINT_PROPERTIES[2]);
        }

        changed
    }

    pub fn value_of(&self, property: &str) -> Option<Uuid> {
        match property {
            "navigationCategoryId" => Some(self.navigation_category_id),
            "footerCategoryId" => self.footer_category_id,
            "serviceCategoryId" => self.service_category_id,
            _ => None,
        }
    }
}

/// Partial update of entry points; `None` leaves a field untouched.
///
/// The optional entry points take `Some(None)` to clear them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryPointsUpdate {
    pub navigation_category_id: Option<Uuid>,
    pub footer_category_id: Option<Option<Uuid>>,
    pub service_category_id: Option<Option<Uuid>>,
}

/// A storefront domain (URL) bound to a sales channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesChannelDomainRecord {
    pub id: Uuid,
    pub sales_channel_id: Uuid,
    pub url: String,
    pub language_id: Uuid,
    pub currency_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_points() -> EntryPoints {
        EntryPoints {
            navigation_category_id: Uuid::from_u128(1),
            footer_category_id: None,
            service_category_id: Some(Uuid::from_u128(3)),
        }
    }

    #[test]
    fn apply_reports_only_changed_properties() {
        let mut points = entry_points();
        let changed = points.apply(&EntryPointsUpdate {
            navigation_category_id: Some(Uuid::from_u128(1)),
            footer_category_id: Some(Some(Uuid::from_u128(2))),
            service_category_id: Some(Some(Uuid::from_u128(3))),
        });

        assert_eq!(changed, vec!["footerCategoryId"]);
        assert_eq!(points.footer_category_id, Some(Uuid::from_u128(2)));
    }

    #[test]
    fn explicit_none_clears_optional_entry_point() {
        let mut points = entry_points();
        let changed = points.apply(&EntryPointsUpdate {
            footer_category_id: Some(None),
            service_category_id: Some(None),
            ..EntryPointsUpdate::default()
        });

        assert_eq!(changed, vec!["serviceCategoryId"]);
        assert_eq!(points.service_category_id, None);
        assert_eq!(points.navigation_category_id, Uuid::from_u128(1));
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut points = entry_points();
        assert!(points.apply(&EntryPointsUpdate::default()).is_empty());
        assert_eq!(points, entry_points());
    }
}
