//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of document in the procurement chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Component,
    Enquiry,
    Quotation,
    CounterQuotation,
    Loi,
    Order,
    Invoice,
    Payment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Component => "component",
            EntityKind::Enquiry => "enquiry",
            EntityKind::Quotation => "quotation",
            EntityKind::CounterQuotation => "counter_quotation",
            EntityKind::Loi => "loi",
            EntityKind::Order => "order",
            EntityKind::Invoice => "invoice",
            EntityKind::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "component" => Some(EntityKind::Component),
            "enquiry" => Some(EntityKind::Enquiry),
            "quotation" => Some(EntityKind::Quotation),
            "counter_quotation" => Some(EntityKind::CounterQuotation),
            "loi" => Some(EntityKind::Loi),
            "order" => Some(EntityKind::Order),
            "invoice" => Some(EntityKind::Invoice),
            "payment" => Some(EntityKind::Payment),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller role supplied by the identity layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Vendor,
    PurchasingManager,
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    /// Set for vendor users; the vendor they act for
    pub vendor_id: Option<Uuid>,
}

impl Actor {
    pub fn vendor(user_id: Uuid, vendor_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Vendor,
            vendor_id: Some(vendor_id),
        }
    }

    pub fn purchasing_manager(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::PurchasingManager,
            vendor_id: None,
        }
    }

    pub fn is_purchasing_manager(&self) -> bool {
        self.role == Role::PurchasingManager
    }

    /// True when this actor is the vendor identified by `vendor_id`
    pub fn is_vendor(&self, vendor_id: Uuid) -> bool {
        self.role == Role::Vendor && self.vendor_id == Some(vendor_id)
    }

    /// Purchasing managers see everything; vendors only their own documents
    pub fn can_view(&self, vendor_id: Uuid) -> bool {
        self.is_purchasing_manager() || self.is_vendor(vendor_id)
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Slice one page out of an already filtered list
    pub fn paginate<T>(&self, items: Vec<T>) -> PaginatedResponse<T> {
        let per_page = self.per_page.clamp(1, 200);
        let page = self.page.max(1);
        let total_items = items.len() as u64;
        let total_pages = ((total_items + per_page as u64 - 1) / per_page as u64) as u32;
        let start = usize::try_from(u64::from(page - 1) * u64::from(per_page)).unwrap_or(usize::MAX);

        let data = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        PaginatedResponse {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total_items,
                total_pages,
            },
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_round_trips_through_str() {
        for kind in [
            EntityKind::Component,
            EntityKind::Enquiry,
            EntityKind::Quotation,
            EntityKind::CounterQuotation,
            EntityKind::Loi,
            EntityKind::Order,
            EntityKind::Invoice,
            EntityKind::Payment,
        ] {
            assert_eq!(EntityKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::from_str("receipt"), None);
    }

    #[test]
    fn vendor_visibility_is_scoped() {
        let vendor_id = Uuid::new_v4();
        let vendor = Actor::vendor(Uuid::new_v4(), vendor_id);
        let manager = Actor::purchasing_manager(Uuid::new_v4());

        assert!(vendor.can_view(vendor_id));
        assert!(!vendor.can_view(Uuid::new_v4()));
        assert!(manager.can_view(vendor_id));
    }

    #[test]
    fn paginate_slices_pages() {
        let page = Pagination { page: 2, per_page: 3 }.paginate((1..=7).collect::<Vec<_>>());
        assert_eq!(page.data, vec![4, 5, 6]);
        assert_eq!(page.pagination.total_items, 7);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn paginate_far_past_the_end_is_empty() {
        let page = Pagination {
            page: u32::MAX,
            per_page: 200,
        }
        .paginate((1..=7).collect::<Vec<_>>());
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.page, u32::MAX);
        assert_eq!(page.pagination.total_items, 7);
    }
}
