//! Built-in customer field catalog

use crate::config::ServerConfig;
use redzone_core::{FieldCatalog, FieldType};

/// Fields of the customer record and its metrics that rules may reference
pub fn default_customer_catalog() -> FieldCatalog {
    FieldCatalog::new()
        .with_field("id", "Customer ID", FieldType::Number)
        .with_field("name", "Customer Name", FieldType::String)
        .with_field("status", "Status", FieldType::String)
        .with_field("tier", "Tier", FieldType::String)
        .with_field("industry", "Industry", FieldType::String)
        .with_field("csm_id", "CSM", FieldType::Number)
        .with_field("nps_score", "NPS Score", FieldType::Number)
        .with_field("health_score", "Health Score", FieldType::Number)
        .with_field("active_stores", "Active Stores", FieldType::Number)
        .with_field("revenue_1_year", "Revenue (1 Year)", FieldType::Number)
        .with_field("mrr", "MRR", FieldType::Number)
        .with_field("arr", "ARR", FieldType::Number)
        .with_field("renewal_date", "Renewal Date", FieldType::Date)
        .with_field("days_since_last_login", "Days Since Last Login", FieldType::Number)
        .with_field("open_tickets", "Open Support Tickets", FieldType::Number)
        .with_field("is_churned", "Churned", FieldType::Boolean)
        .with_field("chargebee_status", "Billing Status", FieldType::String)
        .with_field("campaign_stats", "Campaign Stats", FieldType::Json)
}

/// The configured catalog, or the built-in one
pub fn catalog_from_config(config: &ServerConfig) -> FieldCatalog {
    match &config.available_fields {
        Some(catalog) if !catalog.is_empty() => catalog.clone(),
        _ => default_customer_catalog(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_allows_json_paths() {
        let catalog = default_customer_catalog();
        assert!(catalog.allows("nps_score"));
        assert!(catalog.allows("campaign_stats.lastSentDate"));
        assert!(!catalog.allows("nps_score.value"));
        assert!(!catalog.allows("favourite_colour"));
    }

    #[test]
    fn test_config_override() {
        let config = ServerConfig {
            available_fields: Some(FieldCatalog::new().with_field("mrr", "MRR", FieldType::Number)),
            ..Default::default()
        };
        let catalog = catalog_from_config(&config);
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.allows("nps_score"));
    }
}
