// BillExact - app/options.rs
//
// Builds the core rule and export option types from validated config.
// Keeps platform (config) and core (rules) unaware of each other.

use crate::app::store::BillingBook;
use crate::core::compliance::ComplianceRules;
use crate::core::export::{LedesOptions, MatterCatalogue};
use crate::platform::config::AppConfig;
use crate::util::error::ComplianceError;
use chrono::NaiveDate;

/// Compile the compliance rule set described by `config`.
pub fn compliance_rules(config: &AppConfig) -> Result<ComplianceRules, ComplianceError> {
    let rules = ComplianceRules::new(
        config.max_block_hours,
        config.min_narrative_chars,
        &config.vague_terms,
        &config.auto_fix_replacements,
    )?;
    tracing::debug!(
        max_block_hours = rules.max_block_hours,
        min_narrative_chars = rules.min_narrative_chars,
        vague_terms = rules.vague_terms().len(),
        "Compliance rules compiled"
    );
    Ok(rules)
}

/// LEDES invoice options from `config`, with the matter catalogue taken
/// from the book's matters and clients.
pub fn ledes_options(config: &AppConfig, book: &BillingBook, invoice_date: NaiveDate) -> LedesOptions {
    LedesOptions {
        invoice_date,
        invoice_number: config.invoice_number.clone(),
        law_firm_id: config.law_firm_id.clone(),
        default_client_id: config.client_id.clone(),
        default_law_firm_matter_id: config.law_firm_matter_id.clone(),
        client_matter_id: config.client_matter_id.clone(),
        timekeeper_ids: config.timekeeper_ids.clone(),
        default_timekeeper_id: config.timekeeper_id.clone(),
        catalogue: MatterCatalogue::new(&book.matters, &book.clients),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::constants;

    #[test]
    fn test_default_config_builds_standard_rules() {
        let rules = compliance_rules(&AppConfig::default()).unwrap();
        assert_eq!(rules.max_block_hours, constants::DEFAULT_MAX_BLOCK_HOURS);
        assert_eq!(rules.vague_terms().len(), constants::DEFAULT_VAGUE_TERMS.len());
    }

    #[test]
    fn test_ledes_options_use_config_identifiers() {
        let mut config = AppConfig::default();
        config.invoice_number = "INV-7".to_string();
        config
            .timekeeper_ids
            .insert("Lisa Wong".to_string(), "LW01".to_string());

        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let options = ledes_options(&config, &BillingBook::default(), date);
        assert_eq!(options.invoice_date, date);
        assert_eq!(options.invoice_number, "INV-7");
        assert_eq!(options.law_firm_id, constants::DEFAULT_LAW_FIRM_ID);
        assert_eq!(options.timekeeper_ids.get("Lisa Wong").map(String::as_str), Some("LW01"));
    }
}
