//! Data-quality report over extracted fields. Pure, no side effects.

use serde::Serialize;

use super::model::{ExtractedFields, FieldName};

/// Fields counted toward completeness. Every step-required field is critical.
pub const CRITICAL_FIELDS: [FieldName; 6] = FieldName::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Percent of critical fields filled, 0–100.
    pub completeness: u8,
    pub quality: QualityTier,
    pub filled_fields: u8,
    pub total_fields: u8,
    pub missing_critical: Vec<FieldName>,
}

/// Analyze how complete the extracted data is.
pub fn analyze(extracted: &ExtractedFields) -> QualityReport {
    let total = CRITICAL_FIELDS.len() as u8;
    let missing_critical: Vec<FieldName> = CRITICAL_FIELDS
        .iter()
        .copied()
        .filter(|f| extracted.get(*f).is_none())
        .collect();
    let filled = total - missing_critical.len() as u8;
    let completeness = (u16::from(filled) * 100 / u16::from(total)) as u8;

    let quality = if completeness >= 80 {
        QualityTier::High
    } else if completeness >= 60 {
        QualityTier::Medium
    } else {
        QualityTier::Low
    };

    QualityReport {
        completeness,
        quality,
        filled_fields: filled,
        total_fields: total,
        missing_critical,
    }
}
