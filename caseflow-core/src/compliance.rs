//! Compliance scoring.

use crate::types::{CheckStatus, ComplianceCheck};

/// Severity-weighted compliance percentage, 0–100.
///
/// Each check contributes its severity weight (critical 4, high 3,
/// medium 2, low 1) to the denominator and, when compliant, to the
/// numerator. An empty check list scores 100 — vacuously compliant by
/// policy, not an omission.
pub fn calculate_compliance_score(checks: &[ComplianceCheck]) -> u8 {
    if checks.is_empty() {
        return 100;
    }

    let total: u32 = checks.iter().map(|c| c.severity.weight()).sum();
    let compliant: u32 = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Compliant)
        .map(|c| c.severity.weight())
        .sum();

    ((f64::from(compliant) / f64::from(total)) * 100.0).round() as u8
}
