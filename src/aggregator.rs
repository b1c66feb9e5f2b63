// 📊 KPI Aggregator - compliance scoring and status classification
// Pure functions only: the enclosing app re-invokes them on every
// filter change and renders the fresh outputs.

use crate::model::{KpiRecord, Perspective, UnitKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DIRECTION
// ============================================================================

/// Whether a KPI improves as its value falls or rises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Times and error counts: beating the target means staying under it
    LowerIsBetter,
    /// Everything else: beating the target means exceeding it
    HigherIsBetter,
}

/// Classify a KPI's direction from its unit text and name.
/// Total function, no error cases.
pub fn classify(kpi: &KpiRecord) -> Direction {
    let time_based = matches!(kpi.unit_kind(), UnitKind::Hours | UnitKind::Minutes);
    if time_based || kpi.is_error_metric() {
        Direction::LowerIsBetter
    } else {
        Direction::HigherIsBetter
    }
}

// ============================================================================
// COMPLIANCE
// ============================================================================

/// A division by zero the caller was required to guard against.
/// The old dashboard let these slip through as Infinity/NaN; here they
/// are explicit so bad records surface as data-quality issues instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComplianceError {
    #[error("KPI {id}: target value is zero, compliance is undefined")]
    ZeroTarget { id: u32 },

    #[error("KPI {id}: current value is zero on a lower-is-better metric")]
    ZeroCurrent { id: u32 },
}

/// Direction-adjusted performance as a percentage of target.
/// Returns the unrounded value; round only at the display edge.
pub fn compliance_of(kpi: &KpiRecord) -> Result<f64, ComplianceError> {
    match classify(kpi) {
        Direction::LowerIsBetter => {
            if kpi.current_value == 0.0 {
                return Err(ComplianceError::ZeroCurrent { id: kpi.id });
            }
            Ok((kpi.target_value / kpi.current_value) * 100.0)
        }
        Direction::HigherIsBetter => {
            if kpi.target_value == 0.0 {
                return Err(ComplianceError::ZeroTarget { id: kpi.id });
            }
            Ok((kpi.current_value / kpi.target_value) * 100.0)
        }
    }
}

/// Mean compliance over a pre-filtered KPI list.
/// An empty list yields exactly 0.0 so card rendering never needs a
/// missing-value branch.
pub fn consolidate(kpis: &[KpiRecord]) -> Result<f64, ComplianceError> {
    if kpis.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for kpi in kpis {
        total += compliance_of(kpi)?;
    }

    Ok(total / kpis.len() as f64)
}

/// Round to 2 decimal places for display. Aggregation always works on
/// unrounded values to avoid compounding rounding error.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp compliance to [0, 100] for bar/gauge widths. The unclamped
/// value is still what gets shown as text.
pub fn progress_width(compliance: f64) -> f64 {
    compliance.clamp(0.0, 100.0)
}

// ============================================================================
// STATUS
// ============================================================================

/// Three-tier semaphore classification, shared by the perspective cards
/// and the table badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Excellent,
    Acceptable,
    Critical,
}

impl Status {
    /// Badge text as shown in the table
    pub fn label(&self) -> &'static str {
        match self {
            Status::Excellent => "Excelente",
            Status::Acceptable => "Aceptable",
            Status::Critical => "Crítico",
        }
    }

    pub fn semaphore(&self) -> &'static str {
        match self {
            Status::Excellent => "🟢",
            Status::Acceptable => "🟡",
            Status::Critical => "🔴",
        }
    }
}

/// Fixed thresholds: >= 90 excellent, >= 70 acceptable, else critical
pub fn classify_status(compliance: f64) -> Status {
    if compliance >= 90.0 {
        Status::Excellent
    } else if compliance >= 70.0 {
        Status::Acceptable
    } else {
        Status::Critical
    }
}

// ============================================================================
// CARD & TABLE OUTPUTS
// ============================================================================

/// Consolidated score for one perspective card
#[derive(Debug, Clone, Serialize)]
pub struct PerspectiveCard {
    pub perspective: Perspective,
    /// Unrounded consolidated compliance
    pub compliance: f64,
    pub status: Status,
}

impl PerspectiveCard {
    pub fn display_value(&self) -> String {
        format!("{}%", round2(self.compliance))
    }
}

/// One card per perspective in fixed order, consolidated over the full
/// KPI list (cards ignore the table's perspective filter, as the
/// original dashboard did)
pub fn perspective_cards(kpis: &[KpiRecord]) -> Result<Vec<PerspectiveCard>, ComplianceError> {
    let mut cards = Vec::with_capacity(Perspective::ALL.len());

    for perspective in Perspective::ALL {
        let subset: Vec<KpiRecord> = kpis
            .iter()
            .filter(|k| k.perspective == perspective)
            .cloned()
            .collect();

        let compliance = consolidate(&subset)?;
        cards.push(PerspectiveCard {
            perspective,
            compliance,
            status: classify_status(compliance),
        });
    }

    Ok(cards)
}

/// Computed table row for one KPI
#[derive(Debug, Clone, Serialize)]
pub struct KpiRow {
    pub id: u32,
    pub perspective: Perspective,
    pub name: String,
    pub current_display: String,
    pub target_display: String,
    /// Rounded to 2 decimals for display
    pub compliance: f64,
    pub status: Status,
    pub direction: Direction,
}

/// Unit suffix used when formatting current and target values
fn unit_suffix(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Percentage => "%",
        UnitKind::Hours => " h",
        UnitKind::Minutes => " min",
        UnitKind::Other => "",
    }
}

/// Format a raw value according to the KPI's unit ("85%", "12.5 h", ...)
pub fn format_value(kpi: &KpiRecord, value: f64) -> String {
    format!("{}{}", value, unit_suffix(kpi.unit_kind()))
}

/// Compute table rows in input order (display order is load order,
/// never re-sorted)
pub fn table_rows(kpis: &[KpiRecord]) -> Result<Vec<KpiRow>, ComplianceError> {
    let mut rows = Vec::with_capacity(kpis.len());

    for kpi in kpis {
        let compliance = round2(compliance_of(kpi)?);
        rows.push(KpiRow {
            id: kpi.id,
            perspective: kpi.perspective,
            name: kpi.name.clone(),
            current_display: format_value(kpi, kpi.current_value),
            target_display: format_value(kpi, kpi.target_value),
            compliance,
            status: classify_status(compliance),
            direction: classify(kpi),
        });
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi(
        id: u32,
        perspective: Perspective,
        name: &str,
        unit: &str,
        current: f64,
        target: f64,
    ) -> KpiRecord {
        KpiRecord {
            id,
            process: "Alta de cliente".to_string(),
            perspective,
            name: name.to_string(),
            objective: String::new(),
            unit: unit.to_string(),
            formula: String::new(),
            granularity: String::new(),
            reporting_period: "Mensual".to_string(),
            current_value: current,
            target_value: target,
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_classify_direction() {
        let hours = kpi(1, Perspective::Efficiency, "Tiempo", "Horas", 1.0, 1.0);
        let minutes = kpi(2, Perspective::Efficiency, "Espera", "Minutos", 1.0, 1.0);
        let percent = kpi(3, Perspective::Quality, "Validaciones", "Porcentaje (%)", 1.0, 1.0);
        let errors = kpi(4, Perspective::Quality, "Errores de Carga", "Porcentaje (%)", 1.0, 1.0);

        assert_eq!(classify(&hours), Direction::LowerIsBetter);
        assert_eq!(classify(&minutes), Direction::LowerIsBetter);
        assert_eq!(classify(&percent), Direction::HigherIsBetter);
        // Name wins over unit for error metrics
        assert_eq!(classify(&errors), Direction::LowerIsBetter);
    }

    #[test]
    fn test_compliance_lower_is_better() {
        let record = kpi(1, Perspective::Efficiency, "Tiempo", "Horas", 12.5, 10.0);
        assert_close(compliance_of(&record).unwrap(), (10.0 / 12.5) * 100.0);
    }

    #[test]
    fn test_compliance_higher_is_better() {
        let record = kpi(1, Perspective::Quality, "Validaciones", "Porcentaje (%)", 85.0, 90.0);
        assert_close(compliance_of(&record).unwrap(), (85.0 / 90.0) * 100.0);
    }

    #[test]
    fn test_compliance_zero_target_is_error() {
        let record = kpi(7, Perspective::Quality, "Validaciones", "Porcentaje (%)", 85.0, 0.0);
        assert_eq!(
            compliance_of(&record),
            Err(ComplianceError::ZeroTarget { id: 7 })
        );
    }

    #[test]
    fn test_compliance_zero_current_lower_is_better_is_error() {
        let record = kpi(8, Perspective::Efficiency, "Tiempo", "Horas", 0.0, 10.0);
        assert_eq!(
            compliance_of(&record),
            Err(ComplianceError::ZeroCurrent { id: 8 })
        );
    }

    #[test]
    fn test_consolidate_empty_is_zero_sentinel() {
        assert_eq!(consolidate(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_consolidate_single_equals_compliance() {
        let record = kpi(1, Perspective::Quality, "Validaciones", "Porcentaje (%)", 85.0, 90.0);
        assert_close(
            consolidate(std::slice::from_ref(&record)).unwrap(),
            compliance_of(&record).unwrap(),
        );
    }

    #[test]
    fn test_consolidate_mixed_directions() {
        // KPI A: higher-is-better, 85 of 90 -> ~94.44
        // KPI B: lower-is-better, 12.5 against budget 10 -> 80
        let a = kpi(1, Perspective::Efficiency, "Validaciones", "Porcentaje (%)", 85.0, 90.0);
        let b = kpi(2, Perspective::Efficiency, "Tiempo", "Horas", 12.5, 10.0);

        let result = consolidate(&[a, b]).unwrap();
        assert_close(result, ((85.0 / 90.0) * 100.0 + 80.0) / 2.0);
        assert_close(round2(result), 87.22);
        assert_eq!(classify_status(result), Status::Acceptable);
    }

    #[test]
    fn test_status_band_boundaries() {
        assert_eq!(classify_status(90.0), Status::Excellent);
        assert_eq!(classify_status(89.99), Status::Acceptable);
        assert_eq!(classify_status(70.0), Status::Acceptable);
        assert_eq!(classify_status(69.99), Status::Critical);
    }

    #[test]
    fn test_progress_width_clamps() {
        assert_eq!(progress_width(150.0), 100.0);
        assert_eq!(progress_width(-5.0), 0.0);
        assert_eq!(progress_width(42.0), 42.0);
    }

    #[test]
    fn test_error_metric_overachieves() {
        // "Errores" name forces lower-is-better even with a neutral unit:
        // 5 errors against a budget of 10 doubles the target.
        let record = kpi(1, Perspective::Quality, "Errores de Proceso", "Cantidad", 5.0, 10.0);

        assert_eq!(classify(&record), Direction::LowerIsBetter);
        let compliance = compliance_of(&record).unwrap();
        assert_close(compliance, 200.0);
        // Bar is capped, text still shows 200%
        assert_eq!(progress_width(compliance), 100.0);
    }

    #[test]
    fn test_round2() {
        assert_close(round2(94.44444), 94.44);
        assert_close(round2(87.222222), 87.22);
        assert_close(round2(80.0), 80.0);
    }

    #[test]
    fn test_perspective_cards_fixed_order() {
        let kpis = vec![
            kpi(1, Perspective::Quality, "Validaciones", "Porcentaje (%)", 90.0, 90.0),
            kpi(2, Perspective::Efficiency, "Tiempo", "Horas", 10.0, 10.0),
        ];

        let cards = perspective_cards(&kpis).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].perspective, Perspective::Efficiency);
        assert_eq!(cards[1].perspective, Perspective::Quality);
        assert_eq!(cards[2].perspective, Perspective::CustomerExperience);

        assert_close(cards[0].compliance, 100.0);
        assert_eq!(cards[0].status, Status::Excellent);
        // No customer-experience KPIs loaded: empty sentinel, critical
        assert_eq!(cards[2].compliance, 0.0);
        assert_eq!(cards[2].status, Status::Critical);
    }

    #[test]
    fn test_table_rows_preserve_order_and_format() {
        let kpis = vec![
            kpi(2, Perspective::Efficiency, "Tiempo de Onboarding", "Horas", 12.5, 10.0),
            kpi(1, Perspective::Quality, "Validaciones", "Porcentaje (%)", 85.0, 90.0),
        ];

        let rows = table_rows(&kpis).unwrap();
        assert_eq!(rows.len(), 2);
        // Load order, not id order
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[1].id, 1);

        assert_eq!(rows[0].current_display, "12.5 h");
        assert_eq!(rows[0].target_display, "10 h");
        assert_eq!(rows[0].compliance, 80.0);
        assert_eq!(rows[0].status, Status::Acceptable);
        assert_eq!(rows[0].direction, Direction::LowerIsBetter);

        assert_eq!(rows[1].current_display, "85%");
        assert_eq!(rows[1].target_display, "90%");
        assert_eq!(rows[1].compliance, 94.44);
        assert_eq!(rows[1].status, Status::Excellent);
    }

    #[test]
    fn test_table_rows_propagate_bad_record() {
        let kpis = vec![kpi(9, Perspective::Quality, "Validaciones", "Porcentaje (%)", 50.0, 0.0)];
        assert_eq!(
            table_rows(&kpis).unwrap_err(),
            ComplianceError::ZeroTarget { id: 9 }
        );
    }

    #[test]
    fn test_status_display_helpers() {
        assert_eq!(Status::Excellent.label(), "Excelente");
        assert_eq!(Status::Acceptable.label(), "Aceptable");
        assert_eq!(Status::Critical.label(), "Crítico");
        assert_eq!(Status::Excellent.semaphore(), "🟢");
    }
}
