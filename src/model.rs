// Data Model - branches, KPI definitions, historical series
// All records are loaded once at session start and held read-only;
// the DashboardData snapshot replaces the ambient globals of the old UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PERSPECTIVE
// ============================================================================

/// Business perspective used to group KPIs for roll-up scoring.
/// Wire names match the Spanish JSON data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perspective {
    #[serde(rename = "Eficiencia")]
    Efficiency,
    #[serde(rename = "Calidad")]
    Quality,
    #[serde(rename = "Satisfacción del Cliente")]
    CustomerExperience,
}

impl Perspective {
    /// Fixed card order for the dashboard
    pub const ALL: [Perspective; 3] = [
        Perspective::Efficiency,
        Perspective::Quality,
        Perspective::CustomerExperience,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Perspective::Efficiency => "Eficiencia",
            Perspective::Quality => "Calidad",
            Perspective::CustomerExperience => "Satisfacción del Cliente",
        }
    }
}

// ============================================================================
// KPI RECORD
// ============================================================================

/// Coarse unit class derived from the free-text unit field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Hours,
    Minutes,
    Percentage,
    Other,
}

/// One KPI definition plus its current and target values.
/// Immutable after load. Field names follow the original JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiRecord {
    pub id: u32,

    /// Business process this KPI measures (e.g. "Alta de cliente")
    #[serde(rename = "proceso")]
    pub process: String,

    #[serde(rename = "perspectiva")]
    pub perspective: Perspective,

    #[serde(rename = "nombre")]
    pub name: String,

    /// What the metric is trying to capture (shown in the detail panel)
    #[serde(rename = "objetivo")]
    pub objective: String,

    /// Free-text unit ("Horas", "Porcentaje (%)", ...). The text drives
    /// direction classification, so it stays a string on this struct.
    #[serde(rename = "unidad")]
    pub unit: String,

    #[serde(rename = "formula")]
    pub formula: String,

    #[serde(rename = "granularidad")]
    pub granularity: String,

    /// Reporting period ("Mensual", "Semanal", ...)
    #[serde(rename = "tiempo")]
    pub reporting_period: String,

    #[serde(rename = "valorActual")]
    pub current_value: f64,

    /// Target/budget value. Used as a divisor for higher-is-better
    /// metrics, so a zero here is a data-quality error the loader flags.
    #[serde(rename = "valorBudget")]
    pub target_value: f64,
}

impl KpiRecord {
    /// Classify the unit text. Accepts both the Spanish wire vocabulary
    /// and its English equivalents.
    pub fn unit_kind(&self) -> UnitKind {
        if self.unit.contains("Horas") || self.unit.contains("Hours") {
            UnitKind::Hours
        } else if self.unit.contains("Minutos") || self.unit.contains("Minutes") {
            UnitKind::Minutes
        } else if self.unit.contains("Porcentaje") || self.unit.contains("Percentage") {
            UnitKind::Percentage
        } else {
            UnitKind::Other
        }
    }

    /// True if the KPI counts errors, which flips it to lower-is-better
    /// regardless of unit
    pub fn is_error_metric(&self) -> bool {
        self.name.contains("Errores") || self.name.contains("Errors")
    }
}

// ============================================================================
// BRANCH RECORD
// ============================================================================

/// A bank branch with its account officers, in display order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRecord {
    pub id: u32,

    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "oficiales")]
    pub officers: Vec<String>,
}

// ============================================================================
// HISTORICAL SERIES
// ============================================================================

/// Period labels plus three parallel sequences, one per perspective
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub labels: Vec<String>,

    #[serde(rename = "eficiencia")]
    pub efficiency: Vec<f64>,

    #[serde(rename = "calidad")]
    pub quality: Vec<f64>,

    #[serde(rename = "experiencia")]
    pub experience: Vec<f64>,
}

impl HistoricalSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn series_for(&self, perspective: Perspective) -> &[f64] {
        match perspective {
            Perspective::Efficiency => &self.efficiency,
            Perspective::Quality => &self.quality,
            Perspective::CustomerExperience => &self.experience,
        }
    }

    /// All three sequences must line up with the labels
    pub fn is_consistent(&self) -> bool {
        let n = self.labels.len();
        self.efficiency.len() == n && self.quality.len() == n && self.experience.len() == n
    }

    /// Last `n` periods (or everything when `n` exceeds the history)
    pub fn tail(&self, n: usize) -> HistoricalSeries {
        let skip = self.labels.len().saturating_sub(n);
        HistoricalSeries {
            labels: self.labels[skip..].to_vec(),
            efficiency: self.efficiency[skip.min(self.efficiency.len())..].to_vec(),
            quality: self.quality[skip.min(self.quality.len())..].to_vec(),
            experience: self.experience[skip.min(self.experience.len())..].to_vec(),
        }
    }
}

// ============================================================================
// DASHBOARD DATA SNAPSHOT
// ============================================================================

/// The session snapshot: everything the dashboard needs, loaded once and
/// passed by reference into the aggregator and renderer
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub branches: Vec<BranchRecord>,
    pub kpis: Vec<KpiRecord>,
    pub historical: HistoricalSeries,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardData {
    pub fn new(
        branches: Vec<BranchRecord>,
        kpis: Vec<KpiRecord>,
        historical: HistoricalSeries,
    ) -> Self {
        DashboardData {
            branches,
            kpis,
            historical,
            loaded_at: Utc::now(),
        }
    }

    pub fn branch_by_id(&self, id: u32) -> Option<&BranchRecord> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn kpi_by_id(&self, id: u32) -> Option<&KpiRecord> {
        self.kpis.iter().find(|k| k.id == id)
    }

    /// KPIs belonging to one perspective, input order preserved
    pub fn kpis_for(&self, perspective: Perspective) -> Vec<KpiRecord> {
        self.kpis
            .iter()
            .filter(|k| k.perspective == perspective)
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi(unit: &str, name: &str) -> KpiRecord {
        KpiRecord {
            id: 1,
            process: "Alta de cliente".to_string(),
            perspective: Perspective::Efficiency,
            name: name.to_string(),
            objective: String::new(),
            unit: unit.to_string(),
            formula: String::new(),
            granularity: String::new(),
            reporting_period: "Mensual".to_string(),
            current_value: 1.0,
            target_value: 1.0,
        }
    }

    #[test]
    fn test_parse_kpi_from_original_json() {
        let json = r#"{
            "id": 1,
            "proceso": "Alta de cliente",
            "perspectiva": "Eficiencia",
            "nombre": "Tiempo de Onboarding del Cliente",
            "objetivo": "Medir el tiempo total desde la carga inicial.",
            "unidad": "Horas",
            "formula": "Fecha Creación - Fecha Inicio",
            "granularidad": "Segmento - Canal - Oficial",
            "tiempo": "Mensual",
            "valorActual": 12.5,
            "valorBudget": 10.0
        }"#;

        let record: KpiRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.perspective, Perspective::Efficiency);
        assert_eq!(record.unit_kind(), UnitKind::Hours);
        assert_eq!(record.current_value, 12.5);
        assert_eq!(record.target_value, 10.0);
    }

    #[test]
    fn test_perspective_wire_names() {
        let p: Perspective = serde_json::from_str("\"Satisfacción del Cliente\"").unwrap();
        assert_eq!(p, Perspective::CustomerExperience);

        let s = serde_json::to_string(&Perspective::Quality).unwrap();
        assert_eq!(s, "\"Calidad\"");
    }

    #[test]
    fn test_unit_kind_classification() {
        assert_eq!(kpi("Horas", "x").unit_kind(), UnitKind::Hours);
        assert_eq!(kpi("Minutos", "x").unit_kind(), UnitKind::Minutes);
        assert_eq!(kpi("Porcentaje (%)", "x").unit_kind(), UnitKind::Percentage);
        assert_eq!(kpi("Cantidad", "x").unit_kind(), UnitKind::Other);
    }

    #[test]
    fn test_error_metric_by_name() {
        assert!(kpi("Cantidad", "Errores de Carga").is_error_metric());
        assert!(kpi("Cantidad", "Data Entry Errors").is_error_metric());
        assert!(!kpi("Cantidad", "Clientes Nuevos").is_error_metric());
    }

    #[test]
    fn test_parse_branch() {
        let json = r#"{
            "id": 1,
            "nombre": "Asunción - Centro",
            "oficiales": ["Juan Pérez", "María González", "Carlos López"]
        }"#;

        let branch: BranchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(branch.name, "Asunción - Centro");
        assert_eq!(branch.officers.len(), 3);
        assert_eq!(branch.officers[0], "Juan Pérez");
    }

    #[test]
    fn test_historical_series_access() {
        let json = r#"{
            "labels": ["Jun 2024", "Jul 2024", "Ago 2024"],
            "eficiencia": [78, 80, 82],
            "calidad": [85, 86, 87],
            "experiencia": [72, 74, 76]
        }"#;

        let hist: HistoricalSeries = serde_json::from_str(json).unwrap();
        assert!(hist.is_consistent());
        assert_eq!(hist.len(), 3);
        assert_eq!(hist.series_for(Perspective::Quality), &[85.0, 86.0, 87.0]);

        let tail = hist.tail(2);
        assert_eq!(tail.labels, vec!["Jul 2024", "Ago 2024"]);
        assert_eq!(tail.efficiency, vec![80.0, 82.0]);

        // Asking for more than exists returns everything
        assert_eq!(hist.tail(10).len(), 3);
    }

    #[test]
    fn test_snapshot_lookups() {
        let data = DashboardData::new(
            vec![BranchRecord {
                id: 2,
                name: "Ciudad del Este".to_string(),
                officers: vec!["Roberto Martínez".to_string()],
            }],
            vec![kpi("Horas", "Tiempo de Onboarding")],
            HistoricalSeries::default(),
        );

        assert!(data.branch_by_id(2).is_some());
        assert!(data.branch_by_id(99).is_none());
        assert_eq!(data.kpis_for(Perspective::Efficiency).len(), 1);
        assert!(data.kpis_for(Perspective::Quality).is_empty());
    }
}
