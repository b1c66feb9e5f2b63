// 📂 Data Loader - reads the three session JSON files and validates them
// The aggregator never guards its own divisors; any record that would
// divide by zero must be caught here, before the session starts.

use crate::aggregator::{classify, Direction};
use crate::model::{BranchRecord, DashboardData, HistoricalSeries, KpiRecord};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// File names expected inside the data directory, as the original
/// dashboard served them
pub const BRANCHES_FILE: &str = "sucursales.json";
pub const KPIS_FILE: &str = "kpis.json";
pub const HISTORICAL_FILE: &str = "historical.json";

// ============================================================================
// LOADING
// ============================================================================

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {:?}", path))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {:?}", path))
}

/// Load the full session snapshot from a data directory containing
/// sucursales.json, kpis.json and historical.json
pub fn load_dashboard_data<P: AsRef<Path>>(dir: P) -> Result<DashboardData> {
    let dir = dir.as_ref();

    let branches: Vec<BranchRecord> = load_json(&dir.join(BRANCHES_FILE))?;
    let kpis: Vec<KpiRecord> = load_json(&dir.join(KPIS_FILE))?;
    let historical: HistoricalSeries = load_json(&dir.join(HISTORICAL_FILE))?;

    Ok(DashboardData::new(branches, kpis, historical))
}

/// Built-in fallback dataset, used when the data directory is missing
/// or unreadable so the dashboard still comes up
pub fn sample_data() -> DashboardData {
    let branches = vec![
        BranchRecord {
            id: 1,
            name: "Asunción - Centro".to_string(),
            officers: vec![
                "Juan Pérez".to_string(),
                "María González".to_string(),
                "Carlos López".to_string(),
            ],
        },
        BranchRecord {
            id: 2,
            name: "Ciudad del Este".to_string(),
            officers: vec![
                "Roberto Martínez".to_string(),
                "Ana Rodríguez".to_string(),
                "Luis Fernández".to_string(),
            ],
        },
    ];

    let kpis = vec![
        KpiRecord {
            id: 1,
            process: "Alta de cliente".to_string(),
            perspective: crate::model::Perspective::Efficiency,
            name: "Tiempo de Onboarding del Cliente".to_string(),
            objective: "Medir el tiempo total desde la carga inicial hasta la creación del cliente en el sistema.".to_string(),
            unit: "Horas".to_string(),
            formula: "Fecha y Hora Creación - Fecha y Hora Inicio Onboarding".to_string(),
            granularity: "Segmento - Canal - Oficial".to_string(),
            reporting_period: "Mensual".to_string(),
            current_value: 12.5,
            target_value: 10.0,
        },
        KpiRecord {
            id: 2,
            process: "Alta de cliente".to_string(),
            perspective: crate::model::Perspective::Efficiency,
            name: "Validaciones Automáticas Exitosas".to_string(),
            objective: "Medir cuántos clientes pasan exitosamente por controles automáticos.".to_string(),
            unit: "Porcentaje (%)".to_string(),
            formula: "Validaciones OK / Total Clientes * 100".to_string(),
            granularity: "Tipo de validación - Canal".to_string(),
            reporting_period: "Mensual".to_string(),
            current_value: 85.0,
            target_value: 90.0,
        },
    ];

    let historical = HistoricalSeries {
        labels: vec![
            "Jun 2024".to_string(),
            "Jul 2024".to_string(),
            "Ago 2024".to_string(),
        ],
        efficiency: vec![78.0, 80.0, 82.0],
        quality: vec![85.0, 86.0, 87.0],
        experience: vec![72.0, 74.0, 76.0],
    };

    DashboardData::new(branches, kpis, historical)
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Severity {
    Critical, // Record would break aggregation and must be excluded
    Warning,  // Data is questionable but computable
}

/// One data-quality finding from pre-session validation
#[derive(Debug, Clone)]
pub struct DataIssue {
    pub severity: Severity,
    pub subject: String,
    pub message: String,
}

impl DataIssue {
    fn critical(subject: String, message: String) -> Self {
        DataIssue {
            severity: Severity::Critical,
            subject,
            message,
        }
    }

    fn warning(subject: String, message: String) -> Self {
        DataIssue {
            severity: Severity::Warning,
            subject,
            message,
        }
    }
}

/// Validate a loaded snapshot. Critical issues mark records the
/// aggregator must never see.
pub fn validate(data: &DashboardData) -> Vec<DataIssue> {
    let mut issues = Vec::new();

    for kpi in &data.kpis {
        let subject = format!("KPI {} ({})", kpi.id, kpi.name);

        if kpi.target_value == 0.0 {
            issues.push(DataIssue::critical(
                subject.clone(),
                "target value is zero".to_string(),
            ));
        }

        if kpi.current_value == 0.0 && classify(kpi) == Direction::LowerIsBetter {
            issues.push(DataIssue::critical(
                subject.clone(),
                "current value is zero on a lower-is-better metric".to_string(),
            ));
        }

        if kpi.current_value < 0.0 || kpi.target_value < 0.0 {
            issues.push(DataIssue::warning(
                subject,
                "negative value".to_string(),
            ));
        }
    }

    if !data.historical.is_consistent() {
        issues.push(DataIssue::critical(
            "historical series".to_string(),
            format!(
                "series lengths do not match {} period labels",
                data.historical.len()
            ),
        ));
    }

    for branch in &data.branches {
        if branch.officers.is_empty() {
            issues.push(DataIssue::warning(
                format!("Branch {} ({})", branch.id, branch.name),
                "no officers listed".to_string(),
            ));
        }
    }

    issues
}

/// Drop the KPIs flagged critical so the rest of the session can run.
/// Returns the clean snapshot and how many records were excluded.
pub fn quarantine(data: DashboardData) -> (DashboardData, usize) {
    let DashboardData {
        branches,
        kpis,
        historical,
        loaded_at,
    } = data;

    let before = kpis.len();
    let kpis: Vec<KpiRecord> = kpis
        .into_iter()
        .filter(|kpi| {
            kpi.target_value != 0.0
                && !(kpi.current_value == 0.0 && classify(kpi) == Direction::LowerIsBetter)
        })
        .collect();

    let excluded = before - kpis.len();
    let clean = DashboardData {
        branches,
        kpis,
        historical,
        loaded_at,
    };

    (clean, excluded)
}

// ============================================================================
// TESTS
// ============================================================================
