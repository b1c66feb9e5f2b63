// KPI Dashboard - Core Library
// Exposes the data model, aggregation core and data loader for use in
// the CLI and tests

pub mod model;
pub mod aggregator;
pub mod loader;

// Re-export commonly used types
pub use model::{
    BranchRecord, DashboardData, HistoricalSeries, KpiRecord, Perspective, UnitKind,
};
pub use aggregator::{
    classify, classify_status, compliance_of, consolidate, format_value,
    perspective_cards, progress_width, round2, table_rows,
    ComplianceError, Direction, KpiRow, PerspectiveCard, Status,
};
pub use loader::{
    load_dashboard_data, quarantine, sample_data, validate,
    DataIssue, Severity,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
