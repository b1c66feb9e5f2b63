// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use kpi_dashboard::{
    load_dashboard_data, perspective_cards, quarantine, sample_data, table_rows, validate,
    DashboardData, Severity,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("ui");
    let data_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    match mode {
        "summary" => run_summary(&data_dir),
        "validate" => run_validate(&data_dir),
        _ => run_ui_mode(&data_dir),
    }
}

/// Load the session snapshot, falling back to the built-in sample data
/// when the data directory is unusable (the old dashboard did the same)
fn load_or_fallback(data_dir: &Path) -> DashboardData {
    match load_dashboard_data(data_dir) {
        Ok(data) => {
            println!("✓ Loaded data from {:?}", data_dir);
            data
        }
        Err(err) => {
            eprintln!("⚠️  Could not load data from {:?}: {:#}", data_dir, err);
            eprintln!("   Falling back to built-in sample data.");
            sample_data()
        }
    }
}

/// Validate, report, and drop records the aggregator must not see
fn load_clean(data_dir: &Path) -> DashboardData {
    let data = load_or_fallback(data_dir);

    let issues = validate(&data);
    for issue in &issues {
        eprintln!("⚠️  {}: {}", issue.subject, issue.message);
    }

    let (clean, excluded) = quarantine(data);
    if excluded > 0 {
        eprintln!("   Excluded {} KPI record(s) from aggregation.", excluded);
    }

    clean
}

fn run_summary(data_dir: &Path) -> Result<()> {
    println!("📊 KPI Dashboard - Resumen Consolidado");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data = load_clean(data_dir);

    println!("\nPerspectivas:");
    for card in perspective_cards(&data.kpis)? {
        println!(
            "  {} {:<28} {:>8}  [{}]",
            card.status.semaphore(),
            card.perspective.label(),
            card.display_value(),
            card.status.label()
        );
    }

    println!("\nKPIs ({}):", data.kpis.len());
    for row in table_rows(&data.kpis)? {
        println!(
            "  {} {:<42} {:>10} / {:<8} {:>8}%  [{}]",
            row.status.semaphore(),
            row.name,
            row.current_display,
            row.target_display,
            row.compliance,
            row.status.label()
        );
    }

    println!(
        "\nSucursales: {} | Periodos históricos: {}",
        data.branches.len(),
        data.historical.len()
    );

    Ok(())
}

fn run_validate(data_dir: &Path) -> Result<()> {
    println!("🔍 KPI Dashboard - Validación de Datos");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data = load_dashboard_data(data_dir)?;
    let issues = validate(&data);

    if issues.is_empty() {
        println!(
            "✅ Sin problemas: {} KPIs, {} sucursales, {} periodos.",
            data.kpis.len(),
            data.branches.len(),
            data.historical.len()
        );
        return Ok(());
    }

    let mut critical = 0;
    for issue in &issues {
        let marker = match issue.severity {
            Severity::Critical => {
                critical += 1;
                "❌"
            }
            Severity::Warning => "⚠️ ",
        };
        println!("{} {}: {}", marker, issue.subject, issue.message);
    }

    println!(
        "\n{} problema(s), {} crítico(s).",
        issues.len(),
        critical
    );

    if critical > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(data_dir: &Path) -> Result<()> {
    println!("🖥️  Loading KPI Dashboard UI...\n");

    let data = load_clean(data_dir);
    println!(
        "✓ {} KPIs, {} sucursales, {} periodos históricos\n",
        data.kpis.len(),
        data.branches.len(),
        data.historical.len()
    );
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(data)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(data_dir: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a text report: kpi-dashboard summary {:?}", data_dir);
    std::process::exit(1);
}
