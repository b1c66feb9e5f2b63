use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, Paragraph, Row, Table,
        TableState,
    },
    Frame, Terminal,
};
use std::io;

use kpi_dashboard::{
    perspective_cards, progress_width, round2, table_rows, DashboardData, HistoricalSeries,
    KpiRecord, KpiRow, Perspective, PerspectiveCard, Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Matrix,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Matrix,
            Page::Matrix => Page::Dashboard,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard de KPIs",
            Page::Matrix => "Casa Matriz - KPIs Centrales",
        }
    }
}

/// Chart window over the historical series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    LastSix,
    LastThree,
}

impl PeriodFilter {
    pub fn next(&self) -> Self {
        match self {
            PeriodFilter::All => PeriodFilter::LastSix,
            PeriodFilter::LastSix => PeriodFilter::LastThree,
            PeriodFilter::LastThree => PeriodFilter::All,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PeriodFilter::All => "Todo",
            PeriodFilter::LastSix => "Últimos 6",
            PeriodFilter::LastThree => "Últimos 3",
        }
    }
}

/// Active filter selection. Per the original dashboard only the
/// perspective narrows the table; branch and officer are session
/// context, and the period windows the trend chart.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub perspective: Option<Perspective>,
    pub branch_idx: usize,
    pub officer: Option<String>,
    pub period: PeriodFilter,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            perspective: None,
            branch_idx: 0,
            officer: None,
            period: PeriodFilter::All,
        }
    }
}

pub struct App {
    pub data: DashboardData,
    pub cards: Vec<PerspectiveCard>,
    pub rows: Vec<KpiRow>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter: FilterState,
}

impl App {
    pub fn new(data: DashboardData) -> Result<Self> {
        let mut app = App {
            data,
            cards: Vec::new(),
            rows: Vec::new(),
            state: TableState::default(),
            current_page: Page::Dashboard,
            show_detail: false,
            filter: FilterState::default(),
        };
        app.recompute()?;
        Ok(app)
    }

    /// Recompute cards and table rows from the immutable snapshot.
    /// Invoked on every filter change; outputs are always fresh.
    pub fn recompute(&mut self) -> Result<()> {
        self.cards = perspective_cards(&self.data.kpis)?;

        let filtered: Vec<KpiRecord> = match self.filter.perspective {
            None => self.data.kpis.clone(),
            Some(p) => self.data.kpis_for(p),
        };
        self.rows = table_rows(&filtered)?;

        // Reset selection to first item
        if self.rows.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }

        Ok(())
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_kpi(&self) -> Option<&KpiRecord> {
        let row = self.state.selected().and_then(|i| self.rows.get(i))?;
        self.data.kpi_by_id(row.id)
    }

    pub fn current_branch(&self) -> Option<&kpi_dashboard::BranchRecord> {
        self.data.branches.get(self.filter.branch_idx)
    }

    /// Todas -> Eficiencia -> Calidad -> Satisfacción -> Todas
    pub fn cycle_perspective(&mut self) -> Result<()> {
        self.filter.perspective = match self.filter.perspective {
            None => Some(Perspective::Efficiency),
            Some(Perspective::Efficiency) => Some(Perspective::Quality),
            Some(Perspective::Quality) => Some(Perspective::CustomerExperience),
            Some(Perspective::CustomerExperience) => None,
        };
        self.recompute()
    }

    /// Switching branch resets the officer selection, since the officer
    /// list belongs to the branch
    pub fn cycle_branch(&mut self) -> Result<()> {
        if !self.data.branches.is_empty() {
            self.filter.branch_idx = (self.filter.branch_idx + 1) % self.data.branches.len();
            self.filter.officer = None;
        }
        self.recompute()
    }

    /// Todos -> each officer of the current branch -> Todos
    pub fn cycle_officer(&mut self) -> Result<()> {
        let officers = match self.current_branch() {
            Some(branch) => branch.officers.clone(),
            None => Vec::new(),
        };

        self.filter.officer = match &self.filter.officer {
            None => officers.first().cloned(),
            Some(current) => {
                let pos = officers.iter().position(|o| o == current);
                match pos {
                    Some(i) if i + 1 < officers.len() => Some(officers[i + 1].clone()),
                    _ => None,
                }
            }
        };
        self.recompute()
    }

    pub fn cycle_period(&mut self) -> Result<()> {
        self.filter.period = self.filter.period.next();
        self.recompute()
    }

    pub fn clear_filters(&mut self) -> Result<()> {
        self.filter = FilterState::default();
        self.recompute()
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        // Two pages: previous equals next
        self.current_page = self.current_page.next();
    }

    /// Historical window for the trend chart under the period filter
    pub fn chart_series(&self) -> HistoricalSeries {
        match self.filter.period {
            PeriodFilter::All => self.data.historical.clone(),
            PeriodFilter::LastSix => self.data.historical.tail(6),
            PeriodFilter::LastThree => self.data.historical.tail(3),
        }
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Char('p') => app.cycle_perspective()?,
                KeyCode::Char('b') if app.current_page == Page::Dashboard => {
                    app.cycle_branch()?
                }
                KeyCode::Char('o') if app.current_page == Page::Dashboard => {
                    app.cycle_officer()?
                }
                KeyCode::Char('t') => app.cycle_period()?,
                KeyCode::Char('c') => app.clear_filters()?,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.rows.is_empty() {
                        app.state.select(Some(app.rows.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header with navigation and filters
            Constraint::Length(5),  // Perspective cards
            Constraint::Min(8),     // KPI table (and detail panel)
            Constraint::Length(10), // Historical trend chart
            Constraint::Length(3),  // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_cards(f, chunks[1], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // KPI table
                Constraint::Percentage(40), // Detail panel
            ])
            .split(chunks[2]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[2], app);
    }

    render_chart(f, chunks[3], app);
    render_status_bar(f, chunks[4], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [(Page::Dashboard, "Dashboard"), (Page::Matrix, "Casa Matriz")];

    let mut tab_spans = vec![];
    for (i, (page, name)) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(*name, style));
    }

    tab_spans.push(Span::raw("  |  "));
    let perspective_label = app
        .filter
        .perspective
        .map(|p| p.label())
        .unwrap_or("Todas");
    tab_spans.push(Span::styled(
        format!("Perspectiva: {}", perspective_label),
        Style::default().fg(Color::White),
    ));

    // Branch filters only apply on the branch dashboard
    if app.current_page == Page::Dashboard {
        if let Some(branch) = app.current_branch() {
            tab_spans.push(Span::raw("  |  "));
            tab_spans.push(Span::styled(
                format!("Sucursal: {}", branch.name),
                Style::default().fg(Color::Cyan),
            ));
        }
        let officer = app.filter.officer.as_deref().unwrap_or("Todos");
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Oficial: {}", officer),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.current_page.title())),
    );

    f.render_widget(header, area);
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Excellent => Color::Green,
        Status::Acceptable => Color::Yellow,
        Status::Critical => Color::Red,
    }
}

fn render_cards(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

    for (card, chunk) in app.cards.iter().zip(chunks.iter()) {
        // The gauge ratio is clamped; the label keeps the exact value
        let ratio = progress_width(card.compliance) / 100.0;
        let label = format!(
            "{}% {}",
            round2(card.compliance),
            card.status.semaphore()
        );

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", card.perspective.label())),
            )
            .gauge_style(Style::default().fg(status_color(card.status)))
            .ratio(ratio)
            .label(label);

        f.render_widget(gauge, *chunk);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Perspectiva", "KPI", "Actual", "Meta", "Cumplimiento", "Estado"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|row| {
        let color = status_color(row.status);

        let cells = vec![
            Cell::from(row.perspective.label()),
            Cell::from(truncate(&row.name, 38)),
            Cell::from(row.current_display.clone()),
            Cell::from(row.target_display.clone()),
            Cell::from(format!("{}%", row.compliance)).style(Style::default().fg(color)),
            Cell::from(format!("{} {}", row.status.semaphore(), row.status.label()))
                .style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(40),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(13),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" KPIs "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.selected_kpi() {
        Some(kpi) => {
            let direction = match kpi_dashboard::classify(kpi) {
                kpi_dashboard::Direction::LowerIsBetter => "Menor es mejor",
                kpi_dashboard::Direction::HigherIsBetter => "Mayor es mejor",
            };

            vec![
                Line::from(Span::styled(
                    kpi.name.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Proceso: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.process.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Objetivo: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.objective.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Fórmula: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.formula.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Unidad: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.unit.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Granularidad: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.granularity.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Frecuencia: ", Style::default().fg(Color::Cyan)),
                    Span::raw(kpi.reporting_period.clone()),
                ]),
                Line::from(vec![
                    Span::styled("Dirección: ", Style::default().fg(Color::Cyan)),
                    Span::raw(direction),
                ]),
            ]
        }
        None => vec![Line::from("No hay KPI seleccionado")],
    };

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Detalle "),
        )
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(panel, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let hist = app.chart_series();

    let to_points = |series: &[f64]| -> Vec<(f64, f64)> {
        series
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    };

    let efficiency = to_points(hist.series_for(Perspective::Efficiency));
    let quality = to_points(hist.series_for(Perspective::Quality));
    let experience = to_points(hist.series_for(Perspective::CustomerExperience));

    let datasets = vec![
        Dataset::default()
            .name("Eficiencia")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&efficiency),
        Dataset::default()
            .name("Calidad")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&quality),
        Dataset::default()
            .name("Experiencia")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&experience),
    ];

    let x_max = hist.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = match hist.labels.len() {
        0 => vec![],
        1 => vec![Span::raw(hist.labels[0].clone())],
        n => vec![
            Span::raw(hist.labels[0].clone()),
            Span::raw(hist.labels[n / 2].clone()),
            Span::raw(hist.labels[n - 1].clone()),
        ],
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Evolución Histórica ({}) ", app.filter.period.label())),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Cumplimiento %")
                .style(Style::default().fg(Color::Gray))
                .bounds([50.0, 100.0])
                .labels(vec![
                    Span::raw("50"),
                    Span::raw("75"),
                    Span::raw("100"),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.rows.len();

    let mut status_spans = vec![Span::styled(
        format!(" KPI: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw("| "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Perspectiva | "));
    if app.current_page == Page::Dashboard {
        status_spans.push(Span::styled("b", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Sucursal | "));
        status_spans.push(Span::styled("o", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Oficial | "));
    }
    status_spans.push(Span::styled("t", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Periodo | "));
    status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Limpiar | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Detalle | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Vista | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Salir"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
