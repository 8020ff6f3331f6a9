//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(10),   // chart + grid map
            Constraint::Length(3), // completion gauge
            Constraint::Length(4), // status panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(grid_width(app))])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_chart(frame, app, middle[0]);
    render_grid(frame, app, middle[1]);
    render_gauge(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

/// Each intersection cell is a glyph plus a 3-digit queue.
fn grid_width(app: &App) -> u16 {
    let cells = u16::try_from(app.grid_size()).unwrap_or(u16::MAX / 6);
    cells.saturating_mul(6).saturating_add(2).max(16)
}

/// Header bar: label, tick progress, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.error.is_some() {
        ("✖", "ERROR")
    } else if app.is_finished() {
        ("■", "DONE")
    } else if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };

    let header = Line::from(vec![
        Span::styled(
            " TRAFFIC-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(&app.label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ t={}/{} │ {}ms │ {} {} ",
            app.ticks_run(),
            app.total_ticks(),
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Total queue and vehicles in the network over the rolling window.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let queue_data: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|r| (r.tick as f64, f64::from(r.total_queue)))
        .collect();
    let network_data: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|r| (r.tick as f64, r.in_network as f64))
        .collect();

    let y_bounds = style::auto_bounds_y(&queue_data, &network_data);
    let x_lo = queue_data.first().map_or(0.0, |p| p.0);
    let x_hi = queue_data.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let datasets = vec![
        Dataset::default()
            .name("Queued")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::QUEUE_COLOR))
            .data(&queue_data),
        Dataset::default()
            .name("In network")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(style::IN_NETWORK_COLOR))
            .data(&network_data),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Queued vs In-Network Vehicles ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("tick")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{x_lo:.0}"), format!("{x_hi:.0}")]),
        )
        .y_axis(
            Axis::default()
                .title("veh")
                .bounds(y_bounds)
                .labels(vec![format!("{:.0}", y_bounds[0]), format!("{:.0}", y_bounds[1])]),
        );

    frame.render_widget(chart, area);
}

/// Intersection map: phase glyph and latest queue per node, row `i`, column `j`.
fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let n = app.grid_size();
    let cells = app.intersections();
    let lines: Vec<Line> = cells
        .chunks(n.max(1))
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .flat_map(|&(phase, queue)| {
                    let (color, glyph) = style::phase_style(phase);
                    [
                        Span::styled(glyph, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                        Span::raw(format!("{queue:>3}  ")),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let block = Block::default().title(" Signals ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let ratio = app.completion_ratio().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().title(" Completed ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::GAUGE))
        .ratio(ratio)
        .label(format!(
            "{}/{} ({:.0}%)",
            app.completed(),
            app.total_vehicles(),
            ratio * 100.0
        ));
    frame.render_widget(gauge, area);
}

/// Latest tick counters, or the error that halted the run.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines = if let Some(ref err) = app.error {
        vec![Line::from(Span::styled(
            format!("  {err}"),
            Style::default().fg(style::ERROR_FG),
        ))]
    } else if let Some(r) = app.last_record() {
        vec![
            Line::from(format!(
                "  queued={:>5}  in_network={:>5}  arrived_now={:>3}  avg_tt={:>7.1}s",
                r.total_queue,
                r.in_network,
                r.completed_this_tick,
                app.mean_travel_time_s(),
            )),
            Line::from(format!(
                "  NS green={:>3}  EW green={:>3}  yellow={:>3}  CO2={:>9.2} kg",
                r.ns_green,
                r.ew_green,
                r.yellow,
                r.emissions_total_g / 1000.0,
            )),
        ]
    } else {
        vec![Line::from("  Waiting for first tick...")]
    };

    let block = Block::default().title(" Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  1/2/3:Preset  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
