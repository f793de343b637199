//! Terminal user interface with ratatui.

use crate::analysis::Recommendation;
use crate::app::App;
use crate::models::Column;
use crate::report::ReportRow;
use crate::session::RefreshState;
use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

/// Colors for the UI.
pub struct UiColors {
    pub gain: Color,
    pub loss: Color,
    pub neutral: Color,
    pub header_bg: Color,
    pub selected_bg: Color,
    pub border: Color,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            gain: Color::Green,
            loss: Color::Red,
            neutral: Color::White,
            header_bg: Color::DarkGray,
            selected_bg: Color::Rgb(40, 40, 60),
            border: Color::DarkGray,
        }
    }
}

/// Render the main UI.
pub fn render<F>(frame: &mut Frame, app: &App<F>) {
    let colors = UiColors::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Table + details
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0], &colors);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    render_quotes_table(frame, app, panes[0], &colors);
    render_details(frame, app, panes[1], &colors);
    render_footer(frame, app, chunks[2], &colors);

    if app.show_help {
        render_help_overlay(frame, &colors);
    }

    if let Some(warning) = app.session.warning() {
        render_warning(frame, warning, &colors);
    }
}

/// Render the header with summary information.
fn render_header<F>(frame: &mut Frame, app: &App<F>, area: Rect, colors: &UiColors) {
    let session = &app.session;
    let (sells, buys) = session
        .rows()
        .iter()
        .filter_map(|r| r.analysis.as_ref().ok())
        .flatten()
        .fold((0, 0), |(s, b), r| if r.is_sell() { (s + 1, b) } else { (s, b + 1) });

    let state = match session.state() {
        RefreshState::Idle => Span::raw("Idle"),
        RefreshState::Refreshing { .. } => {
            Span::styled("Refreshing...", Style::default().fg(Color::Yellow))
        }
    };

    let header_text = vec![
        Line::from(vec![
            Span::styled(
                "TICKRS ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("- {} tickers  ", session.rows().len())),
            Span::raw(Local::now().format("%H:%M:%S").to_string()),
        ]),
        Line::from(vec![
            Span::styled(format!("{sells} "), Style::default().fg(colors.loss)),
            Span::raw("sell  "),
            Span::styled(format!("{buys} "), Style::default().fg(colors.gain)),
            Span::raw("buy  "),
            state,
            Span::raw(format!("  Updated: {}", session.time_since_refresh())),
        ]),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(colors.border)),
    );

    frame.render_widget(header, area);
}

fn column_width(column: Column) -> Constraint {
    match column {
        Column::Symbol => Constraint::Length(8),
        Column::Recommendations => Constraint::Min(20),
        _ => Constraint::Length(9),
    }
}

/// Render the quotes table.
fn render_quotes_table<F>(frame: &mut Frame, app: &App<F>, area: Rect, colors: &UiColors) {
    let session = &app.session;
    let (sort_column, sort_direction) = session.sort();

    let header_cells = Column::ALL.iter().map(|column| {
        let mut style = if *column == sort_column {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        if *column == app.column_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        let indicator = if *column == sort_column {
            format!(" {}", sort_direction.indicator())
        } else {
            String::new()
        };

        Cell::from(format!("{}{}", column.header(), indicator)).style(style)
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(colors.header_bg))
        .height(1);

    let rows = session.rows().iter().enumerate().map(|(i, row)| {
        let row_style = if i == session.selected() {
            Style::default().bg(colors.selected_bg)
        } else {
            Style::default()
        };

        let cells = Column::ALL.iter().map(|column| {
            let text = session.cell(row, *column);
            Cell::from(text).style(cell_style(row, *column, colors))
        });

        Row::new(cells).style(row_style)
    });

    let widths = Column::ALL.map(column_width);

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::NONE))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(Some(session.selected()));

    frame.render_stateful_widget(table, area, &mut state);
}

fn cell_style(row: &ReportRow, column: Column, colors: &UiColors) -> Style {
    match column {
        Column::Change | Column::ChangePercent => {
            let color = match column.value(&row.quote) {
                Some(v) if v > 0.0 => colors.gain,
                Some(v) if v < 0.0 => colors.loss,
                _ => colors.neutral,
            };
            Style::default().fg(color)
        }
        Column::Recommendations => match &row.analysis {
            Ok(recommendations) => match recommendations.first() {
                Some(r) if r.is_sell() => Style::default().fg(colors.loss),
                Some(Recommendation::BuyYearLow | Recommendation::BuyCloseToLow) => {
                    Style::default().fg(colors.gain)
                }
                _ => Style::default(),
            },
            Err(_) => Style::default().fg(Color::DarkGray),
        },
        _ => Style::default(),
    }
}

/// Render the details pane for the selected ticker.
fn render_details<F>(frame: &mut Frame, app: &App<F>, area: Rect, colors: &UiColors) {
    let details = Paragraph::new(app.session.detail())
        .block(
            Block::default()
                .title(" Details ")
                .borders(Borders::LEFT)
                .border_style(Style::default().fg(colors.border)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(details, area);
}

/// Render the footer with status and keybindings.
fn render_footer<F>(frame: &mut Frame, app: &App<F>, area: Rect, colors: &UiColors) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(33), Constraint::Percentage(67)])
        .split(area);

    let status = Paragraph::new(format!(" {}", app.session.status()))
        .style(Style::default().bg(colors.header_bg));

    let keys = Line::from(vec![
        Span::styled(" q", Style::default().fg(Color::Yellow)),
        Span::raw(":quit "),
        Span::styled("u", Style::default().fg(Color::Yellow)),
        Span::raw(":update "),
        Span::styled("←→", Style::default().fg(Color::Yellow)),
        Span::raw(":column "),
        Span::styled("s", Style::default().fg(Color::Yellow)),
        Span::raw(":sort "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(":help "),
        Span::raw(format!("| {}", app.column_cursor.header())),
    ]);
    let keys = Paragraph::new(keys).style(Style::default().bg(colors.header_bg));

    frame.render_widget(status, halves[0]);
    frame.render_widget(keys, halves[1]);
}

/// Render help overlay.
fn render_help_overlay(frame: &mut Frame, colors: &UiColors) {
    let area = centered_rect(60, 70, frame.area());

    let help_text = vec![
        Line::from(Span::styled(
            "TICKRS HELP",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  ↑/k       Move up"),
        Line::from("  ↓/j       Move down"),
        Line::from("  g/Home    Go to top"),
        Line::from("  G/End     Go to bottom"),
        Line::from("  PgUp/PgDn Page up/down"),
        Line::from(""),
        Line::from("Sorting:"),
        Line::from("  ←/h →/l   Pick column"),
        Line::from("  s/Enter   Sort by column, again to reverse"),
        Line::from("  1-9, 0    Sort by column 1-10"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  u/Space/R Update quotes"),
        Line::from("  q/Esc     Quit"),
        Line::from("  ?         Toggle help"),
        Line::from(""),
        Line::from("Press any key to close"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

/// Render a recoverable warning.
fn render_warning(frame: &mut Frame, warning: &str, colors: &UiColors) {
    let area = centered_rect(50, 20, frame.area());

    let warning_widget = Paragraph::new(warning)
        .block(
            Block::default()
                .title(" Warning ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.loss)),
        )
        .style(Style::default().fg(colors.loss))
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(warning_widget, area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchError, QuoteFetcher, QuoteMap};
    use crate::session::Session;
    use crate::template::DetailTemplate;
    use crate::tickers::{TickerSymbol, parse_ticker_list};
    use ratatui::{Terminal, backend::TestBackend};

    struct NoFetcher;

    impl QuoteFetcher for NoFetcher {
        async fn fetch_quotes(&self, _symbols: &[TickerSymbol]) -> Result<QuoteMap, FetchError> {
            Ok(QuoteMap::new())
        }
    }

    fn screen(app: &App<NoFetcher>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(200, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App<NoFetcher> {
        let session = Session::new(&parse_ticker_list(&["AAPL", "MSFT"]), DetailTemplate::default());
        App::new(session, NoFetcher, None)
    }

    #[test]
    fn test_render_table_and_status() {
        let text = screen(&app());
        assert!(text.contains("TICKRS"));
        assert!(text.contains("Symbol ▲"));
        assert!(text.contains("52w High"));
        assert!(text.contains("MSFT"));
        assert!(text.contains("Details"));
        assert!(text.contains("Updated: never"));
    }

    #[test]
    fn test_render_help_overlay() {
        let mut app = app();
        app.toggle_help();
        assert!(screen(&app).contains("TICKRS HELP"));
    }

    #[test]
    fn test_centered_rect() {
        let rect = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(rect, Rect::new(25, 10, 50, 20));
    }
}
