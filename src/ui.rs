use crate::controller::{App, ConsoleState, Dialog, Level, Tab};
use crate::form::{FieldInput, Form, FormKind};
use crate::model::{StatefulTable, TableRow};
use crate::prelude::*;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Stdout};
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};

pub struct Ui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Ui {
    pub fn new() -> Result<Self> {
        // TUI用のターミナル用意
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Ui { terminal })
    }

    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|f| render(f, app))?;
        Ok(())
    }
}

// デストラクタ
impl Drop for Ui {
    fn drop(&mut self) {
        // ターミナルを元に戻す。失敗しても続行する
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            PopKeyboardEnhancementFlags
        );
        let _ = self.terminal.show_cursor();
    }
}

/// 画面全体。タブ・一覧・ヘルプの上にフォームとダイアログを重ねる
pub fn render<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    render_tabs(f, chunks[0], app.tab);

    let title = app.table_title(app.tab);
    match app.tab {
        Tab::Cars => render_table(f, chunks[1], &title, &mut app.cars),
        Tab::Customers => render_table(f, chunks[1], &title, &mut app.customers),
        Tab::Bookings => render_table(f, chunks[1], &title, &mut app.bookings),
    }

    let help = Paragraph::new(help_text(app))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);

    if let Some(form) = &app.form {
        render_form(f, form);
    }
    if let Some(dialog) = app.dialogs.front() {
        render_dialog(f, dialog);
    }
}

fn render_tabs<B: Backend>(f: &mut Frame<B>, area: Rect, current: Tab) {
    let titles = Tab::ALL
        .iter()
        .map(|t| Spans::from(Span::raw(t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Car Rental Management System"),
        )
        .select(current.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_table<B: Backend, T: TableRow>(
    f: &mut Frame<B>,
    area: Rect,
    title: &str,
    table: &mut StatefulTable<T>,
) {
    // 行を選択した時のスタイル
    let selected_style = Style::default().add_modifier(Modifier::REVERSED);
    let header_style = Style::default()
        .bg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let header_cells = T::HEADER
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Gray)));
    let header = Row::new(header_cells)
        .style(header_style)
        .height(1)
        .bottom_margin(1);

    let rows = table.items.iter().map(|item| Row::new(item.cells()));

    // カラム幅は均等
    let columns = T::HEADER.len() as u32;
    let widths = vec![Constraint::Ratio(1, columns); T::HEADER.len()];

    let t = Table::new(rows)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightMagenta))
                .title(title.to_string()),
        )
        .highlight_style(selected_style)
        .widths(&widths);
    f.render_stateful_widget(t, area, &mut table.state);
}

fn render_form<B: Backend>(f: &mut Frame<B>, form: &Form) {
    let popup = centered_rect(70, 80, f.size());
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(form.kind.title());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let constraints: Vec<Constraint> = form
        .fields
        .iter()
        .map(|field| Constraint::Length(field.height()))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, (field, row)) in form.fields.iter().zip(rows.iter()).enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(10)].as_ref())
            .split(*row);
        let label_style = if i == form.focus() {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        f.render_widget(Paragraph::new(field.label).style(label_style), cols[0]);

        match &field.input {
            FieldInput::Text { area, .. } => f.render_widget(area.widget(), cols[1]),
            FieldInput::Choice(choice) => {
                let label = if choice.options.is_empty() {
                    "(none)"
                } else {
                    choice.label()
                };
                let style = if i == form.focus() {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                f.render_widget(
                    Paragraph::new(format!("< {} >", label)).style(style),
                    cols[1],
                );
            }
        }
    }
}

fn render_dialog<B: Backend>(f: &mut Frame<B>, dialog: &Dialog) {
    let (title, text, hint, color) = match dialog {
        Dialog::Message { level, text } => {
            let (title, color) = match level {
                Level::Info => ("Info", Color::Green),
                Level::Warning => ("Warning", Color::Yellow),
                Level::Error => ("Error", Color::Red),
            };
            (title, text.as_str(), "[Enter] OK", color)
        }
        Dialog::Confirm { title, text, .. } => {
            (*title, text.as_str(), "[y] Yes  [n] No", Color::Yellow)
        }
    };

    let area = centered_rect(50, 30, f.size());
    f.render_widget(Clear, area);
    let body = vec![
        Spans::from(text.to_string()),
        Spans::from(""),
        Spans::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ];
    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// 状態ごとのキー操作の説明
pub fn help_text(app: &App) -> &'static str {
    if app.state == ConsoleState::EditForm {
        return match app.form.as_ref().map(|form| &form.kind) {
            Some(FormKind::NewBooking) => {
                "Tab/Shift-Tab: move  ←/→: choose  Ctrl-a: check availability  Ctrl-s: save  Esc: cancel"
            }
            Some(FormKind::SearchCars) | Some(FormKind::FindCustomer) => {
                "Tab/Shift-Tab: move  ←/→: choose  Ctrl-s: search  Esc: cancel"
            }
            _ => "Tab/Shift-Tab: move  ←/→: choose  Ctrl-s: save  Esc: cancel",
        };
    }
    match app.tab {
        Tab::Cars => {
            "↑/↓: select  a: add  e: update  d: delete  s: search  b: bookings  r: refresh  x: export  Tab: next  q: quit"
        }
        Tab::Customers => {
            "↑/↓: select  a: add  e: update  d: delete  f: find by email  b: bookings  r: refresh  x: export  Tab: next  q: quit"
        }
        Tab::Bookings => {
            "↑/↓: select  a: create  e: update  c: cancel  d: delete  r: refresh  x: export  Tab: next  q: quit"
        }
    }
}

/// 画面中央の矩形 (幅・高さは%指定)
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Car;
    use crate::service::CarRentalService;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::Duration;
    use tui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_app() -> App {
        // 描画だけなので通信は発生しない
        let service =
            CarRentalService::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        App::new(service, PathBuf::from("unused"))
    }

    fn screen(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn renders_tabs_and_car_rows() {
        let mut app = make_app();
        app.cars.set_items(vec![Car {
            id: Some("k1".into()),
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2023,
            ..Car::default()
        }]);
        let content = screen(&mut app, 160, 20);
        assert!(content.contains("Cars"));
        assert!(content.contains("Customers"));
        assert!(content.contains("Bookings"));
        assert!(content.contains("Make"));
        assert!(content.contains("Honda"));
        assert!(content.contains("s: search"));
    }

    #[test]
    fn renders_form_over_table() {
        let mut app = make_app();
        app.handle_key(press(KeyCode::Char('a')));
        let content = screen(&mut app, 120, 40);
        assert!(content.contains("Add Car"));
        assert!(content.contains("Daily Rate:"));
        assert!(content.contains("Ctrl-s: save"));
    }

    #[test]
    fn renders_booking_choices() {
        let mut app = make_app();
        app.tab = Tab::Bookings;
        app.handle_key(press(KeyCode::Char('a')));
        let content = screen(&mut app, 140, 40);
        assert!(content.contains("Create Booking"));
        assert!(content.contains("< (none) >"));
        assert!(content.contains("Ctrl-a: check availability"));
    }

    #[test]
    fn renders_dialog_on_top() {
        let mut app = make_app();
        app.handle_key(press(KeyCode::Char('d')));
        let content = screen(&mut app, 120, 30);
        assert!(content.contains("Warning"));
        assert!(content.contains("Please select a car to delete."));
        assert!(content.contains("[Enter] OK"));
    }

    #[test]
    fn help_follows_current_tab() {
        let mut app = make_app();
        app.tab = Tab::Customers;
        assert!(help_text(&app).contains("f: find by email"));
        app.tab = Tab::Bookings;
        assert!(help_text(&app).contains("c: cancel"));
    }
}
