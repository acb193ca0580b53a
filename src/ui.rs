use anyhow::Result;
use aurum_calc::parser::{
    accept_masha_input, accept_ratti_input, sanitize_decimal, sanitize_integer,
    CURRENCY_DECIMALS, GRAMS_DECIMALS,
};
use aurum_calc::{
    decompose_purity, delete_entry, format_currency, format_last_updated, format_relative,
    format_tmr, format_weight, get_all_entries, grams_from_tmr_input, insert_entry,
    karat_rate_table, parse_number, search_conversion_table, tmr_from_grams, value_of,
    ConversionRow, Database, EntryDraft, EntryKind, GoldEntry, Karat, LedgerTotals, RateState,
};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Calculator,
    Ledger,
    KaratRates,
    ConversionTable,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Calculator => Page::Ledger,
            Page::Ledger => Page::KaratRates,
            Page::KaratRates => Page::ConversionTable,
            Page::ConversionTable => Page::Calculator,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Calculator => Page::ConversionTable,
            Page::Ledger => Page::Calculator,
            Page::KaratRates => Page::Ledger,
            Page::ConversionTable => Page::KaratRates,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Calculator => "Calculator",
            Page::Ledger => "Ledger",
            Page::KaratRates => "Karat Rates",
            Page::ConversionTable => "Ratti Table",
        }
    }
}

/// Calculator input fields, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Tola,
    Masha,
    Ratti,
    Grams,
}

impl Field {
    const ORDER: [Field; 4] = [Field::Tola, Field::Masha, Field::Ratti, Field::Grams];

    fn label(&self) -> &str {
        match self {
            Field::Tola => "Tola",
            Field::Masha => "Masha",
            Field::Ratti => "Ratti",
            Field::Grams => "Grams",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalculatorForm {
    pub tola: String,
    pub masha: String,
    pub ratti: String,
    pub grams: String,
}

impl CalculatorForm {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::Tola => &self.tola,
            Field::Masha => &self.masha,
            Field::Ratti => &self.ratti,
            Field::Grams => &self.grams,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Tola => &mut self.tola,
            Field::Masha => &mut self.masha,
            Field::Ratti => &mut self.ratti,
            Field::Grams => &mut self.grams,
        }
    }
}

pub struct App {
    pub rate: RateState<Database>,
    pub entries: Vec<GoldEntry>,
    pub state: TableState,
    pub current_page: Page,
    pub form: CalculatorForm,
    pub focus: Field,
    pub karat: Karat,
    /// Some while the rate editor is open
    pub rate_input: Option<String>,
    pub message: Option<(String, Color)>,
    pub currency_symbol: String,
    /// Filter typed on the Ratti Table page
    pub table_search: String,
}

impl App {
    pub fn new(rate: RateState<Database>, entries: Vec<GoldEntry>, currency_symbol: String) -> Self {
        let mut state = TableState::default();
        if !entries.is_empty() {
            state.select(Some(0));
        }

        Self {
            rate,
            entries,
            state,
            current_page: Page::Calculator,
            form: CalculatorForm::default(),
            focus: Field::Tola,
            karat: Karat::K24,
            rate_input: None,
            message: None,
            currency_symbol,
            table_search: String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Calculator
    // ------------------------------------------------------------------

    /// Grams field wins when filled in, otherwise Tola/Masha/Ratti
    pub fn calculator_grams(&self) -> f64 {
        if !self.form.grams.trim().is_empty() {
            parse_number(&self.form.grams)
        } else {
            grams_from_tmr_input(&self.form.tola, &self.form.masha, &self.form.ratti)
        }
    }

    pub fn focus_next(&mut self) {
        let idx = Field::ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = Field::ORDER[(idx + 1) % Field::ORDER.len()];
    }

    pub fn focus_previous(&mut self) {
        let idx = Field::ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = Field::ORDER[(idx + Field::ORDER.len() - 1) % Field::ORDER.len()];
    }

    /// Apply a keystroke to the focused field, keeping its input rules
    pub fn type_char(&mut self, c: char) {
        let mut candidate = self.form.value(self.focus).to_string();
        candidate.push(c);

        let accepted = match self.focus {
            Field::Tola => Some(sanitize_integer(&candidate)),
            Field::Masha => accept_masha_input(&candidate),
            Field::Ratti => accept_ratti_input(&candidate),
            Field::Grams => sanitize_decimal(&candidate, GRAMS_DECIMALS),
        };

        if let Some(value) = accepted {
            *self.form.slot(self.focus) = value;
        }
    }

    pub fn backspace(&mut self) {
        self.form.slot(self.focus).pop();
    }

    pub fn clear_form(&mut self) {
        self.form = CalculatorForm::default();
        self.focus = Field::Tola;
    }

    pub fn add_current_to_ledger(&mut self) -> Result<()> {
        let draft = EntryDraft {
            description: "Gold Weight".to_string(),
            grams: self.form.grams.clone(),
            tola: self.form.tola.clone(),
            masha: self.form.masha.clone(),
            ratti: self.form.ratti.clone(),
            karat: self.karat,
            kind: EntryKind::Add,
            price: String::new(),
        };

        let entry = GoldEntry::from_draft(&draft, self.rate.current_rate())?;
        let db = self.rate.store();
        insert_entry(db.conn(), &entry, db.actor())?;
        self.reload_entries()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    pub fn reload_entries(&mut self) -> Result<()> {
        self.entries = get_all_entries(self.rate.store().conn())?;
        match self.state.selected() {
            _ if self.entries.is_empty() => self.state.select(None),
            Some(i) if i >= self.entries.len() => self.state.select(Some(self.entries.len() - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
        Ok(())
    }

    pub fn selected_entry(&self) -> Option<&GoldEntry> {
        self.state.selected().and_then(|i| self.entries.get(i))
    }

    pub fn delete_selected(&mut self) -> Result<bool> {
        let Some(id) = self.selected_entry().map(|e| e.id.clone()) else {
            return Ok(false);
        };
        let db = self.rate.store();
        let removed = delete_entry(db.conn(), &id, db.actor())?;
        self.reload_entries()?;
        Ok(removed)
    }

    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals::from_entries(&self.entries)
    }

    pub fn next(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.entries.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }

    // ------------------------------------------------------------------
    // Rate editing
    // ------------------------------------------------------------------

    pub fn open_rate_editor(&mut self) {
        self.rate_input = Some(format!("{}", self.rate.current_rate()));
    }

    pub fn type_rate_char(&mut self, c: char) {
        if let Some(input) = self.rate_input.as_mut() {
            let mut candidate = input.clone();
            candidate.push(c);
            if let Some(clean) = sanitize_decimal(&candidate, CURRENCY_DECIMALS) {
                *input = clean;
            }
        }
    }

    pub fn commit_rate(&mut self) {
        let Some(input) = self.rate_input.take() else {
            return;
        };

        match self.rate.update_rate_from_input(&input) {
            Ok(_) => {
                self.message = Some(("Gold rate updated successfully!".to_string(), Color::Green));
            }
            Err(e) => {
                self.message = Some((format!("Invalid Rate: {}", e), Color::Red));
            }
        }
    }

    pub fn conversion_rows(&self) -> Vec<ConversionRow> {
        search_conversion_table(&self.table_search)
    }

    fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.currency_symbol)
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Rate editor captures every key while open
        if app.rate_input.is_some() {
            match key.code {
                KeyCode::Esc => app.rate_input = None,
                KeyCode::Enter => app.commit_rate(),
                KeyCode::Backspace => {
                    if let Some(input) = app.rate_input.as_mut() {
                        input.pop();
                    }
                }
                KeyCode::Char(c) => app.type_rate_char(c),
                _ => {}
            }
            continue;
        }

        app.message = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.current_page = app.current_page.next(),
            KeyCode::BackTab => app.current_page = app.current_page.previous(),
            KeyCode::Char('u') => app.open_rate_editor(),
            _ => match app.current_page {
                Page::Calculator => handle_calculator_key(app, key.code, key.modifiers),
                Page::Ledger => handle_ledger_key(app, key.code),
                Page::KaratRates => {}
                Page::ConversionTable => handle_table_key(app, key.code),
            },
        }
    }
}

fn handle_calculator_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Down | KeyCode::Enter => app.focus_next(),
        KeyCode::Up => app.focus_previous(),
        KeyCode::Left => app.karat = app.karat.previous(),
        KeyCode::Right => app.karat = app.karat.next(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char('c') => app.clear_form(),
        KeyCode::Char('a') if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.message = Some(match app.add_current_to_ledger() {
                Ok(()) => ("Added to ledger".to_string(), Color::Green),
                Err(e) => (format!("Error: {}", e), Color::Red),
            });
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => app.type_char(c),
        _ => {}
    }
}

fn handle_table_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            app.table_search.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => app.table_search.push(c),
        _ => {}
    }
}

fn handle_ledger_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home if !app.entries.is_empty() => app.state.select(Some(0)),
        KeyCode::End if !app.entries.is_empty() => app.state.select(Some(app.entries.len() - 1)),
        KeyCode::Char('d') | KeyCode::Delete => {
            app.message = Some(match app.delete_selected() {
                Ok(true) => ("Entry deleted".to_string(), Color::Green),
                Ok(false) => ("Nothing selected".to_string(), Color::Yellow),
                Err(e) => (format!("Error: {}", e), Color::Red),
            });
        }
        _ => {}
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Calculator => render_calculator(f, chunks[1], app),
        Page::Ledger => render_ledger(f, chunks[1], app),
        Page::KaratRates => render_karat_rates(f, chunks[1], app),
        Page::ConversionTable => render_conversion_table(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Calculator, Page::Ledger, Page::KaratRates, Page::ConversionTable];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rate: {} / tola", app.money(app.rate.current_rate())),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!(
            "Updated: {} ({})",
            format_last_updated(app.rate.last_updated()),
            format_relative(app.rate.last_updated(), Utc::now())
        ),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_calculator(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    // Inputs
    let mut input_lines = vec![Line::from("")];
    for field in Field::ORDER {
        let focused = field == app.focus;
        let marker = if focused { "→ " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        input_lines.push(Line::from(vec![
            Span::styled(format!("{}{:<6}", marker, field.label()), style),
            Span::styled(format!("[{:>12}]", app.form.value(field)), style),
        ]));
    }
    input_lines.push(Line::from(""));
    input_lines.push(Line::from(vec![
        Span::raw("  Karat  "),
        Span::styled(
            format!("◀ {} ({:.2}%) ▶", app.karat, app.karat.purity_percent()),
            Style::default().fg(Color::Yellow),
        ),
    ]));

    let inputs = Paragraph::new(input_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Weight "),
    );
    f.render_widget(inputs, columns[0]);

    // Results
    let grams = app.calculator_grams();
    let tmr = tmr_from_grams(grams);
    let rate = app.rate.current_rate();
    let breakdown = decompose_purity(grams, app.karat.value());

    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let result_lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Grams        ", label),
            Span::styled(format_weight(grams, 4), value),
        ]),
        Line::from(vec![
            Span::styled("  T / M / R    ", label),
            Span::styled(format_tmr(&tmr), value),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  Value ({})   ", app.karat), label),
            Span::styled(
                app.money(value_of(grams, app.karat.value(), rate)),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Value (24K)  ", label),
            Span::styled(app.money(value_of(grams, 24, rate)), value),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Pure gold    ", label),
            Span::styled(format!("{} g", format_weight(breakdown.pure_gold, 4)), value),
        ]),
        Line::from(vec![
            Span::styled("  Impurity     ", label),
            Span::styled(format!("{} g", format_weight(breakdown.impurity, 4)), value),
        ]),
    ];

    let results = Paragraph::new(result_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Result "),
    );
    f.render_widget(results, columns[1]);
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(area);

    let header_cells = ["Date", "Description", "Grams", "T / M / R", "Karat", "Type", "Price"]
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

    let symbol = app.currency_symbol.clone();
    let rows = app.entries.iter().map(|entry| {
        let color = match entry.kind {
            EntryKind::Add => Color::Green,
            EntryKind::Subtract => Color::Red,
        };

        Row::new(vec![
            Cell::from(entry.date.format("%Y-%m-%d").to_string()),
            Cell::from(truncate(&entry.description, 24)),
            Cell::from(format_weight(entry.grams, 4)),
            Cell::from(format!("{}/{}/{:.2}", entry.tola, entry.masha, entry.ratti)),
            Cell::from(entry.karat.label()),
            Cell::from(entry.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(format_currency(entry.final_price, &symbol)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Entries "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let totals = app.totals();
    let totals_lines = vec![
        Line::from(vec![
            Span::styled("  Added      ", Style::default().fg(Color::Green)),
            Span::raw(format!(
                "{} g  {}",
                format_weight(totals.added_weight, 4),
                app.money(totals.added_value)
            )),
        ]),
        Line::from(vec![
            Span::styled("  Subtracted ", Style::default().fg(Color::Red)),
            Span::raw(format!(
                "{} g  {}",
                format_weight(totals.subtracted_weight, 4),
                app.money(totals.subtracted_value)
            )),
        ]),
        Line::from(vec![
            Span::styled("  Balance    ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                "{} g  {}  ({})",
                format_weight(totals.balance_weight, 4),
                app.money(totals.balance_value),
                format_tmr(&totals.balance_tmr())
            )),
        ]),
    ];

    let summary = Paragraph::new(totals_lines)
        .block(Block::default().borders(Borders::ALL).title(" Totals "));
    f.render_widget(summary, chunks[1]);
}

fn render_karat_rates(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Karat", "Purity", "Per Tola", "Per Gram", "Use"]
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

    let rows: Vec<Row> = karat_rate_table(app.rate.current_rate())
        .into_iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.karat.label()),
                Cell::from(format!("{:.2}%", row.purity_percent)),
                Cell::from(app.money(row.per_tola)).style(Style::default().fg(Color::Green)),
                Cell::from(app.money(row.per_gram)),
                Cell::from(row.karat.description()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Prices by Karat "),
    );

    f.render_widget(table, area);
}

fn render_conversion_table(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Ratti", "Masha + R", "Tola + R", "Milligrams", "Grams"]
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

    let rows: Vec<Row> = app
        .conversion_rows()
        .into_iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.ratti.to_string()),
                Cell::from(format!("{} M + {} R", row.masha, row.masha_remainder)),
                Cell::from(format!("{} T + {} R", row.tola, row.tola_remainder)),
                Cell::from(format!("{:.1}", row.milligrams)),
                Cell::from(format_weight(row.grams, 4)).style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    let title = if app.table_search.is_empty() {
        " Ratti Conversion ".to_string()
    } else {
        format!(" Ratti Conversion (search: {}) ", app.table_search)
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let mut status_spans = vec![];

    if let Some(input) = &app.rate_input {
        status_spans.push(Span::styled(" New rate: ", Style::default().fg(Color::Cyan)));
        status_spans.push(Span::styled(
            format!("{}▏", input),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw("  | "));
        status_spans.push(Span::styled("Enter", key));
        status_spans.push(Span::raw(" Save | "));
        status_spans.push(Span::styled("Esc", key));
        status_spans.push(Span::raw(" Cancel"));
    } else {
        if let Some((text, color)) = &app.message {
            status_spans.push(Span::styled(format!(" {} ", text), Style::default().fg(*color)));
            status_spans.push(Span::raw(" | "));
        }

        match app.current_page {
            Page::Calculator => {
                status_spans.push(Span::styled("↑/↓", key));
                status_spans.push(Span::raw(" Field | "));
                status_spans.push(Span::styled("←/→", key));
                status_spans.push(Span::raw(" Karat | "));
                status_spans.push(Span::styled("a", key));
                status_spans.push(Span::raw(" Add to ledger | "));
                status_spans.push(Span::styled("c", key));
                status_spans.push(Span::raw(" Clear | "));
            }
            Page::Ledger => {
                let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
                status_spans.push(Span::styled(
                    format!("Row: {}/{} ", selected, app.entries.len()),
                    Style::default().fg(Color::Cyan),
                ));
                status_spans.push(Span::raw("| "));
                status_spans.push(Span::styled("d", key));
                status_spans.push(Span::raw(" Delete | "));
            }
            Page::KaratRates => {}
            Page::ConversionTable => {
                status_spans.push(Span::styled("0-9 .", key));
                status_spans.push(Span::raw(" Search | "));
            }
        }

        status_spans.push(Span::styled("u", key));
        status_spans.push(Span::raw(" Update rate | "));
        status_spans.push(Span::styled("Tab", key));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

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
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurum_calc::DEFAULT_RATE;

    fn test_app() -> App {
        let db = Database::open_in_memory().unwrap().with_actor("tui");
        App::new(RateState::load(db, DEFAULT_RATE), Vec::new(), "Rs".to_string())
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.type_char(c);
        }
    }

    #[test]
    fn test_calculator_fields_follow_input_rules() {
        let mut app = test_app();

        type_str(&mut app, "1");
        app.focus_next();
        type_str(&mut app, "12"); // 12 masha rejected, stays "1"
        app.focus_next();
        type_str(&mut app, "9"); // ratti above 7.99 rejected
        type_str(&mut app, "2.555");

        assert_eq!(app.form.tola, "1");
        assert_eq!(app.form.masha, "1");
        assert_eq!(app.form.ratti, "2.55");

        let expected = grams_from_tmr_input("1", "1", "2.55");
        assert_eq!(app.calculator_grams(), expected);
    }

    #[test]
    fn test_grams_field_takes_precedence() {
        let mut app = test_app();
        type_str(&mut app, "3");
        app.focus = Field::Grams;
        type_str(&mut app, "11.664");

        assert_eq!(app.calculator_grams(), 11.664);

        app.clear_form();
        assert_eq!(app.calculator_grams(), 0.0);
        assert_eq!(app.focus, Field::Tola);
    }

    #[test]
    fn test_add_and_delete_ledger_entries() {
        let mut app = test_app();

        assert!(app.add_current_to_ledger().is_err(), "empty weight must be rejected");

        type_str(&mut app, "1");
        app.add_current_to_ledger().unwrap();
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.totals().balance_weight, 11.664);

        assert!(app.delete_selected().unwrap());
        assert!(app.entries.is_empty());
        assert_eq!(app.state.selected(), None);
        assert!(!app.delete_selected().unwrap());
    }

    #[test]
    fn test_rate_editor() {
        let mut app = test_app();

        app.open_rate_editor();
        app.rate_input = Some(String::new());
        for c in "355000.5".chars() {
            app.type_rate_char(c);
        }
        app.commit_rate();

        assert_eq!(app.rate.current_rate(), 355000.5);
        assert!(app.rate_input.is_none());

        app.rate_input = Some("0".to_string());
        app.commit_rate();
        assert_eq!(app.rate.current_rate(), 355000.5);
        assert!(matches!(app.message, Some((_, Color::Red))));
    }

    #[test]
    fn test_page_cycle_and_truncate() {
        let mut page = Page::Calculator;
        for _ in 0..4 {
            page = page.next();
        }
        assert_eq!(page, Page::Calculator);
        assert_eq!(Page::Calculator.previous(), Page::ConversionTable);
        assert_eq!(truncate("Gold Weight", 20), "Gold Weight");
        assert_eq!(truncate("A very long description", 10), "A very ...");
    }

    #[test]
    fn test_conversion_table_search() {
        let mut app = test_app();
        assert_eq!(app.conversion_rows().len(), 96);

        for c in "0.972".chars() {
            handle_table_key(&mut app, KeyCode::Char(c));
        }
        handle_table_key(&mut app, KeyCode::Char('x'));
        assert_eq!(app.table_search, "0.972");
        assert_eq!(app.conversion_rows()[0].ratti, 8);

        handle_table_key(&mut app, KeyCode::Backspace);
        assert_eq!(app.table_search, "0.97");
    }
}
