use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::info;

use ludoteca_core::{
    auth, CatalogStore, GameRecord, RentalLedger, RentalRecord, Session,
};

use crate::forms::{GameForm, LoginForm, RentForm};

const TICK_RATE: Duration = Duration::from_millis(250);
const FORM_LABEL_WIDTH: usize = 13;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Menu,
    Catalog,
    Rentals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogMode {
    Browse,
    TitleFilter,
    CategoryFilter,
}

const MENU_ITEMS: [&str; 4] = ["Catalogue", "Rentals", "Switch user", "Quit"];

/// High-level application state for the rental desk TUI.
pub struct LudotecaApp {
    catalog: CatalogStore,
    ledger: RentalLedger,
    session: Option<Session>,
    screen: Screen,
    theme: Theme,
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    // Catalogue screen.
    catalog_mode: CatalogMode,
    title_filter: String,
    category_filter: String,
    games: Vec<GameRecord>,
    game_cursor: usize,
    game_offset: usize,
    game_list_height: usize,
    // Rentals screen.
    rentals: Vec<RentalRecord>,
    show_returned: bool,
    rental_cursor: usize,
    rental_offset: usize,
    rental_list_height: usize,
    // Modal state.
    login: LoginForm,
    game_form: Option<GameForm>,
    rent_form: Option<RentForm>,
    confirm_remove: Option<GameRecord>,
}

impl LudotecaApp {
    pub fn new(catalog: CatalogStore, ledger: RentalLedger) -> Self {
        Self {
            catalog,
            ledger,
            session: None,
            screen: Screen::Login,
            theme: Theme::default(),
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            catalog_mode: CatalogMode::Browse,
            title_filter: String::new(),
            category_filter: String::new(),
            games: Vec::new(),
            game_cursor: 0,
            game_offset: 0,
            game_list_height: 1,
            rentals: Vec::new(),
            show_returned: false,
            rental_cursor: 0,
            rental_offset: 0,
            rental_list_height: 1,
            login: LoginForm::new(),
            game_form: None,
            rent_form: None,
            confirm_remove: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.refresh_games();
        self.refresh_rentals();

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            if event::poll(TICK_RATE).context("failed to poll input")? {
                if let Event::Key(key) = event::read().context("failed to read input")? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    // ---- input handling -------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        if self.game_form.is_some() {
            self.handle_game_form_key(key);
            return;
        }
        if self.rent_form.is_some() {
            self.handle_rent_form_key(key);
            return;
        }
        if self.confirm_remove.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Menu => self.handle_menu_key(key),
            Screen::Catalog => self.handle_catalog_key(key),
            Screen::Rentals => self.handle_rentals_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.login.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.login.focus_prev(),
            KeyCode::Backspace => self.login.active_mut().backspace(),
            KeyCode::Enter => {
                if self.login.cursor == 0 {
                    self.login.focus_next();
                    return;
                }
                match auth::authenticate(self.login.username(), self.login.password()) {
                    Some(session) => {
                        info!("login: {} ({})", session.username, session.role);
                        self.set_status(format!(
                            "Logged in as {} ({})",
                            session.username, session.role
                        ));
                        self.session = Some(session);
                        self.login = LoginForm::new();
                        self.menu_cursor = 0;
                        self.screen = Screen::Menu;
                    }
                    None => {
                        info!("rejected login attempt for {:?}", self.login.username());
                        self.login.reject("Invalid username or password");
                    }
                }
            }
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.login.active_mut().push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.menu_cursor + 1 < MENU_ITEMS.len() {
                    self.menu_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Enter => match self.menu_cursor {
                0 => {
                    self.refresh_games();
                    self.screen = Screen::Catalog;
                    self.set_status(format!("{} games on record", self.games.len()));
                }
                1 => {
                    self.refresh_rentals();
                    self.screen = Screen::Rentals;
                    self.set_status(format!("{} rentals shown", self.rentals.len()));
                }
                2 => self.switch_user(),
                _ => self.should_quit = true,
            },
            _ => {}
        }
    }

    fn switch_user(&mut self) {
        if let Some(session) = self.session.take() {
            info!("logout: {}", session.username);
        }
        self.login = LoginForm::new();
        self.screen = Screen::Login;
        self.set_status("Ready");
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) {
        match self.catalog_mode {
            CatalogMode::Browse => self.handle_catalog_browse_key(key),
            CatalogMode::TitleFilter | CatalogMode::CategoryFilter => {
                self.handle_catalog_filter_key(key)
            }
        }
    }

    fn handle_catalog_filter_key(&mut self, key: KeyEvent) {
        let filtering_title = self.catalog_mode == CatalogMode::TitleFilter;
        match key.code {
            KeyCode::Esc => {
                if filtering_title {
                    self.title_filter.clear();
                } else {
                    self.category_filter.clear();
                }
                self.catalog_mode = CatalogMode::Browse;
                self.refresh_games();
                self.set_status("Filter cancelled");
            }
            KeyCode::Enter => {
                self.catalog_mode = CatalogMode::Browse;
                self.set_status(format!("{} games match", self.games.len()));
            }
            KeyCode::Backspace => {
                if filtering_title {
                    self.title_filter.pop();
                } else {
                    self.category_filter.pop();
                }
                self.refresh_games();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    if filtering_title {
                        self.title_filter.push(ch);
                    } else {
                        self.category_filter.push(ch);
                    }
                    self.refresh_games();
                }
            }
            _ => {}
        }
    }

    fn handle_catalog_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Esc => {
                self.screen = Screen::Menu;
                self.set_status("Ready");
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_game_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_game_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_game_cursor(isize::MIN),
            KeyCode::Char('G') | KeyCode::End => self.move_game_cursor(isize::MAX),
            KeyCode::PageDown => self.move_game_cursor(self.game_list_height as isize),
            KeyCode::PageUp => self.move_game_cursor(-(self.game_list_height as isize)),
            KeyCode::Char('/') => {
                self.catalog_mode = CatalogMode::TitleFilter;
                self.set_status("Type to filter by title");
            }
            KeyCode::Char('c') if key.modifiers.is_empty() => {
                self.catalog_mode = CatalogMode::CategoryFilter;
                self.set_status("Type a category to filter by");
            }
            KeyCode::Char('a') if key.modifiers.is_empty() => {
                if self.require_catalog_admin() {
                    self.game_form = Some(GameForm::for_new());
                }
            }
            KeyCode::Char('e') if key.modifiers.is_empty() => {
                if self.require_catalog_admin() {
                    match self.selected_game() {
                        Some(game) => self.game_form = Some(GameForm::for_edit(&game)),
                        None => self.set_status("No game selected"),
                    }
                }
            }
            KeyCode::Char('d') if key.modifiers.is_empty() => {
                if self.require_catalog_admin() {
                    match self.selected_game() {
                        Some(game) => self.confirm_remove = Some(game),
                        None => self.set_status("No game selected"),
                    }
                }
            }
            KeyCode::Char('r') if key.modifiers.is_empty() => match self.selected_game() {
                Some(game) if game.available => self.rent_form = Some(RentForm::new(&game)),
                Some(game) => {
                    self.set_status(format!("\"{}\" is already rented out", game.title));
                }
                None => self.set_status("No game selected"),
            },
            _ => {}
        }
    }

    fn handle_rentals_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Esc => {
                self.screen = Screen::Menu;
                self.set_status("Ready");
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_rental_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_rental_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_rental_cursor(isize::MIN),
            KeyCode::Char('G') | KeyCode::End => self.move_rental_cursor(isize::MAX),
            KeyCode::PageDown => self.move_rental_cursor(self.rental_list_height as isize),
            KeyCode::PageUp => self.move_rental_cursor(-(self.rental_list_height as isize)),
            KeyCode::Char('a') if key.modifiers.is_empty() => {
                self.show_returned = !self.show_returned;
                self.refresh_rentals();
                let message = if self.show_returned {
                    format!("Showing all {} rentals", self.rentals.len())
                } else {
                    format!("Showing {} active rentals", self.rentals.len())
                };
                self.set_status(message);
            }
            KeyCode::Enter => self.return_selected_rental(),
            _ => {}
        }
    }

    fn return_selected_rental(&mut self) {
        let allowed = self
            .session
            .as_ref()
            .map(|session| session.role.can_return_rentals())
            .unwrap_or(false);
        if !allowed {
            self.set_status("Only administrators can register returns");
            return;
        }
        let Some(rental) = self.rentals.get(self.rental_cursor).cloned() else {
            self.set_status("No rental selected");
            return;
        };
        match self.ledger.return_rental(&rental.code) {
            Ok(closed) => {
                info!("return: {} ({})", closed.code, closed.title);
                self.set_status(format!(
                    "Rental {} closed, \"{}\" back on the shelf",
                    closed.code, closed.title
                ));
                self.refresh_rentals();
                self.refresh_games();
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn handle_game_form_key(&mut self, key: KeyEvent) {
        let mut submit = false;
        let mut cancel = false;
        if let Some(form) = self.game_form.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Backspace => form.active_mut().backspace(),
                KeyCode::Enter => {
                    if form.on_last_field() {
                        submit = true;
                    } else {
                        form.focus_next();
                    }
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        form.active_mut().push(ch);
                    }
                }
                _ => {}
            }
        }
        if cancel {
            self.game_form = None;
            self.set_status("Cancelled");
        } else if submit {
            self.submit_game_form();
        }
    }

    fn submit_game_form(&mut self) {
        let Some(form) = self.game_form.as_mut() else {
            return;
        };
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(message) => {
                form.error = Some(message);
                return;
            }
        };

        let outcome = match form.editing {
            Some(id) => self
                .catalog
                .update(id, draft.into_patch())
                .map(|game| ("Updated", game)),
            None => self
                .catalog
                .add(draft.into_new_game())
                .map(|game| ("Added", game)),
        };

        match outcome {
            Ok((verb, game)) => {
                info!("{}: #{} {}", verb.to_lowercase(), game.id, game.title);
                self.set_status(format!("{verb} \"{}\" (id {})", game.title, game.id));
                self.game_form = None;
                self.refresh_games();
            }
            Err(err) => {
                if let Some(form) = self.game_form.as_mut() {
                    form.error = Some(err.to_string());
                }
            }
        }
    }

    fn handle_rent_form_key(&mut self, key: KeyEvent) {
        let mut submit = false;
        let mut cancel = false;
        if let Some(form) = self.rent_form.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Backspace => form.active_mut().backspace(),
                KeyCode::Enter => {
                    if form.on_last_field() {
                        submit = true;
                    } else {
                        form.focus_next();
                    }
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        form.active_mut().push(ch);
                    }
                }
                _ => {}
            }
        }
        if cancel {
            self.rent_form = None;
            self.set_status("Cancelled");
        } else if submit {
            self.submit_rent_form();
        }
    }

    fn submit_rent_form(&mut self) {
        let Some(form) = self.rent_form.as_mut() else {
            return;
        };
        let customer = match form.validate() {
            Ok(customer) => customer,
            Err(message) => {
                form.error = Some(message);
                return;
            }
        };

        match self.ledger.rent(form.game_id, customer) {
            Ok(rental) => {
                info!("rent: {} ({})", rental.code, rental.title);
                self.set_status(format!(
                    "Rental {} opened for \"{}\"",
                    rental.code, rental.title
                ));
                self.rent_form = None;
                self.refresh_games();
                self.refresh_rentals();
            }
            Err(err) => {
                if let Some(form) = self.rent_form.as_mut() {
                    form.error = Some(err.to_string());
                }
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(game) = self.confirm_remove.take() {
                    match self.catalog.remove(game.id) {
                        Ok(()) => {
                            info!("remove: #{} {}", game.id, game.title);
                            self.set_status(format!("Removed \"{}\"", game.title));
                            self.refresh_games();
                        }
                        Err(err) => self.set_status(err.to_string()),
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_remove = None;
                self.set_status("Removal cancelled");
            }
            _ => {}
        }
    }

    fn require_catalog_admin(&mut self) -> bool {
        let allowed = self
            .session
            .as_ref()
            .map(|session| session.role.can_manage_catalog())
            .unwrap_or(false);
        if !allowed {
            self.set_status("Only administrators can change the catalogue");
        }
        allowed
    }

    // ---- derived state --------------------------------------------------

    fn selected_game(&self) -> Option<GameRecord> {
        self.games.get(self.game_cursor).cloned()
    }

    fn refresh_games(&mut self) {
        let title = self.title_filter.trim().to_lowercase();
        let category = self.category_filter.trim().to_string();

        let mut games = if !category.is_empty() {
            self.catalog.filter_by_category(&category)
        } else if !title.is_empty() {
            self.catalog.search_by_title(&title)
        } else {
            self.catalog.all()
        };
        if !category.is_empty() && !title.is_empty() {
            games.retain(|game| game.title.to_lowercase().contains(&title));
        }

        self.games = games;
        if self.game_cursor >= self.games.len() {
            self.game_cursor = self.games.len().saturating_sub(1);
        }
        ensure_visible(
            self.game_cursor,
            &mut self.game_offset,
            self.games.len(),
            self.game_list_height,
        );
    }

    fn refresh_rentals(&mut self) {
        let mut rentals = self.ledger.all();
        if !self.show_returned {
            // The active view is a plain caller-side filter over the ledger.
            rentals.retain(|rental| !rental.returned);
        }
        self.rentals = rentals;
        if self.rental_cursor >= self.rentals.len() {
            self.rental_cursor = self.rentals.len().saturating_sub(1);
        }
        ensure_visible(
            self.rental_cursor,
            &mut self.rental_offset,
            self.rentals.len(),
            self.rental_list_height,
        );
    }

    fn move_game_cursor(&mut self, delta: isize) {
        step_cursor(&mut self.game_cursor, self.games.len(), delta);
        ensure_visible(
            self.game_cursor,
            &mut self.game_offset,
            self.games.len(),
            self.game_list_height,
        );
    }

    fn move_rental_cursor(&mut self, delta: isize) {
        step_cursor(&mut self.rental_cursor, self.rentals.len(), delta);
        ensure_visible(
            self.rental_cursor,
            &mut self.rental_offset,
            self.rentals.len(),
            self.rental_list_height,
        );
    }

    // ---- rendering ------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Login => self.draw_login(frame),
            Screen::Menu => self.draw_menu(frame),
            Screen::Catalog => self.draw_catalog(frame),
            Screen::Rentals => self.draw_rentals(frame),
        }
        if let Some(form) = &self.game_form {
            self.render_game_form(frame, form);
        }
        if let Some(form) = &self.rent_form {
            self.render_rent_form(frame, form);
        }
        if let Some(game) = &self.confirm_remove {
            self.render_confirm_remove(frame, game);
        }
    }

    fn draw_login(&self, frame: &mut Frame) {
        let area = frame.size();
        let box_area = centered_rect(46, 10, area);
        frame.render_widget(Clear, box_area);

        let mut lines = vec![
            Line::from(Span::styled(
                "LUDOTECA",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "game rental desk",
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
        ];
        for (idx, field) in self.login.fields.iter().enumerate() {
            lines.push(field_line(
                &self.theme,
                field.label,
                &field.display_value(),
                idx == self.login.cursor,
            ));
        }
        lines.push(Line::from(""));
        match &self.login.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.danger),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter login · Esc quit",
                Style::default().fg(self.theme.muted),
            ))),
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Login"))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, box_area);

        let field = &self.login.fields[self.login.cursor];
        let cursor_x = box_area.x
            + 1
            + 2
            + FORM_LABEL_WIDTH as u16
            + 2
            + field.display_value().len() as u16;
        let cursor_y = box_area.y + 4 + self.login.cursor as u16;
        frame.set_cursor(
            cursor_x.min(box_area.x + box_area.width.saturating_sub(2)),
            cursor_y,
        );
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, layout[0], "Menu");

        let menu_height = (MENU_ITEMS.len() as u16 + 2).min(layout[1].height);
        let menu_area = centered_rect(28.min(layout[1].width.max(1)), menu_height, layout[1]);
        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);

        self.render_status(frame, layout[2], "j/k move · Enter select · q quit");
    }

    fn draw_catalog(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, layout[0], "Catalogue");

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(layout[1]);

        self.game_list_height = body[0].height.saturating_sub(2) as usize;
        ensure_visible(
            self.game_cursor,
            &mut self.game_offset,
            self.games.len(),
            self.game_list_height,
        );
        self.render_game_list(frame, body[0]);
        self.render_game_detail(frame, body[1]);

        let hints = match self.catalog_mode {
            CatalogMode::Browse => {
                "a add · e edit · d remove · r rent · / title · c category · Esc menu"
            }
            CatalogMode::TitleFilter | CatalogMode::CategoryFilter => "Enter apply · Esc cancel",
        };
        self.render_status(frame, layout[2], hints);
    }

    fn render_game_list(&self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let end = (self.game_offset + height).min(self.games.len());
        let visible = &self.games[self.game_offset.min(end)..end];

        let mut list_state = ListState::default();
        if !visible.is_empty() {
            let selected = self
                .game_cursor
                .saturating_sub(self.game_offset)
                .min(visible.len().saturating_sub(1));
            list_state.select(Some(selected));
        }

        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let is_selected = self.game_offset + idx == self.game_cursor;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let id = Span::styled(
                    format!("{:>4}  ", game.id),
                    Style::default().fg(self.theme.muted),
                );
                let title = Span::styled(
                    format!("{:<26}  ", truncate(&game.title, 26)),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let category = Span::styled(
                    format!("{:<14}  ", truncate(&game.category, 14)),
                    Style::default().fg(self.theme.muted),
                );
                let availability = if game.available {
                    Span::styled("on shelf", Style::default().fg(self.theme.success))
                } else {
                    Span::styled("rented", Style::default().fg(self.theme.danger))
                };
                ListItem::new(Line::from(vec![marker, id, title, category, availability]))
            })
            .collect();

        let mut title = format!("Games ({})", self.games.len());
        if !self.title_filter.trim().is_empty() {
            title.push_str(&format!(" · title ~ \"{}\"", self.title_filter.trim()));
        }
        if !self.category_filter.trim().is_empty() {
            title.push_str(&format!(" · category = \"{}\"", self.category_filter.trim()));
        }

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(game) = self.games.get(self.game_cursor) else {
            let paragraph = Paragraph::new("No games to show").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let availability = if game.available {
            Span::styled("on shelf", Style::default().fg(self.theme.success))
        } else {
            Span::styled("rented out", Style::default().fg(self.theme.danger))
        };
        let lines = vec![
            Line::from(Span::styled(
                game.display_title(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                game.category.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
            Line::from(format!("Developer: {}", game.developer)),
            Line::from(format!("Publisher: {}", game.publisher)),
            Line::from(format!("Age rating: {}", game.age_rating)),
            Line::from(format!("Score: {}", game.score)),
            Line::from(vec![Span::raw("Availability: "), availability]),
            Line::from(Span::styled(
                format!(
                    "#{} · registered {}",
                    game.id,
                    game.created_at.format("%Y-%m-%d %H:%M UTC")
                ),
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_rentals(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, layout[0], "Rentals");

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(layout[1]);

        self.rental_list_height = body[0].height.saturating_sub(2) as usize;
        ensure_visible(
            self.rental_cursor,
            &mut self.rental_offset,
            self.rentals.len(),
            self.rental_list_height,
        );
        self.render_rental_list(frame, body[0]);
        self.render_rental_detail(frame, body[1]);

        self.render_status(
            frame,
            layout[2],
            "Enter return · a toggle returned · Esc menu",
        );
    }

    fn render_rental_list(&self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let end = (self.rental_offset + height).min(self.rentals.len());
        let visible = &self.rentals[self.rental_offset.min(end)..end];

        let mut list_state = ListState::default();
        if !visible.is_empty() {
            let selected = self
                .rental_cursor
                .saturating_sub(self.rental_offset)
                .min(visible.len().saturating_sub(1));
            list_state.select(Some(selected));
        }

        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .map(|(idx, rental)| {
                let is_selected = self.rental_offset + idx == self.rental_cursor;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let code = Span::styled(
                    format!("{:<18}  ", truncate(&rental.code, 18)),
                    Style::default().fg(self.theme.accent),
                );
                let title = Span::styled(
                    format!("{:<22}  ", truncate(&rental.title, 22)),
                    Style::default().fg(self.theme.primary_fg),
                );
                let customer = Span::styled(
                    format!("{:<16}  ", truncate(&rental.customer.name, 16)),
                    Style::default().fg(self.theme.muted),
                );
                let state = if rental.returned {
                    Span::styled("returned", Style::default().fg(self.theme.muted))
                } else {
                    Span::styled("open", Style::default().fg(self.theme.warning))
                };
                ListItem::new(Line::from(vec![marker, code, title, customer, state]))
            })
            .collect();

        let title = if self.show_returned {
            format!("Rentals ({}, all)", self.rentals.len())
        } else {
            format!("Rentals ({} active)", self.rentals.len())
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_rental_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Rental");
        let Some(rental) = self.rentals.get(self.rental_cursor) else {
            let message = if self.show_returned {
                "No rentals on record"
            } else {
                "No active rentals"
            };
            let paragraph = Paragraph::new(message).block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                rental.code.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Game: {} (id {})", rental.title, rental.game_id)),
            Line::from(""),
            Line::from(format!("Customer: {}", rental.customer.name)),
            Line::from(format!("Document: {}", rental.customer.document_id)),
        ];
        if let Some(contact) = &rental.customer.contact {
            lines.push(Line::from(format!("Contact: {contact}")));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Rented: {}",
            rental.rented_at.format("%Y-%m-%d %H:%M UTC")
        )));
        match rental.returned_at {
            Some(returned_at) => lines.push(Line::from(vec![
                Span::raw(format!(
                    "Returned: {}",
                    returned_at.format("%Y-%m-%d %H:%M UTC")
                )),
            ])),
            None => lines.push(Line::from(Span::styled(
                "Still out",
                Style::default().fg(self.theme.warning),
            ))),
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, screen_name: &str) {
        let user = match &self.session {
            Some(session) => format!("{} ({})", session.username, session.role),
            None => "not logged in".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(
                "LUDOTECA",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" · {screen_name} · ")),
            Span::styled(user, Style::default().fg(self.theme.muted)),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, hints: &str) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = match self.catalog_mode {
            CatalogMode::TitleFilter if self.screen == Screen::Catalog => {
                format!("Title filter: {}", self.title_filter)
            }
            CatalogMode::CategoryFilter if self.screen == Screen::Catalog => {
                format!("Category filter: {}", self.category_filter)
            }
            _ => self.status.clone(),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(hints.to_string(), Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_game_form(&self, frame: &mut Frame, form: &GameForm) {
        let title = match form.editing {
            Some(id) => format!("Edit Game #{id}"),
            None => "Add Game".to_string(),
        };
        self.render_form_modal(frame, &title, &form.fields, form.cursor, form.error.as_deref());
    }

    fn render_rent_form(&self, frame: &mut Frame, form: &RentForm) {
        let title = format!("Rent · {}", form.game_label);
        self.render_form_modal(frame, &title, &form.fields, form.cursor, form.error.as_deref());
    }

    fn render_form_modal(
        &self,
        frame: &mut Frame,
        title: &str,
        fields: &[crate::forms::TextField],
        cursor: usize,
        error: Option<&str>,
    ) {
        let frame_area = frame.size();
        let width = 56.min(frame_area.width.saturating_sub(4)).max(30);
        let height = (fields.len() as u16 + 4).min(frame_area.height.saturating_sub(2));
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let mut lines = Vec::new();
        for (idx, field) in fields.iter().enumerate() {
            lines.push(field_line(
                &self.theme,
                field.label,
                &field.display_value(),
                idx == cursor,
            ));
        }
        lines.push(Line::from(""));
        match error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(self.theme.danger),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter next/save · Tab move · Esc cancel",
                Style::default().fg(self.theme.muted),
            ))),
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);

        if let Some(field) = fields.get(cursor) {
            let cursor_x = area.x
                + 1
                + 2
                + FORM_LABEL_WIDTH as u16
                + 2
                + field.display_value().len() as u16;
            let cursor_y = area.y + 1 + cursor as u16;
            frame.set_cursor(
                cursor_x.min(area.x + area.width.saturating_sub(2)),
                cursor_y.min(area.y + area.height.saturating_sub(2)),
            );
        }
    }

    fn render_confirm_remove(&self, frame: &mut Frame, game: &GameRecord) {
        let frame_area = frame.size();
        let area = centered_rect(50.min(frame_area.width.saturating_sub(4)), 5, frame_area);
        frame.render_widget(Clear, area);

        let lines = vec![
            Line::from(format!("Remove \"{}\" (id {})?", game.title, game.id)),
            Line::from(""),
            Line::from(Span::styled(
                "y remove · n cancel",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Confirm removal")
                    .border_style(Style::default().fg(self.theme.warning)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn field_line<'a>(theme: &Theme, label: &'a str, value: &str, active: bool) -> Line<'a> {
    let marker = if active {
        Span::styled(
            "▶ ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("  ")
    };
    let label_span = Span::styled(
        format!("{label:<width$}", width = FORM_LABEL_WIDTH),
        Style::default().fg(theme.muted),
    );
    let value_span = if active {
        Span::styled(value.to_string(), Style::default().fg(theme.primary_fg))
    } else {
        Span::raw(value.to_string())
    };
    Line::from(vec![marker, label_span, Span::raw(": "), value_span])
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn step_cursor(cursor: &mut usize, len: usize, delta: isize) {
    if len == 0 {
        *cursor = 0;
        return;
    }
    let last = (len - 1) as isize;
    let current = *cursor as isize;
    let next = current.saturating_add(delta).clamp(0, last);
    *cursor = next as usize;
}

fn ensure_visible(cursor: usize, offset: &mut usize, len: usize, height: usize) {
    if len == 0 || height == 0 {
        *offset = 0;
        return;
    }
    let max_offset = len.saturating_sub(height);
    if cursor < *offset {
        *offset = cursor;
    } else if cursor >= *offset + height {
        *offset = cursor + 1 - height;
    }
    if *offset > max_offset {
        *offset = max_offset;
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stepping_clamps_to_the_list() {
        let mut cursor = 0;
        step_cursor(&mut cursor, 3, -1);
        assert_eq!(cursor, 0);
        step_cursor(&mut cursor, 3, 10);
        assert_eq!(cursor, 2);
        step_cursor(&mut cursor, 3, isize::MIN);
        assert_eq!(cursor, 0);
        step_cursor(&mut cursor, 0, 5);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn scroll_offset_follows_the_cursor() {
        let mut offset = 0;
        ensure_visible(5, &mut offset, 10, 3);
        assert_eq!(offset, 3);
        ensure_visible(1, &mut offset, 10, 3);
        assert_eq!(offset, 1);
        ensure_visible(9, &mut offset, 10, 3);
        assert_eq!(offset, 7);
        ensure_visible(0, &mut offset, 0, 3);
        assert_eq!(offset, 0);
    }

    #[test]
    fn truncate_keeps_short_text_and_marks_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 8), "a very …");
    }
}
