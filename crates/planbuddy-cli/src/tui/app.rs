//! TUI application state and key handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use planbuddy_core::{Screen, Session};
use planbuddy_store::Task;

/// Message shown in the status bar until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// What the event loop must do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Draw the loading state, then await [`App::submit`].
    Submit,
}

/// Application state for the TUI.
pub struct App {
    pub session: Session,
    pub selected_task: usize,
    /// The "start a new plan?" dialog is open.
    pub confirming_new_plan: bool,
    pub show_help: bool,
    pub should_quit: bool,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            selected_task: 0,
            confirming_new_plan: false,
            show_help: false,
            should_quit: false,
            notice: None,
        }
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.session.visible_tasks()
    }

    pub fn selected(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_task).copied()
    }

    // -- Keys --

    pub async fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Action::None;
        }
        self.notice = None;

        if self.show_help {
            self.show_help = false;
            return Action::None;
        }
        if self.confirming_new_plan {
            self.handle_confirm_key(key).await;
            return Action::None;
        }

        if matches!(self.session.screen(), Screen::Create(_)) {
            self.handle_create_key(key).await
        } else {
            self.handle_plan_key(key).await;
            Action::None
        }
    }

    async fn handle_create_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => return Action::Submit,
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(form) = self.session.create_form_mut() {
                    form.horizon = form.horizon.toggled();
                }
            }
            KeyCode::Esc => {
                if !self.session.view_current_plan().await {
                    self.should_quit = true;
                } else {
                    self.selected_task = 0;
                }
            }
            KeyCode::Backspace => {
                if let Some(form) = self.session.create_form_mut() {
                    form.goal.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(form) = self.session.create_form_mut() {
                    form.goal.push(c);
                }
            }
            _ => {}
        }
        Action::None
    }

    async fn handle_plan_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected().await,
            KeyCode::Char('f') => self.cycle_filter(),
            KeyCode::Char('n') => self.confirming_new_plan = true,
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.confirming_new_plan = false;
                if self.session.new_plan(true).await {
                    self.selected_task = 0;
                    self.notice = Some(Notice::Info("Plan discarded".to_string()));
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirming_new_plan = false;
            }
            _ => {}
        }
    }

    // -- Actions --

    /// Run the pending submission. The caller draws the loading frame first.
    pub async fn submit(&mut self) {
        match self.session.submit().await {
            Ok(()) => {
                self.selected_task = 0;
                self.notice = Some(Notice::Info("Plan created".to_string()));
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    async fn toggle_selected(&mut self) {
        let Some(id) = self.selected().map(|t| t.id.clone()) else {
            return;
        };
        self.session.toggle(&id).await;
    }

    fn cycle_filter(&mut self) {
        let next = match self.session.screen() {
            Screen::Plan(view) => view.filter.next(),
            Screen::Create(_) => return,
        };
        self.session.set_filter(next);
        self.clamp_selection();
    }

    // -- Navigation --

    pub fn move_up(&mut self) {
        if self.selected_task > 0 {
            self.selected_task -= 1;
        }
    }

    pub fn move_down(&mut self) {
        let len = self.visible_tasks().len();
        if len > 0 && self.selected_task < len - 1 {
            self.selected_task += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if self.selected_task >= len {
            self.selected_task = len.saturating_sub(1);
        }
    }
}
