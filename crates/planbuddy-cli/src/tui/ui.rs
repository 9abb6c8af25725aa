//! TUI rendering using ratatui.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use planbuddy_core::{CreateScreen, PlanScreen, Screen};
use planbuddy_store::{Horizon, Priority};

use super::app::{App, Notice};

/// Render the current screen.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // main content
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    match app.session.screen() {
        Screen::Create(form) => render_create(f, form, chunks[0]),
        Screen::Plan(view) => render_plan(f, app, view, chunks[0]),
    }

    render_status_bar(f, app, chunks[1]);

    if app.confirming_new_plan {
        render_confirm(f, f.area());
    } else if app.show_help {
        render_help(f, f.area());
    }
}

// -- Create screen --

fn render_create(f: &mut Frame, form: &CreateScreen, area: Rect) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" PlanBuddy: new plan ");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // prompt
            Constraint::Length(3), // goal input
            Constraint::Length(3), // horizon
            Constraint::Min(1),    // loading / hints
        ])
        .split(inner);

    let prompt = Paragraph::new("What do you want to get done?")
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(prompt, chunks[0]);

    let input = Paragraph::new(format!("{}_", form.goal)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Goal ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(input, chunks[1]);

    let horizon = Paragraph::new(Line::from(vec![
        horizon_option(Horizon::Today, "Today", form.horizon),
        Span::raw("  "),
        horizon_option(Horizon::Week, "This week", form.horizon),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Horizon (Tab) "));
    f.render_widget(horizon, chunks[2]);

    let footer = if form.loading {
        Paragraph::new(Span::styled(
            "Generating your plan...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else {
        Paragraph::new(Span::styled(
            "Enter: generate plan  Esc: current plan / quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(footer, chunks[3]);
}

fn horizon_option(option: Horizon, label: &str, current: Horizon) -> Span<'static> {
    if option == current {
        Span::styled(
            format!("[{label}]"),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {label} "), Style::default().fg(Color::DarkGray))
    }
}

// -- Plan screen --

fn render_plan(f: &mut Frame, app: &App, view: &PlanScreen, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // summary
            Constraint::Min(5),    // tasks
            Constraint::Length(4), // notes of selected task
        ])
        .split(area);

    let total = view.plan.tasks.len();
    let done = view.plan.completed_count();
    let summary = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {done}/{total} done"),
            Style::default().fg(if done == total && total > 0 {
                Color::Green
            } else {
                Color::White
            }),
        ),
        Span::raw("  |  filter: "),
        Span::styled(view.filter.to_string(), Style::default().fg(Color::Cyan)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Your plan "));
    f.render_widget(summary, chunks[0]);

    let header_cells = ["", "Task", "Priority", "Due"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1);

    let tasks = view.visible_tasks();
    let rows = tasks.iter().enumerate().map(|(i, task)| {
        let mut style = if task.completed {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default()
        };
        if i == app.selected_task {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        let title = match &task.emoji {
            Some(emoji) => format!("{emoji} {}", task.title),
            None => task.title.clone(),
        };

        Row::new(vec![
            Cell::from(if task.completed { "[x]" } else { "[ ]" }),
            Cell::from(title),
            Cell::from(priority_colored(task.priority)),
            Cell::from(task.due_date.clone()),
        ])
        .style(style)
    });

    let title = if tasks.is_empty() {
        " Tasks (none match this filter) "
    } else {
        " Tasks "
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, chunks[1]);

    let notes = app
        .selected()
        .and_then(|t| t.notes.clone())
        .unwrap_or_default();
    let notes = Paragraph::new(notes)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Notes "));
    f.render_widget(notes, chunks[2]);
}

// -- Overlays --

fn render_confirm(f: &mut Frame, area: Rect) {
    let popup = centered(area, 50, 5);
    f.render_widget(Clear, popup);
    let text = vec![
        Line::from("Start a new plan? The current one is deleted."),
        Line::from(""),
        Line::from(Span::styled(
            "y: yes, start over   n: cancel",
            Style::default().fg(Color::Yellow),
        )),
    ];
    let dialog = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" New plan ")
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(dialog, popup);
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered(area, 40, 11);
    f.render_widget(Clear, popup);
    let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(Span::styled("  Plan list", heading)),
        Line::from("    j/k, arrows   move"),
        Line::from("    space/Enter   toggle done"),
        Line::from("    f             cycle filter"),
        Line::from("    n             new plan"),
        Line::from("    q/Esc         quit"),
        Line::from(""),
        Line::from(Span::styled("  Any key closes this help", heading)),
    ];
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(help, popup);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let screen_name = match app.session.screen() {
        Screen::Create(_) => "New plan",
        Screen::Plan(_) => "Plan",
    };
    let hints = match app.session.screen() {
        Screen::Create(_) => "  Tab:horizon  Enter:generate  Ctrl-C:quit",
        Screen::Plan(_) => "  space:toggle  f:filter  n:new  ?:help  q:quit",
    };

    let notice = match &app.notice {
        Some(Notice::Info(msg)) => Span::styled(msg.clone(), Style::default().fg(Color::Green)),
        Some(Notice::Error(msg)) => Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        None => Span::raw(""),
    };

    let bar = Line::from(vec![
        Span::styled(
            format!(" {screen_name} "),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw("  "),
        notice,
        Span::raw(hints),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

// -- Helpers --

fn priority_colored(priority: Priority) -> Span<'static> {
    let color = match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    };
    Span::styled(priority.to_string(), Style::default().fg(color))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use planbuddy_core::Session;
    use planbuddy_store::Plan;
    use planbuddy_test_utils::{ScriptedSource, memory_plan_store, sample_generated_plan};

    use super::*;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn create_screen_shows_form() {
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));
        let mut app = App::new(Session::start(memory_plan_store(), source).await);
        if let Some(form) = app.session.create_form_mut() {
            form.goal = "Finish the draft".to_string();
        }

        let text = screen_text(&app);
        assert!(text.contains("Finish the draft"));
        assert!(text.contains("[Today]"));
    }

    #[tokio::test]
    async fn plan_screen_lists_tasks() {
        let store = memory_plan_store();
        store
            .save(&Plan::from_generated(sample_generated_plan(), Utc::now()))
            .await;
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));
        let mut app = App::new(Session::start(store, source).await);
        app.confirming_new_plan = true;

        let text = screen_text(&app);
        assert!(text.contains("0/3 done"));
        assert!(text.contains("Tidy the desk"));
        assert!(text.contains("Start a new plan?"));
    }
}
