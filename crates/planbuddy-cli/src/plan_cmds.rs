//! CLI handlers for the client-side plan commands.
//!
//! Implements:
//! - `planbuddy generate <goal>`  -- create a plan and store it
//! - `planbuddy show`             -- print the stored plan
//! - `planbuddy toggle <task-id>` -- flip a task's completion
//! - `planbuddy clear`            -- delete the stored plan
//! - `planbuddy health`           -- ping the relay

use std::fmt::Write as _;
use std::io::{BufRead, Write as _};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use planbuddy_core::{ApiClient, PlanSource, Screen, Session};
use planbuddy_store::{Horizon, Plan, PlanStore, PriorityFilter};

// -----------------------------------------------------------------------
// planbuddy generate <goal>
// -----------------------------------------------------------------------

/// Generate a plan through `source`, store it, and print it.
///
/// Refuses to replace a stored plan unless `force` is set. A replaced plan is
/// written back if generation fails.
pub async fn run_generate(
    store: PlanStore,
    source: Arc<dyn PlanSource>,
    goal: &str,
    horizon: Horizon,
    force: bool,
) -> Result<()> {
    let mut session = Session::start(store.clone(), source).await;

    let previous = match session.screen() {
        Screen::Plan(_) if !force => bail!(
            "a plan already exists\nUse --force to replace it, or `planbuddy clear` first."
        ),
        Screen::Plan(view) => Some(view.plan.clone()),
        Screen::Create(_) => None,
    };
    if previous.is_some() {
        session.new_plan(true).await;
    }

    let form = session
        .create_form_mut()
        .context("creation form is not available")?;
    form.goal = goal.to_string();
    form.horizon = horizon;

    println!("Generating a plan for {horizon}...");
    if let Err(e) = session.submit().await {
        if let Some(plan) = &previous {
            store.save(plan).await;
        }
        return Err(e.into());
    }

    let plan = stored_plan(&session)?;
    println!("Plan created with {} tasks.", plan.tasks.len());
    println!();
    print!("{}", render_plan(plan, PriorityFilter::All));
    Ok(())
}

fn stored_plan(session: &Session) -> Result<&Plan> {
    match session.screen() {
        Screen::Plan(view) => Ok(&view.plan),
        Screen::Create(_) => bail!("no plan was created"),
    }
}

// -----------------------------------------------------------------------
// planbuddy show
// -----------------------------------------------------------------------

pub async fn run_show(store: &PlanStore, filter: PriorityFilter) -> Result<()> {
    match store.load().await {
        Some(plan) => print!("{}", render_plan(&plan, filter)),
        None => println!("No plan yet. Use `planbuddy generate <goal>` to create one."),
    }
    Ok(())
}

/// Render a plan as a table, restricted to tasks matching `filter`.
pub fn render_plan(plan: &Plan, filter: PriorityFilter) -> String {
    let mut out = String::new();
    let tasks = plan.filtered(filter);

    let _ = writeln!(
        out,
        "{}/{} done  (filter: {filter})",
        plan.completed_count(),
        plan.tasks.len()
    );
    let _ = writeln!(out);

    if tasks.is_empty() {
        let _ = writeln!(out, "No tasks match this filter.");
        return out;
    }

    let id_w = tasks.iter().map(|t| t.id.len()).max().unwrap_or(2).max(2);
    let prio_w = 8;
    let due_w = 10;

    let _ = writeln!(
        out,
        "DONE  {:<id_w$}  {:<prio_w$}  {:<due_w$}  TITLE",
        "ID", "PRIORITY", "DUE",
    );
    for task in tasks {
        let mark = if task.completed { "[x]" } else { "[ ]" };
        let title = match &task.emoji {
            Some(emoji) => format!("{emoji} {}", task.title),
            None => task.title.clone(),
        };
        let _ = writeln!(
            out,
            "{mark:<4}  {:<id_w$}  {:<prio_w$}  {:<due_w$}  {title}",
            task.id,
            task.priority.to_string(),
            task.due_date,
        );
        if let Some(notes) = task.notes.as_deref().filter(|n| !n.is_empty()) {
            let indent = 4 + 2 + id_w + 2 + prio_w + 2 + due_w + 2;
            let _ = writeln!(out, "{:indent$}{notes}", "");
        }
    }
    out
}

// -----------------------------------------------------------------------
// planbuddy toggle <task-id>
// -----------------------------------------------------------------------

pub async fn run_toggle(store: &PlanStore, task_id: &str) -> Result<()> {
    let Some(mut plan) = store.load().await else {
        bail!("no plan stored; use `planbuddy generate <goal>` to create one");
    };
    if !plan.toggle_task(task_id) {
        bail!("task not found: {task_id}");
    }
    store.save(&plan).await;

    let done = plan
        .tasks
        .iter()
        .find(|t| t.id == task_id)
        .is_some_and(|t| t.completed);
    let state = if done { "done" } else { "not done" };
    println!("Task {task_id} marked {state}.");
    Ok(())
}

// -----------------------------------------------------------------------
// planbuddy clear
// -----------------------------------------------------------------------

pub async fn run_clear(store: &PlanStore, yes: bool) -> Result<()> {
    if store.load().await.is_none() {
        println!("No plan to clear.");
        return Ok(());
    }

    if !yes {
        print!("Delete the current plan? This cannot be undone. [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !is_yes(&answer) {
            println!("Kept the current plan.");
            return Ok(());
        }
    }

    store.clear().await;
    println!("Plan cleared.");
    Ok(())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// -----------------------------------------------------------------------
// planbuddy health
// -----------------------------------------------------------------------

pub async fn run_health(client: &ApiClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("relay at {} is not reachable", client.base_url()))?;
    println!("{}: {}", client.base_url(), health.status);
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use planbuddy_store::Priority;
    use planbuddy_test_utils::{ScriptedSource, memory_plan_store, sample_generated_plan};

    fn sample_plan() -> Plan {
        let created = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        Plan::from_generated(sample_generated_plan(), created)
    }

    #[test]
    fn render_lists_all_tasks() {
        let out = render_plan(&sample_plan(), PriorityFilter::All);
        assert!(out.starts_with("0/3 done  (filter: all)"));
        assert!(out.contains("task-1"));
        assert!(out.contains("task-2"));
        assert!(out.contains("task-3"));
        assert!(out.contains("Tip for Write the outline"));
    }

    #[test]
    fn render_respects_filter() {
        let out = render_plan(&sample_plan(), PriorityFilter::Only(Priority::Low));
        assert!(out.contains("task-3"));
        assert!(!out.contains("task-1"));
        assert!(out.contains("(filter: low)"));
    }

    #[test]
    fn render_marks_completed() {
        let mut plan = sample_plan();
        plan.toggle_task("task-2");
        let out = render_plan(&plan, PriorityFilter::All);
        assert!(out.starts_with("1/3 done"));
        let line = out.lines().find(|l| l.contains("task-2")).unwrap();
        assert!(line.starts_with("[x]"));
    }

    #[test]
    fn render_empty_filter_result() {
        let mut plan = sample_plan();
        plan.tasks.retain(|t| t.priority == Priority::High);
        let out = render_plan(&plan, PriorityFilter::Only(Priority::Medium));
        assert!(out.contains("No tasks match this filter."));
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[tokio::test]
    async fn generate_stores_plan() {
        let store = memory_plan_store();
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));

        run_generate(store.clone(), source.clone(), "Write", Horizon::Week, false)
            .await
            .unwrap();

        let plan = store.load().await.expect("plan stored");
        assert_eq!(plan.tasks.len(), 3);
        assert!(plan.tasks.iter().all(|t| !t.completed));
        assert_eq!(source.requests(), vec![("Write".to_string(), Horizon::Week)]);
    }

    #[tokio::test]
    async fn generate_refuses_to_overwrite_without_force() {
        let store = memory_plan_store();
        let mut existing = sample_plan();
        existing.toggle_task("task-1");
        store.save(&existing).await;
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));

        let err = run_generate(store.clone(), source.clone(), "g", Horizon::Today, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(source.requests().is_empty());
        assert_eq!(store.load().await, Some(existing));
    }

    #[tokio::test]
    async fn generate_with_force_replaces_plan() {
        let store = memory_plan_store();
        let mut existing = sample_plan();
        existing.toggle_task("task-1");
        store.save(&existing).await;
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));

        run_generate(store.clone(), source, "g", Horizon::Today, true)
            .await
            .unwrap();

        let plan = store.load().await.unwrap();
        assert_eq!(plan.completed_count(), 0);
    }

    #[tokio::test]
    async fn forced_generate_failure_keeps_previous_plan() {
        let store = memory_plan_store();
        let mut existing = sample_plan();
        existing.toggle_task("task-1");
        store.save(&existing).await;
        let source = Arc::new(ScriptedSource::failing("Failed to generate plan"));

        let err = run_generate(store.clone(), source.clone(), "g", Horizon::Today, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate plan");
        assert_eq!(source.requests().len(), 1);
        assert_eq!(store.load().await, Some(existing));
    }

    #[tokio::test]
    async fn generate_failure_surfaces_message() {
        let store = memory_plan_store();
        let source = Arc::new(ScriptedSource::failing("Failed to generate plan"));

        let err = run_generate(store.clone(), source, "g", Horizon::Today, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate plan");
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn generate_rejects_blank_goal() {
        let store = memory_plan_store();
        let source = Arc::new(ScriptedSource::succeeding(sample_generated_plan()));

        let err = run_generate(store, source.clone(), "   ", Horizon::Today, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please enter a goal");
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn toggle_persists() {
        let store = memory_plan_store();
        store.save(&sample_plan()).await;

        run_toggle(&store, "task-3").await.unwrap();
        let plan = store.load().await.unwrap();
        assert!(plan.tasks.iter().find(|t| t.id == "task-3").unwrap().completed);

        run_toggle(&store, "task-3").await.unwrap();
        let plan = store.load().await.unwrap();
        assert_eq!(plan.completed_count(), 0);
    }

    #[tokio::test]
    async fn toggle_unknown_task_is_error() {
        let store = memory_plan_store();
        store.save(&sample_plan()).await;
        let err = run_toggle(&store, "task-9").await.unwrap_err();
        assert!(err.to_string().contains("task-9"));
    }

    #[tokio::test]
    async fn toggle_without_plan_is_error() {
        let store = memory_plan_store();
        assert!(run_toggle(&store, "task-1").await.is_err());
    }

    #[tokio::test]
    async fn clear_with_yes_removes_plan() {
        let store = memory_plan_store();
        store.save(&sample_plan()).await;
        run_clear(&store, true).await.unwrap();
        assert!(store.load().await.is_none());
    }
}
