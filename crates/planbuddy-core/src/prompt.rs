//! Prompt construction for plan generation.
//!
//! Pure string assembly, no I/O. The goal is interpolated verbatim; nothing
//! here attempts to neutralise instructions embedded in user text.

use chrono::{Duration, NaiveDate};
use planbuddy_store::Horizon;

/// JSON shape the model must return.
const RESPONSE_FORMAT: &str = r#"{
  "tasks": [
    {
      "id": "unique-id-1",
      "title": "Task title",
      "dueDate": "YYYY-MM-DD",
      "priority": "low" | "medium" | "high",
      "notes": "Helpful tip or detail",
      "emoji": "📝"
    }
  ]
}"#;

/// Build the instruction sent to the model for `goal` over `horizon`.
///
/// `today` anchors the due-date window: `Horizon::Today` asks for every task
/// on that date, `Horizon::Week` for dates within the following seven days.
pub fn build_prompt(goal: &str, horizon: Horizon, today: NaiveDate) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(
        "You are a helpful planning assistant. Generate a structured plan based on \
         the user's goal and time horizon.\n\n",
    );
    prompt.push_str(&format!("Goal: {goal}\n"));
    prompt.push_str(&format!("Time Horizon: {horizon}\n"));
    prompt.push_str(&format!("Today's Date: {}\n\n", today.format("%Y-%m-%d")));

    prompt.push_str(
        "Generate a plan with 3-5 tasks. Return ONLY valid JSON in this exact format:\n",
    );
    prompt.push_str(RESPONSE_FORMAT);
    prompt.push_str("\n\nImportant:\n");

    let last = today + Duration::days(horizon.window_days());
    match horizon {
        Horizon::Today => prompt.push_str(&format!(
            "- Every task is due today: use dueDate \"{}\" for all tasks\n",
            today.format("%Y-%m-%d")
        )),
        Horizon::Week => prompt.push_str(&format!(
            "- Spread due dates within the next 7 days: between \"{}\" and \"{}\" inclusive\n",
            today.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        )),
    }
    prompt.push_str("- Give every task a distinct id\n");
    prompt.push_str("- Use only \"high\", \"medium\" or \"low\" for priority\n");
    prompt.push_str("- Include relevant emojis for each task\n");
    prompt.push_str("- Make tasks specific and actionable\n");
    prompt.push_str("- Return ONLY the JSON object, no additional text\n");

    prompt
}
