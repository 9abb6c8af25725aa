//! Client-side screen state machine.
//!
//! Two screens: [`Screen::Create`] (no plan stored, show the form) and
//! [`Screen::Plan`] (a plan exists, show the list). Rendering lives in the
//! front end; this module owns the transitions and the write-through to the
//! [`PlanStore`].
//!
//! ```text
//!            submit ok
//!   Create ------------> Plan
//!      ^                  |  toggle / set_filter (stay)
//!      +------------------+
//!        new_plan(confirmed)
//! ```

use std::sync::Arc;

use chrono::Utc;
use planbuddy_store::{Horizon, Plan, PlanStore, PriorityFilter, Task};
use thiserror::Error;
use tracing::{info, warn};

use crate::service::PlanSource;

/// State of the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateScreen {
    pub goal: String,
    pub horizon: Horizon,
    /// True while a generation request is in flight.
    pub loading: bool,
}

/// State of the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanScreen {
    pub plan: Plan,
    pub filter: PriorityFilter,
}

impl PlanScreen {
    fn new(plan: Plan) -> Self {
        Self {
            plan,
            filter: PriorityFilter::All,
        }
    }

    /// Tasks shown under the active filter.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.plan.filtered(self.filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Create(CreateScreen),
    Plan(PlanScreen),
}

/// Why a submission did not produce a plan. Both are user-facing alerts.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Please enter a goal")]
    EmptyGoal,

    #[error("{0}")]
    Generate(String),

    #[error("no creation form is showing")]
    NotOnCreateScreen,
}

/// One client session: the current screen plus its collaborators.
pub struct Session {
    store: PlanStore,
    source: Arc<dyn PlanSource>,
    screen: Screen,
}

impl Session {
    /// Load the stored plan and open the matching screen.
    pub async fn start(store: PlanStore, source: Arc<dyn PlanSource>) -> Self {
        let screen = match store.load().await {
            Some(plan) => Screen::Plan(PlanScreen::new(plan)),
            None => Screen::Create(CreateScreen::default()),
        };
        Self {
            store,
            source,
            screen,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn has_plan(&self) -> bool {
        matches!(self.screen, Screen::Plan(_))
    }

    /// The creation form, when it is showing.
    pub fn create_form_mut(&mut self) -> Option<&mut CreateScreen> {
        match &mut self.screen {
            Screen::Create(form) => Some(form),
            Screen::Plan(_) => None,
        }
    }

    /// Mark the form as loading. Front ends call this to render a spinner
    /// before awaiting [`Self::submit`].
    pub fn begin_submit(&mut self) {
        if let Screen::Create(form) = &mut self.screen {
            form.loading = true;
        }
    }

    /// Generate a plan from the form, persist it, and switch to the list.
    ///
    /// On failure the form stays up with its input intact.
    pub async fn submit(&mut self) -> Result<(), SubmitError> {
        let Screen::Create(form) = &mut self.screen else {
            return Err(SubmitError::NotOnCreateScreen);
        };
        if form.goal.trim().is_empty() {
            form.loading = false;
            return Err(SubmitError::EmptyGoal);
        }

        form.loading = true;
        let (goal, horizon) = (form.goal.clone(), form.horizon);
        let result = self.source.generate_plan(&goal, horizon).await;

        match result {
            Ok(generated) => {
                let plan = Plan::from_generated(generated, Utc::now());
                self.store.save(&plan).await;
                info!(tasks = plan.tasks.len(), %horizon, "new plan created");
                self.screen = Screen::Plan(PlanScreen::new(plan));
                Ok(())
            }
            Err(e) => {
                if let Screen::Create(form) = &mut self.screen {
                    form.loading = false;
                }
                warn!(error = %e, "plan generation failed");
                Err(SubmitError::Generate(e.to_string()))
            }
        }
    }

    /// Switch from the form to the stored plan, if one exists. Returns
    /// whether the screen changed.
    pub async fn view_current_plan(&mut self) -> bool {
        if self.has_plan() {
            return false;
        }
        match self.store.load().await {
            Some(plan) => {
                self.screen = Screen::Plan(PlanScreen::new(plan));
                true
            }
            None => false,
        }
    }

    /// Flip a task's completion and write the whole plan through. The local
    /// change stands even if the write fails.
    pub async fn toggle(&mut self, task_id: &str) -> bool {
        let Screen::Plan(view) = &mut self.screen else {
            return false;
        };
        if !view.plan.toggle_task(task_id) {
            return false;
        }
        self.store.save(&view.plan).await;
        true
    }

    /// Change the list filter. Nothing is persisted.
    pub fn set_filter(&mut self, filter: PriorityFilter) {
        if let Screen::Plan(view) = &mut self.screen {
            view.filter = filter;
        }
    }

    /// Tasks visible on the list screen; empty on the form.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        match &self.screen {
            Screen::Plan(view) => view.visible_tasks(),
            Screen::Create(_) => Vec::new(),
        }
    }

    /// Discard the plan and return to the form. Does nothing unless the user
    /// confirmed.
    pub async fn new_plan(&mut self, confirmed: bool) -> bool {
        if !confirmed || !self.has_plan() {
            return false;
        }
        self.store.clear().await;
        self.screen = Screen::Create(CreateScreen::default());
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("screen", &self.screen)
            .finish()
    }
}
