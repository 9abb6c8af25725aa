//! The single persisted plan.
//!
//! Exactly one plan lives under [`PLAN_KEY`]. Every operation swallows
//! backend and decoding failures after logging them: a plan that cannot be
//! read is treated as no plan at all, and a failed write leaves the caller's
//! in-memory state authoritative.

use std::sync::Arc;

use tracing::{debug, error};

use crate::kv::KeyValueStore;
use crate::models::Plan;

/// Storage key of the plan.
pub const PLAN_KEY: &str = "planbuddy_plan";

/// Reads and writes the plan through a [`KeyValueStore`].
#[derive(Clone)]
pub struct PlanStore {
    kv: Arc<dyn KeyValueStore>,
}

impl PlanStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Serialize `plan` and overwrite the stored value.
    pub async fn save(&self, plan: &Plan) {
        let json = match serde_json::to_string(plan) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize plan");
                return;
            }
        };
        match self.kv.set(PLAN_KEY, &json).await {
            Ok(()) => debug!(tasks = plan.tasks.len(), "plan saved"),
            Err(e) => error!(error = %e, "failed to save plan"),
        }
    }

    /// Load the stored plan. Returns `None` when nothing is stored or the
    /// stored value cannot be read or decoded.
    pub async fn load(&self) -> Option<Plan> {
        let raw = match self.kv.get(PLAN_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(error = %e, "failed to load plan");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(plan) => Some(plan),
            Err(e) => {
                error!(error = %e, "stored plan is not valid JSON; ignoring it");
                None
            }
        }
    }

    /// Remove the stored plan.
    pub async fn clear(&self) {
        if let Err(e) = self.kv.remove(PLAN_KEY).await {
            error!(error = %e, "failed to clear plan");
        }
    }
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore").field("key", &PLAN_KEY).finish()
    }
}
