//! Remediation Types
//!
//! Data structures only - matching, queuing and execution live in
//! `engine.rs` and `worker.rs`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACTION VOCABULARY
// ============================================================================

/// What a remediation action does to the (simulated) infrastructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    BlockIp,
    AdjustBandwidth,
    UpdateFirewall,
    IsolateNode,
    RollbackConfig,
    RestartInterface,
    ClearSessions,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::BlockIp => "block_ip",
            ActionType::AdjustBandwidth => "adjust_bandwidth",
            ActionType::UpdateFirewall => "update_firewall",
            ActionType::IsolateNode => "isolate_node",
            ActionType::RollbackConfig => "rollback_config",
            ActionType::RestartInterface => "restart_interface",
            ActionType::ClearSessions => "clear_sessions",
        }
    }

    /// Only these action types can be reverted after success
    pub fn rollbackable(&self) -> bool {
        matches!(
            self,
            ActionType::BlockIp
                | ActionType::AdjustBandwidth
                | ActionType::UpdateFirewall
                | ActionType::IsolateNode
                | ActionType::RollbackConfig
        )
    }
}

/// pending -> executing -> {success | failed}; success + rollbackable may
/// become rolled_back, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Executing,
    Success,
    Failed,
    RolledBack,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Executing => "executing",
            ActionStatus::Success => "success",
            ActionStatus::Failed => "failed",
            ActionStatus::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionStatus::Success | ActionStatus::Failed | ActionStatus::RolledBack
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    Automatic,
    Manual,
}

// ============================================================================
// ACTION RECORD
// ============================================================================

/// One remediation action. Descriptive fields are fixed at creation; only
/// status/timing/error fields advance with the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    pub id: String,
    pub action_type: ActionType,
    pub status: ActionStatus,
    pub mode: ActionMode,
    /// Human-readable trigger description, e.g. "threat:ddos:<id>"
    pub trigger: String,
    /// Device id or IP the action applies to
    pub target: String,
    pub rollbackable: bool,
    /// Policy that produced this action (None for manual actions)
    pub policy_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    /// Execution side-effect details (inserted rule ids etc.)
    pub metadata: HashMap<String, String>,
}

// ============================================================================
// POLICIES
// ============================================================================

/// What kind of detection a policy reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Threat,
    Anomaly,
    Prediction,
}

/// Forecast of an impending fault, produced by an upstream forecasting
/// collaborator and fed to prediction-triggered policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedFault {
    pub id: String,
    pub device_id: String,
    /// e.g. "config_regression", "capacity_exhaustion"
    pub fault_type: String,
    /// 0.0 - 1.0
    pub probability: f64,
    pub predicted_at: DateTime<Utc>,
}

impl PredictedFault {
    pub fn new(device_id: &str, fault_type: &str, probability: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            fault_type: fault_type.to_string(),
            probability,
            predicted_at: Utc::now(),
        }
    }
}

/// Admin-configured trigger -> action binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPolicy {
    pub id: String,
    pub name: String,
    pub trigger: TriggerType,
    /// Threat/anomaly type allowlist; empty matches every type
    pub match_types: Vec<String>,
    pub action_type: ActionType,
    pub cooldown_minutes: i64,
    /// Consecutive failed executions tolerated before cooldown re-applies
    pub max_retries: u32,
    pub auto_execute: bool,
    pub requires_approval: bool,
    /// Lower evaluates first
    pub priority: i32,
    pub enabled: bool,
}

// ============================================================================
// QUERY FILTER & STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub status: Option<ActionStatus>,
    pub mode: Option<ActionMode>,
    pub action_type: Option<ActionType>,
}

impl ActionFilter {
    pub fn matches(&self, action: &RemediationAction) -> bool {
        self.status.map_or(true, |s| action.status == s)
            && self.mode.map_or(true, |m| action.mode == m)
            && self.action_type.map_or(true, |t| action.action_type == t)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemediationStatistics {
    pub total_actions: usize,
    pub pending: usize,
    pub executing: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rolled_back: usize,
    pub by_type: HashMap<String, usize>,
    pub policies: usize,
    pub queue_depth: usize,
}
