//! Remediation Engine
//!
//! Matches triggers (threats, anomalies, predictions) against the policy
//! table, enqueues actions and executes them one at a time with a simulated
//! external-system latency and a sampled success outcome. Failed executions
//! raise a high-severity alert; successful rollbackable actions can be
//! reverted exactly once.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::alerts::AlertEngine;
use crate::anomaly::{Anomaly, Severity};
use crate::config::PipelineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::metrics::BoundedHistory;
use crate::threat::{Threat, ThreatEngine};

use super::types::{
    ActionFilter, ActionMode, ActionStatus, ActionType, PredictedFault, RemediationAction,
    RemediationPolicy, RemediationStatistics, TriggerType,
};

/// Oldest completed actions are evicted beyond this
const ACTION_STORE_CAP: usize = 1000;

pub struct RemediationEngine {
    config: PipelineConfig,
    policies: RwLock<Vec<RemediationPolicy>>,
    actions: RwLock<BoundedHistory<RemediationAction>>,
    queue: RwLock<VecDeque<String>>,
    /// Per-policy last-fire timestamps (cooldown tracking, keyed by id)
    cooldowns: RwLock<HashMap<String, DateTime<Utc>>>,
    /// Consecutive failed executions per policy (retry accounting)
    failures: RwLock<HashMap<String, u32>>,
    /// At most one action executing at any time
    processing: AtomicBool,
    rng: RwLock<StdRng>,
    threats: Arc<ThreatEngine>,
    alerts: Arc<AlertEngine>,
    bus: EventBus,
}

impl RemediationEngine {
    pub fn new(
        config: &PipelineConfig,
        threats: Arc<ThreatEngine>,
        alerts: Arc<AlertEngine>,
    ) -> Self {
        let rng = match config.rng_seed {
            // Offset so the executor gets its own stream
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_entropy(),
        };
        Self {
            config: config.clone(),
            policies: RwLock::new(default_policies()),
            actions: RwLock::new(BoundedHistory::new(ACTION_STORE_CAP)),
            queue: RwLock::new(VecDeque::new()),
            cooldowns: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            processing: AtomicBool::new(false),
            rng: RwLock::new(rng),
            threats,
            alerts,
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    // ------------------------------------------------------------------
    // Trigger evaluation
    // ------------------------------------------------------------------

    /// Create actions for every threat-triggered policy whose type allowlist
    /// matches and whose cooldown has elapsed.
    pub fn evaluate_threat(&self, threat: &Threat) -> Vec<RemediationAction> {
        self.evaluate_trigger(
            TriggerType::Threat,
            &threat.threat_type,
            &threat.source_ip,
            format!("threat:{}:{}", threat.threat_type, threat.id),
        )
    }

    /// Same matching for anomaly-triggered policies; target is the device.
    pub fn evaluate_anomaly(&self, anomaly: &Anomaly) -> Vec<RemediationAction> {
        self.evaluate_trigger(
            TriggerType::Anomaly,
            anomaly.anomaly_type.as_str(),
            &anomaly.device_id,
            format!("anomaly:{}:{}", anomaly.anomaly_type.as_str(), anomaly.id),
        )
    }

    /// Same matching for prediction-triggered policies, keyed by the
    /// forecast fault type.
    pub fn evaluate_prediction(&self, prediction: &PredictedFault) -> Vec<RemediationAction> {
        self.evaluate_trigger(
            TriggerType::Prediction,
            &prediction.fault_type,
            &prediction.device_id,
            format!("prediction:{}:{}", prediction.fault_type, prediction.id),
        )
    }

    fn evaluate_trigger(
        &self,
        trigger: TriggerType,
        type_name: &str,
        target: &str,
        trigger_desc: String,
    ) -> Vec<RemediationAction> {
        let mut candidates: Vec<RemediationPolicy> = self
            .policies
            .read()
            .iter()
            .filter(|p| p.enabled && p.trigger == trigger)
            .filter(|p| p.match_types.is_empty() || p.match_types.iter().any(|t| t == type_name))
            .cloned()
            .collect();
        candidates.sort_by_key(|p| p.priority);

        let mut created = Vec::new();
        for policy in candidates {
            if !self.policy_ready(&policy) {
                log::debug!("policy {} on cooldown, skipping", policy.id);
                continue;
            }
            self.cooldowns.write().insert(policy.id.clone(), Utc::now());

            let action = self.create_action(
                policy.action_type,
                ActionMode::Automatic,
                trigger_desc.clone(),
                target,
                Some(policy.id.clone()),
            );
            if policy.auto_execute && !policy.requires_approval {
                self.enqueue(&action.id, action.action_type);
            }
            created.push(action);
        }
        created
    }

    /// Queue an action directly, bypassing policy matching
    pub fn manual_execute(
        &self,
        action_type: ActionType,
        target: &str,
        description: &str,
    ) -> RemediationAction {
        let action = self.create_action(
            action_type,
            ActionMode::Manual,
            format!("manual:{}", description),
            target,
            None,
        );
        self.enqueue(&action.id, action.action_type);
        action
    }

    /// Release a pending approval-gated action into the queue
    pub fn approve_action(&self, action_id: &str) -> bool {
        let actions = self.actions.read();
        let action = match actions.iter().find(|a| a.id == action_id) {
            Some(a) if a.status == ActionStatus::Pending => a,
            _ => return false,
        };
        if self.queue.read().iter().any(|id| id == action_id) {
            return false;
        }
        let action_type = action.action_type;
        drop(actions);
        self.enqueue(action_id, action_type);
        true
    }

    fn create_action(
        &self,
        action_type: ActionType,
        mode: ActionMode,
        trigger: String,
        target: &str,
        policy_id: Option<String>,
    ) -> RemediationAction {
        let action = RemediationAction {
            id: Uuid::new_v4().to_string(),
            action_type,
            status: ActionStatus::Pending,
            mode,
            trigger,
            target: target.to_string(),
            rollbackable: action_type.rollbackable(),
            policy_id,
            created_at: Utc::now(),
            executed_at: None,
            completed_at: None,
            duration_ms: None,
            error: None,
            metadata: HashMap::new(),
        };
        self.actions.write().push(action.clone());
        action
    }

    fn enqueue(&self, action_id: &str, action_type: ActionType) {
        self.queue.write().push_back(action_id.to_string());
        self.bus.emit(EngineEvent::ActionQueued {
            action_id: action_id.to_string(),
            action_type: action_type.as_str().to_string(),
        });
    }

    /// A policy may fire when its cooldown elapsed, or when it is inside its
    /// retry budget after consecutive failures (cooldown waived).
    fn policy_ready(&self, policy: &RemediationPolicy) -> bool {
        let failures = self
            .failures
            .read()
            .get(&policy.id)
            .copied()
            .unwrap_or(0);
        if failures > 0 && failures <= policy.max_retries {
            return true;
        }
        match self.cooldowns.read().get(&policy.id) {
            None => true,
            Some(last) => Utc::now() - *last >= Duration::minutes(policy.cooldown_minutes),
        }
    }

    // ------------------------------------------------------------------
    // Execution (driven by the worker)
    // ------------------------------------------------------------------

    /// One worker tick: execute the next queued action unless one is already
    /// in flight. A tick during execution is a no-op - this is the natural
    /// backpressure that keeps side effects serialized.
    pub async fn tick(&self) {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let next = self.queue.write().pop_front();
        if let Some(action_id) = next {
            self.execute_action(&action_id).await;
        }

        self.processing.store(false, Ordering::SeqCst);
    }

    /// Run one action to completion. Returns the sampled outcome; unknown
    /// ids or non-pending actions return false without side effects.
    pub async fn execute_action(&self, action_id: &str) -> bool {
        let action_type;
        let target;
        let policy_id;
        {
            let mut actions = self.actions.write();
            let action = match actions.iter_mut().find(|a| a.id == action_id) {
                Some(a) if a.status == ActionStatus::Pending => a,
                _ => return false,
            };
            action.status = ActionStatus::Executing;
            action.executed_at = Some(Utc::now());
            action_type = action.action_type;
            target = action.target.clone();
            policy_id = action.policy_id.clone();
        }
        self.bus.emit(EngineEvent::ActionStarted {
            action_id: action_id.to_string(),
        });
        log::info!("executing {} against {}", action_type.as_str(), target);

        let started = Instant::now();

        // Simulated external-system interaction window; the action stays
        // visible as `executing` to concurrent readers throughout.
        let delay = self.config.execution_delay;
        if delay.max_ms > 0 {
            let ms = if delay.max_ms > delay.min_ms {
                self.rng.write().gen_range(delay.min_ms..=delay.max_ms)
            } else {
                delay.min_ms
            };
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }

        let success = self.rng.write().gen_bool(self.config.execution_success_rate);
        let mut metadata = HashMap::new();
        if success {
            self.apply_side_effect(action_type, &target, &mut metadata);
        }

        {
            let mut actions = self.actions.write();
            if let Some(action) = actions.iter_mut().find(|a| a.id == action_id) {
                action.status = if success {
                    ActionStatus::Success
                } else {
                    ActionStatus::Failed
                };
                action.completed_at = Some(Utc::now());
                action.duration_ms = Some(started.elapsed().as_millis() as u64);
                action.metadata = metadata;
                if !success {
                    action.error = Some(format!(
                        "{} against {} rejected by target system",
                        action_type.as_str(),
                        target
                    ));
                }
            };
        }

        if let Some(pid) = policy_id {
            self.record_outcome(&pid, success);
        }
        if !success {
            self.alerts.raise(
                &target,
                "remediation",
                Severity::High,
                &format!("remediation action {} failed", action_type.as_str()),
            );
        }

        self.bus.emit(EngineEvent::ActionCompleted {
            action_id: action_id.to_string(),
            success,
        });
        success
    }

    fn record_outcome(&self, policy_id: &str, success: bool) {
        let mut failures = self.failures.write();
        if success {
            failures.remove(policy_id);
            return;
        }
        let count = failures.entry(policy_id.to_string()).or_insert(0);
        *count += 1;
        let max_retries = self
            .policies
            .read()
            .iter()
            .find(|p| p.id == policy_id)
            .map_or(0, |p| p.max_retries);
        if *count > max_retries {
            // Retry budget exhausted; fall back to normal cooldown
            failures.remove(policy_id);
        }
    }

    /// Type-specific side effect. Only block_ip touches another engine; the
    /// remaining infrastructure is simulated so they record metadata only.
    fn apply_side_effect(
        &self,
        action_type: ActionType,
        target: &str,
        metadata: &mut HashMap<String, String>,
    ) {
        match action_type {
            ActionType::BlockIp => {
                if let Some(rule) = self.threats.block_source(target) {
                    metadata.insert("firewall_rule_id".into(), rule.id);
                }
            }
            ActionType::AdjustBandwidth => {
                metadata.insert("shaping_profile".into(), "congestion-50pct".into());
            }
            ActionType::UpdateFirewall => {
                metadata.insert("change".into(), "ruleset refreshed".into());
            }
            ActionType::IsolateNode => {
                metadata.insert("vlan".into(), "quarantine".into());
            }
            ActionType::RollbackConfig => {
                metadata.insert("restored".into(), "last-known-good".into());
            }
            ActionType::RestartInterface => {
                metadata.insert("interface".into(), "primary-uplink".into());
            }
            ActionType::ClearSessions => {
                metadata.insert("sessions_cleared".into(), "all".into());
            }
        }
    }

    // ------------------------------------------------------------------
    // Rollback
    // ------------------------------------------------------------------

    /// Revert a successful rollbackable action. Succeeds at most once per
    /// action; any further call returns false.
    pub fn rollback_action(&self, action_id: &str) -> bool {
        let rule_to_remove;
        {
            let mut actions = self.actions.write();
            let action = match actions.iter_mut().find(|a| a.id == action_id) {
                Some(a) => a,
                None => return false,
            };
            if action.status != ActionStatus::Success || !action.rollbackable {
                return false;
            }
            action.status = ActionStatus::RolledBack;
            rule_to_remove = action.metadata.get("firewall_rule_id").cloned();
        }

        if let Some(rule_id) = rule_to_remove {
            self.threats.remove_firewall_rule(&rule_id);
        }
        self.bus.emit(EngineEvent::ActionRolledBack {
            action_id: action_id.to_string(),
        });
        log::info!("action {} rolled back", action_id);
        true
    }

    // ------------------------------------------------------------------
    // Policy administration
    // ------------------------------------------------------------------

    pub fn add_policy(&self, mut policy: RemediationPolicy) -> RemediationPolicy {
        if policy.id.is_empty() {
            policy.id = Uuid::new_v4().to_string();
        }
        self.policies.write().push(policy.clone());
        self.bus.emit(EngineEvent::PolicyChanged {
            policy_id: policy.id.clone(),
        });
        policy
    }

    /// Replace a policy wholesale by id. Unknown id -> false.
    pub fn update_policy(&self, policy: RemediationPolicy) -> bool {
        let mut policies = self.policies.write();
        match policies.iter_mut().find(|p| p.id == policy.id) {
            Some(slot) => {
                let policy_id = policy.id.clone();
                *slot = policy;
                drop(policies);
                self.bus.emit(EngineEvent::PolicyChanged { policy_id });
                true
            }
            None => false,
        }
    }

    pub fn remove_policy(&self, policy_id: &str) -> bool {
        let mut policies = self.policies.write();
        let before = policies.len();
        policies.retain(|p| p.id != policy_id);
        let removed = policies.len() != before;
        drop(policies);
        if removed {
            self.bus.emit(EngineEvent::PolicyChanged {
                policy_id: policy_id.to_string(),
            });
        }
        removed
    }

    // ------------------------------------------------------------------
    // Query surface (defensive copies)
    // ------------------------------------------------------------------

    pub fn get_actions(&self, filter: &ActionFilter) -> Vec<RemediationAction> {
        self.actions
            .read()
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    pub fn get_action(&self, action_id: &str) -> Option<RemediationAction> {
        self.actions
            .read()
            .iter()
            .find(|a| a.id == action_id)
            .cloned()
    }

    pub fn get_policies(&self) -> Vec<RemediationPolicy> {
        self.policies.read().clone()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.read().len()
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.config.queue_poll_interval_ms
    }

    pub fn get_statistics(&self) -> RemediationStatistics {
        let actions = self.actions.read();
        let mut stats = RemediationStatistics {
            total_actions: actions.len(),
            policies: self.policies.read().len(),
            queue_depth: self.queue.read().len(),
            ..Default::default()
        };
        for a in actions.iter() {
            match a.status {
                ActionStatus::Pending => stats.pending += 1,
                ActionStatus::Executing => stats.executing += 1,
                ActionStatus::Success => stats.succeeded += 1,
                ActionStatus::Failed => stats.failed += 1,
                ActionStatus::RolledBack => stats.rolled_back += 1,
            }
            *stats
                .by_type
                .entry(a.action_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}

// ============================================================================
// DEFAULT POLICIES
// ============================================================================

fn default_policies() -> Vec<RemediationPolicy> {
    vec![
        RemediationPolicy {
            id: "pol-block-attacker".into(),
            name: "Block attacking source".into(),
            trigger: TriggerType::Threat,
            match_types: vec![
                "ddos".into(),
                "brute_force".into(),
                "port_scan".into(),
                "sql_injection".into(),
                "xss".into(),
                "malware".into(),
            ],
            action_type: ActionType::BlockIp,
            cooldown_minutes: 5,
            max_retries: 2,
            auto_execute: true,
            requires_approval: false,
            priority: 1,
            enabled: true,
        },
        RemediationPolicy {
            id: "pol-isolate-node".into(),
            name: "Isolate compromised node".into(),
            trigger: TriggerType::Threat,
            match_types: vec!["malware".into(), "ransomware".into()],
            action_type: ActionType::IsolateNode,
            cooldown_minutes: 30,
            max_retries: 1,
            auto_execute: true,
            requires_approval: true,
            priority: 2,
            enabled: true,
        },
        RemediationPolicy {
            id: "pol-shape-traffic".into(),
            name: "Shape congested traffic".into(),
            trigger: TriggerType::Anomaly,
            match_types: vec!["traffic_spike".into(), "performance_degradation".into()],
            action_type: ActionType::AdjustBandwidth,
            cooldown_minutes: 15,
            max_retries: 2,
            auto_execute: true,
            requires_approval: false,
            priority: 3,
            enabled: true,
        },
        RemediationPolicy {
            id: "pol-clear-sessions".into(),
            name: "Recover exhausted device".into(),
            trigger: TriggerType::Anomaly,
            match_types: vec!["resource_exhaustion".into()],
            action_type: ActionType::ClearSessions,
            cooldown_minutes: 20,
            max_retries: 1,
            auto_execute: true,
            requires_approval: false,
            priority: 4,
            enabled: true,
        },
        RemediationPolicy {
            id: "pol-config-rollback".into(),
            name: "Roll back regressed configuration".into(),
            trigger: TriggerType::Prediction,
            match_types: vec!["config_regression".into()],
            action_type: ActionType::RollbackConfig,
            cooldown_minutes: 60,
            max_retries: 0,
            auto_execute: false,
            requires_approval: true,
            priority: 5,
            enabled: true,
        },
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::{IncidentKind, IncidentSink};
    use crate::threat::ThreatStatus;

    fn setup() -> (Arc<RemediationEngine>, Arc<ThreatEngine>, Arc<AlertEngine>) {
        let config = PipelineConfig::deterministic(11);
        let threats = Arc::new(ThreatEngine::new(&config));
        let alerts = Arc::new(AlertEngine::new());
        let engine = Arc::new(RemediationEngine::new(
            &config,
            Arc::clone(&threats),
            Arc::clone(&alerts),
        ));
        (engine, threats, alerts)
    }

    fn ddos_threat(id: &str, source: &str) -> Threat {
        Threat {
            id: id.into(),
            threat_type: "ddos".into(),
            severity: Severity::Critical,
            status: ThreatStatus::Active,
            source_ip: source.into(),
            target_ip: "10.0.0.1".into(),
            confidence: 0.95,
            detected_at: Utc::now(),
            neutralized_at: None,
        }
    }

    #[test]
    fn test_cooldown_allows_exactly_one_action() {
        let (engine, _, _) = setup();

        let first = engine.evaluate_threat(&ddos_threat("t-1", "198.51.100.1"));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].action_type, ActionType::BlockIp);

        // Second matching threat inside the cooldown window: no new action
        let second = engine.evaluate_threat(&ddos_threat("t-2", "198.51.100.2"));
        assert!(second.is_empty());
    }

    #[test]
    fn test_prediction_trigger_matches_rollback_policy() {
        let (engine, _, _) = setup();
        let prediction = PredictedFault::new("dev-1", "config_regression", 0.87);

        let created = engine.evaluate_prediction(&prediction);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].action_type, ActionType::RollbackConfig);
        assert!(created[0].trigger.starts_with("prediction:config_regression:"));

        // The rollback policy is approval-gated: pending, not queued
        assert_eq!(engine.queue_depth(), 0);
        assert!(engine.approve_action(&created[0].id));
        assert_eq!(engine.queue_depth(), 1);

        // Unknown fault types match no policy
        let other = PredictedFault::new("dev-1", "link_flap", 0.9);
        assert!(engine.evaluate_prediction(&other).is_empty());
    }

    #[test]
    fn test_unmatched_threat_type_creates_nothing() {
        let (engine, _, _) = setup();
        let mut threat = ddos_threat("t-1", "198.51.100.1");
        threat.threat_type = "unknown_probe".into();
        assert!(engine.evaluate_threat(&threat).is_empty());
    }

    #[tokio::test]
    async fn test_execute_block_ip_inserts_firewall_rule() {
        let (engine, threats, _) = setup();
        let created = engine.evaluate_threat(&ddos_threat("t-1", "198.51.100.9"));
        let action_id = created[0].id.clone();

        assert!(engine.execute_action(&action_id).await);

        let action = engine.get_action(&action_id).unwrap();
        assert_eq!(action.status, ActionStatus::Success);
        assert!(action.duration_ms.is_some());
        assert!(action.metadata.contains_key("firewall_rule_id"));
        assert_eq!(threats.get_firewall_rules().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_is_monotonic() {
        let (engine, threats, _) = setup();
        let action = engine.manual_execute(ActionType::BlockIp, "203.0.113.5", "operator block");
        engine.tick().await;

        assert!(engine.rollback_action(&action.id));
        assert_eq!(
            engine.get_action(&action.id).unwrap().status,
            ActionStatus::RolledBack
        );
        // Rule inserted by the action is gone again
        assert!(threats.get_firewall_rules().is_empty());

        // Second rollback must refuse
        assert!(!engine.rollback_action(&action.id));
    }

    #[tokio::test]
    async fn test_rollback_refused_for_non_rollbackable() {
        let (engine, _, _) = setup();
        let action = engine.manual_execute(ActionType::ClearSessions, "dev-1", "ops request");
        engine.tick().await;
        assert_eq!(
            engine.get_action(&action.id).unwrap().status,
            ActionStatus::Success
        );
        assert!(!engine.rollback_action(&action.id));
    }

    struct CapturingSink(Arc<parking_lot::Mutex<Vec<IncidentKind>>>);

    impl IncidentSink for CapturingSink {
        fn record(&self, kind: IncidentKind, _payload: &serde_json::Value) -> Result<(), String> {
            self.0.lock().push(kind);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_execution_raises_alert() {
        let config = PipelineConfig {
            rng_seed: Some(5),
            execution_success_rate: 0.0,
            execution_delay: crate::config::DelayRange::none(),
            ..Default::default()
        };
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let threats = Arc::new(ThreatEngine::new(&config));
        let alerts = Arc::new(AlertEngine::with_sink(Arc::new(CapturingSink(
            Arc::clone(&seen),
        ))));
        let engine = RemediationEngine::new(&config, threats, Arc::clone(&alerts));

        let action = engine.manual_execute(ActionType::AdjustBandwidth, "dev-1", "shaping");
        assert!(!engine.execute_action(&action.id).await);

        let record = engine.get_action(&action.id).unwrap();
        assert_eq!(record.status, ActionStatus::Failed);
        assert!(record.error.is_some());
        assert_eq!(alerts.get_alerts(10).len(), 1);
        assert_eq!(alerts.get_alerts(10)[0].severity, Severity::High);
        // The failure alert also reached the incident sink
        assert_eq!(seen.lock().as_slice(), &[IncidentKind::Alert]);
    }

    #[test]
    fn test_action_store_is_bounded() {
        let (engine, _, _) = setup();
        for i in 0..ACTION_STORE_CAP + 10 {
            engine.manual_execute(ActionType::ClearSessions, &format!("dev-{}", i), "sweep");
        }
        assert_eq!(engine.get_statistics().total_actions, ACTION_STORE_CAP);
    }

    #[tokio::test]
    async fn test_tick_drains_one_action_at_a_time() {
        let (engine, _, _) = setup();
        engine.manual_execute(ActionType::ClearSessions, "dev-1", "a");
        engine.manual_execute(ActionType::ClearSessions, "dev-2", "b");
        assert_eq!(engine.queue_depth(), 2);

        engine.tick().await;
        assert_eq!(engine.queue_depth(), 1);
        engine.tick().await;
        assert_eq!(engine.queue_depth(), 0);
    }

    #[test]
    fn test_approval_gated_policy_not_auto_enqueued() {
        let (engine, _, _) = setup();
        let mut threat = ddos_threat("t-1", "198.51.100.1");
        threat.threat_type = "malware".into();

        let created = engine.evaluate_threat(&threat);
        // Both the block policy and the isolate policy match malware
        assert_eq!(created.len(), 2);
        let isolate = created
            .iter()
            .find(|a| a.action_type == ActionType::IsolateNode)
            .unwrap();
        // Only the auto policy's action is queued
        assert_eq!(engine.queue_depth(), 1);

        assert!(engine.approve_action(&isolate.id));
        assert_eq!(engine.queue_depth(), 2);
        // Double approval refused
        assert!(!engine.approve_action(&isolate.id));
    }

    #[test]
    fn test_policy_administration() {
        let (engine, _, _) = setup();
        let baseline = engine.get_policies().len();

        let added = engine.add_policy(RemediationPolicy {
            id: String::new(),
            name: "Custom".into(),
            trigger: TriggerType::Anomaly,
            match_types: vec!["packet_loss".into()],
            action_type: ActionType::RestartInterface,
            cooldown_minutes: 10,
            max_retries: 0,
            auto_execute: true,
            requires_approval: false,
            priority: 9,
            enabled: true,
        });
        assert!(!added.id.is_empty());
        assert_eq!(engine.get_policies().len(), baseline + 1);

        let mut updated = added.clone();
        updated.enabled = false;
        assert!(engine.update_policy(updated));
        assert!(engine.remove_policy(&added.id));
        assert!(!engine.remove_policy(&added.id));
    }

    #[tokio::test]
    async fn test_statistics() {
        let (engine, _, _) = setup();
        engine.manual_execute(ActionType::ClearSessions, "dev-1", "a");
        engine.tick().await;
        engine.manual_execute(ActionType::BlockIp, "203.0.113.1", "b");

        let stats = engine.get_statistics();
        assert_eq!(stats.total_actions, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.queue_depth, 1);
    }
}
