//! Serializable simulation state.
//!
//! Everything here is stored verbatim in `game_state.state_json` and
//! `turn_result.result_json`, so field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of the table a player sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Architect,
    Prospect,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Architect => "ARCHITECT",
            Self::Prospect => "PROSPECT",
        }
    }

    /// Parse the stored role string (`ARCHITECT` / `PROSPECT`, any case).
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ARCHITECT" => Some(Self::Architect),
            "PROSPECT" => Some(Self::Prospect),
            _ => None,
        }
    }

    #[must_use]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::Architect => Self::Prospect,
            Self::Prospect => Self::Architect,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase as recorded inside the snapshot. The room row carries the authoritative phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TurnPhase {
    Event,
    Planning,
    Commit,
    Resolve,
    Review,
}

// ─────────────────────────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectMetrics {
    pub adoption: f64,
    pub trust: f64,
    /// Milliseconds, lower is better. Kept within `[200, 3000]`.
    pub latency: f64,
    /// Spend per turn. Unbounded.
    pub cost: f64,
    pub governance_coverage: f64,
    pub reliability: f64,
    pub political_capital: f64,
    pub support_load: f64,
}

impl Default for ArchitectMetrics {
    fn default() -> Self {
        Self {
            adoption: 30.0,
            trust: 50.0,
            latency: 1500.0,
            cost: 80.0,
            governance_coverage: 40.0,
            reliability: 60.0,
            political_capital: 50.0,
            support_load: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectMetrics {
    pub business_value: f64,
    pub risk: f64,
    pub patience: f64,
}

impl Default for ProspectMetrics {
    fn default() -> Self {
        Self {
            business_value: 30.0,
            risk: 50.0,
            patience: 70.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub architect: ArchitectMetrics,
    pub prospect: ProspectMetrics,
}

/// Partial change to the architect metrics. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub political_capital: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_load: Option<f64>,
}

/// Partial change to the prospect metrics. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patience: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsDelta {
    pub architect: ArchitectDelta,
    pub prospect: ProspectDelta,
}

pub(crate) fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

fn shift(value: &mut f64, delta: Option<f64>, min: f64, max: f64) {
    if let Some(d) = delta {
        *value = clamp(*value + d, min, max);
    }
}

impl Metrics {
    /// Apply a delta: percentages clamp to `[0, 100]`, latency to `[200, 3000]`,
    /// cost is unbounded.
    pub fn apply(&mut self, delta: &MetricsDelta) {
        let a = &mut self.architect;
        let d = &delta.architect;
        shift(&mut a.adoption, d.adoption, 0.0, 100.0);
        shift(&mut a.trust, d.trust, 0.0, 100.0);
        shift(&mut a.latency, d.latency, 200.0, 3000.0);
        if let Some(cost) = d.cost {
            a.cost += cost;
        }
        shift(&mut a.governance_coverage, d.governance_coverage, 0.0, 100.0);
        shift(&mut a.reliability, d.reliability, 0.0, 100.0);
        shift(&mut a.political_capital, d.political_capital, 0.0, 100.0);
        shift(&mut a.support_load, d.support_load, 0.0, 100.0);

        let p = &mut self.prospect;
        let d = &delta.prospect;
        shift(&mut p.business_value, d.business_value, 0.0, 100.0);
        shift(&mut p.risk, d.risk, 0.0, 100.0);
        shift(&mut p.patience, d.patience, 0.0, 100.0);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Map
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    BusinessUnit,
    Application,
    DataPlatform,
    Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    SimbaConnectors,
    LogiVdd,
    ManagedDashboards,
}

impl Capability {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "simba-connectors" => Some(Self::SimbaConnectors),
            "logi-vdd" => Some(Self::LogiVdd),
            "managed-dashboards" => Some(Self::ManagedDashboards),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SimbaConnectors => "simba-connectors",
            Self::LogiVdd => "logi-vdd",
            Self::ManagedDashboards => "managed-dashboards",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub capability: Capability,
    pub turn_deployed: u32,
    pub auth_strength: Strength,
    pub templates_used: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNode {
    pub id: String,
    pub name: String,
    pub category: NodeCategory,
    pub x: f64,
    pub y: f64,
    pub adoption: f64,
    pub trust: f64,
    pub latency: f64,
    pub cost: f64,
    pub deployments: Vec<Deployment>,
    pub blocked: bool,
}

impl GameNode {
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.deployments.iter().any(|d| d.capability == capability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub strength: Strength,
}

// ─────────────────────────────────────────────────────────────────────────────
// Constraints, timeline, events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    CapabilityBlock,
    PocRequired,
    SecurityReview,
    Deadline,
}

impl ConstraintKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CapabilityBlock => "capability-block",
            Self::PocRequired => "poc-required",
            Self::SecurityReview => "security-review",
            Self::Deadline => "deadline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConstraint {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub turn_imposed: u32,
    /// Turns until expiry, counted from `turn_imposed`.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_capability: Option<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Action,
    Event,
    Milestone,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub turn: u32,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AffectedRole {
    Architect,
    Prospect,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChoice {
    pub id: String,
    pub label: String,
    pub description: String,
    pub architect_effect: ArchitectDelta,
    pub prospect_effect: ProspectDelta,
}

/// A random event card opened at the start of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub affects_role: AffectedRole,
    pub choices: Vec<EventChoice>,
}

impl GameEvent {
    /// The role whose submission picks the choice. `BOTH` events are decided by the architect.
    #[must_use]
    pub const fn chooser(&self) -> Role {
        match self.affects_role {
            AffectedRole::Prospect => Role::Prospect,
            AffectedRole::Architect | AffectedRole::Both => Role::Architect,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Win conditions and the full state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectGoals {
    pub adoption: f64,
    pub trust: f64,
    pub governance_coverage: f64,
    pub reliability: f64,
    pub max_latency: f64,
    pub max_cost_per_turn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectGoals {
    pub business_value: f64,
    pub max_risk: f64,
    /// The evaluation ends as soon as patience drops to this value.
    pub min_patience: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinConditions {
    pub architect: ArchitectGoals,
    pub prospect: ProspectGoals,
}

impl Default for WinConditions {
    fn default() -> Self {
        Self {
            architect: ArchitectGoals {
                adoption: 75.0,
                trust: 75.0,
                governance_coverage: 70.0,
                reliability: 70.0,
                max_latency: 1200.0,
                max_cost_per_turn: 120.0,
            },
            prospect: ProspectGoals {
                business_value: 70.0,
                max_risk: 30.0,
                min_patience: 10.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub scenario_id: String,
    pub seed: u32,
    pub current_turn: u32,
    pub max_turns: u32,
    pub phase: TurnPhase,
    pub nodes: Vec<GameNode>,
    pub edges: Vec<GameEdge>,
    pub metrics: Metrics,
    pub active_constraints: Vec<ActiveConstraint>,
    pub current_event: Option<GameEvent>,
    pub event_history: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    pub win_conditions: WinConditions,
    pub winner: Option<Role>,
    pub game_over: bool,
    pub end_reason: Option<String>,
}

impl GameState {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GameNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of deployments of `capability` across the whole map.
    #[must_use]
    pub fn deployment_count(&self, capability: Capability) -> usize {
        self.nodes
            .iter()
            .flat_map(|n| n.deployments.iter())
            .filter(|d| d.capability == capability)
            .count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    // Architect
    DeploySimba,
    DeployVdd,
    DeployDashboards,
    RunEnablement,
    AddGovernance,
    PerformanceTuning,
    IncidentResponse,
    PresentRoadmap,
    ExecutiveEscalation,
    // Prospect
    ImposeConstraint,
    DemandPoc,
    RequestSecurityReview,
    ThreatenAlternative,
    ApproveBudget,
    SetDeadline,
    ShareRequirements,
    AcknowledgeProgress,
}

impl ActionType {
    pub const PROSPECT: [Self; 8] = [
        Self::ImposeConstraint,
        Self::DemandPoc,
        Self::RequestSecurityReview,
        Self::ThreatenAlternative,
        Self::ApproveBudget,
        Self::SetDeadline,
        Self::ShareRequirements,
        Self::AcknowledgeProgress,
    ];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let action = match s {
            "deploy-simba" => Self::DeploySimba,
            "deploy-vdd" => Self::DeployVdd,
            "deploy-dashboards" => Self::DeployDashboards,
            "run-enablement" => Self::RunEnablement,
            "add-governance" => Self::AddGovernance,
            "performance-tuning" => Self::PerformanceTuning,
            "incident-response" => Self::IncidentResponse,
            "present-roadmap" => Self::PresentRoadmap,
            "executive-escalation" => Self::ExecutiveEscalation,
            "impose-constraint" => Self::ImposeConstraint,
            "demand-poc" => Self::DemandPoc,
            "request-security-review" => Self::RequestSecurityReview,
            "threaten-alternative" => Self::ThreatenAlternative,
            "approve-budget" => Self::ApproveBudget,
            "set-deadline" => Self::SetDeadline,
            "share-requirements" => Self::ShareRequirements,
            "acknowledge-progress" => Self::AcknowledgeProgress,
            _ => return None,
        };
        Some(action)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeploySimba => "deploy-simba",
            Self::DeployVdd => "deploy-vdd",
            Self::DeployDashboards => "deploy-dashboards",
            Self::RunEnablement => "run-enablement",
            Self::AddGovernance => "add-governance",
            Self::PerformanceTuning => "performance-tuning",
            Self::IncidentResponse => "incident-response",
            Self::PresentRoadmap => "present-roadmap",
            Self::ExecutiveEscalation => "executive-escalation",
            Self::ImposeConstraint => "impose-constraint",
            Self::DemandPoc => "demand-poc",
            Self::RequestSecurityReview => "request-security-review",
            Self::ThreatenAlternative => "threaten-alternative",
            Self::ApproveBudget => "approve-budget",
            Self::SetDeadline => "set-deadline",
            Self::ShareRequirements => "share-requirements",
            Self::AcknowledgeProgress => "acknowledge-progress",
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::DeploySimba
            | Self::DeployVdd
            | Self::DeployDashboards
            | Self::RunEnablement
            | Self::AddGovernance
            | Self::PerformanceTuning
            | Self::IncidentResponse
            | Self::PresentRoadmap
            | Self::ExecutiveEscalation => Role::Architect,
            _ => Role::Prospect,
        }
    }

    /// Capability a deployment action installs, if it is one.
    #[must_use]
    pub const fn capability(&self) -> Option<Capability> {
        match self {
            Self::DeploySimba => Some(Capability::SimbaConnectors),
            Self::DeployVdd => Some(Capability::LogiVdd),
            Self::DeployDashboards => Some(Capability::ManagedDashboards),
            _ => None,
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::DeploySimba => "Deploy Simba Connectors",
            Self::DeployVdd => "Enable VDD Pilot",
            Self::DeployDashboards => "Publish Managed Dashboards",
            Self::RunEnablement => "Run Enablement",
            Self::AddGovernance => "Add Governance Policy",
            Self::PerformanceTuning => "Performance Tuning",
            Self::IncidentResponse => "Incident Response",
            Self::PresentRoadmap => "Present Roadmap",
            Self::ExecutiveEscalation => "Executive Escalation",
            Self::ImposeConstraint => "Impose Constraint",
            Self::DemandPoc => "Demand Proof-of-Concept",
            Self::RequestSecurityReview => "Request Security Review",
            Self::ThreatenAlternative => "Threaten Alternative",
            Self::ApproveBudget => "Approve Budget",
            Self::SetDeadline => "Set Deadline",
            Self::ShareRequirements => "Share Requirements",
            Self::AcknowledgeProgress => "Acknowledge Progress",
        }
    }
}

/// One action as submitted by a client, before it is given an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInput {
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A validated action ready for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMove {
    pub id: String,
    pub role: Role,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl PlannedMove {
    /// String parameter by key, e.g. `capability` for `impose-constraint`.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action_id: String,
    pub role: Role,
    pub action_type: ActionType,
    pub success: bool,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    pub effects: Vec<String>,
    pub metrics_change: MetricsDelta,
}

/// Everything a resolution produced. Stored as the turn result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResolution {
    pub turn_number: u32,
    pub previous_state: GameState,
    pub new_state: GameState,
    pub architect_actions: Vec<PlannedMove>,
    pub prospect_actions: Vec<PlannedMove>,
    pub action_results: Vec<ActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_choice_id: Option<String>,
    pub turn_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_clamping() {
        let mut metrics = Metrics::default();
        metrics.apply(&MetricsDelta {
            architect: ArchitectDelta {
                adoption: Some(200.0),
                latency: Some(-5000.0),
                cost: Some(500.0),
                ..ArchitectDelta::default()
            },
            prospect: ProspectDelta {
                patience: Some(-1000.0),
                ..ProspectDelta::default()
            },
        });
        assert!((metrics.architect.adoption - 100.0).abs() < f64::EPSILON);
        assert!((metrics.architect.latency - 200.0).abs() < f64::EPSILON);
        assert!((metrics.architect.cost - 580.0).abs() < f64::EPSILON);
        assert!(metrics.prospect.patience.abs() < f64::EPSILON);
    }

    #[test]
    fn test_action_type_wire_names() {
        for action in ActionType::PROSPECT {
            assert_eq!(ActionType::parse(action.as_str()), Some(action));
            assert_eq!(action.role(), Role::Prospect);
        }
        let json = serde_json::to_string(&ActionType::DemandPoc).unwrap_or_default();
        assert_eq!(json, "\"demand-poc\"");
        assert_eq!(ActionType::parse("deploy-vdd"), Some(ActionType::DeployVdd));
        assert_eq!(ActionType::parse("teleport"), None);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(Role::from_str("architect"), Some(Role::Architect));
        assert_eq!(Role::Architect.opponent(), Role::Prospect);
        let json = serde_json::to_string(&Role::Prospect).unwrap_or_default();
        assert_eq!(json, "\"PROSPECT\"");
    }

    #[test]
    fn test_constraint_kind_serializes_as_type() {
        let constraint = ActiveConstraint {
            id: "constraint-1-0".to_string(),
            kind: ConstraintKind::CapabilityBlock,
            turn_imposed: 1,
            duration: 2,
            target_capability: Some(Capability::LogiVdd),
            target_node_id: None,
            requirement: None,
        };
        let value = serde_json::to_value(&constraint).unwrap_or_default();
        assert_eq!(value["type"], "capability-block");
        assert_eq!(value["targetCapability"], "logi-vdd");
        assert!(value.get("requirement").is_none());
    }
}
