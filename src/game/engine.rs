use super::events;
use super::map;
use super::rng::SeededRng;
use super::scenario::Scenario;
use super::types::{
    ActionInput, ActionResult, ActionType, ActiveConstraint, ArchitectMetrics, Capability,
    ConstraintKind, Deployment, GameState, MetricsDelta, NodeCategory, PlannedMove, Role,
    Strength, TimelineEntry, TimelineKind, TurnPhase, TurnResolution, WinConditions, clamp,
};
use super::EngineError;

pub const MAX_ACTIONS_PER_TURN: usize = 3;
const MAX_TURNS: u32 = 12;

/// Build the opening state for a room.
#[must_use]
pub fn initialize(scenario: Scenario, seed: u32) -> GameState {
    let mut rng = SeededRng::new(u64::from(seed));
    let (nodes, edges) = map::generate(&mut rng);

    GameState {
        scenario_id: scenario.as_str().to_string(),
        seed,
        current_turn: 1,
        max_turns: MAX_TURNS,
        phase: TurnPhase::Planning,
        nodes,
        edges,
        metrics: scenario.initial_metrics(),
        active_constraints: Vec::new(),
        current_event: None,
        event_history: Vec::new(),
        timeline: Vec::new(),
        win_conditions: WinConditions::default(),
        winner: None,
        game_over: false,
        end_reason: None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Availability and validation
// ─────────────────────────────────────────────────────────────────────────────

/// Actions `role` may take now, optionally against a specific node.
#[must_use]
pub fn available_actions(state: &GameState, role: Role, node_id: Option<&str>) -> Vec<ActionType> {
    if role == Role::Prospect {
        return ActionType::PROSPECT.to_vec();
    }

    let mut actions = Vec::new();
    if let Some(node) = node_id.and_then(|id| state.node(id)) {
        let is_infra = matches!(
            node.category,
            NodeCategory::Application | NodeCategory::DataPlatform
        );
        let is_bu = node.category == NodeCategory::BusinessUnit;
        if is_infra && !node.has_capability(Capability::SimbaConnectors) {
            actions.push(ActionType::DeploySimba);
        }
        if is_bu && !node.has_capability(Capability::LogiVdd) {
            actions.push(ActionType::DeployVdd);
        }
        if is_bu && !node.has_capability(Capability::ManagedDashboards) {
            actions.push(ActionType::DeployDashboards);
        }
    }

    actions.extend([
        ActionType::RunEnablement,
        ActionType::AddGovernance,
        ActionType::PerformanceTuning,
        ActionType::PresentRoadmap,
    ]);

    if state.metrics.architect.reliability < 50.0 {
        actions.push(ActionType::IncidentResponse);
    }

    if !state.active_constraints.is_empty() && state.metrics.architect.political_capital >= 20.0 {
        actions.push(ActionType::ExecutiveEscalation);
    }

    actions
}

/// Check a submission against the rules for `role` in the current state.
///
/// # Errors
///
/// Returns the first rule the submission breaks.
pub fn validate_submission(
    state: &GameState,
    role: Role,
    actions: &[ActionInput],
    event_choice_id: Option<&str>,
) -> Result<(), EngineError> {
    if state.game_over {
        return Err(EngineError::GameOver);
    }
    if actions.len() > MAX_ACTIONS_PER_TURN {
        return Err(EngineError::TooManyActions(MAX_ACTIONS_PER_TURN));
    }

    if let Some(choice_id) = event_choice_id {
        let known = state
            .current_event
            .as_ref()
            .is_some_and(|e| e.choices.iter().any(|c| c.id == choice_id));
        if !known {
            return Err(EngineError::UnknownEventChoice(choice_id.to_string()));
        }
    }

    for input in actions {
        let action = ActionType::parse(&input.action_type)
            .ok_or_else(|| EngineError::UnknownAction(input.action_type.clone()))?;
        if action.role() != role {
            return Err(EngineError::WrongRole {
                action: action.as_str().to_string(),
                role,
            });
        }

        if action.capability().is_some() {
            let target = input
                .target_node_id
                .as_deref()
                .ok_or_else(|| EngineError::MissingTarget(action.as_str().to_string()))?;
            if state.node(target).is_none() {
                return Err(EngineError::UnknownNode(target.to_string()));
            }
        }

        if action == ActionType::ImposeConstraint {
            let capability = input
                .parameters
                .as_ref()
                .and_then(|p| p.get("capability"))
                .and_then(serde_json::Value::as_str)
                .and_then(Capability::parse);
            if capability.is_none() {
                return Err(EngineError::MissingParameter {
                    action: action.as_str().to_string(),
                    parameter: "capability".to_string(),
                });
            }
        }

        if !available_actions(state, role, input.target_node_id.as_deref()).contains(&action) {
            return Err(EngineError::Unavailable {
                action: action.as_str().to_string(),
            });
        }
    }

    Ok(())
}

/// Turn validated inputs into moves with stable ids (`arch-3-0`, `pros-3-1`, ...).
///
/// # Errors
///
/// Returns [`EngineError::UnknownAction`] for an unrecognised action type.
pub fn build_moves(
    role: Role,
    turn: u32,
    actions: &[ActionInput],
) -> Result<Vec<PlannedMove>, EngineError> {
    let prefix = match role {
        Role::Architect => "arch",
        Role::Prospect => "pros",
    };
    actions
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let action_type = ActionType::parse(&input.action_type)
                .ok_or_else(|| EngineError::UnknownAction(input.action_type.clone()))?;
            Ok(PlannedMove {
                id: format!("{prefix}-{turn}-{i}"),
                role,
                action_type,
                target_node_id: input.target_node_id.clone(),
                parameters: input.parameters.clone(),
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve one turn: event choice, prospect moves, architect moves, end-of-turn
/// drift, win/lose check, then the next turn's event draw.
///
/// # Errors
///
/// Fails if the game is already over or `event_choice_id` names no choice of the
/// current event.
pub fn resolve_turn(
    state: &GameState,
    architect_moves: &[PlannedMove],
    prospect_moves: &[PlannedMove],
    event_choice_id: Option<&str>,
) -> Result<TurnResolution, EngineError> {
    if state.game_over {
        return Err(EngineError::GameOver);
    }

    let turn_number = state.current_turn;
    let mut next = state.clone();
    let applied_choice = apply_event(&mut next, event_choice_id)?;

    let mut results = Vec::with_capacity(prospect_moves.len() + architect_moves.len());
    for (seq, mv) in prospect_moves.iter().enumerate() {
        let result = apply_prospect_move(&mut next, mv, seq);
        next.metrics.apply(&result.metrics_change);
        results.push(result);
    }
    for mv in architect_moves {
        let result = apply_architect_move(&mut next, mv);
        if result.success {
            next.metrics.apply(&result.metrics_change);
        }
        results.push(result);
    }

    end_of_turn(&mut next);
    check_game_end(&mut next);
    if next.game_over {
        next.current_event = None;
    } else {
        events::draw(&mut next);
    }

    let turn_summary = summarize(&results);

    Ok(TurnResolution {
        turn_number,
        previous_state: state.clone(),
        new_state: next,
        architect_actions: architect_moves.to_vec(),
        prospect_actions: prospect_moves.to_vec(),
        action_results: results,
        event_choice_id: applied_choice,
        turn_summary,
    })
}

fn apply_event(
    state: &mut GameState,
    choice_id: Option<&str>,
) -> Result<Option<String>, EngineError> {
    let Some(event) = state.current_event.take() else {
        return Ok(None);
    };

    let choice = match choice_id {
        Some(id) => event
            .choices
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::UnknownEventChoice(id.to_string()))?,
        None => match event.choices.first() {
            Some(first) => first,
            None => return Ok(None),
        },
    };

    state.metrics.apply(&MetricsDelta {
        architect: choice.architect_effect.clone(),
        prospect: choice.prospect_effect.clone(),
    });
    state.timeline.push(TimelineEntry {
        turn: state.current_turn,
        kind: TimelineKind::Event,
        title: format!("{}: {}", event.title, choice.label),
        description: choice.description.clone(),
        role: Some(event.chooser()),
    });

    Ok(Some(choice.id.clone()))
}

fn action_result(mv: &PlannedMove, effects: Vec<String>, delta: MetricsDelta) -> ActionResult {
    ActionResult {
        action_id: mv.id.clone(),
        role: mv.role,
        action_type: mv.action_type,
        success: true,
        blocked: false,
        block_reason: None,
        effects,
        metrics_change: delta,
    }
}

fn push_action_timeline(state: &mut GameState, mv: &PlannedMove, effects: &[String]) {
    state.timeline.push(TimelineEntry {
        turn: state.current_turn,
        kind: TimelineKind::Action,
        title: mv.action_type.display_name().to_string(),
        description: effects.join(". "),
        role: Some(mv.role),
    });
}

fn apply_prospect_move(state: &mut GameState, mv: &PlannedMove, seq: usize) -> ActionResult {
    let mut effects = Vec::new();
    let mut delta = MetricsDelta::default();
    let turn = state.current_turn;

    match mv.action_type {
        ActionType::ImposeConstraint => {
            let capability = mv.param_str("capability").and_then(Capability::parse);
            let label = capability.map_or("unspecified", |c| c.as_str());
            state.active_constraints.push(ActiveConstraint {
                id: format!("constraint-{turn}-{seq}"),
                kind: ConstraintKind::CapabilityBlock,
                turn_imposed: turn,
                duration: 2,
                target_capability: capability,
                target_node_id: None,
                requirement: None,
            });
            effects.push(format!("Blocked {label} deployments for 2 turns"));
            delta.prospect.risk = Some(-5.0);
            delta.architect.political_capital = Some(-10.0);
        }
        ActionType::DemandPoc => {
            state.active_constraints.push(ActiveConstraint {
                id: format!("constraint-{turn}-{seq}"),
                kind: ConstraintKind::PocRequired,
                turn_imposed: turn,
                duration: 3,
                target_capability: None,
                target_node_id: None,
                requirement: Some(state.metrics.architect.adoption + 10.0),
            });
            effects.push("Demanded proof-of-concept: adoption must increase by 10%".to_string());
            delta.prospect.patience = Some(-10.0);
        }
        ActionType::RequestSecurityReview => {
            let goals = &mut state.win_conditions.architect;
            goals.governance_coverage = (goals.governance_coverage + 10.0).min(100.0);
            effects.push("Increased governance requirement by 10%".to_string());
            delta.prospect.risk = Some(-10.0);
            delta.architect.political_capital = Some(-5.0);
        }
        ActionType::ThreatenAlternative => {
            effects.push("Threatened to evaluate alternative solutions".to_string());
            delta.prospect.patience = Some(-15.0);
            delta.architect.political_capital = Some(-15.0);
        }
        ActionType::ApproveBudget => {
            state.win_conditions.architect.max_cost_per_turn += 20.0;
            effects.push("Approved additional budget: cost limit +20".to_string());
            delta.prospect.business_value = Some(-5.0);
            delta.architect.political_capital = Some(10.0);
        }
        ActionType::SetDeadline => {
            state.max_turns = (turn + 2).max(state.max_turns.saturating_sub(2));
            effects.push(format!(
                "Set tighter deadline: {} turns remaining",
                state.max_turns - turn
            ));
            delta.prospect.patience = Some(-5.0);
        }
        ActionType::ShareRequirements => {
            effects.push("Shared detailed requirements with Architect".to_string());
            delta.prospect.business_value = Some(5.0);
            delta.architect.political_capital = Some(10.0);
        }
        ActionType::AcknowledgeProgress => {
            effects.push("Acknowledged progress made so far".to_string());
            delta.prospect.patience = Some(10.0);
            delta.prospect.business_value = Some(5.0);
            delta.architect.trust = Some(5.0);
        }
        _ => {}
    }

    push_action_timeline(state, mv, &effects);
    action_result(mv, effects, delta)
}

fn blocking_constraint<'a>(state: &'a GameState, mv: &PlannedMove) -> Option<&'a ActiveConstraint> {
    let capability = mv.action_type.capability()?;
    state
        .active_constraints
        .iter()
        .find(|c| c.kind == ConstraintKind::CapabilityBlock && c.target_capability == Some(capability))
}

fn apply_architect_move(state: &mut GameState, mv: &PlannedMove) -> ActionResult {
    if let Some(constraint) = blocking_constraint(state, mv) {
        return ActionResult {
            action_id: mv.id.clone(),
            role: mv.role,
            action_type: mv.action_type,
            success: false,
            blocked: true,
            block_reason: Some(format!("Blocked by {}", constraint.kind.as_str())),
            effects: Vec::new(),
            metrics_change: MetricsDelta::default(),
        };
    }

    let mut effects = Vec::new();
    let mut delta = MetricsDelta::default();
    let turn = state.current_turn;
    let governance = state.metrics.architect.governance_coverage;
    let deployment_seq = state.nodes.iter().map(|n| n.deployments.len()).sum::<usize>();

    match mv.action_type {
        ActionType::DeploySimba | ActionType::DeployVdd | ActionType::DeployDashboards => {
            let Some(capability) = mv.action_type.capability() else {
                return action_result(mv, effects, delta);
            };
            let node = mv
                .target_node_id
                .as_deref()
                .and_then(|id| state.nodes.iter_mut().find(|n| n.id == id));
            if let Some(node) = node {
                let deployment_id = format!("dep-{turn}-{deployment_seq}");
                match (capability, node.category) {
                    (
                        Capability::SimbaConnectors,
                        NodeCategory::Application | NodeCategory::DataPlatform,
                    ) => {
                        node.deployments.push(Deployment {
                            id: deployment_id,
                            capability,
                            turn_deployed: turn,
                            auth_strength: if governance >= 50.0 {
                                Strength::Strong
                            } else {
                                Strength::Weak
                            },
                            templates_used: false,
                        });
                        node.latency = (node.latency - 200.0).max(200.0);
                        effects.push(format!("Deployed Simba Connectors on {}", node.name));
                        delta.architect.latency = Some(-150.0);
                        delta.architect.cost = Some(15.0);
                        delta.prospect.business_value = Some(5.0);
                        if governance < 50.0 {
                            delta.architect.support_load = Some(8.0);
                            delta.prospect.risk = Some(5.0);
                        }
                    }
                    (Capability::LogiVdd, NodeCategory::BusinessUnit) => {
                        node.deployments.push(Deployment {
                            id: deployment_id,
                            capability,
                            turn_deployed: turn,
                            auth_strength: Strength::Strong,
                            templates_used: governance >= 60.0,
                        });
                        node.adoption = (node.adoption + 15.0).min(100.0);
                        effects.push(format!("Enabled VDD Pilot on {}", node.name));
                        delta.architect.adoption = Some(12.0);
                        delta.architect.support_load = Some(10.0);
                        delta.architect.cost = Some(10.0);
                        delta.prospect.business_value = Some(8.0);
                        if governance < 50.0 {
                            delta.architect.trust = Some(-5.0);
                            delta.prospect.risk = Some(10.0);
                        }
                    }
                    (Capability::ManagedDashboards, NodeCategory::BusinessUnit) => {
                        node.deployments.push(Deployment {
                            id: deployment_id,
                            capability,
                            turn_deployed: turn,
                            auth_strength: Strength::Strong,
                            templates_used: true,
                        });
                        node.trust = (node.trust + 10.0).min(100.0);
                        effects.push(format!("Published Managed Dashboards on {}", node.name));
                        delta.architect.trust = Some(8.0);
                        delta.architect.reliability = Some(5.0);
                        delta.architect.adoption = Some(3.0);
                        delta.architect.support_load = Some(-5.0);
                        delta.architect.cost = Some(25.0);
                        delta.prospect.business_value = Some(10.0);
                        delta.prospect.risk = Some(-5.0);
                    }
                    _ => {}
                }
            }
        }
        ActionType::RunEnablement => {
            effects.push("Conducted training and deployed templates".to_string());
            delta.architect.support_load = Some(-12.0);
            delta.architect.adoption = Some(6.0);
            delta.architect.cost = Some(8.0);
            delta.prospect.patience = Some(3.0);
        }
        ActionType::AddGovernance => {
            effects.push("Implemented new data governance controls".to_string());
            delta.architect.governance_coverage = Some(10.0);
            delta.architect.trust = Some(6.0);
            delta.architect.adoption = Some(-3.0);
            delta.architect.political_capital = Some(-5.0);
            delta.prospect.risk = Some(-10.0);
        }
        ActionType::PerformanceTuning => {
            effects.push("Optimized query performance and reduced latency".to_string());
            delta.architect.latency = Some(-250.0);
            delta.architect.reliability = Some(8.0);
            delta.architect.political_capital = Some(-8.0);
            delta.architect.cost = Some(12.0);
            delta.prospect.business_value = Some(3.0);
        }
        ActionType::IncidentResponse => {
            effects.push("Resolved critical incident and restored services".to_string());
            delta.architect.reliability = Some(10.0);
            delta.architect.support_load = Some(-5.0);
            delta.prospect.risk = Some(-5.0);
            delta.prospect.patience = Some(-5.0);
        }
        ActionType::PresentRoadmap => {
            effects.push("Presented strategic roadmap to stakeholders".to_string());
            delta.architect.political_capital = Some(-10.0);
            delta.prospect.patience = Some(15.0);
            delta.prospect.business_value = Some(5.0);
        }
        ActionType::ExecutiveEscalation => {
            if !state.active_constraints.is_empty() {
                let removed = state.active_constraints.remove(0);
                effects.push(format!(
                    "Escalated to remove constraint: {}",
                    removed.kind.as_str()
                ));
            }
            delta.architect.political_capital = Some(-20.0);
            delta.prospect.patience = Some(-10.0);
        }
        _ => {}
    }

    push_action_timeline(state, mv, &effects);
    action_result(mv, effects, delta)
}

#[allow(clippy::cast_precision_loss)]
fn end_of_turn(state: &mut GameState) {
    let simba = state.deployment_count(Capability::SimbaConnectors) as f64;
    let vdd = state.deployment_count(Capability::LogiVdd) as f64;
    let dashboards = state.deployment_count(Capability::ManagedDashboards) as f64;

    let a = &mut state.metrics.architect;
    a.adoption = clamp(a.adoption + vdd * 2.0 + dashboards, 0.0, 100.0);
    let governance_penalty = if a.governance_coverage < 50.0 { 2.0 } else { 0.0 };
    a.trust = clamp(a.trust + dashboards * 1.5 - governance_penalty, 0.0, 100.0);
    a.latency = clamp(a.latency + 50.0 - simba * 30.0, 200.0, 3000.0);
    a.reliability = clamp(a.reliability + dashboards * 2.0 - 1.0, 0.0, 100.0);
    a.political_capital = clamp(a.political_capital + 3.0, 0.0, 100.0);
    let adoption = a.adoption;
    let governance = a.governance_coverage;

    let p = &mut state.metrics.prospect;
    p.patience = clamp(p.patience - 2.0, 0.0, 100.0);
    if adoption > 50.0 {
        p.business_value = clamp(p.business_value + 2.0, 0.0, 100.0);
    }
    if governance > 60.0 {
        p.risk = clamp(p.risk - 2.0, 0.0, 100.0);
    }

    let turn = state.current_turn;
    state
        .active_constraints
        .retain(|c| turn.saturating_sub(c.turn_imposed) < c.duration);
    for node in &mut state.nodes {
        node.blocked = false;
    }

    state.current_turn += 1;
    state.phase = TurnPhase::Planning;
}

fn check_game_end(state: &mut GameState) {
    let a = &state.metrics.architect;
    let p = &state.metrics.prospect;
    let goals = &state.win_conditions;

    let early_loss = if p.patience <= goals.prospect.min_patience {
        Some("Prospect ran out of patience and terminated the evaluation.")
    } else if a.trust <= 15.0 {
        Some("Trust collapsed. Stakeholders have lost faith in the platform.")
    } else if a.reliability <= 15.0 {
        Some("Reliability crisis. Constant incidents made the platform unusable.")
    } else {
        None
    };
    if let Some(reason) = early_loss {
        finish(state, Some(Role::Prospect), reason.to_string());
        return;
    }

    if state.current_turn <= state.max_turns {
        return;
    }

    let failures = architect_shortfalls(a, goals);
    let architect_won = failures.is_empty();
    let prospect_satisfied = p.business_value >= goals.prospect.business_value
        && p.risk <= goals.prospect.max_risk;

    let (winner, reason) = match (architect_won, prospect_satisfied) {
        (true, true) => (
            Some(Role::Architect),
            "Successfully delivered the analytics platform. Both parties satisfied!".to_string(),
        ),
        (false, false) => (
            None,
            "Neither party achieved their objectives. The evaluation ends inconclusively."
                .to_string(),
        ),
        (false, true) => (
            Some(Role::Prospect),
            format!("Failed to meet: {}", failures.join(", ")),
        ),
        (true, false) => (
            Some(Role::Prospect),
            "Prospect requirements not met despite technical success.".to_string(),
        ),
    };
    finish(state, winner, reason);
}

fn finish(state: &mut GameState, winner: Option<Role>, reason: String) {
    state.game_over = true;
    state.winner = winner;
    state.timeline.push(TimelineEntry {
        turn: state.current_turn,
        kind: TimelineKind::Milestone,
        title: "Evaluation complete".to_string(),
        description: reason.clone(),
        role: winner,
    });
    state.end_reason = Some(reason);
}

fn architect_shortfalls(a: &ArchitectMetrics, goals: &WinConditions) -> Vec<&'static str> {
    let g = &goals.architect;
    let mut failures = Vec::new();
    if a.adoption < g.adoption {
        failures.push("Adoption");
    }
    if a.trust < g.trust {
        failures.push("Trust");
    }
    if a.governance_coverage < g.governance_coverage {
        failures.push("Governance");
    }
    if a.reliability < g.reliability {
        failures.push("Reliability");
    }
    if a.latency > g.max_latency {
        failures.push("Latency");
    }
    if a.cost > g.max_cost_per_turn {
        failures.push("Cost");
    }
    failures
}

fn summarize(results: &[ActionResult]) -> String {
    let effects_of = |role: Role| -> Vec<String> {
        results
            .iter()
            .filter(|r| r.role == role)
            .flat_map(|r| r.effects.iter().cloned())
            .collect()
    };

    let mut parts = Vec::new();
    let prospect = effects_of(Role::Prospect);
    if !prospect.is_empty() {
        parts.push(format!("Prospect: {}", prospect.join(". ")));
    }
    let architect = effects_of(Role::Architect);
    if !architect.is_empty() {
        parts.push(format!("Architect: {}", architect.join(". ")));
    }
    let blocked = results.iter().filter(|r| r.blocked).count();
    if blocked > 0 {
        parts.push(format!("{blocked} action(s) were blocked by constraints."));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(action: &str, target: Option<&str>) -> ActionInput {
        ActionInput {
            action_type: action.to_string(),
            target_node_id: target.map(str::to_string),
            parameters: None,
        }
    }

    fn moves(role: Role, turn: u32, inputs: &[ActionInput]) -> Vec<PlannedMove> {
        build_moves(role, turn, inputs).unwrap_or_default()
    }

    fn first_node(state: &GameState, category: NodeCategory) -> String {
        state
            .nodes
            .iter()
            .find(|n| n.category == category)
            .map(|n| n.id.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_initialize_is_deterministic() {
        let a = initialize(Scenario::SpeedToValue, 123_456);
        let b = initialize(Scenario::SpeedToValue, 123_456);
        assert_eq!(a, b);
        assert_eq!(a.current_turn, 1);
        assert_eq!(a.max_turns, 12);
        assert_eq!(a.nodes.len(), 15);
        assert!((a.metrics.architect.adoption - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let state = initialize(Scenario::Balanced, 42);
        let bu = first_node(&state, NodeCategory::BusinessUnit);
        let arch = moves(Role::Architect, 1, &[input("deploy-vdd", Some(&bu))]);
        let pros = moves(Role::Prospect, 1, &[input("acknowledge-progress", None)]);

        let a = resolve_turn(&state, &arch, &pros, None);
        let b = resolve_turn(&state, &arch, &pros, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_turn_applies_drift_only() {
        let state = initialize(Scenario::Balanced, 1);
        let result = resolve_turn(&state, &[], &[], None).unwrap_or_else(|_| unreachable!());
        let next = &result.new_state;
        assert_eq!(next.current_turn, 2);
        // governance 40 < 50 → trust -2, latency +50, reliability -1, pc +3, patience -2
        assert!((next.metrics.architect.trust - 48.0).abs() < 1e-9);
        assert!((next.metrics.architect.latency - 1550.0).abs() < 1e-9);
        assert!((next.metrics.architect.reliability - 59.0).abs() < 1e-9);
        assert!((next.metrics.architect.political_capital - 53.0).abs() < 1e-9);
        assert!((next.metrics.prospect.patience - 68.0).abs() < 1e-9);
        assert!(result.turn_summary.is_empty());
    }

    #[test]
    fn test_deploy_vdd_effects() {
        let state = initialize(Scenario::Balanced, 7);
        let bu = first_node(&state, NodeCategory::BusinessUnit);
        let arch = moves(Role::Architect, 1, &[input("deploy-vdd", Some(&bu))]);
        let result = resolve_turn(&state, &arch, &[], None).unwrap_or_else(|_| unreachable!());

        let node = result.new_state.node(&bu).cloned();
        assert!(node.is_some_and(|n| n.has_capability(Capability::LogiVdd)));
        // +12 from the action, +2 drift for one VDD node
        assert!((result.new_state.metrics.architect.adoption - 44.0).abs() < 1e-9);
        assert_eq!(result.action_results.len(), 1);
        assert!(result.action_results[0].success);
        assert_eq!(result.action_results[0].action_id, "arch-1-0");
        assert!(result.turn_summary.starts_with("Architect: Enabled VDD Pilot on"));
    }

    #[test]
    fn test_capability_block_stops_deployment() {
        let state = initialize(Scenario::Balanced, 9);
        let bu = first_node(&state, NodeCategory::BusinessUnit);
        let pros = moves(
            Role::Prospect,
            1,
            &[ActionInput {
                action_type: "impose-constraint".to_string(),
                target_node_id: None,
                parameters: Some(json!({ "capability": "logi-vdd" })),
            }],
        );
        let arch = moves(Role::Architect, 1, &[input("deploy-vdd", Some(&bu))]);
        let result = resolve_turn(&state, &arch, &pros, None).unwrap_or_else(|_| unreachable!());

        let blocked = &result.action_results[1];
        assert!(blocked.blocked);
        assert!(!blocked.success);
        assert_eq!(blocked.block_reason.as_deref(), Some("Blocked by capability-block"));
        assert_eq!(result.new_state.deployment_count(Capability::LogiVdd), 0);
        assert!(result.turn_summary.contains("1 action(s) were blocked by constraints."));
        assert_eq!(result.new_state.active_constraints.len(), 1);
    }

    #[test]
    fn test_constraint_expires_after_duration() {
        let mut state = initialize(Scenario::Balanced, 9);
        let pros = moves(
            Role::Prospect,
            1,
            &[ActionInput {
                action_type: "impose-constraint".to_string(),
                target_node_id: None,
                parameters: Some(json!({ "capability": "simba-connectors" })),
            }],
        );
        state = resolve_turn(&state, &[], &pros, None)
            .map(|r| r.new_state)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(state.active_constraints.len(), 1);
        for _ in 0..2 {
            state = resolve_turn(&state, &[], &[], None)
                .map(|r| r.new_state)
                .unwrap_or_else(|_| unreachable!());
        }
        assert!(state.active_constraints.is_empty());
    }

    #[test]
    fn test_set_deadline_never_below_two_turns() {
        let mut state = initialize(Scenario::Balanced, 3);
        state.current_turn = 10;
        let pros = moves(Role::Prospect, 10, &[input("set-deadline", None)]);
        let result = resolve_turn(&state, &[], &pros, None).unwrap_or_else(|_| unreachable!());
        assert_eq!(result.new_state.max_turns, 12);

        state.current_turn = 2;
        let result = resolve_turn(&state, &[], &pros, None).unwrap_or_else(|_| unreachable!());
        assert_eq!(result.new_state.max_turns, 10);
    }

    #[test]
    fn test_patience_exhaustion_ends_game() {
        let mut state = initialize(Scenario::Balanced, 11);
        state.metrics.prospect.patience = 12.0;
        let result = resolve_turn(&state, &[], &[], None).unwrap_or_else(|_| unreachable!());
        assert!(result.new_state.game_over);
        assert_eq!(result.new_state.winner, Some(Role::Prospect));
        assert_eq!(
            result.new_state.end_reason.as_deref(),
            Some("Prospect ran out of patience and terminated the evaluation.")
        );
        assert!(result.new_state.current_event.is_none());
    }

    #[test]
    fn test_final_turn_draw() {
        let mut state = initialize(Scenario::Balanced, 11);
        state.current_turn = 12;
        let result = resolve_turn(&state, &[], &[], None).unwrap_or_else(|_| unreachable!());
        assert!(result.new_state.game_over);
        assert_eq!(result.new_state.winner, None);
        assert!(
            result
                .new_state
                .end_reason
                .is_some_and(|r| r.contains("inconclusively"))
        );
    }

    #[test]
    fn test_final_turn_architect_shortfall_lists_metrics() {
        let mut state = initialize(Scenario::Balanced, 11);
        state.current_turn = 12;
        state.metrics.prospect.business_value = 90.0;
        state.metrics.prospect.risk = 10.0;
        let result = resolve_turn(&state, &[], &[], None).unwrap_or_else(|_| unreachable!());
        assert_eq!(result.new_state.winner, Some(Role::Prospect));
        assert!(
            result
                .new_state
                .end_reason
                .is_some_and(|r| r.starts_with("Failed to meet: Adoption, Trust"))
        );
    }

    #[test]
    fn test_resolving_finished_game_fails() {
        let mut state = initialize(Scenario::Balanced, 11);
        state.game_over = true;
        assert_eq!(
            resolve_turn(&state, &[], &[], None),
            Err(EngineError::GameOver)
        );
    }

    #[test]
    fn test_event_choice_applied() {
        let mut state = initialize(Scenario::Balanced, 5);
        let deck = events::deck();
        state.current_event = deck.into_iter().find(|e| e.id == "licensing-surprise");
        let result = resolve_turn(&state, &[], &[], Some("pay-up")).unwrap_or_else(|_| unreachable!());
        assert_eq!(result.event_choice_id.as_deref(), Some("pay-up"));
        assert!((result.new_state.metrics.architect.cost - 120.0).abs() < 1e-9);

        let bad = resolve_turn(&state, &[], &[], Some("nope"));
        assert_eq!(bad, Err(EngineError::UnknownEventChoice("nope".to_string())));
    }

    #[test]
    fn test_validate_rejects_wrong_role_and_targets() {
        let state = initialize(Scenario::Balanced, 5);
        assert!(matches!(
            validate_submission(&state, Role::Architect, &[input("demand-poc", None)], None),
            Err(EngineError::WrongRole { .. })
        ));
        assert!(matches!(
            validate_submission(&state, Role::Architect, &[input("deploy-vdd", None)], None),
            Err(EngineError::MissingTarget(_))
        ));
        assert!(matches!(
            validate_submission(&state, Role::Architect, &[input("deploy-vdd", Some("node-99"))], None),
            Err(EngineError::UnknownNode(_))
        ));
        let app = first_node(&state, NodeCategory::Application);
        assert!(matches!(
            validate_submission(&state, Role::Architect, &[input("deploy-vdd", Some(&app))], None),
            Err(EngineError::Unavailable { .. })
        ));
        assert!(matches!(
            validate_submission(&state, Role::Prospect, &[input("impose-constraint", None)], None),
            Err(EngineError::MissingParameter { .. })
        ));
        assert!(matches!(
            validate_submission(&state, Role::Prospect, &[input("bribe", None)], None),
            Err(EngineError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_validate_limits_action_count() {
        let state = initialize(Scenario::Balanced, 5);
        let four = vec![input("share-requirements", None); 4];
        assert_eq!(
            validate_submission(&state, Role::Prospect, &four, None),
            Err(EngineError::TooManyActions(MAX_ACTIONS_PER_TURN))
        );
        assert!(validate_submission(&state, Role::Prospect, &four[..3], None).is_ok());
        assert!(validate_submission(&state, Role::Prospect, &[], None).is_ok());
    }

    #[test]
    fn test_available_actions() {
        let mut state = initialize(Scenario::Balanced, 5);
        assert_eq!(available_actions(&state, Role::Prospect, None).len(), 8);

        let global = available_actions(&state, Role::Architect, None);
        assert_eq!(global.len(), 4);
        assert!(!global.contains(&ActionType::ExecutiveEscalation));

        let bu = first_node(&state, NodeCategory::BusinessUnit);
        let on_bu = available_actions(&state, Role::Architect, Some(&bu));
        assert!(on_bu.contains(&ActionType::DeployVdd));
        assert!(on_bu.contains(&ActionType::DeployDashboards));
        assert!(!on_bu.contains(&ActionType::DeploySimba));

        state.active_constraints.push(ActiveConstraint {
            id: "constraint-1-0".to_string(),
            kind: ConstraintKind::PocRequired,
            turn_imposed: 1,
            duration: 3,
            target_capability: None,
            target_node_id: None,
            requirement: Some(40.0),
        });
        assert!(available_actions(&state, Role::Architect, None).contains(&ActionType::ExecutiveEscalation));
        state.metrics.architect.political_capital = 10.0;
        assert!(!available_actions(&state, Role::Architect, None).contains(&ActionType::ExecutiveEscalation));
    }
}
