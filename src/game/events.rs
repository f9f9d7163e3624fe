use super::rng::SeededRng;
use super::types::{
    AffectedRole, ArchitectDelta, EventChoice, GameEvent, GameState, ProspectDelta, TimelineEntry,
    TimelineKind,
};

/// Chance that a turn from the second one onwards opens with an event.
const EVENT_CHANCE: f64 = 0.5;

fn choice(
    id: &str,
    label: &str,
    description: &str,
    architect_effect: ArchitectDelta,
    prospect_effect: ProspectDelta,
) -> EventChoice {
    EventChoice {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        architect_effect,
        prospect_effect,
    }
}

fn event(
    id: &str,
    title: &str,
    description: &str,
    affects_role: AffectedRole,
    choices: Vec<EventChoice>,
) -> GameEvent {
    GameEvent {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        affects_role,
        choices,
    }
}

/// The full deck. Each card is drawn at most once per game.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn deck() -> Vec<GameEvent> {
    vec![
        event(
            "auth-model-change",
            "OAuth Scope Shift",
            "The security team is changing the authentication model. All OAuth scopes need review.",
            AffectedRole::Architect,
            vec![
                choice(
                    "accept-disruption",
                    "Accept Temporary Disruption",
                    "Support load +15, Reliability -10",
                    ArchitectDelta {
                        support_load: Some(15.0),
                        reliability: Some(-10.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
                choice(
                    "expedite-review",
                    "Expedite Review",
                    "Spend 15 political capital to minimize impact",
                    ArchitectDelta {
                        political_capital: Some(-15.0),
                        support_load: Some(5.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
            ],
        ),
        event(
            "schema-drift",
            "Schema Drift Detected",
            "Upstream data sources have changed their schemas without notice. Dashboards may break.",
            AffectedRole::Both,
            vec![
                choice(
                    "let-it-ride",
                    "Ride It Out",
                    "Trust -12, Risk +5",
                    ArchitectDelta {
                        trust: Some(-12.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        risk: Some(5.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "emergency-fix",
                    "Emergency Schema Fix",
                    "Cost +20, Trust -3",
                    ArchitectDelta {
                        cost: Some(20.0),
                        trust: Some(-3.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
            ],
        ),
        event(
            "high-cardinality",
            "High-Cardinality Dashboard Pain",
            "Users are complaining about slow-loading dashboards. The query engine is overwhelmed.",
            AffectedRole::Architect,
            vec![
                choice(
                    "do-nothing",
                    "Acknowledge and Monitor",
                    "Latency +300ms, Patience -5",
                    ArchitectDelta {
                        latency: Some(300.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        patience: Some(-5.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "add-caching",
                    "Implement Caching Layer",
                    "Cost +25, Latency -200ms",
                    ArchitectDelta {
                        cost: Some(25.0),
                        latency: Some(-200.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
            ],
        ),
        event(
            "exec-ai-mandate",
            "Executive AI Search Mandate",
            "The C-suite wants AI-powered search across the data estate. This is a visibility opportunity.",
            AffectedRole::Prospect,
            vec![
                choice(
                    "embrace-ai",
                    "Embrace the Mandate",
                    "Business value +10, Risk +10",
                    ArchitectDelta {
                        political_capital: Some(20.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        business_value: Some(10.0),
                        risk: Some(10.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "cautious-pilot",
                    "Propose Controlled Pilot",
                    "Patience -5, Risk -5",
                    ArchitectDelta {
                        political_capital: Some(5.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        patience: Some(-5.0),
                        risk: Some(-5.0),
                        ..ProspectDelta::default()
                    },
                ),
            ],
        ),
        event(
            "licensing-surprise",
            "Licensing Surprise",
            "A vendor audit has revealed licensing discrepancies. Costs are about to spike.",
            AffectedRole::Prospect,
            vec![
                choice(
                    "pay-up",
                    "Pay the Bill",
                    "Cost +40, Business value -5",
                    ArchitectDelta {
                        cost: Some(40.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        business_value: Some(-5.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "cut-scope",
                    "Cut Scope",
                    "Adoption -10, Cost +10",
                    ArchitectDelta {
                        adoption: Some(-10.0),
                        cost: Some(10.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
            ],
        ),
        event(
            "p1-incident",
            "P1 Incident",
            "A critical production incident has occurred. Data pipelines are down and users are impacted.",
            AffectedRole::Both,
            vec![choice(
                "incident-response",
                "Full Incident Response",
                "Reliability -15, Patience -5",
                ArchitectDelta {
                    reliability: Some(-15.0),
                    ..ArchitectDelta::default()
                },
                ProspectDelta {
                    patience: Some(-5.0),
                    ..ProspectDelta::default()
                },
            )],
        ),
        event(
            "stalled-adoption",
            "Stalled Adoption",
            "Users are not engaging with the analytics tools. Growth has flatlined.",
            AffectedRole::Architect,
            vec![
                choice(
                    "accept-stall",
                    "Accept for Now",
                    "Business value -3",
                    ArchitectDelta::default(),
                    ProspectDelta {
                        business_value: Some(-3.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "push-enablement",
                    "Push Emergency Enablement",
                    "Cost +15, Adoption +8",
                    ArchitectDelta {
                        cost: Some(15.0),
                        adoption: Some(8.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta::default(),
                ),
            ],
        ),
        event(
            "shadow-it-breakout",
            "Shadow IT Breakout",
            "Users have started building their own analytics outside your governance.",
            AffectedRole::Both,
            vec![
                choice(
                    "crack-down",
                    "Crack Down",
                    "Political capital -10, Adoption -8, Risk -5",
                    ArchitectDelta {
                        political_capital: Some(-10.0),
                        adoption: Some(-8.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        risk: Some(-5.0),
                        ..ProspectDelta::default()
                    },
                ),
                choice(
                    "embrace-extend",
                    "Embrace and Extend",
                    "Adoption +5, Trust -5, Risk +5",
                    ArchitectDelta {
                        adoption: Some(5.0),
                        trust: Some(-5.0),
                        ..ArchitectDelta::default()
                    },
                    ProspectDelta {
                        risk: Some(5.0),
                        ..ProspectDelta::default()
                    },
                ),
            ],
        ),
    ]
}

/// Possibly open an event for `state.current_turn`.
///
/// Turn one never has an event. Drawn cards are recorded in the event history
/// and the timeline and become `current_event`.
pub fn draw(state: &mut GameState) -> Option<GameEvent> {
    state.current_event = None;
    if state.current_turn < 2 {
        return None;
    }

    let mut rng = SeededRng::for_turn(state.seed, state.current_turn);
    if rng.next_f64() >= EVENT_CHANCE {
        return None;
    }

    let available: Vec<GameEvent> = deck()
        .into_iter()
        .filter(|e| !state.event_history.contains(&e.id))
        .collect();
    if available.is_empty() {
        return None;
    }

    let drawn = available[rng.next_index(available.len())].clone();
    state.event_history.push(drawn.id.clone());
    state.timeline.push(TimelineEntry {
        turn: state.current_turn,
        kind: TimelineKind::Event,
        title: drawn.title.clone(),
        description: drawn.description.clone(),
        role: None,
    });
    state.current_event = Some(drawn.clone());
    Some(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::initialize;
    use crate::game::scenario::Scenario;

    #[test]
    fn test_deck_ids_unique_and_choices_present() {
        let cards = deck();
        let mut ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), cards.len());
        assert!(cards.iter().all(|c| !c.choices.is_empty()));
    }

    #[test]
    fn test_no_event_on_first_turn() {
        let mut state = initialize(Scenario::Balanced, 4242);
        assert!(draw(&mut state).is_none());
        assert!(state.event_history.is_empty());
    }

    #[test]
    fn test_cards_never_repeat() {
        let mut state = initialize(Scenario::Balanced, 777);
        for turn in 2..40 {
            state.current_turn = turn;
            draw(&mut state);
        }
        let mut history = state.event_history.clone();
        history.sort_unstable();
        history.dedup();
        assert_eq!(history.len(), state.event_history.len());
        assert!(state.event_history.len() <= deck().len());
    }

    #[test]
    fn test_draw_is_deterministic() {
        let mut a = initialize(Scenario::ScaleOut, 2024);
        let mut b = initialize(Scenario::ScaleOut, 2024);
        a.current_turn = 3;
        b.current_turn = 3;
        assert_eq!(draw(&mut a), draw(&mut b));
    }
}
