use std::f64::consts::PI;

use super::rng::SeededRng;
use super::types::{GameEdge, GameNode, NodeCategory, Strength};

const BUSINESS_UNITS: [&str; 5] = ["Finance", "Operations", "Product", "Sales", "Marketing"];
const APPLICATIONS: [&str; 3] = ["ERP", "CRM", "Support"];
const DATA_PLATFORMS: [&str; 3] = ["Data Warehouse", "Data Lake", "Query Engine"];
const DOMAINS: [&str; 4] = ["Orders", "Customers", "Revenue", "Tickets"];

const CENTER_X: f64 = 400.0;
const CENTER_Y: f64 = 300.0;
const RADIUS: f64 = 200.0;

/// Base value and random spread for one node stat.
struct Spread(f64, f64);

struct CategoryProfile {
    adoption: Spread,
    trust: Spread,
    latency: Spread,
    cost: Spread,
}

const fn profile(category: NodeCategory) -> CategoryProfile {
    match category {
        NodeCategory::BusinessUnit => CategoryProfile {
            adoption: Spread(20.0, 30.0),
            trust: Spread(40.0, 20.0),
            latency: Spread(800.0, 600.0),
            cost: Spread(10.0, 20.0),
        },
        NodeCategory::Application => CategoryProfile {
            adoption: Spread(30.0, 20.0),
            trust: Spread(50.0, 20.0),
            latency: Spread(600.0, 400.0),
            cost: Spread(15.0, 15.0),
        },
        NodeCategory::DataPlatform => CategoryProfile {
            adoption: Spread(25.0, 25.0),
            trust: Spread(45.0, 25.0),
            latency: Spread(500.0, 500.0),
            cost: Spread(20.0, 25.0),
        },
        NodeCategory::Domain => CategoryProfile {
            adoption: Spread(30.0, 20.0),
            trust: Spread(50.0, 20.0),
            latency: Spread(400.0, 300.0),
            cost: Spread(5.0, 10.0),
        },
    }
}

#[allow(clippy::cast_precision_loss)]
fn position(category: NodeCategory, i: usize) -> (f64, f64) {
    let i = i as f64;
    match category {
        NodeCategory::BusinessUnit => {
            let angle = (i / BUSINESS_UNITS.len() as f64) * PI - PI / 2.0;
            (
                CENTER_X - RADIUS + angle.cos() * (RADIUS * 0.6),
                CENTER_Y + angle.sin() * (RADIUS * 0.8),
            )
        }
        NodeCategory::Application => (
            CENTER_X + RADIUS * 0.3,
            CENTER_Y - RADIUS * 0.4 + i * (RADIUS * 0.4),
        ),
        NodeCategory::DataPlatform => (
            CENTER_X + RADIUS * 0.8,
            CENTER_Y - RADIUS * 0.3 + i * (RADIUS * 0.3),
        ),
        NodeCategory::Domain => (CENTER_X, CENTER_Y - RADIUS * 0.5 + i * (RADIUS * 0.33)),
    }
}

fn strength(rng: &mut SeededRng) -> Strength {
    if rng.next_f64() > 0.5 {
        Strength::Strong
    } else {
        Strength::Weak
    }
}

/// Build the fifteen-node estate and its edges.
pub fn generate(rng: &mut SeededRng) -> (Vec<GameNode>, Vec<GameEdge>) {
    let groups = [
        (NodeCategory::BusinessUnit, &BUSINESS_UNITS[..]),
        (NodeCategory::Application, &APPLICATIONS[..]),
        (NodeCategory::DataPlatform, &DATA_PLATFORMS[..]),
        (NodeCategory::Domain, &DOMAINS[..]),
    ];

    let mut nodes = Vec::with_capacity(15);
    for (category, names) in groups {
        let p = profile(category);
        for (i, name) in names.iter().enumerate() {
            let (x, y) = position(category, i);
            nodes.push(GameNode {
                id: format!("node-{}", nodes.len()),
                name: (*name).to_string(),
                category,
                x,
                y,
                adoption: p.adoption.0 + rng.next_f64() * p.adoption.1,
                trust: p.trust.0 + rng.next_f64() * p.trust.1,
                latency: p.latency.0 + rng.next_f64() * p.latency.1,
                cost: p.cost.0 + rng.next_f64() * p.cost.1,
                deployments: Vec::new(),
                blocked: false,
            });
        }
    }

    let ids_of = |category: NodeCategory| -> Vec<String> {
        nodes
            .iter()
            .filter(|n| n.category == category)
            .map(|n| n.id.clone())
            .collect()
    };
    let domains = ids_of(NodeCategory::Domain);
    let apps = ids_of(NodeCategory::Application);
    let platforms = ids_of(NodeCategory::DataPlatform);

    let mut edges: Vec<GameEdge> = Vec::new();
    let push = |edges: &mut Vec<GameEdge>, source: &str, target: &str, s: Strength| {
        let id = format!("edge-{}", edges.len());
        edges.push(GameEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            strength: s,
        });
    };

    for node in &nodes {
        match node.category {
            NodeCategory::BusinessUnit => {
                for domain in domains.iter().take(2) {
                    let s = strength(rng);
                    push(&mut edges, &node.id, domain, s);
                }
            }
            NodeCategory::Application => {
                for platform in &platforms {
                    if rng.next_f64() > 0.3 {
                        let s = strength(rng);
                        push(&mut edges, &node.id, platform, s);
                    }
                }
            }
            NodeCategory::Domain => {
                for app in apps.iter().take(2) {
                    if rng.next_f64() > 0.4 {
                        push(&mut edges, &node.id, app, Strength::Weak);
                    }
                }
            }
            NodeCategory::DataPlatform => {}
        }
    }

    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_counts() {
        let (nodes, _) = generate(&mut SeededRng::new(12345));
        assert_eq!(nodes.len(), 15);
        let count = |c| nodes.iter().filter(|n| n.category == c).count();
        assert_eq!(count(NodeCategory::BusinessUnit), 5);
        assert_eq!(count(NodeCategory::Application), 3);
        assert_eq!(count(NodeCategory::DataPlatform), 3);
        assert_eq!(count(NodeCategory::Domain), 4);
        assert_eq!(nodes[0].id, "node-0");
        assert_eq!(nodes[14].name, "Tickets");
    }

    #[test]
    fn test_stats_within_spread() {
        let (nodes, _) = generate(&mut SeededRng::new(99));
        for node in nodes.iter().filter(|n| n.category == NodeCategory::BusinessUnit) {
            assert!((20.0..=50.0).contains(&node.adoption));
            assert!((800.0..=1400.0).contains(&node.latency));
        }
    }

    #[test]
    fn test_every_business_unit_links_two_domains() {
        let (nodes, edges) = generate(&mut SeededRng::new(5));
        for bu in nodes.iter().filter(|n| n.category == NodeCategory::BusinessUnit) {
            assert_eq!(edges.iter().filter(|e| e.source == bu.id).count(), 2);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = generate(&mut SeededRng::new(31337));
        let b = generate(&mut SeededRng::new(31337));
        assert_eq!(a, b);
    }
}
