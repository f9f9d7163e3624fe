use serde::{Deserialize, Serialize};

use super::types::{ArchitectMetrics, Metrics, ProspectMetrics};

/// Starting conditions a room is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// High pressure for quick results
    SpeedToValue,
    /// Strong governance requirements
    GovernanceFirst,
    /// Enterprise scale challenges
    ScaleOut,
    Balanced,
}

impl Scenario {
    pub const ALL: [Self; 4] = [
        Self::SpeedToValue,
        Self::GovernanceFirst,
        Self::ScaleOut,
        Self::Balanced,
    ];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sc| sc.as_str() == s)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SpeedToValue => "speed-to-value",
            Self::GovernanceFirst => "governance-first",
            Self::ScaleOut => "scale-out",
            Self::Balanced => "balanced",
        }
    }

    #[must_use]
    pub fn initial_metrics(&self) -> Metrics {
        let architect = ArchitectMetrics::default();
        let prospect = ProspectMetrics::default();
        match self {
            Self::SpeedToValue => Metrics {
                architect: ArchitectMetrics {
                    adoption: 20.0,
                    political_capital: 60.0,
                    ..architect
                },
                prospect: ProspectMetrics {
                    patience: 50.0,
                    business_value: 20.0,
                    ..prospect
                },
            },
            Self::GovernanceFirst => Metrics {
                architect: ArchitectMetrics {
                    governance_coverage: 60.0,
                    trust: 40.0,
                    ..architect
                },
                prospect: ProspectMetrics {
                    risk: 70.0,
                    patience: 80.0,
                    ..prospect
                },
            },
            Self::ScaleOut => Metrics {
                architect: ArchitectMetrics {
                    adoption: 40.0,
                    reliability: 50.0,
                    ..architect
                },
                prospect: ProspectMetrics {
                    business_value: 40.0,
                    patience: 60.0,
                    ..prospect
                },
            },
            Self::Balanced => Metrics { architect, prospect },
        }
    }
}
