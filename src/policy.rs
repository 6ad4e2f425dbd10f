//! Sport compatibility policy.
//!
//! The remote service does not reliably persist custom workouts for every
//! sport type. A policy maps a requested sport either to a substitute sport
//! plus a warning for the caller, or to an outright rejection. Sports without a
//! rule are applied as requested.

use serde::{Deserialize, Serialize};

use crate::model::Sport;

const HIIT_FALLBACK_WARNING: &str = "The remote service does not reliably persist custom HIIT \
     workouts; cardio_training was applied so the session is created and shows up on the calendar.";

const HIIT_REJECT_REASON: &str = "custom HIIT workouts are not persisted reliably by the remote \
     service; use cardio_training instead";

/// A requested sport the policy refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sport type '{requested}' is not accepted: {reason}")]
pub struct SportRejected {
    pub requested: Sport,
    pub reason: String,
}

/// A versioned table of sport substitutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SportPolicy {
    pub version: u32,

    #[serde(default)]
    pub rules: Vec<SportRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SportRule {
    pub requested: Sport,

    #[serde(flatten)]
    pub action: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RuleAction {
    /// Apply `applied` instead, and tell the caller why.
    Fallback { applied: Sport, warning: String },

    /// Refuse the request before anything reaches the remote service.
    Reject { reason: String },
}

/// The outcome of resolving a requested sport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportResolution {
    pub requested: Sport,
    pub applied: Sport,
    pub warning: Option<String>,
}

impl SportResolution {
    /// A resolution that applies the sport as requested.
    pub fn unchanged(sport: Sport) -> Self {
        Self {
            requested: sport,
            applied: sport,
            warning: None,
        }
    }

    pub fn substituted(&self) -> bool {
        self.requested != self.applied
    }
}

impl Default for SportPolicy {
    /// Version 2: HIIT falls back to cardio training with a warning.
    fn default() -> Self {
        Self {
            version: 2,
            rules: vec![SportRule {
                requested: Sport::Hiit,
                action: RuleAction::Fallback {
                    applied: Sport::Cardio,
                    warning: HIIT_FALLBACK_WARNING.to_string(),
                },
            }],
        }
    }
}

impl SportPolicy {
    /// Version 1: HIIT is rejected outright.
    pub fn strict() -> Self {
        Self {
            version: 1,
            rules: vec![SportRule {
                requested: Sport::Hiit,
                action: RuleAction::Reject {
                    reason: HIIT_REJECT_REASON.to_string(),
                },
            }],
        }
    }

    /// Resolves `requested` through the first matching rule.
    pub fn resolve(&self, requested: Sport) -> Result<SportResolution, SportRejected> {
        let Some(rule) = self.rules.iter().find(|rule| rule.requested == requested) else {
            return Ok(SportResolution::unchanged(requested));
        };

        match &rule.action {
            RuleAction::Fallback { applied, warning } => {
                tracing::debug!(
                    policy = self.version,
                    %requested,
                    %applied,
                    "sport substituted"
                );
                Ok(SportResolution {
                    requested,
                    applied: *applied,
                    warning: (requested != *applied).then(|| {
                        if warning.trim().is_empty() {
                            format!("{applied} was applied instead of {requested}.")
                        } else {
                            warning.clone()
                        }
                    }),
                })
            }
            RuleAction::Reject { reason } => Err(SportRejected {
                requested,
                reason: reason.clone(),
            }),
        }
    }
}

/// Joins non-empty warnings with a space.
pub fn merge_warnings<I, S>(warnings: I) -> Option<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let parts: Vec<String> = warnings
        .into_iter()
        .flatten()
        .map(|w| w.as_ref().trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}
