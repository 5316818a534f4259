//! Purchase limit resolution.
//!
//! A partner may buy an asset up to an effective limit built from three
//! sources: the asset's global `max_order_per_partner`, a partner-specific
//! override and an override attached to the partner's category. The partner
//! override shadows the category override; the result is then combined with
//! the asset default according to a [`LimitPolicy`].
//!
//! A limit of zero is treated the same as a missing one at every level, and
//! an unset effective limit means the asset can be ordered without bound.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// How an override is combined with the asset default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// The override replaces the asset default.
    #[default]
    MostSpecific,
    /// The lower of override and asset default applies.
    Stricter,
    /// The higher of override and asset default applies.
    Looser,
}

#[derive(Debug, Error)]
#[error("unknown limit policy `{0}` (expected most_specific, stricter or looser)")]
pub struct UnknownLimitPolicy(String);

impl FromStr for LimitPolicy {
    type Err = UnknownLimitPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most_specific" | "most-specific" => Ok(LimitPolicy::MostSpecific),
            "stricter" | "min" => Ok(LimitPolicy::Stricter),
            "looser" | "max" => Ok(LimitPolicy::Looser),
            other => Err(UnknownLimitPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for LimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimitPolicy::MostSpecific => "most_specific",
            LimitPolicy::Stricter => "stricter",
            LimitPolicy::Looser => "looser",
        };
        f.write_str(name)
    }
}

/// The configured limit values for one (partner, asset) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitSources {
    pub asset_default: Option<i64>,
    pub partner_override: Option<i64>,
    pub category_override: Option<i64>,
}

impl LimitSources {
    /// Resolve the effective limit. `None` means unlimited.
    pub fn effective_limit(&self, policy: LimitPolicy) -> Option<i64> {
        let default = configured(self.asset_default);
        let overriding = configured(self.partner_override).or(configured(self.category_override));

        match (overriding, default) {
            (None, default) => default,
            (Some(limit), None) => Some(limit),
            (Some(limit), Some(default)) => Some(match policy {
                LimitPolicy::MostSpecific => limit,
                LimitPolicy::Stricter => limit.min(default),
                LimitPolicy::Looser => limit.max(default),
            }),
        }
    }
}

fn configured(limit: Option<i64>) -> Option<i64> {
    limit.filter(|value| *value > 0)
}

/// Quantities that count against the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitUsage {
    /// Quantity already ordered, excluding cancelled and failed orders.
    pub lifetime_qty: i64,
    /// Quantity held in the cart, excluding the line being updated.
    pub other_qty: i64,
}

impl LimitUsage {
    /// What is still purchasable under `limit`, never negative.
    pub fn remaining(&self, limit: i64) -> i64 {
        (limit - self.lifetime_qty - self.other_qty).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    Rejected { remaining: i64 },
}

impl LimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitDecision::Allowed)
    }
}

/// Decide whether `requested` more units may be reserved.
pub fn check_purchase(
    sources: &LimitSources,
    policy: LimitPolicy,
    usage: LimitUsage,
    requested: i64,
) -> LimitDecision {
    let Some(limit) = sources.effective_limit(policy) else {
        return LimitDecision::Allowed;
    };

    let projected_total = usage.lifetime_qty + usage.other_qty + requested;
    if projected_total > limit {
        LimitDecision::Rejected {
            remaining: usage.remaining(limit),
        }
    } else {
        LimitDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_only(limit: i64) -> LimitSources {
        LimitSources {
            asset_default: Some(limit),
            ..Default::default()
        }
    }

    #[test]
    fn unset_limit_allows_any_quantity() {
        let usage = LimitUsage {
            lifetime_qty: 1_000,
            other_qty: 50,
        };
        let decision = check_purchase(&LimitSources::default(), LimitPolicy::default(), usage, 10);
        assert_eq!(decision, LimitDecision::Allowed);
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let decision = check_purchase(
            &asset_only(0),
            LimitPolicy::MostSpecific,
            LimitUsage::default(),
            500,
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn rejects_over_asset_limit_with_remaining() {
        let usage = LimitUsage {
            lifetime_qty: 3,
            other_qty: 2,
        };
        let decision = check_purchase(&asset_only(10), LimitPolicy::MostSpecific, usage, 6);
        assert_eq!(decision, LimitDecision::Rejected { remaining: 5 });
    }

    #[test]
    fn accepts_exactly_at_limit() {
        let usage = LimitUsage {
            lifetime_qty: 3,
            other_qty: 2,
        };
        let decision = check_purchase(&asset_only(10), LimitPolicy::MostSpecific, usage, 5);
        assert!(decision.is_allowed());
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let usage = LimitUsage {
            lifetime_qty: 12,
            other_qty: 0,
        };
        let decision = check_purchase(&asset_only(10), LimitPolicy::MostSpecific, usage, 1);
        assert_eq!(decision, LimitDecision::Rejected { remaining: 0 });
    }

    #[test]
    fn partner_override_shadows_category_override() {
        let sources = LimitSources {
            asset_default: Some(5),
            partner_override: Some(8),
            category_override: Some(20),
        };
        assert_eq!(sources.effective_limit(LimitPolicy::MostSpecific), Some(8));
    }

    #[test]
    fn category_override_applies_without_partner_override() {
        let sources = LimitSources {
            asset_default: Some(5),
            partner_override: None,
            category_override: Some(3),
        };
        assert_eq!(sources.effective_limit(LimitPolicy::MostSpecific), Some(3));
        assert_eq!(sources.effective_limit(LimitPolicy::Looser), Some(5));
        assert_eq!(sources.effective_limit(LimitPolicy::Stricter), Some(3));
    }

    #[test]
    fn zero_partner_override_falls_through_to_category() {
        let sources = LimitSources {
            asset_default: Some(5),
            partner_override: Some(0),
            category_override: Some(7),
        };
        assert_eq!(sources.effective_limit(LimitPolicy::MostSpecific), Some(7));
    }

    #[test]
    fn override_without_default_applies_under_every_policy() {
        let sources = LimitSources {
            asset_default: None,
            partner_override: Some(4),
            category_override: None,
        };
        for policy in [
            LimitPolicy::MostSpecific,
            LimitPolicy::Stricter,
            LimitPolicy::Looser,
        ] {
            assert_eq!(sources.effective_limit(policy), Some(4));
        }
    }

    #[test]
    fn policy_parses_from_config_values() {
        assert_eq!("stricter".parse::<LimitPolicy>().ok(), Some(LimitPolicy::Stricter));
        assert_eq!("MAX".parse::<LimitPolicy>().ok(), Some(LimitPolicy::Looser));
        assert_eq!(
            " most_specific ".parse::<LimitPolicy>().ok(),
            Some(LimitPolicy::MostSpecific)
        );
        assert!("loosest".parse::<LimitPolicy>().is_err());
    }
}
