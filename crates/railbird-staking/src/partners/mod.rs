//! Partner aggregation
//!
//! Read-side projection grouping a user's stakes by counterparty, with
//! outstanding balances and per-role performance. Recomputed in full on each
//! request; nothing here holds state between calls.
//!
//! Sign conventions: `outstanding_net` and `total_net` are liability balances
//! (positive means the current user owes the counterparty), so the settlement
//! amount is negated when the user is the staker. Role profit is economic
//! gain and carries the opposite adjustment.

mod analytics;

pub use self::analytics::RoleStats;

use {
    self::analytics::RoleAccum,
    chrono::{DateTime, Utc},
    railbird_common::{
        Counterparty, ManualStaker, SettlementBreakdown, Stake, StakeStatus,
    },
    std::collections::HashMap,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerSummary {
    pub counterparty: Counterparty,
    pub display_name: String,
    pub stake_count: usize,
    /// Net balance over non-settled stakes; positive means the user owes.
    pub outstanding_net: f64,
    /// Same balance over every stake, settled included. Informational only.
    pub total_net: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub as_staker: RoleStats,
    pub as_player: RoleStats,
}

#[derive(Default)]
struct Group {
    display_name: String,
    stake_count: usize,
    outstanding_net: f64,
    total_net: f64,
    last_activity: Option<DateTime<Utc>>,
    as_staker: RoleAccum,
    as_player: RoleAccum,
}

/// Group `user_id`'s stakes by counterparty. Directory entries with no stakes
/// yet still produce (empty) groups so newly added manual stakers surface.
pub fn aggregate_partners(
    user_id: &str,
    stakes: &[Stake],
    manual_stakers: &[ManualStaker],
) -> Vec<PartnerSummary> {
    let mut groups: HashMap<Counterparty, Group> = HashMap::new();

    for entry in manual_stakers {
        if entry.created_by_user_id != user_id {
            continue;
        }
        let key = Counterparty::Manual(entry.normalized_name());
        let group = groups.entry(key).or_default();
        group.display_name = entry.name.trim().to_string();
    }

    for stake in stakes {
        let Some(counterparty) = stake.counterparty_of(user_id) else {
            continue;
        };
        let group = groups.entry(counterparty.clone()).or_default();
        if group.display_name.is_empty() {
            group.display_name = match &counterparty {
                Counterparty::AppUser(id) => id.clone(),
                Counterparty::Manual(_) => stake
                    .manual_staker_display_name
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            };
        }

        let as_staker = stake.is_staker(user_id);
        let amount = stake.settlement_amount();
        let exposure = if as_staker { -amount } else { amount };

        group.stake_count += 1;
        group.total_net += exposure;
        group.last_activity = Some(match group.last_activity {
            Some(prev) => prev.max(stake.proposed_at),
            None => stake.proposed_at,
        });

        if stake.status() == StakeStatus::Settled {
            let breakdown = SettlementBreakdown::for_stake(stake);
            if as_staker {
                group.as_staker.record(amount, breakdown.staker_cost);
            } else {
                group.as_player.record(-amount, breakdown.player_cost);
            }
        } else {
            group.outstanding_net += exposure;
        }
    }

    let mut summaries: Vec<PartnerSummary> = groups
        .into_iter()
        .map(|(counterparty, group)| PartnerSummary {
            counterparty,
            display_name: group.display_name,
            stake_count: group.stake_count,
            outstanding_net: group.outstanding_net,
            total_net: group.total_net,
            last_activity: group.last_activity,
            as_staker: group.as_staker.finalize(),
            as_player: group.as_player.finalize(),
        })
        .collect();

    // Active relationships first, most recent activity on top; empty groups
    // trail in name order.
    summaries.sort_by(|a, b| match (a.last_activity, b.last_activity) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.display_name.cmp(&b.display_name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.display_name.cmp(&b.display_name),
    });

    summaries
}
