//! Per-role performance figures over settled stakes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoleStats {
    pub settled_stakes: u32,
    pub wins: u32,
    /// Economic gain in the role: as staker `+amount`, as player `-amount`.
    pub profit: f64,
    /// Staker: grossed-up buy-in share. Player: self-funded buy-in share.
    pub cost_basis: f64,
    /// Profit over cost basis, as a percentage. Zero when the basis is zero.
    pub roi: f64,
    /// Fraction of settled stakes that closed with positive profit.
    pub win_rate: f64,
}

#[derive(Debug, Default)]
pub(crate) struct RoleAccum {
    settled: u32,
    wins: u32,
    profit: f64,
    cost_basis: f64,
}

impl RoleAccum {
    pub(crate) fn record(&mut self, profit: f64, cost_basis: f64) {
        self.settled += 1;
        if profit > 0.0 {
            self.wins += 1;
        }
        self.profit += profit;
        self.cost_basis += cost_basis;
    }

    pub(crate) fn finalize(&self) -> RoleStats {
        RoleStats {
            settled_stakes: self.settled,
            wins: self.wins,
            profit: self.profit,
            cost_basis: self.cost_basis,
            roi: if self.cost_basis > 0.0 {
                self.profit / self.cost_basis * 100.0
            } else {
                0.0
            },
            win_rate: if self.settled > 0 {
                f64::from(self.wins) / f64::from(self.settled)
            } else {
                0.0
            },
        }
    }
}
