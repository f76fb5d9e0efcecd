//! Staking settlement engine for railbird
//! Drives stake lifecycle transitions, ledger persistence and partner analytics

pub mod ledger;
pub mod partners;
pub mod transition;

pub use ledger::StakeLedger;
pub use partners::{aggregate_partners, PartnerSummary, RoleStats};
pub use transition::Applied;
