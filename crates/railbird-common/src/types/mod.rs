pub mod counterparty;
pub mod manual_staker;
pub mod settlement;
pub mod stake;

pub use counterparty::Counterparty;
pub use manual_staker::{normalize_name, ManualStaker};
pub use settlement::SettlementBreakdown;
pub use stake::{NewStake, Stake, StakeStatus, OFF_APP_USER_ID};
