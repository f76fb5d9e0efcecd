//! Counterparty identity
//!
//! A stake's other side is either another app user or an off-platform person
//! from the manual staker directory. Modelled as a closed variant so grouping
//! never parses string-prefixed keys.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Counterparty {
    /// Another app user, by user id.
    AppUser(String),
    /// An off-platform person, by whitespace/case-normalized directory name.
    Manual(String),
}

impl fmt::Display for Counterparty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counterparty::AppUser(id) => write!(f, "{}", id),
            Counterparty::Manual(name) => write!(f, "manual:{}", name),
        }
    }
}
