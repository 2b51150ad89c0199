//! Flow type identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Which domain's registration flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Appointment,
    Birth,
    Death,
    Sale,
    Purchase,
    Expense,
}

impl FlowType {
    pub const ALL: [FlowType; 6] = [
        FlowType::Appointment,
        FlowType::Birth,
        FlowType::Death,
        FlowType::Sale,
        FlowType::Purchase,
        FlowType::Expense,
    ];

    /// Stable identifier used in storage keys and record API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Appointment => "appointment",
            FlowType::Birth => "birth",
            FlowType::Death => "death",
            FlowType::Sale => "sale",
            FlowType::Purchase => "purchase",
            FlowType::Expense => "expense",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FlowType::Appointment => "Appointment",
            FlowType::Birth => "Birth",
            FlowType::Death => "Death",
            FlowType::Sale => "Sale",
            FlowType::Purchase => "Purchase",
            FlowType::Expense => "Expense",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FlowType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        FlowType::ALL
            .iter()
            .copied()
            .find(|flow| flow.as_str() == needle)
            .ok_or_else(|| {
                ValidationError::invalid_format("flow_type", format!("unknown flow '{}'", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&FlowType::Expense).unwrap(), "\"expense\"");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Death".parse::<FlowType>().unwrap(), FlowType::Death);
        assert_eq!(" sale ".parse::<FlowType>().unwrap(), FlowType::Sale);
    }

    #[test]
    fn rejects_unknown_flow() {
        assert!("harvest".parse::<FlowType>().is_err());
    }

    #[test]
    fn as_str_round_trips_through_from_str() {
        for flow in FlowType::ALL {
            assert_eq!(flow.as_str().parse::<FlowType>().unwrap(), flow);
        }
    }
}
