use serde::{Deserialize, Serialize};

/// Entry in the recent-recipients history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub label: String,
    /// Unix millis of the last successful send
    pub last_used: i64,
}

impl Recipient {
    pub fn new(address: &str, label: Option<&str>) -> Self {
        let label = match label.map(str::trim) {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => address.chars().take(8).collect(),
        };
        Self {
            address: address.to_string(),
            label,
            last_used: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn matches(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}
