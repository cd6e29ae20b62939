use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an item sits in the user's collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    /// Already watched
    #[default]
    History,
    /// Planned to watch
    Watchlist,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::History => "history",
            WatchStatus::Watchlist => "watchlist",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "history" | "watched" => Ok(WatchStatus::History),
            "watchlist" | "planned" => Ok(WatchStatus::Watchlist),
            other => Err(format!("Invalid status: {}. Use 'history' or 'watchlist'", other)),
        }
    }
}
