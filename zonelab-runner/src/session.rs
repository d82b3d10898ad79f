//! Trading-session classification for statistics breakdowns.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Named trading session a timestamp falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Session {
    #[serde(rename = "rth")]
    Rth,
    #[serde(rename = "afterhours")]
    AfterHours,
    #[serde(rename = "overnight")]
    Overnight,
}

impl Session {
    pub fn as_str(self) -> &'static str {
        match self {
            Session::Rth => "rth",
            Session::AfterHours => "afterhours",
            Session::Overnight => "overnight",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a timestamp to a [`Session`].
pub trait SessionClassifier {
    fn classify(&self, at: DateTime<Utc>) -> Session;
}

impl<F> SessionClassifier for F
where
    F: Fn(DateTime<Utc>) -> Session,
{
    fn classify(&self, at: DateTime<Utc>) -> Session {
        self(at)
    }
}

/// CME equity-index sessions in exchange-local (New York) time.
///
/// - 09:30–16:00 regular trading hours
/// - 16:00–18:00 after hours
/// - everything else overnight
///
/// Boundaries are minutes after local midnight; each session includes its
/// opening minute and excludes its closing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsFuturesSessions {
    pub timezone: Tz,
    pub rth_open: u32,
    pub rth_close: u32,
    pub after_hours_close: u32,
}

impl Default for UsFuturesSessions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            rth_open: 9 * 60 + 30,
            rth_close: 16 * 60,
            after_hours_close: 18 * 60,
        }
    }
}

impl SessionClassifier for UsFuturesSessions {
    fn classify(&self, at: DateTime<Utc>) -> Session {
        let local = at.with_timezone(&self.timezone);
        let minute = local.hour() * 60 + local.minute();
        if minute >= self.rth_open && minute < self.rth_close {
            Session::Rth
        } else if minute >= self.rth_close && minute < self.after_hours_close {
            Session::AfterHours
        } else {
            Session::Overnight
        }
    }
}
