use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_status() -> String {
    "scheduled".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "W"),
            MatchResult::Draw => write!(f, "D"),
            MatchResult::Loss => write!(f, "L"),
        }
    }
}

/// A match row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Match {
    pub id: String,
    pub team_id: Option<String>,
    pub opponent_name: String,
    pub match_date: DateTime<Utc>,
    pub location: Option<String>,
    pub match_type: Option<String>,
    #[serde(default)]
    pub home_score: u32,
    #[serde(default)]
    pub away_score: u32,
    #[serde(default = "default_true")]
    pub is_home: bool,
    #[serde(default = "default_status")]
    pub status: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    /// Goals for and against from our side of the fixture.
    pub fn our_score(&self) -> (u32, u32) {
        if self.is_home {
            (self.home_score, self.away_score)
        } else {
            (self.away_score, self.home_score)
        }
    }

    /// Result from our perspective, once the match is completed.
    pub fn result(&self) -> Option<MatchResult> {
        if !self.is_completed() {
            return None;
        }
        let (ours, theirs) = self.our_score();
        Some(match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Loss,
        })
    }

    pub fn formatted_date(&self) -> String {
        self.match_date.format("%b %d, %Y").to_string()
    }

    pub fn fixture_label(&self) -> String {
        if self.is_home {
            format!("vs {}", self.opponent_name)
        } else {
            format!("@ {}", self.opponent_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub opponent_name: String,
    pub match_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(default)]
    pub home_score: u32,
    #[serde(default)]
    pub away_score: u32,
    #[serde(default = "default_true")]
    pub is_home: bool,
    #[serde(default = "default_status")]
    pub status: String,
}

impl NewMatch {
    pub fn new(opponent_name: impl Into<String>, match_date: DateTime<Utc>) -> Self {
        Self {
            team_id: None,
            opponent_name: opponent_name.into(),
            match_date,
            location: None,
            match_type: None,
            home_score: 0,
            away_score: 0,
            is_home: true,
            status: default_status(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MatchPatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub team_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub location: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub match_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_home: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture(is_home: bool, home: u32, away: u32, status: &str) -> Match {
        let date = Utc.with_ymd_and_hms(2026, 9, 12, 15, 0, 0).single().expect("valid date");
        Match {
            id: "m1".to_string(),
            team_id: None,
            opponent_name: "City".to_string(),
            match_date: date,
            location: None,
            match_type: Some("league".to_string()),
            home_score: home,
            away_score: away,
            is_home,
            status: status.to_string(),
            user_id: "u1".to_string(),
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn test_result_from_our_perspective() {
        assert_eq!(fixture(true, 2, 1, "completed").result(), Some(MatchResult::Win));
        assert_eq!(fixture(false, 2, 1, "completed").result(), Some(MatchResult::Loss));
        assert_eq!(fixture(false, 1, 1, "Completed").result(), Some(MatchResult::Draw));
        assert_eq!(fixture(true, 0, 0, "scheduled").result(), None);
    }

    #[test]
    fn test_labels() {
        let m = fixture(false, 0, 0, "scheduled");
        assert_eq!(m.fixture_label(), "@ City");
        assert_eq!(m.formatted_date(), "Sep 12, 2026");
    }

    #[test]
    fn test_parse_match_row_defaults() {
        let json = r#"{"id":"m1","team_id":null,"opponent_name":"City","match_date":"2026-09-12T15:00:00+00:00","location":null,"match_type":null,"user_id":"u1","created_at":"2026-09-01T00:00:00Z","updated_at":"2026-09-01T00:00:00Z"}"#;
        let m: Match = serde_json::from_str(json).expect("match row");
        assert_eq!(m.home_score, 0);
        assert!(m.is_home);
        assert_eq!(m.status, "scheduled");
    }
}
