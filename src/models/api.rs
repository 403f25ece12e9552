// Wire format of the election results provider

use super::{ElectionResult, FALLBACK_COLOR, PartyResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const PARTY_TARGET: &str = "parties";

/// Payload that parses as JSON but cannot describe an election.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedResults {
    #[error("contest list is empty")]
    NoContest,
    #[error("unparseable status_date {0:?}")]
    StatusDate(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub election: Election,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Election {
    // Absent means no data yet, present but empty is an error
    #[serde(default)]
    pub contest: Option<Vec<Contest>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Contest {
    #[serde(default)]
    pub results_overall: ResultsOverall,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsOverall {
    #[serde(default)]
    pub latest: Latest,
}

#[derive(Debug, Default, Deserialize)]
pub struct Latest {
    #[serde(default)]
    pub status_date: Option<String>,
    #[serde(default)]
    pub results: Vec<TargetResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TargetResult {
    #[serde(default)]
    pub target: String,
    #[serde(default, deserialize_with = "id_as_string")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub percent: Vec<Measure>,
    #[serde(default)]
    pub seats: Vec<Measure>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub value: MeasureValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeasureValue {
    #[serde(default)]
    pub absolute: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub color: Option<String>,
}

// Ids show up as numbers or strings depending on the feed
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ResultsResponse {
    /// Builds the party ranking of the first contest.
    ///
    /// `Ok(None)` while the provider has not published a status date,
    /// i.e. there is nothing to show yet.
    pub fn into_election_result(
        self,
        election_id: &str,
        stage: &str,
    ) -> Result<Option<ElectionResult>, MalformedResults> {
        let latest = match self.election.contest {
            None => return Ok(None),
            Some(contests) => contests
                .into_iter()
                .next()
                .map(|c| c.results_overall.latest)
                .ok_or(MalformedResults::NoContest)?,
        };

        let status_date = match latest.status_date.filter(|s| !s.trim().is_empty()) {
            Some(s) => s,
            None => return Ok(None),
        };
        let timestamp =
            parse_status_date(&status_date).ok_or(MalformedResults::StatusDate(status_date))?;

        let parties = latest
            .results
            .iter()
            .filter(|r| r.target == PARTY_TARGET)
            .filter_map(|r| {
                let share = r.percent.first()?;
                let target_id = r.target_id.as_deref()?;
                let party = self
                    .parties
                    .iter()
                    .find(|p| p.id.as_deref() == Some(target_id))?;
                Some(PartyResult::new(
                    party.abbreviation.clone(),
                    share.value.absolute.unwrap_or(0.0),
                    r.seats.first().and_then(|s| seat_count(s.value.absolute)),
                    party.color.as_deref().unwrap_or(FALLBACK_COLOR),
                ))
            })
            .collect();

        let mut result = ElectionResult {
            election_id: election_id.to_string(),
            stage: stage.to_string(),
            timestamp,
            parties,
        };
        let ranked: Vec<PartyResult> = result.ranked_parties().into_iter().cloned().collect();
        result.parties = ranked;
        Ok(Some(result))
    }
}

fn seat_count(raw: Option<f64>) -> Option<u32> {
    let seats = raw?;
    if seats.is_finite() && seats >= 0.0 && seats.fract() == 0.0 && seats <= u32::MAX as f64 {
        Some(seats as u32)
    } else {
        None
    }
}

// RFC 3339 first; offset-less timestamps are taken as UTC
fn parse_status_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw)
                .ok()
                .or_else(|| raw.parse::<DateTime<Utc>>().ok().map(|ts| ts.fixed_offset()))
        })
}
