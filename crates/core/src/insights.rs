//! Per-learner rollups of activity logs and owned courses for the admin view.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::gaps::{KnowledgeGap, rank_knowledge_gaps};
use crate::model::{ActivityEventType, ActivityLogEntry, Course};
use crate::time::parse_timestamp_millis;

/// Most recent value of some per-user field, with the time it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Latest {
    pub value: String,
    /// Epoch millis; 0 when the stored timestamp could not be parsed.
    pub at_ms: i64,
}

/// Derived view of one learner. Recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub courses: Vec<Course>,
    /// Holds the raw login timestamp string.
    pub last_login: Option<Latest>,
    pub last_topic: Option<Latest>,
    pub last_search: Option<Latest>,
    pub top_gaps: Vec<KnowledgeGap>,
}

impl UserSummary {
    fn empty(username: &str) -> Self {
        Self {
            username: username.to_owned(),
            courses: Vec::new(),
            last_login: None,
            last_topic: None,
            last_search: None,
            top_gaps: Vec::new(),
        }
    }

    #[must_use]
    pub fn last_login_ms(&self) -> i64 {
        self.last_login.as_ref().map_or(0, |l| l.at_ms)
    }
}

/// Candidate for a "most recent" field.
///
/// Ordered by time, then parsed-over-unparsed, then value, so the winner does
/// not depend on the order events arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    at_ms: i64,
    parsed: bool,
    value: String,
}

impl Candidate {
    fn from_entry(entry: &ActivityLogEntry, value: &str) -> Self {
        let parsed = parse_timestamp_millis(&entry.timestamp);
        Self {
            at_ms: parsed.unwrap_or(0),
            parsed: parsed.is_some(),
            value: value.to_owned(),
        }
    }

    fn key(&self) -> (i64, bool, &str) {
        (self.at_ms, self.parsed, self.value.as_str())
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn keep_latest(slot: &mut Option<Candidate>, candidate: Candidate) {
    if slot.as_ref().is_none_or(|current| candidate > *current) {
        *slot = Some(candidate);
    }
}

#[derive(Default)]
struct Fold {
    courses: Vec<Course>,
    login: Option<Candidate>,
    topic: Option<Candidate>,
    search: Option<Candidate>,
}

fn into_latest(candidate: Option<Candidate>) -> Option<Latest> {
    candidate.map(|c| Latest {
        value: c.value,
        at_ms: c.at_ms,
    })
}

/// Build one summary per user seen in `logs` or owning one of `courses`.
///
/// Output is ordered by username. Each user's courses are ordered by creation
/// time then id before gaps are ranked, so permuting either input changes nothing.
#[must_use]
pub fn summarize_users(logs: &[ActivityLogEntry], courses: &[Course]) -> Vec<UserSummary> {
    let mut users: BTreeMap<String, Fold> = BTreeMap::new();

    for course in courses {
        users
            .entry(course.owner().to_owned())
            .or_default()
            .courses
            .push(course.clone());
    }

    for entry in logs {
        let fold = users.entry(entry.user().to_owned()).or_default();
        match entry.event_type {
            ActivityEventType::Login => {
                keep_latest(&mut fold.login, Candidate::from_entry(entry, &entry.timestamp));
            }
            ActivityEventType::GenerateCourse => {
                if let Some(topic) = entry.requested_topic() {
                    keep_latest(&mut fold.topic, Candidate::from_entry(entry, topic));
                }
            }
            ActivityEventType::Search => {
                if let Some(term) = entry.search_term() {
                    keep_latest(&mut fold.search, Candidate::from_entry(entry, term));
                }
            }
            _ => {}
        }
    }

    users
        .into_iter()
        .map(|(username, mut fold)| {
            fold.courses.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.course_id.cmp(&b.course_id))
            });
            let mut summary = UserSummary::empty(&username);
            summary.top_gaps = rank_knowledge_gaps(&fold.courses);
            summary.courses = fold.courses;
            summary.last_login = into_latest(fold.login);
            summary.last_topic = into_latest(fold.topic);
            summary.last_search = into_latest(fold.search);
            summary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::course;
    use crate::model::{ActivityDraft, ChapterId, CourseProgress};
    use serde_json::json;

    fn log(event_type: ActivityEventType, user: Option<&str>, ts: &str) -> ActivityLogEntry {
        ActivityLogEntry {
            id: format!("{event_type}-{ts}"),
            event_type,
            timestamp: ts.to_owned(),
            payload: ActivityDraft {
                user: user.map(str::to_owned),
                ..ActivityDraft::default()
            },
        }
    }

    fn topic(user: &str, ts: &str, topic: &str) -> ActivityLogEntry {
        let mut entry = log(ActivityEventType::GenerateCourse, Some(user), ts);
        entry.payload.request = Some(json!({ "topic": topic }));
        entry
    }

    fn search(user: &str, ts: &str, query: &str) -> ActivityLogEntry {
        let mut entry = log(ActivityEventType::Search, Some(user), ts);
        entry.payload.query = Some(query.to_owned());
        entry
    }

    const T1: &str = "2024-03-01T09:00:00Z";
    const T2: &str = "2024-03-02T09:00:00Z";

    #[test]
    fn latest_login_wins_in_either_order() {
        let forward = vec![
            log(ActivityEventType::Login, Some("ada"), T1),
            log(ActivityEventType::Login, Some("ada"), T2),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();

        for logs in [forward, backward] {
            let summaries = summarize_users(&logs, &[]);
            assert_eq!(summaries.len(), 1);
            let login = summaries[0].last_login.as_ref().unwrap();
            assert_eq!(login.value, T2);
        }
    }

    #[test]
    fn unparsable_timestamps_lose_ties() {
        let logs = vec![
            log(ActivityEventType::Login, Some("ada"), "1970-01-01T00:00:00Z"),
            log(ActivityEventType::Login, Some("ada"), "not-a-date"),
        ];
        let summary = &summarize_users(&logs, &[])[0];
        assert_eq!(summary.last_login.as_ref().unwrap().value, "1970-01-01T00:00:00Z");

        let only_bad = vec![log(ActivityEventType::Login, Some("bob"), "not-a-date")];
        let summary = &summarize_users(&only_bad, &[])[0];
        assert_eq!(summary.last_login.as_ref().unwrap().at_ms, 0);
    }

    #[test]
    fn topics_and_searches_skip_empty_values() {
        let logs = vec![
            topic("ada", T1, "rust lifetimes"),
            topic("ada", T2, ""),
            search("ada", T1, "ownership"),
            search("ada", T2, "traits"),
        ];
        let summary = &summarize_users(&logs, &[])[0];
        assert_eq!(summary.last_topic.as_ref().unwrap().value, "rust lifetimes");
        assert_eq!(summary.last_search.as_ref().unwrap().value, "traits");
        assert!(summary.last_login.is_none());
    }

    #[test]
    fn course_owners_without_events_still_appear() {
        let mut owned = course("c1", &[5]);
        owned.username = Some("carol".into());
        let orphan = course("c2", &[5]);

        let summaries = summarize_users(&[], &[owned, orphan]);
        let names: Vec<&str> = summaries.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["anonymous", "carol"]);
        assert!(summaries[1].last_login.is_none());
        assert_eq!(summaries[1].courses.len(), 1);
    }

    #[test]
    fn padded_usernames_fold_into_one_learner() {
        let mut owned = course("c1", &[5]);
        owned.username = Some("ada".into());
        let logs = vec![log(ActivityEventType::Login, Some("ada "), T1)];

        let summaries = summarize_users(&logs, &[owned]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].username, "ada");
        assert_eq!(summaries[0].courses.len(), 1);
        assert!(summaries[0].last_login.is_some());
    }

    #[test]
    fn events_without_user_are_anonymous() {
        let logs = vec![log(ActivityEventType::Login, None, T1)];
        assert_eq!(summarize_users(&logs, &[])[0].username, "anonymous");
    }

    #[test]
    fn gaps_are_computed_per_user() {
        let mut weak = course("c1", &[5, 5]);
        weak.username = Some("ada".into());
        let mut progress = CourseProgress::fresh(2);
        progress.quiz_scores.insert(ChapterId::new(1), 1);
        progress.quiz_scores.insert(ChapterId::new(2), 5);
        weak.progress = Some(progress);

        let summaries = summarize_users(&[], &[weak]);
        assert_eq!(summaries[0].top_gaps.len(), 1);
        assert_eq!(summaries[0].top_gaps[0].score_percent, 20);
    }

    #[test]
    fn result_is_independent_of_input_permutation() {
        let mut a = course("a", &[5]);
        a.username = Some("ada".into());
        let mut pa = CourseProgress::fresh(1);
        pa.quiz_scores.insert(ChapterId::new(1), 2);
        a.progress = Some(pa.clone());
        let mut b = course("b", &[5]);
        b.username = Some("ada".into());
        b.progress = Some(pa);

        let logs = vec![
            topic("ada", T1, "alpha"),
            topic("ada", T1, "beta"),
            log(ActivityEventType::Login, Some("ada"), T2),
            search("bob", T2, "x"),
            log(ActivityEventType::Login, Some("ada"), "garbage"),
        ];
        let baseline = summarize_users(&logs, &[a.clone(), b.clone()]);

        let reversed_logs: Vec<_> = logs.iter().rev().cloned().collect();
        let permuted = summarize_users(&reversed_logs, &[b, a]);
        assert_eq!(baseline, permuted);
        assert_eq!(baseline[0].last_topic.as_ref().unwrap().value, "beta");
        assert_eq!(baseline[0].top_gaps[0].course_title, "Course a");
    }
}
