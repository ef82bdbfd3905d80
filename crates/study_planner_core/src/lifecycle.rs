//! crates/study_planner_core/src/lifecycle.rs
//!
//! The session lifecycle:
//!
//! ```text
//! scheduled ──(now in [start, end])──▶ active ──(user completes)──▶ completed
//!     │                                  │
//!     └──────────(now > end)─────────────┴──────────────────────────▶ skipped
//! ```
//!
//! Transitions are pull-based: they are recomputed whenever a caller looks at
//! the schedule, never by a timer. Re-running an evaluation with the same
//! "now" changes nothing and emits no events.

use crate::calendar::{current_week, local_date, week_key};
use crate::domain::{Session, SessionStatus, SkipRecord, Subject, WeekKey};
use crate::error::PlannerError;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// A status change produced by an evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Activated {
        session_id: Uuid,
        subject_id: Uuid,
    },
    Skipped {
        session_id: Uuid,
        subject_id: Uuid,
        scheduled_start: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn subject_id(&self) -> Uuid {
        match self {
            SessionEvent::Activated { subject_id, .. } | SessionEvent::Skipped { subject_id, .. } => {
                *subject_id
            }
        }
    }
}

/// Moves one session forward according to `now`. Returns the event, if any.
pub fn advance(session: &mut Session, now: DateTime<Utc>) -> Option<SessionEvent> {
    match session.status {
        SessionStatus::Scheduled | SessionStatus::Active if now > session.scheduled_end => {
            session.status = SessionStatus::Skipped;
            Some(SessionEvent::Skipped {
                session_id: session.id,
                subject_id: session.subject_id,
                scheduled_start: session.scheduled_start,
            })
        }
        SessionStatus::Scheduled if now >= session.scheduled_start => {
            session.status = SessionStatus::Active;
            session.actual_start = Some(now);
            Some(SessionEvent::Activated {
                session_id: session.id,
                subject_id: session.subject_id,
            })
        }
        _ => None,
    }
}

/// The sessions after an evaluation pass and the transitions it made.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvaluation {
    pub sessions: Vec<Session>,
    pub events: Vec<SessionEvent>,
}

pub fn evaluate_session_states(sessions: &[Session], now: &DateTime<FixedOffset>) -> StateEvaluation {
    let now = now.with_timezone(&Utc);
    let mut sessions = sessions.to_vec();
    let events = sessions
        .iter_mut()
        .filter_map(|s| advance(s, now))
        .collect();
    StateEvaluation { sessions, events }
}

/// Marks a session completed by explicit user action.
///
/// Completing a session that is already completed or skipped is a conflict:
/// terminal states have no outgoing transitions.
pub fn complete_session(session: &mut Session, now: DateTime<Utc>) -> Result<(), PlannerError> {
    if session.status.is_terminal() {
        return Err(PlannerError::SessionClosed {
            session: session.id,
            status: session.status,
        });
    }
    session.status = SessionStatus::Completed;
    session.completed = true;
    session.actual_end = Some(now);
    Ok(())
}

//=========================================================================================
// Subject Side Effects
//=========================================================================================

/// Credits a completed session to its subject.
pub fn record_completion(subject: &mut Subject, allocated: f64, now: DateTime<Utc>) {
    subject.total_hours += allocated;
    subject.last_studied = now;
}

/// Counts one skip against the subject and appends it to the skip history.
pub fn record_skip(subject: &mut Subject, scheduled_start: DateTime<Utc>, now: &DateTime<FixedOffset>) {
    let date = local_date(scheduled_start, now.offset());
    subject.skips_this_week += 1;
    subject.skip_history.push(SkipRecord {
        scheduled_time: scheduled_start,
        day_of_week: date.weekday(),
        week: week_key(date),
        recorded_at: now.with_timezone(&Utc),
    });
}

/// Zeroes `skips_this_week` when the last recorded skip happened in an
/// earlier week than `current`. Returns whether the counter changed.
pub fn roll_skip_counter(subject: &mut Subject, current: WeekKey, offset: &FixedOffset) -> bool {
    if subject.skips_this_week == 0 {
        return false;
    }
    let last_skip_week = subject
        .skip_history
        .last()
        .map(|r| week_key(local_date(r.recorded_at, offset)));
    if last_skip_week == Some(current) {
        return false;
    }
    subject.skips_this_week = 0;
    true
}

//=========================================================================================
// Week Refresh
//=========================================================================================

/// The outcome of bringing a week's sessions and their subjects up to date.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekRefresh {
    pub sessions: Vec<Session>,
    pub subjects: Vec<Subject>,
    pub events: Vec<SessionEvent>,
    /// Ids of subjects whose counters changed and need to be written back.
    pub changed_subjects: Vec<Uuid>,
}

impl WeekRefresh {
    pub fn sessions_changed(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Runs the evaluation pass over `sessions` and applies its side effects to
/// copies of `subjects`: stale weekly skip counters are reset first, then
/// every new skip is counted exactly once.
pub fn refresh_week(subjects: &[Subject], sessions: &[Session], now: &DateTime<FixedOffset>) -> WeekRefresh {
    let week = current_week(now);
    let mut subjects = subjects.to_vec();
    let mut changed = Vec::new();

    for subject in subjects.iter_mut() {
        if roll_skip_counter(subject, week, now.offset()) {
            debug!(subject = %subject.id, "reset weekly skip counter");
            changed.push(subject.id);
        }
    }

    let StateEvaluation { sessions, events } = evaluate_session_states(sessions, now);

    let index: HashMap<Uuid, usize> = subjects
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, i))
        .collect();
    for event in &events {
        if let SessionEvent::Skipped {
            session_id,
            subject_id,
            scheduled_start,
        } = event
        {
            info!(session = %session_id, subject = %subject_id, "session skipped");
            // The subject may have been deleted since the session was planned.
            if let Some(&i) = index.get(subject_id) {
                record_skip(&mut subjects[i], *scheduled_start, now);
                if !changed.contains(subject_id) {
                    changed.push(*subject_id);
                }
            }
        }
    }

    WeekRefresh {
        sessions,
        subjects,
        events,
        changed_subjects: changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::hours;
    use crate::domain::{Difficulty, Priority, SessionDraft};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 12, 15, 0, 0)
            .unwrap()
    }

    fn utc_now() -> DateTime<Utc> {
        now().with_timezone(&Utc)
    }

    fn math() -> Subject {
        Subject::new(
            Uuid::new_v4(),
            "Math",
            Difficulty::Hard,
            Priority::High,
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn session(subject: &Subject, start: DateTime<Utc>, allocated: f64) -> Session {
        Session::from_draft(SessionDraft {
            subject_id: subject.id,
            subject_name: subject.name.clone(),
            scheduled_start: start,
            scheduled_end: start + hours(allocated),
            allocated,
        })
    }

    #[test]
    fn test_future_session_stays_scheduled() {
        let s = session(&math(), utc_now() + Duration::hours(3), 1.0);
        let eval = evaluate_session_states(&[s], &now());
        assert_eq!(eval.sessions[0].status, SessionStatus::Scheduled);
        assert!(eval.events.is_empty());
    }

    #[test]
    fn test_running_session_becomes_active() {
        let subject = math();
        let s = session(&subject, utc_now() - Duration::minutes(30), 1.0);
        let eval = evaluate_session_states(&[s.clone()], &now());
        assert_eq!(eval.sessions[0].status, SessionStatus::Active);
        assert_eq!(eval.sessions[0].actual_start, Some(utc_now()));
        assert_eq!(
            eval.events,
            vec![SessionEvent::Activated {
                session_id: s.id,
                subject_id: subject.id
            }]
        );
    }

    #[test]
    fn test_session_boundaries_are_inclusive() {
        let subject = math();
        let starting = session(&subject, utc_now(), 1.0);
        let ending = session(&subject, utc_now() - Duration::hours(1), 1.0);
        let eval = evaluate_session_states(&[starting, ending], &now());
        assert_eq!(eval.sessions[0].status, SessionStatus::Active);
        assert_eq!(eval.sessions[1].status, SessionStatus::Active);
    }

    #[test]
    fn test_overdue_session_is_skipped_and_counted_once() {
        let subject = math();
        let overdue = session(&subject, utc_now() - Duration::hours(3), 1.0);

        let refresh = refresh_week(&[subject.clone()], &[overdue], &now());
        assert_eq!(refresh.sessions[0].status, SessionStatus::Skipped);
        assert_eq!(refresh.subjects[0].skips_this_week, 1);
        assert_eq!(refresh.subjects[0].skip_history.len(), 1);
        assert_eq!(refresh.changed_subjects, vec![subject.id]);

        let again = refresh_week(&refresh.subjects, &refresh.sessions, &now());
        assert_eq!(again.sessions, refresh.sessions);
        assert_eq!(again.subjects[0].skips_this_week, 1);
        assert!(again.events.is_empty());
        assert!(again.changed_subjects.is_empty());
    }

    #[test]
    fn test_active_session_skipped_after_end() {
        let subject = math();
        let mut s = session(&subject, utc_now() - Duration::hours(2), 1.0);
        s.status = SessionStatus::Active;
        let eval = evaluate_session_states(&[s], &now());
        assert_eq!(eval.sessions[0].status, SessionStatus::Skipped);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let subject = math();
        let sessions = vec![
            session(&subject, utc_now() - Duration::hours(5), 2.0),
            session(&subject, utc_now() - Duration::minutes(10), 1.0),
            session(&subject, utc_now() + Duration::hours(1), 1.0),
        ];
        let first = evaluate_session_states(&sessions, &now());
        let second = evaluate_session_states(&first.sessions, &now());
        assert_eq!(first.sessions, second.sessions);
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_completed_sessions_never_change() {
        let subject = math();
        let mut s = session(&subject, utc_now() - Duration::hours(5), 1.0);
        complete_session(&mut s, utc_now() - Duration::hours(3)).unwrap();
        let eval = evaluate_session_states(&[s.clone()], &now());
        assert_eq!(eval.sessions[0], s);
    }

    #[test]
    fn test_complete_session_sets_fields() {
        let subject = math();
        let mut s = session(&subject, utc_now() - Duration::minutes(20), 1.0);
        complete_session(&mut s, utc_now()).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(s.completed);
        assert_eq!(s.actual_end, Some(utc_now()));
    }

    #[test]
    fn test_complete_terminal_session_is_conflict() {
        let subject = math();
        let mut s = session(&subject, utc_now(), 1.0);
        s.status = SessionStatus::Skipped;
        let err = complete_session(&mut s, utc_now()).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::SessionClosed { status: SessionStatus::Skipped, .. }
        ));
    }

    #[test]
    fn test_record_completion_updates_subject() {
        let mut subject = math();
        subject.total_hours = 4.0;
        record_completion(&mut subject, 1.5, utc_now());
        assert_eq!(subject.total_hours, 5.5);
        assert_eq!(subject.last_studied, utc_now());
    }

    #[test]
    fn test_skip_record_captures_schedule() {
        let mut subject = math();
        let scheduled = Utc.with_ymd_and_hms(2025, 3, 11, 18, 0, 0).unwrap();
        record_skip(&mut subject, scheduled, &now());
        let record = &subject.skip_history[0];
        assert_eq!(record.scheduled_time, scheduled);
        assert_eq!(record.day_of_week, chrono::Weekday::Tue);
        assert_eq!(record.week, current_week(&now()));
    }

    #[test]
    fn test_skip_counter_resets_in_a_new_week() {
        let mut subject = math();
        let last_week = now() - Duration::days(7);
        record_skip(&mut subject, utc_now() - Duration::days(8), &last_week);
        assert_eq!(subject.skips_this_week, 1);

        assert!(roll_skip_counter(&mut subject, current_week(&now()), now().offset()));
        assert_eq!(subject.skips_this_week, 0);
        assert_eq!(subject.skip_history.len(), 1);
        assert!(!roll_skip_counter(&mut subject, current_week(&now()), now().offset()));
    }

    #[test]
    fn test_late_detected_skip_survives_next_refresh() {
        // Scheduled last Saturday, only noticed on Wednesday.
        let subject = math();
        let overdue = session(&subject, utc_now() - Duration::days(4), 1.0);
        let refresh = refresh_week(&[subject], &[overdue], &now());
        let again = refresh_week(&refresh.subjects, &refresh.sessions, &now());
        assert_eq!(again.subjects[0].skips_this_week, 1);
    }

    #[test]
    fn test_skip_for_deleted_subject_is_ignored() {
        let subject = math();
        let overdue = session(&subject, utc_now() - Duration::hours(3), 1.0);
        let refresh = refresh_week(&[], &[overdue], &now());
        assert_eq!(refresh.sessions[0].status, SessionStatus::Skipped);
        assert!(refresh.changed_subjects.is_empty());
    }
}
