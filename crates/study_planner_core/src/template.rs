//! crates/study_planner_core/src/template.rs
//!
//! Converting plans into date-free templates and replaying templates onto a
//! new week.

use crate::calendar::{at_local, local_date, next_occurrence, session_end, DayOffsetPolicy};
use crate::domain::{Plan, SessionDraft, Template, TemplateSession};
use crate::error::PlannerError;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use uuid::Uuid;

/// Captures `plan` as a template: each session becomes (weekday, wall-clock
/// start, duration) in the user's calendar.
pub fn template_from_plan(
    plan: &Plan,
    name: &str,
    description: Option<&str>,
    now: &DateTime<FixedOffset>,
) -> Result<Template, PlannerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::MissingName("template"));
    }
    if plan.sessions.is_empty() {
        return Err(PlannerError::EmptyPlan {
            week: plan.week.week_number,
            year: plan.week.year,
        });
    }

    let offset = now.offset();
    let sessions: Vec<TemplateSession> = plan
        .sessions
        .iter()
        .map(|s| {
            let local = s.scheduled_start.with_timezone(offset);
            TemplateSession {
                subject_id: s.subject_id,
                subject_name: s.subject_name.clone(),
                day_of_week: local_date(s.scheduled_start, offset).weekday(),
                start_time: local.time(),
                duration: s.allocated,
            }
        })
        .collect();
    let total_hours_per_week = sessions.iter().map(|s| s.duration).sum();

    Ok(Template {
        id: Uuid::new_v4(),
        user_id: plan.user_id,
        name: name.to_string(),
        description: description.unwrap_or_default().to_string(),
        sessions,
        total_hours_per_week,
        created_at: now.with_timezone(&Utc),
    })
}

/// Places every template session on its next weekday occurrence from `now`.
pub fn instantiate_template(
    template: &Template,
    now: &DateTime<FixedOffset>,
    policy: DayOffsetPolicy,
) -> Result<Vec<SessionDraft>, PlannerError> {
    let today = now.date_naive();
    template
        .sessions
        .iter()
        .map(|ts| {
            let date = next_occurrence(today, ts.day_of_week, policy);
            let start = at_local(date, ts.start_time, now.offset());
            Ok(SessionDraft {
                subject_id: ts.subject_id,
                subject_name: ts.subject_name.clone(),
                scheduled_start: start,
                scheduled_end: session_end(start, ts.duration)?,
                allocated: ts.duration,
            })
        })
        .collect()
}
