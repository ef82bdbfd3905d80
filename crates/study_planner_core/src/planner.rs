//! crates/study_planner_core/src/planner.rs
//!
//! The planner service: runs the pure scheduling core against a
//! [`StudyRepository`]. Every state-dependent read first brings the current
//! week's sessions up to date (and persists what changed), so scores never
//! see stale statuses.
//!
//! Mutations for one user are serialized through a per-user lock.

use crate::calendar::{current_week, DayOffsetPolicy};
use crate::domain::{
    Difficulty, Plan, Priority, Session, Subject, SubjectUpdate, Template, WeekKey,
};
use crate::error::{PlannerError, PlannerResult};
use crate::lifecycle::{complete_session, record_completion, refresh_week};
use crate::ports::{PortError, StudyRepository};
use crate::progress::{study_streak, weekly_progress, WeeklyProgress};
use crate::recommend::{rank_recommendations, rank_static, AdaptiveRecommendation, Recommendation};
use crate::scheduler::{generate_schedule, manual_session, ScheduleRequest};
use crate::template::{instantiate_template, template_from_plan};
use chrono::{DateTime, FixedOffset, NaiveTime, Utc, Weekday};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

/// The subjects and current-week plan after a refresh pass.
struct WeekState {
    subjects: Vec<Subject>,
    plan: Option<Plan>,
}

/// One mutex per user with work in flight.
///
/// An entry whose `Arc` is held only by the table has no holder and no
/// waiter, so it is dropped on the next acquire.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

pub struct StudyPlanner {
    repo: Arc<dyn StudyRepository>,
    policy: DayOffsetPolicy,
    user_locks: UserLocks,
}

impl StudyPlanner {
    pub fn new(repo: Arc<dyn StudyRepository>, policy: DayOffsetPolicy) -> Self {
        Self {
            repo,
            policy,
            user_locks: UserLocks::default(),
        }
    }

    pub fn policy(&self) -> DayOffsetPolicy {
        self.policy
    }

    async fn lock_user(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        self.user_locks.acquire(user_id).await
    }

    async fn fetch_subject(&self, user_id: Uuid, subject_id: Uuid) -> PlannerResult<Subject> {
        self.repo
            .get_subject(user_id, subject_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => PlannerError::SubjectNotFound(subject_id),
                other => other.into(),
            })
    }

    async fn plan_with_session(&self, user_id: Uuid, session_id: Uuid) -> PlannerResult<Plan> {
        self.repo
            .find_plan_by_session(user_id, session_id)
            .await?
            .ok_or(PlannerError::SessionNotFound(session_id))
    }

    /// Re-evaluates the current week and writes back whatever changed.
    /// Callers must hold the user's lock.
    async fn refresh(&self, user_id: Uuid, now: &DateTime<FixedOffset>) -> PlannerResult<WeekState> {
        let subjects = self.repo.list_subjects(user_id).await?;
        let plan = self.repo.get_plan(user_id, current_week(now)).await?;
        let sessions = plan.as_ref().map(|p| p.sessions.as_slice()).unwrap_or_default();

        let refresh = refresh_week(&subjects, sessions, now);
        for id in &refresh.changed_subjects {
            if let Some(subject) = refresh.subjects.iter().find(|s| s.id == *id) {
                self.repo.save_subject(subject).await?;
            }
        }

        let plan = match plan {
            Some(mut plan) if refresh.sessions_changed() => {
                info!(
                    user = %user_id,
                    transitions = refresh.events.len(),
                    "session states advanced"
                );
                plan.sessions = refresh.sessions;
                self.repo.save_plan(&plan).await?;
                Some(plan)
            }
            other => other,
        };

        Ok(WeekState {
            subjects: refresh.subjects,
            plan,
        })
    }

    //=====================================================================================
    // Subjects
    //=====================================================================================

    pub async fn list_subjects(&self, user_id: Uuid) -> PlannerResult<Vec<Subject>> {
        Ok(self.repo.list_subjects(user_id).await?)
    }

    pub async fn create_subject(
        &self,
        user_id: Uuid,
        name: &str,
        difficulty: Difficulty,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> PlannerResult<Subject> {
        let subject = Subject::new(user_id, name, difficulty, priority, now)?;
        self.repo.save_subject(&subject).await?;
        info!(user = %user_id, subject = %subject.id, "subject created");
        Ok(subject)
    }

    pub async fn update_subject(
        &self,
        user_id: Uuid,
        subject_id: Uuid,
        update: SubjectUpdate,
    ) -> PlannerResult<Subject> {
        let _guard = self.lock_user(user_id).await;
        let mut subject = self.fetch_subject(user_id, subject_id).await?;
        update.apply(&mut subject)?;
        self.repo.save_subject(&subject).await?;
        Ok(subject)
    }

    pub async fn delete_subject(&self, user_id: Uuid, subject_id: Uuid) -> PlannerResult<()> {
        let _guard = self.lock_user(user_id).await;
        self.repo
            .delete_subject(user_id, subject_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => PlannerError::SubjectNotFound(subject_id),
                other => other.into(),
            })
    }

    //=====================================================================================
    // Plans and Sessions
    //=====================================================================================

    /// The current week's plan with up-to-date session states, if one exists.
    pub async fn current_plan(
        &self,
        user_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Option<Plan>> {
        let _guard = self.lock_user(user_id).await;
        Ok(self.refresh(user_id, now).await?.plan)
    }

    /// Generates and stores the plan for the current week.
    pub async fn generate_plan(
        &self,
        user_id: Uuid,
        request: &ScheduleRequest,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Plan> {
        let _guard = self.lock_user(user_id).await;
        let week = current_week(now);
        self.ensure_no_plan(user_id, week).await?;

        let subjects = self.repo.list_subjects(user_id).await?;
        let drafts = generate_schedule(&subjects, request, now, self.policy)?;

        let mut plan = Plan::new(user_id, week, now.with_timezone(&Utc));
        plan.push_drafts(drafts);
        self.repo.save_plan(&plan).await?;
        info!(
            user = %user_id,
            week = week.week_number,
            year = week.year,
            sessions = plan.sessions.len(),
            "plan generated"
        );
        Ok(plan)
    }

    async fn ensure_no_plan(&self, user_id: Uuid, week: WeekKey) -> PlannerResult<()> {
        match self.repo.get_plan(user_id, week).await? {
            Some(_) => Err(PlannerError::PlanExists {
                week: week.week_number,
                year: week.year,
            }),
            None => Ok(()),
        }
    }

    /// Adds a user-placed session to the current week's plan, creating the
    /// plan if needed.
    pub async fn add_session(
        &self,
        user_id: Uuid,
        subject_id: Uuid,
        day: Weekday,
        start_time: NaiveTime,
        duration: f64,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Plan> {
        let _guard = self.lock_user(user_id).await;
        let subject = self.fetch_subject(user_id, subject_id).await?;
        let draft = manual_session(&subject, day, start_time, duration, now, self.policy)?;

        let week = current_week(now);
        let mut plan = match self.repo.get_plan(user_id, week).await? {
            Some(plan) => plan,
            None => Plan::new(user_id, week, now.with_timezone(&Utc)),
        };
        plan.push_drafts([draft]);
        self.repo.save_plan(&plan).await?;
        Ok(plan)
    }

    /// Completes a session and credits its hours to the subject. The plan and
    /// the subject are written together.
    pub async fn complete_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> PlannerResult<Session> {
        let _guard = self.lock_user(user_id).await;
        let mut plan = self.plan_with_session(user_id, session_id).await?;
        let session = plan
            .session_mut(session_id)
            .ok_or(PlannerError::SessionNotFound(session_id))?;
        complete_session(session, now)?;
        let session = session.clone();

        match self.repo.get_subject(user_id, session.subject_id).await {
            Ok(mut subject) => {
                record_completion(&mut subject, session.allocated, now);
                self.repo.save_plan_and_subject(&plan, &subject).await?;
            }
            Err(PortError::NotFound(_)) => {
                warn!(subject = %session.subject_id, "completed session for a deleted subject");
                self.repo.save_plan(&plan).await?;
            }
            Err(e) => return Err(e.into()),
        }
        info!(user = %user_id, session = %session_id, "session completed");
        Ok(session)
    }

    pub async fn update_session_duration(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        duration: f64,
    ) -> PlannerResult<Session> {
        let _guard = self.lock_user(user_id).await;
        let mut plan = self.plan_with_session(user_id, session_id).await?;
        let session = plan
            .session_mut(session_id)
            .ok_or(PlannerError::SessionNotFound(session_id))?;
        session.set_duration(duration)?;
        let session = session.clone();
        self.repo.save_plan(&plan).await?;
        Ok(session)
    }

    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> PlannerResult<()> {
        let _guard = self.lock_user(user_id).await;
        let mut plan = self.plan_with_session(user_id, session_id).await?;
        plan.remove_session(session_id)
            .ok_or(PlannerError::SessionNotFound(session_id))?;
        self.repo.save_plan(&plan).await?;
        Ok(())
    }

    /// Deletes the current week's plan. Returns how many sessions went with it;
    /// an empty week is a success with zero.
    pub async fn clear_current_week(
        &self,
        user_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<usize> {
        let _guard = self.lock_user(user_id).await;
        let deleted = self
            .repo
            .delete_plan(user_id, current_week(now))
            .await?
            .map(|plan| plan.sessions.len())
            .unwrap_or(0);
        info!(user = %user_id, deleted, "current week cleared");
        Ok(deleted)
    }

    //=====================================================================================
    // Recommendations and Progress
    //=====================================================================================

    pub async fn recommendations(
        &self,
        user_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Vec<Recommendation>> {
        let _guard = self.lock_user(user_id).await;
        let state = self.refresh(user_id, now).await?;
        Ok(rank_static(&state.subjects, now))
    }

    pub async fn adaptive_recommendations(
        &self,
        user_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Vec<AdaptiveRecommendation>> {
        let _guard = self.lock_user(user_id).await;
        // The refresh here persists the transitions; the ranking's own pass
        // then finds nothing left to change.
        let state = self.refresh(user_id, now).await?;
        let sessions = state
            .plan
            .as_ref()
            .map(|p| p.sessions.as_slice())
            .unwrap_or_default();
        Ok(rank_recommendations(&state.subjects, sessions, now).recommendations)
    }

    pub async fn weekly_progress(
        &self,
        user_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<WeeklyProgress> {
        let _guard = self.lock_user(user_id).await;
        let plan = self.refresh(user_id, now).await?.plan;
        Ok(plan
            .map(|p| weekly_progress(&p.sessions))
            .unwrap_or_default())
    }

    pub async fn streak(&self, user_id: Uuid, now: &DateTime<FixedOffset>) -> PlannerResult<u32> {
        let plans = self.repo.list_plans(user_id).await?;
        Ok(study_streak(plans.iter().flat_map(|p| &p.sessions), now))
    }

    //=====================================================================================
    // Templates
    //=====================================================================================

    pub async fn list_templates(&self, user_id: Uuid) -> PlannerResult<Vec<Template>> {
        Ok(self.repo.list_templates(user_id).await?)
    }

    /// Saves the current week's plan as a reusable template.
    pub async fn save_template(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<Template> {
        let week = current_week(now);
        let plan = self
            .repo
            .get_plan(user_id, week)
            .await?
            .ok_or(PlannerError::EmptyPlan {
                week: week.week_number,
                year: week.year,
            })?;
        let template = template_from_plan(&plan, name, description, now)?;
        self.repo.save_template(&template).await?;
        info!(user = %user_id, template = %template.id, "template saved");
        Ok(template)
    }

    /// Replays a template onto the current week. The week must not have a plan yet.
    pub async fn load_template(
        &self,
        user_id: Uuid,
        template_id: Uuid,
        now: &DateTime<FixedOffset>,
    ) -> PlannerResult<(Template, Plan)> {
        let _guard = self.lock_user(user_id).await;
        let template = self
            .repo
            .get_template(user_id, template_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => PlannerError::TemplateNotFound(template_id),
                other => other.into(),
            })?;
        let week = current_week(now);
        self.ensure_no_plan(user_id, week).await?;

        let mut plan = Plan::new(user_id, week, now.with_timezone(&Utc));
        plan.push_drafts(instantiate_template(&template, now, self.policy)?);
        self.repo.save_plan(&plan).await?;
        info!(user = %user_id, template = %template.id, "template loaded");
        Ok((template, plan))
    }

    pub async fn delete_template(&self, user_id: Uuid, template_id: Uuid) -> PlannerResult<()> {
        self.repo
            .delete_template(user_id, template_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => PlannerError::TemplateNotFound(template_id),
                other => other.into(),
            })
    }
}
