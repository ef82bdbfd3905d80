//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StudyRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use study_planner_core::calendar::{parse_weekday, weekday_name};
use study_planner_core::domain::{
    Plan, Session, SkipRecord, Subject, Template, TemplateSession, WeekKey,
};
use study_planner_core::ports::{PortError, PortResult, StudyRepository};
use study_planner_core::PlannerError;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StudyRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Unique-constraint violations surface as conflicts, everything else as unexpected.
fn write_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(db.message().to_string())
        }
        _ => unexpected(e),
    }
}

fn corrupt(e: PlannerError) -> PortError {
    PortError::Unexpected(format!("Corrupt row: {}", e))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SubjectRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    difficulty: String,
    priority: String,
    last_studied: DateTime<Utc>,
    total_hours: f64,
    skips_this_week: i32,
    created_at: DateTime<Utc>,
}
impl SubjectRecord {
    fn to_domain(self, skip_history: Vec<SkipRecord>) -> PortResult<Subject> {
        Ok(Subject {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            difficulty: self.difficulty.parse().map_err(corrupt)?,
            priority: self.priority.parse().map_err(corrupt)?,
            last_studied: self.last_studied,
            total_hours: self.total_hours,
            skips_this_week: self.skips_this_week.max(0) as u32,
            skip_history,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SkipRecordRow {
    subject_id: Uuid,
    scheduled_time: DateTime<Utc>,
    day_of_week: String,
    week_number: i32,
    year: i32,
    recorded_at: DateTime<Utc>,
}
impl SkipRecordRow {
    fn to_domain(self) -> PortResult<SkipRecord> {
        Ok(SkipRecord {
            scheduled_time: self.scheduled_time,
            day_of_week: parse_weekday(&self.day_of_week).map_err(corrupt)?,
            week: WeekKey {
                week_number: self.week_number as u32,
                year: self.year,
            },
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(FromRow)]
struct PlanRecord {
    id: Uuid,
    user_id: Uuid,
    week_number: i32,
    year: i32,
    created_at: DateTime<Utc>,
}
impl PlanRecord {
    fn to_domain(self, sessions: Vec<Session>) -> Plan {
        Plan {
            id: self.id,
            user_id: self.user_id,
            week: WeekKey {
                week_number: self.week_number as u32,
                year: self.year,
            },
            sessions,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    plan_id: Uuid,
    subject_id: Uuid,
    subject_name: String,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    allocated: f64,
    completed: bool,
    status: String,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        Ok(Session {
            id: self.id,
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            scheduled_start: self.scheduled_start,
            scheduled_end: self.scheduled_end,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            allocated: self.allocated,
            completed: self.completed,
            status: self.status.parse().map_err(corrupt)?,
        })
    }
}

#[derive(FromRow)]
struct TemplateRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: String,
    total_hours_per_week: f64,
    created_at: DateTime<Utc>,
}
impl TemplateRecord {
    fn to_domain(self, sessions: Vec<TemplateSession>) -> Template {
        Template {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            sessions,
            total_hours_per_week: self.total_hours_per_week,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TemplateSessionRecord {
    template_id: Uuid,
    subject_id: Uuid,
    subject_name: String,
    day_of_week: String,
    start_time: NaiveTime,
    duration: f64,
}
impl TemplateSessionRecord {
    fn to_domain(self) -> PortResult<TemplateSession> {
        Ok(TemplateSession {
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            day_of_week: parse_weekday(&self.day_of_week).map_err(corrupt)?,
            start_time: self.start_time,
            duration: self.duration,
        })
    }
}

//=========================================================================================
// Child Row Loading
//=========================================================================================

const SUBJECT_COLUMNS: &str =
    "id, user_id, name, difficulty, priority, last_studied, total_hours, skips_this_week, created_at";
const PLAN_COLUMNS: &str = "id, user_id, week_number, year, created_at";
const SESSION_COLUMNS: &str = "id, plan_id, subject_id, subject_name, scheduled_start, scheduled_end, \
     actual_start, actual_end, allocated, completed, status";
const TEMPLATE_COLUMNS: &str = "id, user_id, name, description, total_hours_per_week, created_at";

impl DbAdapter {
    async fn assemble_subjects(&self, records: Vec<SubjectRecord>) -> PortResult<Vec<Subject>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, SkipRecordRow>(
            "SELECT subject_id, scheduled_time, day_of_week, week_number, year, recorded_at \
             FROM skip_records WHERE subject_id = ANY($1) ORDER BY id ASC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut history: HashMap<Uuid, Vec<SkipRecord>> = HashMap::new();
        for row in rows {
            let subject_id = row.subject_id;
            history.entry(subject_id).or_default().push(row.to_domain()?);
        }

        records
            .into_iter()
            .map(|r| {
                let skips = history.remove(&r.id).unwrap_or_default();
                r.to_domain(skips)
            })
            .collect()
    }

    async fn assemble_plans(&self, records: Vec<PlanRecord>) -> PortResult<Vec<Plan>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM sessions WHERE plan_id = ANY($1) ORDER BY position ASC",
            SESSION_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut sessions: HashMap<Uuid, Vec<Session>> = HashMap::new();
        for row in rows {
            let plan_id = row.plan_id;
            sessions.entry(plan_id).or_default().push(row.to_domain()?);
        }

        Ok(records
            .into_iter()
            .map(|r| {
                let plan_sessions = sessions.remove(&r.id).unwrap_or_default();
                r.to_domain(plan_sessions)
            })
            .collect())
    }

    async fn assemble_templates(&self, records: Vec<TemplateRecord>) -> PortResult<Vec<Template>> {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, TemplateSessionRecord>(
            "SELECT template_id, subject_id, subject_name, day_of_week, start_time, duration \
             FROM template_sessions WHERE template_id = ANY($1) ORDER BY position ASC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut sessions: HashMap<Uuid, Vec<TemplateSession>> = HashMap::new();
        for row in rows {
            let template_id = row.template_id;
            sessions.entry(template_id).or_default().push(row.to_domain()?);
        }

        Ok(records
            .into_iter()
            .map(|r| {
                let template_sessions = sessions.remove(&r.id).unwrap_or_default();
                r.to_domain(template_sessions)
            })
            .collect())
    }

    async fn first_plan(&self, records: Vec<PlanRecord>) -> PortResult<Option<Plan>> {
        Ok(self.assemble_plans(records).await?.into_iter().next())
    }
}

//=========================================================================================
// Transactional Writes
//=========================================================================================

/// Upserts the subject row and replaces its skip history.
async fn write_subject(conn: &mut PgConnection, subject: &Subject) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO subjects (id, user_id, name, difficulty, priority, last_studied, total_hours, skips_this_week, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, difficulty = EXCLUDED.difficulty, \
         priority = EXCLUDED.priority, last_studied = EXCLUDED.last_studied, \
         total_hours = EXCLUDED.total_hours, skips_this_week = EXCLUDED.skips_this_week",
    )
    .bind(subject.id)
    .bind(subject.user_id)
    .bind(&subject.name)
    .bind(subject.difficulty.as_str())
    .bind(subject.priority.as_str())
    .bind(subject.last_studied)
    .bind(subject.total_hours)
    .bind(subject.skips_this_week as i32)
    .bind(subject.created_at)
    .execute(&mut *conn)
    .await
    .map_err(write_error)?;

    sqlx::query("DELETE FROM skip_records WHERE subject_id = $1")
        .bind(subject.id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;

    for record in &subject.skip_history {
        sqlx::query(
            "INSERT INTO skip_records (subject_id, scheduled_time, day_of_week, week_number, year, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(subject.id)
        .bind(record.scheduled_time)
        .bind(weekday_name(record.day_of_week))
        .bind(record.week.week_number as i32)
        .bind(record.week.year)
        .bind(record.recorded_at)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    }

    Ok(())
}

/// Inserts the plan row if new and replaces its sessions.
async fn write_plan(conn: &mut PgConnection, plan: &Plan) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO plans (id, user_id, week_number, year, created_at) \
         VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
    )
    .bind(plan.id)
    .bind(plan.user_id)
    .bind(plan.week.week_number as i32)
    .bind(plan.week.year)
    .bind(plan.created_at)
    .execute(&mut *conn)
    .await
    .map_err(write_error)?;

    sqlx::query("DELETE FROM sessions WHERE plan_id = $1")
        .bind(plan.id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;

    for (position, session) in plan.sessions.iter().enumerate() {
        sqlx::query(&format!(
            "INSERT INTO sessions ({}, position) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            SESSION_COLUMNS
        ))
        .bind(session.id)
        .bind(plan.id)
        .bind(session.subject_id)
        .bind(&session.subject_name)
        .bind(session.scheduled_start)
        .bind(session.scheduled_end)
        .bind(session.actual_start)
        .bind(session.actual_end)
        .bind(session.allocated)
        .bind(session.completed)
        .bind(session.status.as_str())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(write_error)?;
    }

    Ok(())
}

//=========================================================================================
// `StudyRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyRepository for DbAdapter {
    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>> {
        let records = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
            SUBJECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.assemble_subjects(records).await
    }

    async fn get_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE id = $1 AND user_id = $2",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Subject {} not found", subject_id)),
            _ => unexpected(e),
        })?;
        self.assemble_subjects(vec![record])
            .await?
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Subject {} not found", subject_id)))
    }

    async fn save_subject(&self, subject: &Subject) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        write_subject(&mut *tx, subject).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn delete_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1 AND user_id = $2")
            .bind(subject_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }

    async fn get_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>> {
        let records = sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {} FROM plans WHERE user_id = $1 AND week_number = $2 AND year = $3",
            PLAN_COLUMNS
        ))
        .bind(user_id)
        .bind(week.week_number as i32)
        .bind(week.year)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.first_plan(records).await
    }

    async fn find_plan_by_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<Plan>> {
        let records = sqlx::query_as::<_, PlanRecord>(
            "SELECT p.id, p.user_id, p.week_number, p.year, p.created_at \
             FROM plans p JOIN sessions s ON s.plan_id = p.id \
             WHERE p.user_id = $1 AND s.id = $2",
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.first_plan(records).await
    }

    async fn list_plans(&self, user_id: Uuid) -> PortResult<Vec<Plan>> {
        let records = sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {} FROM plans WHERE user_id = $1 ORDER BY created_at DESC",
            PLAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.assemble_plans(records).await
    }

    async fn save_plan(&self, plan: &Plan) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        write_plan(&mut *tx, plan).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn save_plan_and_subject(&self, plan: &Plan, subject: &Subject) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        write_plan(&mut *tx, plan).await?;
        write_subject(&mut *tx, subject).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn delete_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>> {
        let Some(plan) = self.get_plan(user_id, week).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(plan.id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(Some(plan))
    }

    async fn list_templates(&self, user_id: Uuid) -> PortResult<Vec<Template>> {
        let records = sqlx::query_as::<_, TemplateRecord>(&format!(
            "SELECT {} FROM templates WHERE user_id = $1 ORDER BY created_at DESC",
            TEMPLATE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.assemble_templates(records).await
    }

    async fn get_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<Template> {
        let record = sqlx::query_as::<_, TemplateRecord>(&format!(
            "SELECT {} FROM templates WHERE id = $1 AND user_id = $2",
            TEMPLATE_COLUMNS
        ))
        .bind(template_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Template {} not found", template_id)),
            _ => unexpected(e),
        })?;
        self.assemble_templates(vec![record])
            .await?
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Template {} not found", template_id)))
    }

    async fn save_template(&self, template: &Template) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO templates (id, user_id, name, description, total_hours_per_week, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description, \
             total_hours_per_week = EXCLUDED.total_hours_per_week",
        )
        .bind(template.id)
        .bind(template.user_id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.total_hours_per_week)
        .bind(template.created_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query("DELETE FROM template_sessions WHERE template_id = $1")
            .bind(template.id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        for (position, session) in template.sessions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO template_sessions (template_id, position, subject_id, subject_name, day_of_week, start_time, duration) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(template.id)
            .bind(position as i32)
            .bind(session.subject_id)
            .bind(&session.subject_name)
            .bind(weekday_name(session.day_of_week))
            .bind(session.start_time)
            .bind(session.duration)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn delete_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1 AND user_id = $2")
            .bind(template_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Template {} not found", template_id)));
        }
        Ok(())
    }
}
