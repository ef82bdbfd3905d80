//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `StudyRepository` port. Everything is
//! lost when the process exits; it backs `STORAGE_BACKEND=memory` and the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use study_planner_core::domain::{Plan, Subject, Template, WeekKey};
use study_planner_core::ports::{PortError, PortResult, StudyRepository};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    subjects: Vec<Subject>,
    plans: Vec<Plan>,
    templates: Vec<Template>,
}

impl Store {
    fn check_subject(&self, subject: &Subject) -> PortResult<()> {
        let foreign = self
            .subjects
            .iter()
            .any(|s| s.id == subject.id && s.user_id != subject.user_id);
        if foreign {
            return Err(PortError::Conflict(format!(
                "Subject {} belongs to another user",
                subject.id
            )));
        }
        Ok(())
    }

    fn put_subject(&mut self, subject: &Subject) {
        match self.subjects.iter_mut().find(|s| s.id == subject.id) {
            Some(existing) => *existing = subject.clone(),
            None => self.subjects.push(subject.clone()),
        }
    }

    fn check_plan(&self, plan: &Plan) -> PortResult<()> {
        let clash = self
            .plans
            .iter()
            .any(|p| p.id != plan.id && p.user_id == plan.user_id && p.week == plan.week);
        if clash {
            return Err(PortError::Conflict(format!(
                "A plan already exists for week {} of {}",
                plan.week.week_number, plan.week.year
            )));
        }
        Ok(())
    }

    fn put_plan(&mut self, plan: &Plan) {
        match self.plans.iter_mut().find(|p| p.id == plan.id) {
            Some(existing) => *existing = plan.clone(),
            None => self.plans.push(plan.clone()),
        }
    }
}

/// In-memory storage. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orders by creation time, newest first. Ties go to the later insert.
fn newest_first<T>(
    items: impl Iterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.reverse();
    items.sort_by_key(|item| Reverse(created_at(item)));
    items
}

#[async_trait]
impl StudyRepository for MemoryAdapter {
    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>> {
        let store = self.store.read().await;
        Ok(store
            .subjects
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<Subject> {
        let store = self.store.read().await;
        store
            .subjects
            .iter()
            .find(|s| s.id == subject_id && s.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Subject {} not found", subject_id)))
    }

    async fn save_subject(&self, subject: &Subject) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.check_subject(subject)?;
        store.put_subject(subject);
        Ok(())
    }

    async fn delete_subject(&self, user_id: Uuid, subject_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        let before = store.subjects.len();
        store
            .subjects
            .retain(|s| !(s.id == subject_id && s.user_id == user_id));
        if store.subjects.len() == before {
            return Err(PortError::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }

    async fn get_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>> {
        let store = self.store.read().await;
        Ok(store
            .plans
            .iter()
            .find(|p| p.user_id == user_id && p.week == week)
            .cloned())
    }

    async fn find_plan_by_session(&self, user_id: Uuid, session_id: Uuid) -> PortResult<Option<Plan>> {
        let store = self.store.read().await;
        Ok(store
            .plans
            .iter()
            .find(|p| p.user_id == user_id && p.sessions.iter().any(|s| s.id == session_id))
            .cloned())
    }

    async fn list_plans(&self, user_id: Uuid) -> PortResult<Vec<Plan>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.plans.iter().filter(|p| p.user_id == user_id).cloned(),
            |p| p.created_at,
        ))
    }

    async fn save_plan(&self, plan: &Plan) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.check_plan(plan)?;
        store.put_plan(plan);
        Ok(())
    }

    async fn save_plan_and_subject(&self, plan: &Plan, subject: &Subject) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.check_plan(plan)?;
        store.check_subject(subject)?;
        store.put_plan(plan);
        store.put_subject(subject);
        Ok(())
    }

    async fn delete_plan(&self, user_id: Uuid, week: WeekKey) -> PortResult<Option<Plan>> {
        let mut store = self.store.write().await;
        let position = store
            .plans
            .iter()
            .position(|p| p.user_id == user_id && p.week == week);
        Ok(position.map(|i| store.plans.remove(i)))
    }

    async fn list_templates(&self, user_id: Uuid) -> PortResult<Vec<Template>> {
        let store = self.store.read().await;
        Ok(newest_first(
            store.templates.iter().filter(|t| t.user_id == user_id).cloned(),
            |t| t.created_at,
        ))
    }

    async fn get_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<Template> {
        let store = self.store.read().await;
        store
            .templates
            .iter()
            .find(|t| t.id == template_id && t.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Template {} not found", template_id)))
    }

    async fn save_template(&self, template: &Template) -> PortResult<()> {
        let mut store = self.store.write().await;
        match store.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => store.templates.push(template.clone()),
        }
        Ok(())
    }

    async fn delete_template(&self, user_id: Uuid, template_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        let before = store.templates.len();
        store
            .templates
            .retain(|t| !(t.id == template_id && t.user_id == user_id));
        if store.templates.len() == before {
            return Err(PortError::NotFound(format!("Template {} not found", template_id)));
        }
        Ok(())
    }
}
