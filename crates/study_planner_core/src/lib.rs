pub mod calendar;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod planner;
pub mod ports;
pub mod progress;
pub mod recommend;
pub mod scheduler;
pub mod scoring;
pub mod template;

pub use calendar::DayOffsetPolicy;
pub use domain::{
    Difficulty, Plan, Priority, Session, SessionDraft, SessionStatus, SkipRecord, Subject,
    SubjectUpdate, Template, TemplateSession, WeekKey,
};
pub use error::{ErrorKind, PlannerError, PlannerResult};
pub use lifecycle::{evaluate_session_states, SessionEvent, StateEvaluation};
pub use planner::StudyPlanner;
pub use ports::{PortError, PortResult, StudyRepository};
pub use recommend::{rank_recommendations, AdaptiveRecommendation, Recommendation};
pub use scheduler::{generate_schedule, ScheduleRequest};
pub use scoring::{adaptive_score, generation_score, recommendation_score, ScoringStrategy};
