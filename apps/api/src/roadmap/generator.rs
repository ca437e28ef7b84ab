//! Roadmap Generation: prompt → provider → validate → persist.
//!
//! The provider reply is validated in full before anything is written. A
//! reply that is not JSON, has no modules, or has a module without a title is
//! a provider error and leaves the user's current roadmap untouched.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Db;
use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NOT_SPECIFIED};
use crate::llm_client::{complete_json, CompletionRequest, TextGenerator};
use crate::models::roadmap::{Difficulty, ModuleRow, RoadmapRow};
use crate::models::user::UserRow;
use crate::roadmap::prompts::{ROADMAP_PROMPT_TEMPLATE, ROADMAP_TEMPERATURE};
use crate::roadmap::store::{self, NewRoadmap, PlannedModule};

const DEFAULT_TIMELINE_WEEKS: i32 = 12;
const MAX_TIMELINE_WEEKS: i32 = 52;
const DEFAULT_HOURS: f64 = 1.0;
const MIN_HOURS: f64 = 0.5;
const MAX_HOURS: f64 = 40.0;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRoadmapRequest {
    pub goal: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub current_skills: Vec<String>,
    pub timeline_weeks: Option<i32>,
}

/// Why a provider reply could not be turned into a roadmap.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("reply has no module list")]
    NoModuleList,
    #[error("reply contains no modules")]
    Empty,
    #[error("module at position {0} has no title")]
    MissingTitle(usize),
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        AppError::Provider(format!("unusable roadmap plan: {err}"))
    }
}

/// Profile skills first, then request skills not already present (case-insensitive).
pub fn merge_skills(profile: &[String], requested: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    profile
        .iter()
        .chain(requested)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .map(String::from)
        .collect()
}

fn or_not_specified(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(NOT_SPECIFIED)
}

fn join_or_not_specified(items: &[String]) -> String {
    if items.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        items.join(", ")
    }
}

pub fn build_roadmap_prompt(user: &UserRow, req: &GenerateRoadmapRequest, timeline_weeks: i32) -> String {
    let skills = merge_skills(&user.skills.0, &req.current_skills);
    ROADMAP_PROMPT_TEMPLATE
        .replace("{background}", or_not_specified(user.background.as_deref()))
        .replace("{current_role}", or_not_specified(user.current_role.as_deref()))
        .replace("{skills}", &join_or_not_specified(&skills))
        .replace("{goal}", req.goal.trim())
        .replace("{tech_stack}", &join_or_not_specified(&req.tech_stack))
        .replace("{timeline_weeks}", &timeline_weeks.to_string())
}

/// Turns the provider's JSON into validated modules, positions 0..N-1.
///
/// Accepts `{"modules": [...]}` or a bare array. Prerequisites given as
/// positions or titles are kept only when they name an earlier module.
pub fn parse_plan(reply: &Value) -> Result<Vec<PlannedModule>, PlanError> {
    let entries = match reply {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("modules")
            .and_then(|m| m.as_array())
            .ok_or(PlanError::NoModuleList)?,
        _ => return Err(PlanError::NoModuleList),
    };
    if entries.is_empty() {
        return Err(PlanError::Empty);
    }

    let mut planned: Vec<PlannedModule> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let title = entry
            .get("title")
            .and_then(|t| t.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(PlanError::MissingTitle(position))?
            .to_string();

        let prerequisites = resolve_prerequisites(entry.get("prerequisites"), &planned);

        planned.push(PlannedModule {
            id: Uuid::new_v4(),
            position: position as i32,
            title,
            description: text_field(entry, "description"),
            content: text_field(entry, "content"),
            difficulty: entry
                .get("difficulty")
                .and_then(|d| d.as_str())
                .map(Difficulty::parse_lenient)
                .unwrap_or_default(),
            estimated_hours: parse_hours(entry.get("estimated_hours")),
            prerequisites,
            resources: match entry.get("resources") {
                Some(Value::Object(map)) => Value::Object(map.clone()),
                Some(Value::Array(links)) => json!({ "links": links }),
                _ => json!({}),
            },
            learning_objectives: entry
                .get("learning_objectives")
                .and_then(|o| o.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        });
    }
    Ok(planned)
}

fn text_field(entry: &Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn parse_hours(raw: Option<&Value>) -> f64 {
    let hours = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    hours
        .filter(|h| h.is_finite())
        .unwrap_or(DEFAULT_HOURS)
        .clamp(MIN_HOURS, MAX_HOURS)
}

fn resolve_prerequisites(raw: Option<&Value>, earlier: &[PlannedModule]) -> Vec<Uuid> {
    let Some(items) = raw.and_then(|r| r.as_array()) else {
        return Vec::new();
    };
    let mut resolved = Vec::new();
    for item in items {
        let index = match item {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => match s.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => earlier
                    .iter()
                    .position(|m| m.title.eq_ignore_ascii_case(s.trim())),
            },
            _ => None,
        };
        if let Some(module) = index.and_then(|i| earlier.get(i)) {
            if !resolved.contains(&module.id) {
                resolved.push(module.id);
            }
        }
    }
    resolved
}

#[derive(Debug)]
pub struct GeneratedRoadmap {
    pub roadmap: RoadmapRow,
    pub modules: Vec<ModuleRow>,
}

/// Generates a roadmap for `user` and makes it their active one.
pub async fn generate_roadmap(
    db: &Db,
    generator: &dyn TextGenerator,
    user: &UserRow,
    req: &GenerateRoadmapRequest,
) -> Result<GeneratedRoadmap, AppError> {
    let goal = req.goal.trim();
    if goal.is_empty() {
        return Err(AppError::Validation("goal cannot be empty".into()));
    }
    let timeline_weeks = req.timeline_weeks.unwrap_or(DEFAULT_TIMELINE_WEEKS);
    if !(1..=MAX_TIMELINE_WEEKS).contains(&timeline_weeks) {
        return Err(AppError::Validation(format!(
            "timeline_weeks must be between 1 and {MAX_TIMELINE_WEEKS}"
        )));
    }

    let prompt = build_roadmap_prompt(user, req, timeline_weeks);
    let reply: Value = complete_json(
        generator,
        CompletionRequest {
            system: JSON_ONLY_SYSTEM,
            prompt: &prompt,
            temperature: ROADMAP_TEMPERATURE,
        },
    )
    .await
    .map_err(|e| {
        warn!("Roadmap generation failed for user {}: {e}", user.id);
        AppError::from(e)
    })?;

    let planned = parse_plan(&reply).map_err(|e| {
        warn!("Discarding roadmap plan for user {}: {e}", user.id);
        AppError::from(e)
    })?;

    let (roadmap, modules) = store::replace_active_roadmap(
        db,
        NewRoadmap {
            user_id: user.id,
            goal,
            tech_stack: &req.tech_stack,
            estimated_weeks: timeline_weeks,
            modules: &planned,
        },
    )
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Another roadmap generation is in progress"))?;

    info!(
        "Generated roadmap {} for user {}: {} modules",
        roadmap.id,
        user.id,
        modules.len()
    );
    Ok(GeneratedRoadmap { roadmap, modules })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::fixtures::user;
    use crate::llm_client::testing::{Reply, ScriptedGenerator};

    fn request(goal: &str, tech: &[&str]) -> GenerateRoadmapRequest {
        GenerateRoadmapRequest {
            goal: goal.to_string(),
            tech_stack: tech.iter().map(|s| s.to_string()).collect(),
            current_skills: vec!["sql".into(), "Docker".into()],
            timeline_weeks: None,
        }
    }

    fn sixteen_module_reply() -> String {
        let modules: Vec<Value> = (0..16)
            .map(|i| {
                json!({
                    "title": format!("Topic {i}"),
                    "description": "d",
                    "difficulty": if i < 6 { "beginner" } else if i < 12 { "intermediate" } else { "advanced" },
                    "estimated_hours": 4,
                    "prerequisites": if i == 0 { json!([]) } else { json!([i - 1]) }
                })
            })
            .collect();
        json!({ "modules": modules }).to_string()
    }

    #[test]
    fn test_parse_plan_accepts_bare_array() {
        let planned = parse_plan(&json!([{"title": "Python"}, {"title": "SQL"}])).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[1].position, 1);
        assert_eq!(planned[0].difficulty, Difficulty::Beginner);
        assert_eq!(planned[0].estimated_hours, 1.0);
        assert_eq!(planned[0].resources, json!({}));
    }

    #[test]
    fn test_parse_plan_clamps_hours_and_falls_back_on_difficulty() {
        let planned = parse_plan(&json!({"modules": [
            {"title": "A", "estimated_hours": 0.1, "difficulty": "legendary"},
            {"title": "B", "estimated_hours": "120"},
            {"title": "C", "estimated_hours": "lots", "difficulty": "Advanced"}
        ]}))
        .unwrap();
        assert_eq!(planned[0].estimated_hours, 0.5);
        assert_eq!(planned[0].difficulty, Difficulty::Beginner);
        assert_eq!(planned[1].estimated_hours, 40.0);
        assert_eq!(planned[2].estimated_hours, 1.0);
        assert_eq!(planned[2].difficulty, Difficulty::Advanced);
    }

    #[test]
    fn test_prerequisites_resolve_to_earlier_modules_only() {
        let planned = parse_plan(&json!([
            {"title": "Python Basics"},
            {"title": "SQL", "prerequisites": ["python basics", 0]},
            {"title": "APIs", "prerequisites": [1, "3", "Deployment", 2]},
            {"title": "Deployment", "prerequisites": ["1", true]}
        ]))
        .unwrap();
        assert_eq!(planned[1].prerequisites, vec![planned[0].id]);
        assert_eq!(planned[2].prerequisites, vec![planned[1].id]);
        assert_eq!(planned[3].prerequisites, vec![planned[1].id]);
    }

    #[test]
    fn test_parse_plan_rejects_unusable_replies() {
        assert_eq!(parse_plan(&json!({"modules": []})).unwrap_err(), PlanError::Empty);
        assert_eq!(parse_plan(&json!({"plan": "x"})).unwrap_err(), PlanError::NoModuleList);
        assert_eq!(parse_plan(&json!("modules")).unwrap_err(), PlanError::NoModuleList);
        assert_eq!(
            parse_plan(&json!([{"title": "ok"}, {"title": "  "}])).unwrap_err(),
            PlanError::MissingTitle(1)
        );
    }

    #[test]
    fn test_merge_skills_dedupes_case_insensitively() {
        let merged = merge_skills(
            &["SQL".to_string(), "Excel".to_string()],
            &["sql".to_string(), " Docker ".to_string(), String::new()],
        );
        assert_eq!(merged, vec!["SQL", "Excel", "Docker"]);
    }

    #[tokio::test]
    async fn test_prompt_embeds_profile_goal_and_stack() {
        let db = Db::in_memory().await.unwrap();
        let ada = user(&db, "ada@example.com").await;
        let prompt = build_roadmap_prompt(&ada, &request("Backend Engineer", &["Python", "SQL"]), 12);

        assert!(prompt.contains("Background: Data analyst"));
        assert!(prompt.contains("Current Role: Analyst"));
        assert!(prompt.contains("Current Skills: Excel, SQL, Docker"));
        assert!(prompt.contains("Target Role / Goal: Backend Engineer"));
        assert!(prompt.contains("Tech Stack: Python, SQL"));
        assert!(prompt.contains("Timeline: 12 weeks"));
    }

    #[tokio::test]
    async fn test_generate_persists_every_parsed_module_in_order() {
        let db = Db::in_memory().await.unwrap();
        let ada = user(&db, "ada@example.com").await;
        let generator = ScriptedGenerator::replying(sixteen_module_reply());

        let generated = generate_roadmap(&db, &generator, &ada, &request("Backend Engineer", &["Python", "SQL"]))
            .await
            .unwrap();

        assert_eq!(generated.roadmap.total_modules, 16);
        assert_eq!(generated.roadmap.completed_modules, 0);
        assert_eq!(generated.roadmap.tech_stack.0, vec!["Python", "SQL"]);
        assert!(generated.roadmap.is_active);
        let positions: Vec<i32> = generated.modules.iter().map(|m| m.position).collect();
        assert_eq!(positions, (0..16).collect::<Vec<_>>());
        assert_eq!(generated.modules[5].prerequisites.0, vec![generated.modules[4].id]);
        assert_eq!(*generator.temperatures.lock().unwrap(), vec![0.7]);

        let stored = store::modules_for(&db, generated.roadmap.id).await.unwrap();
        assert_eq!(stored.len(), 16);
    }

    #[tokio::test]
    async fn test_unparseable_reply_persists_nothing() {
        let db = Db::in_memory().await.unwrap();
        let ada = user(&db, "ada@example.com").await;
        let generator = ScriptedGenerator::replying("Here is your roadmap: learn things.");

        let err = generate_roadmap(&db, &generator, &ada, &request("Backend Engineer", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Provider(_)));
        assert!(store::list_roadmaps(&db, ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_previous_roadmap_active() {
        let db = Db::in_memory().await.unwrap();
        let ada = user(&db, "ada@example.com").await;
        let generator = ScriptedGenerator::new(vec![
            Reply::Text(sixteen_module_reply()),
            Reply::Timeout,
            Reply::Text(r#"{"modules": [{"title": ""}]}"#.into()),
        ]);
        let req = request("Backend Engineer", &["Python"]);

        let first = generate_roadmap(&db, &generator, &ada, &req).await.unwrap();
        let timeout = generate_roadmap(&db, &generator, &ada, &req).await.unwrap_err();
        assert!(matches!(timeout, AppError::ProviderTimeout(_)));
        let untitled = generate_roadmap(&db, &generator, &ada, &req).await.unwrap_err();
        assert!(matches!(untitled, AppError::Provider(_)));

        let active = store::active_roadmap(&db, ada.id).await.unwrap().unwrap();
        assert_eq!(active.id, first.roadmap.id);
        assert_eq!(store::list_roadmaps(&db, ada.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let db = Db::in_memory().await.unwrap();
        let ada = user(&db, "ada@example.com").await;
        let generator = ScriptedGenerator::replying(sixteen_module_reply());

        let mut req = request("  ", &[]);
        assert!(matches!(
            generate_roadmap(&db, &generator, &ada, &req).await,
            Err(AppError::Validation(_))
        ));
        req.goal = "Backend Engineer".into();
        req.timeline_weeks = Some(53);
        assert!(matches!(
            generate_roadmap(&db, &generator, &ada, &req).await,
            Err(AppError::Validation(_))
        ));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
