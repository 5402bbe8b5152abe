//! In-process storage backend
//!
//! All three tables live behind a single lock, so each repository call sees
//! and leaves a consistent snapshot. Integrity rules mirror the PostgreSQL
//! schema: unique category names, prompt -> category references that go
//! NULL when the category is deleted, and executions that are removed with
//! their prompt.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{NewPromptCategory, PromptCategory};
use crate::features::categories::repositories::{CategoryEdit, CategoryRepository};
use crate::features::executions::models::{ExecutionStatus, NewExecution, PromptExecution};
use crate::features::executions::repositories::{ExecutionEdit, ExecutionRepository};
use crate::features::prompts::models::{NewPrompt, Prompt, PromptFilter};
use crate::features::prompts::repositories::{PromptEdit, PromptRepository};
use crate::features::stats::dtos::MostUsedCategoryBy;
use crate::features::stats::models::PromptStats;
use crate::features::stats::repositories::StatsRepository;
use crate::shared::types::{JsonMap, SortDirection};

#[derive(Default)]
struct Tables {
    categories: BTreeMap<i64, PromptCategory>,
    prompts: BTreeMap<i64, Prompt>,
    executions: BTreeMap<i64, PromptExecution>,
    last_category_id: i64,
    last_prompt_id: i64,
    last_execution_id: i64,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn check_category_ref(&self, category_id: Option<i64>) -> Result<()> {
        match category_id {
            Some(id) if !self.categories.contains_key(&id) => Err(AppError::InvalidReference(
                format!("prompt references category {} which does not exist", id),
            )),
            _ => Ok(()),
        }
    }
}

fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("category name '{}' already exists", name))
}

fn matches_filter(prompt: &Prompt, filter: &PromptFilter) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = [&prompt.title, &prompt.description, &prompt.content]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if filter.category_id.is_some() && prompt.category_id != filter.category_id {
        return false;
    }
    if filter.is_active.is_some_and(|active| prompt.is_active != active) {
        return false;
    }
    if filter
        .is_template
        .is_some_and(|template| prompt.is_template != template)
    {
        return false;
    }
    if let Some(tag) = &filter.tag {
        if !prompt.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    true
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Storage held entirely in memory; implements every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn insert(&self, category: NewPromptCategory) -> Result<PromptCategory> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&category.name, None) {
            return Err(duplicate_name(&category.name));
        }

        tables.last_category_id += 1;
        let now = Utc::now();
        let category = PromptCategory {
            id: tables.last_category_id,
            name: category.name,
            description: category.description,
            color: category.color,
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());

        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptCategory>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<PromptCategory>> {
        let mut categories: Vec<PromptCategory> =
            self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update(&self, id: i64, edit: CategoryEdit) -> Result<Option<PromptCategory>> {
        let mut tables = self.tables.write().await;
        let Some(mut category) = tables.categories.get(&id).cloned() else {
            return Ok(None);
        };
        edit(&mut category)?;
        if tables.name_taken(&category.name, Some(id)) {
            return Err(duplicate_name(&category.name));
        }

        let Some(stored) = tables.categories.get_mut(&id) else {
            return Ok(None);
        };
        stored.name = category.name;
        stored.description = category.description;
        stored.color = category.color;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }

        for prompt in tables.prompts.values_mut() {
            if prompt.category_id == Some(id) {
                prompt.category_id = None;
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl PromptRepository for MemoryStore {
    async fn insert(&self, prompt: NewPrompt) -> Result<Prompt> {
        let mut tables = self.tables.write().await;
        tables.check_category_ref(prompt.category_id)?;

        tables.last_prompt_id += 1;
        let now = Utc::now();
        let prompt = Prompt {
            id: tables.last_prompt_id,
            title: prompt.title,
            description: prompt.description,
            content: prompt.content,
            version: prompt.version,
            is_active: true,
            is_template: prompt.is_template,
            usage_count: 0,
            rating: None,
            variables: prompt.variables,
            settings: prompt.settings,
            prompt_metadata: prompt.prompt_metadata,
            tags: prompt.tags,
            category_id: prompt.category_id,
            created_at: now,
            updated_at: now,
            last_used_at: None,
        };
        tables.prompts.insert(prompt.id, prompt.clone());

        Ok(prompt)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Prompt>> {
        Ok(self.tables.read().await.prompts.get(&id).cloned())
    }

    async fn list(&self, filter: &PromptFilter) -> Result<(Vec<Prompt>, i64)> {
        let tables = self.tables.read().await;
        let mut prompts: Vec<Prompt> = tables
            .prompts
            .values()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();

        prompts.sort_by_key(|p| (p.created_at, p.id));
        if filter.sort == SortDirection::Desc {
            prompts.reverse();
        }

        let total = prompts.len() as i64;
        Ok((page(prompts, filter.limit, filter.offset), total))
    }

    async fn update(&self, id: i64, edit: PromptEdit) -> Result<Option<Prompt>> {
        let mut tables = self.tables.write().await;
        let Some(mut prompt) = tables.prompts.get(&id).cloned() else {
            return Ok(None);
        };
        edit(&mut prompt)?;
        tables.check_category_ref(prompt.category_id)?;

        let Some(stored) = tables.prompts.get_mut(&id) else {
            return Ok(None);
        };
        stored.title = prompt.title;
        stored.description = prompt.description;
        stored.content = prompt.content;
        stored.version = prompt.version;
        stored.is_active = prompt.is_active;
        stored.is_template = prompt.is_template;
        stored.rating = prompt.rating;
        stored.variables = prompt.variables;
        stored.settings = prompt.settings;
        stored.prompt_metadata = prompt.prompt_metadata;
        stored.tags = prompt.tags;
        stored.category_id = prompt.category_id;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn deactivate(&self, id: i64) -> Result<Option<Prompt>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.prompts.get_mut(&id) else {
            return Ok(None);
        };
        stored.is_active = false;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.prompts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.executions.retain(|_, e| e.prompt_id != id);

        Ok(true)
    }
}

#[async_trait]
impl ExecutionRepository for MemoryStore {
    async fn record(&self, execution: NewExecution) -> Result<PromptExecution> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let Some(prompt) = tables.prompts.get_mut(&execution.prompt_id) else {
            return Err(AppError::InvalidReference(format!(
                "execution references prompt {} which does not exist",
                execution.prompt_id
            )));
        };
        prompt.usage_count += 1;
        prompt.last_used_at = Some(now);

        tables.last_execution_id += 1;
        let execution = PromptExecution {
            id: tables.last_execution_id,
            prompt_id: execution.prompt_id,
            input_data: execution.input_data,
            output_data: JsonMap::new(),
            model_name: execution.model_name,
            model_settings: execution.model_settings,
            execution_time_ms: None,
            token_count: None,
            cost: None,
            status: ExecutionStatus::default(),
            error_message: None,
            user_rating: None,
            user_feedback: None,
            created_at: now,
            completed_at: None,
        };
        tables.executions.insert(execution.id, execution.clone());

        Ok(execution)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptExecution>> {
        Ok(self.tables.read().await.executions.get(&id).cloned())
    }

    async fn list_for_prompt(
        &self,
        prompt_id: i64,
        status: Option<ExecutionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PromptExecution>, i64)> {
        let tables = self.tables.read().await;
        let mut executions: Vec<PromptExecution> = tables
            .executions
            .values()
            .filter(|e| e.prompt_id == prompt_id)
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();

        executions.sort_by_key(|e| std::cmp::Reverse((e.created_at, e.id)));

        let total = executions.len() as i64;
        Ok((page(executions, limit, offset), total))
    }

    async fn update(&self, id: i64, edit: ExecutionEdit) -> Result<Option<PromptExecution>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.executions.get_mut(&id) else {
            return Ok(None);
        };
        let mut execution = stored.clone();
        edit(&mut execution)?;

        stored.output_data = execution.output_data;
        stored.execution_time_ms = execution.execution_time_ms;
        stored.token_count = execution.token_count;
        stored.cost = execution.cost;
        stored.status = execution.status;
        stored.error_message = execution.error_message;
        stored.user_rating = execution.user_rating;
        stored.user_feedback = execution.user_feedback;
        stored.completed_at = execution.completed_at;

        Ok(Some(stored.clone()))
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn prompt_stats(
        &self,
        most_used_by: MostUsedCategoryBy,
        recent_since: DateTime<Utc>,
    ) -> Result<PromptStats> {
        let tables = self.tables.read().await;
        let prompts = &tables.prompts;
        let executions = &tables.executions;

        let ratings: Vec<Decimal> = prompts.values().filter_map(|p| p.rating).collect();
        let avg_rating = if ratings.is_empty() {
            None
        } else {
            let sum: Decimal = ratings.iter().sum();
            Some(sum / Decimal::from(ratings.len() as i64))
        };

        let mut counts: HashMap<i64, i64> = HashMap::new();
        match most_used_by {
            MostUsedCategoryBy::Prompts => {
                for category_id in prompts.values().filter_map(|p| p.category_id) {
                    *counts.entry(category_id).or_default() += 1;
                }
            }
            MostUsedCategoryBy::Executions => {
                for execution in executions.values() {
                    if let Some(category_id) = prompts
                        .get(&execution.prompt_id)
                        .and_then(|p| p.category_id)
                    {
                        *counts.entry(category_id).or_default() += 1;
                    }
                }
            }
        }

        let most_used_category = counts
            .iter()
            .filter_map(|(id, count)| tables.categories.get(id).map(|c| (*count, &c.name)))
            .min_by(|(count_a, name_a), (count_b, name_b)| {
                count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
            })
            .map(|(_, name)| name.clone());

        Ok(PromptStats {
            total_prompts: prompts.len() as i64,
            active_prompts: prompts.values().filter(|p| p.is_active).count() as i64,
            template_prompts: prompts.values().filter(|p| p.is_template).count() as i64,
            total_executions: executions.len() as i64,
            avg_rating,
            most_used_category,
            recent_executions: executions
                .values()
                .filter(|e| e.created_at >= recent_since)
                .count() as i64,
        })
    }
}
