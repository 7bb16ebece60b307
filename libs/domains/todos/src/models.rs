use chrono::{DateTime, SubsecRound, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

pub const MAX_TAGS: usize = 20;
pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE: u64 = 1_000_000;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("length")
            .with_message(format!("must contain at most {MAX_TAGS} tags").into()));
    }
    if tags.iter().any(|t| t.is_empty() || t.chars().count() > 50) {
        return Err(ValidationError::new("length")
            .with_message("each tag must be between 1 and 50 characters".into()));
    }
    Ok(())
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR.is_match(color) {
        return Err(ValidationError::new("color")
            .with_message("must be a hex color like #1A2B3C".into()));
    }
    Ok(())
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Current time at the precision Postgres stores.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Modification time for a record last modified at `prev`; always later than `prev`.
pub fn next_modified(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    if now > prev {
        now
    } else {
        prev + chrono::Duration::microseconds(1)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
    TS,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "todo_priority")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TodoPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

impl TodoPriority {
    /// Sort rank, matching the declaration order of the Postgres enum.
    pub fn rank(&self) -> u8 {
        match self {
            TodoPriority::Low => 0,
            TodoPriority::Medium => 1,
            TodoPriority::High => 2,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
    TS,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "todo_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TodoStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl TodoStatus {
    /// Statuses that still count as open work.
    pub fn is_open(&self) -> bool {
        matches!(self, TodoStatus::Draft | TodoStatus::Active)
    }
}

/// Identifier and timestamps shared by every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Base {
    pub fn new() -> Self {
        let now = now_micros();
        Self {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Base {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Todos
// ============================================================================

/// Free-form metadata attached to a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TodoMetadata {
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    pub reminder: Option<String>,
    pub color: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(flatten)]
    pub base: Base,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub parent_todo_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub metadata: Option<TodoMetadata>,
    pub sort_order: i32,
}

impl Todo {
    pub fn id(&self) -> Uuid {
        self.base.id
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_todo_id.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        let overdue = DueWindow::overdue(now);
        self.status.is_open() && self.due_date.is_some_and(|d| overdue.contains(d))
    }

    /// Apply a patch. Completion time follows status transitions into and out
    /// of `completed`; server-assigned fields are left alone.
    pub fn apply_update(&mut self, update: UpdateTodo, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            if status == TodoStatus::Completed && self.status != TodoStatus::Completed {
                self.completed_at = Some(now);
            } else if status != TodoStatus::Completed {
                self.completed_at = None;
            }
            self.status = status;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(parent_todo_id) = update.parent_todo_id {
            self.parent_todo_id = parent_todo_id;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// Request body for creating a todo.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Defaults to `medium`.
    pub priority: Option<TodoPriority>,
    /// Defaults to `active`.
    pub status: Option<TodoStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub parent_todo_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[validate(nested)]
    pub metadata: Option<TodoMetadata>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

/// Fully resolved insert command. The data-access layer adds id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub parent_todo_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub metadata: Option<TodoMetadata>,
    pub sort_order: i32,
}

impl NewTodo {
    pub fn from_create(user_id: impl Into<String>, input: CreateTodo, now: DateTime<Utc>) -> Self {
        let status = input.status.unwrap_or_default();
        Self {
            user_id: user_id.into(),
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            status,
            due_date: input.due_date,
            completed_at: (status == TodoStatus::Completed).then_some(now),
            parent_todo_id: input.parent_todo_id,
            category_id: input.category_id,
            metadata: input.metadata,
            sort_order: input.sort_order.unwrap_or(0),
        }
    }

    pub fn into_todo(self, base: Base) -> Todo {
        Todo {
            base,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            status: self.status,
            due_date: self.due_date,
            completed_at: self.completed_at,
            parent_todo_id: self.parent_todo_id,
            category_id: self.category_id,
            metadata: self.metadata,
            sort_order: self.sort_order,
        }
    }
}

/// Partial update. For nullable fields `null` clears the value and a missing
/// field leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 1000))]
    pub description: Option<Option<String>>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_todo_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(nested)]
    pub metadata: Option<Option<TodoMetadata>>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TodoSort {
    CreatedAt,
    #[default]
    UpdatedAt,
    DueDate,
    Priority,
    Title,
    SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /todos`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodoFilter {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = MAX_PAGE_LIMIT))]
    pub limit: u64,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub category_id: Option<Uuid>,
    pub parent_todo_id: Option<Uuid>,
    /// Case-insensitive match on title and description.
    #[validate(length(min = 1, max = 255))]
    pub search: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    /// Only open todos whose due date has passed.
    pub overdue: Option<bool>,
    #[serde(default)]
    pub sort: TodoSort,
    #[serde(default)]
    pub order: SortDirection,
}

/// Rows skipped before `page`. Saturates instead of overflowing and stays
/// within what Postgres accepts for `OFFSET`.
pub fn page_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit).min(i64::MAX as u64)
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for TodoFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            priority: None,
            category_id: None,
            parent_todo_id: None,
            search: None,
            due_from: None,
            due_to: None,
            overdue: None,
            sort: TodoSort::default(),
            order: SortDirection::default(),
        }
    }
}

impl TodoFilter {
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }

    /// In-memory equivalent of the SQL predicate.
    pub fn matches(&self, todo: &Todo, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|s| s != todo.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != todo.priority) {
            return false;
        }
        if self.category_id.is_some() && self.category_id != todo.category_id {
            return false;
        }
        if self.parent_todo_id.is_some() && self.parent_todo_id != todo.parent_todo_id {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = todo.title.to_lowercase().contains(&needle);
            let in_description = todo
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        if let Some(from) = self.due_from {
            if !todo.due_date.is_some_and(|d| d >= from) {
                return false;
            }
        }
        if let Some(to) = self.due_to {
            if !todo.due_date.is_some_and(|d| d <= to) {
                return false;
            }
        }
        if self.overdue == Some(true) && !todo.is_overdue(now) {
            return false;
        }
        true
    }
}

/// Pagination query used by list endpoints without filters.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = MAX_PAGE_LIMIT))]
    pub limit: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
    pub overdue: i64,
}

/// A todo with its category, direct children, comments and attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTodo {
    #[serde(flatten)]
    pub todo: Todo,
    pub category: Option<Category>,
    pub children: Vec<Todo>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

/// Open todo selected by a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTodo {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
}

/// Due-date window `(after, until]` scanned by scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub after: Option<DateTime<Utc>>,
    pub until: DateTime<Utc>,
}

impl DueWindow {
    /// Everything due at or before `now`. The overdue list filter, the stats
    /// and the overdue job all share this boundary.
    pub fn overdue(now: DateTime<Utc>) -> Self {
        Self {
            after: None,
            until: now,
        }
    }

    pub fn contains(&self, due: DateTime<Utc>) -> bool {
        due <= self.until && self.after.is_none_or(|after| due > after)
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(flatten)]
    pub base: Base,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_color"))]
    pub color: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255))]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub icon: Option<Option<String>>,
}

impl Category {
    pub fn apply_update(&mut self, update: UpdateCategory) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(flatten)]
    pub base: Base,
    pub todo_id: Uuid,
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateComment {
    #[validate(length(min = 1, max = 1000), custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateComment {
    #[validate(length(min = 1, max = 1000), custom(function = "not_blank"))]
    pub content: String,
}

// ============================================================================
// Attachments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(flatten)]
    pub base: Base,
    pub todo_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Object-store key; never exposed to clients.
    #[serde(skip)]
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub todo_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
}

/// Short-lived download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn todo() -> Todo {
        NewTodo::from_create(
            "user_1",
            CreateTodo {
                title: "Buy milk".into(),
                ..Default::default()
            },
            now_micros(),
        )
        .into_todo(Base::new())
    }

    #[test]
    fn test_create_defaults() {
        let t = todo();
        assert_eq!(t.priority, TodoPriority::Medium);
        assert_eq!(t.status, TodoStatus::Active);
        assert_eq!(t.sort_order, 0);
        assert!(t.completed_at.is_none());
        assert!(t.base.created_at <= t.base.updated_at);
    }

    #[test]
    fn test_todo_serializes_camel_case_with_flattened_base() {
        let value = serde_json::to_value(todo()).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("userId").is_some());
        assert_eq!(value["dueDate"], serde_json::Value::Null);
        assert_eq!(value["priority"], "medium");
        assert!(value.get("base").is_none());
    }

    #[test]
    fn test_update_distinguishes_null_from_missing() {
        let patch: UpdateTodo =
            serde_json::from_value(json!({ "dueDate": null, "title": "x" })).unwrap();
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.category_id, None);
        assert_eq!(patch.title.as_deref(), Some("x"));
    }

    #[test]
    fn test_status_transitions_drive_completed_at() {
        let mut t = todo();
        let now = now_micros();

        t.apply_update(
            UpdateTodo {
                status: Some(TodoStatus::Completed),
                ..Default::default()
            },
            now,
        );
        assert_eq!(t.completed_at, Some(now));

        t.apply_update(
            UpdateTodo {
                status: Some(TodoStatus::Active),
                ..Default::default()
            },
            now,
        );
        assert!(t.completed_at.is_none());
    }

    #[test]
    fn test_completing_twice_keeps_first_completion_time() {
        let mut t = todo();
        let first = now_micros();
        let patch = UpdateTodo {
            status: Some(TodoStatus::Completed),
            ..Default::default()
        };
        t.apply_update(patch.clone(), first);
        t.apply_update(patch, first + chrono::Duration::seconds(5));
        assert_eq!(t.completed_at, Some(first));
    }

    #[test]
    fn test_create_validation_bounds() {
        let input = CreateTodo {
            title: "".into(),
            description: Some("d".repeat(1001)),
            metadata: Some(TodoMetadata {
                tags: vec!["".into()],
                ..Default::default()
            }),
            sort_order: Some(-1),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("metadata"));
        assert!(fields.contains_key("sort_order"));
    }

    #[test]
    fn test_blank_title_rejected() {
        let input = CreateTodo {
            title: "   ".into(),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_too_many_tags_rejected() {
        let metadata = TodoMetadata {
            tags: (0..21).map(|i| format!("t{i}")).collect(),
            ..Default::default()
        };
        assert!(metadata.validate().is_err());
    }

    #[test]
    fn test_category_color_validation() {
        let ok = CreateCategory {
            name: "Work".into(),
            color: "#1a2B3c".into(),
            description: None,
            icon: None,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateCategory {
            color: "red".into(),
            ..ok
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_filter_defaults_and_bounds() {
        let filter: TodoFilter = serde_json::from_value(json!({})).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.sort, TodoSort::UpdatedAt);
        assert_eq!(filter.order, SortDirection::Desc);

        let too_big = TodoFilter {
            limit: 101,
            ..Default::default()
        };
        assert!(too_big.validate().is_err());

        let zero_page = TodoFilter {
            page: 0,
            ..Default::default()
        };
        assert!(zero_page.validate().is_err());
    }

    #[test]
    fn test_page_bounds_match_offset_arithmetic() {
        let at = |page, limit| TodoFilter {
            page,
            limit,
            ..Default::default()
        };

        assert!(at(1, 1).validate().is_ok());
        assert!(at(MAX_PAGE, MAX_PAGE_LIMIT).validate().is_ok());
        assert!(at(MAX_PAGE + 1, 20).validate().is_err());
        assert!(at(u64::MAX, 20).validate().is_err());
        assert!(at(1, 0).validate().is_err());

        assert_eq!(at(1, 20).offset(), 0);
        assert_eq!(at(2, 20).offset(), 20);
        assert_eq!(
            at(MAX_PAGE, MAX_PAGE_LIMIT).offset(),
            (MAX_PAGE - 1) * MAX_PAGE_LIMIT
        );

        let query = PageQuery {
            page: MAX_PAGE + 1,
            limit: 20,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_page_offset_never_overflows() {
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(u64::MAX, 100), i64::MAX as u64);
        assert_eq!(page_offset(1 << 62, 20), i64::MAX as u64);
        assert!(i64::try_from(page_offset(u64::MAX, u64::MAX)).is_ok());
    }

    #[test]
    fn test_filter_matches_search_and_overdue() {
        let now = now_micros();
        let mut t = todo();
        t.description = Some("Semi-skimmed".into());
        t.due_date = Some(now - chrono::Duration::hours(1));

        let search = TodoFilter {
            search: Some("SKIMMED".into()),
            ..Default::default()
        };
        assert!(search.matches(&t, now));

        let overdue = TodoFilter {
            overdue: Some(true),
            ..Default::default()
        };
        assert!(overdue.matches(&t, now));

        t.due_date = Some(now);
        assert!(overdue.matches(&t, now));
        assert!(t.is_overdue(now));
        assert!(DueWindow::overdue(now).contains(now));

        t.status = TodoStatus::Completed;
        assert!(!overdue.matches(&t, now));
    }

    #[test]
    fn test_next_modified_strictly_increases() {
        let future = Utc::now() + chrono::Duration::seconds(10);
        let next = next_modified(future);
        assert!(next > future);
        assert_eq!(next - future, chrono::Duration::microseconds(1));

        let past = Utc::now() - chrono::Duration::seconds(10);
        assert!(next_modified(past) > past);
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<u8> = Page::new(vec![], 1, 20, 41);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_due_window() {
        let now = now_micros();
        let soon = DueWindow {
            after: Some(now),
            until: now + chrono::Duration::hours(24),
        };
        assert!(soon.contains(now + chrono::Duration::hours(1)));
        assert!(!soon.contains(now));
        assert!(!soon.contains(now + chrono::Duration::hours(25)));

        let overdue = DueWindow::overdue(now);
        assert!(overdue.contains(now - chrono::Duration::days(3)));
        assert!(overdue.contains(now));
        assert!(!overdue.contains(now + chrono::Duration::microseconds(1)));
    }
}
