use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    Value,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    due::DueTodoSource,
    entity::{attachment, category, comment, todo},
    error::{TodoError, TodoResult},
    models::{
        Attachment, Base, Category, Comment, CreateCategory, DueTodo, DueWindow, NewAttachment,
        NewTodo, Page, PageQuery, PopulatedTodo, SortDirection, Todo, TodoFilter, TodoSort,
        TodoStats, TodoStatus,
    },
    repository::{CategoryRepository, TodoRepository},
};

/// Enum columns are read back as text so rows decode into the string-backed enums.
const TODO_COLUMNS: &str = "id, user_id, title, description, priority::text AS priority, \
     status::text AS status, due_date, completed_at, parent_todo_id, category_id, metadata, \
     sort_order, created_at, updated_at";

/// Strictly after the previous value even when the clock has not moved.
const NEXT_UPDATED_AT: &str =
    "GREATEST(clock_timestamp(), updated_at + interval '1 microsecond')";

const OPEN_STATUSES: [TodoStatus; 2] = [TodoStatus::Draft, TodoStatus::Active];

/// Positional parameters for hand-written statements.
#[derive(Default)]
struct Params {
    values: Vec<Value>,
}

impl Params {
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }
}

fn statement(sql: String, params: Params) -> Statement {
    Statement::from_sql_and_values(DbBackend::Postgres, sql, params.values)
}

fn order_clause(sort: TodoSort, order: SortDirection) -> String {
    let column = match sort {
        TodoSort::CreatedAt => "created_at",
        TodoSort::UpdatedAt => "updated_at",
        TodoSort::DueDate => "due_date",
        TodoSort::Priority => "priority",
        TodoSort::Title => "title",
        TodoSort::SortOrder => "sort_order",
    };
    let direction = match order {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("{column} {direction} NULLS LAST, id {direction}")
}

fn where_clause(user_id: &str, filter: &TodoFilter, params: &mut Params) -> String {
    let mut clauses = vec![format!("user_id = {}", params.bind(user_id))];

    if let Some(status) = filter.status {
        clauses.push(format!(
            "status = {}::todo_status",
            params.bind(status.to_string())
        ));
    }
    if let Some(priority) = filter.priority {
        clauses.push(format!(
            "priority = {}::todo_priority",
            params.bind(priority.to_string())
        ));
    }
    if let Some(category_id) = filter.category_id {
        clauses.push(format!("category_id = {}", params.bind(category_id)));
    }
    if let Some(parent_todo_id) = filter.parent_todo_id {
        clauses.push(format!("parent_todo_id = {}", params.bind(parent_todo_id)));
    }
    if let Some(search) = &filter.search {
        let pattern = params.bind(format!("%{}%", escape_like(search)));
        clauses.push(format!(
            "(title ILIKE {pattern} OR description ILIKE {pattern})"
        ));
    }
    if let Some(from) = filter.due_from {
        clauses.push(format!("due_date >= {}", params.bind(from)));
    }
    if let Some(to) = filter.due_to {
        clauses.push(format!("due_date <= {}", params.bind(to)));
    }
    if filter.overdue == Some(true) {
        clauses.push("status IN ('draft', 'active') AND due_date <= now()".to_string());
    }

    clauses.join(" AND ")
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct StatsRow {
    total: i64,
    active: i64,
    completed: i64,
    overdue: i64,
}

#[derive(Debug, FromQueryResult)]
struct PopulatedRow {
    todo: serde_json::Value,
    category: Option<serde_json::Value>,
    children: serde_json::Value,
    comments: serde_json::Value,
    attachments: serde_json::Value,
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> TodoResult<T> {
    serde_json::from_value(value).map_err(|e| TodoError::Internal(format!("decode row: {e}")))
}

impl PopulatedRow {
    fn into_populated(self) -> TodoResult<PopulatedTodo> {
        let todo: todo::Model = decode(self.todo)?;
        let category = self
            .category
            .map(decode::<category::Model>)
            .transpose()?
            .map(Category::from);
        let children: Vec<todo::Model> = decode(self.children)?;
        let comments: Vec<comment::Model> = decode(self.comments)?;
        let attachments: Vec<attachment::Model> = decode(self.attachments)?;

        Ok(PopulatedTodo {
            todo: todo.into(),
            category,
            children: children.into_iter().map(Into::into).collect(),
            comments: comments.into_iter().map(Into::into).collect(),
            attachments: attachments.into_iter().map(Into::into).collect(),
        })
    }
}

/// Related rows are aggregated in the same statement so the result is one snapshot.
const POPULATED_SQL: &str = r#"
    SELECT
        to_jsonb(t) AS todo,
        (SELECT to_jsonb(c) FROM categories c WHERE c.id = t.category_id) AS category,
        COALESCE(
            (SELECT jsonb_agg(to_jsonb(ch) ORDER BY ch.sort_order, ch.created_at, ch.id)
             FROM todos ch WHERE ch.parent_todo_id = t.id),
            '[]'::jsonb
        ) AS children,
        COALESCE(
            (SELECT jsonb_agg(to_jsonb(cm) ORDER BY cm.created_at, cm.id)
             FROM todo_comments cm WHERE cm.todo_id = t.id),
            '[]'::jsonb
        ) AS comments,
        COALESCE(
            (SELECT jsonb_agg(to_jsonb(a) ORDER BY a.created_at, a.id)
             FROM todo_attachments a WHERE a.todo_id = t.id),
            '[]'::jsonb
        ) AS attachments
    FROM todos t
    WHERE t.id = $1 AND t.user_id = $2
"#;

#[derive(Clone)]
pub struct PgTodoRepository {
    db: DatabaseConnection,
}

impl PgTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn create(&self, input: NewTodo) -> TodoResult<Todo> {
        let base = Base::new();
        let model = todo::ActiveModel::from_new(input, &base)
            .insert(&self.db)
            .await?;
        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Todo>> {
        let model = todo::Entity::find_by_id(id)
            .filter(todo::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_populated(&self, user_id: &str, id: Uuid) -> TodoResult<Option<PopulatedTodo>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            POPULATED_SQL,
            [id.into(), user_id.into()],
        );
        PopulatedRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(PopulatedRow::into_populated)
            .transpose()
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, user_id: &str, filter: TodoFilter) -> TodoResult<Page<Todo>> {
        let mut count_params = Params::default();
        let count_where = where_clause(user_id, &filter, &mut count_params);
        let total = CountRow::find_by_statement(statement(
            format!("SELECT COUNT(*) AS total FROM todos WHERE {count_where}"),
            count_params,
        ))
        .one(&self.db)
        .await?
        .map(|row| row.total)
        .unwrap_or(0);

        let mut params = Params::default();
        let predicate = where_clause(user_id, &filter, &mut params);
        let limit = params.bind(filter.limit as i64);
        let offset = params.bind(filter.offset() as i64);
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE {predicate} ORDER BY {} LIMIT {limit} OFFSET {offset}",
            order_clause(filter.sort, filter.order)
        );

        let models = todo::Model::find_by_statement(statement(sql, params))
            .all(&self.db)
            .await?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            filter.page,
            filter.limit,
            total.max(0) as u64,
        ))
    }

    #[instrument(skip(self))]
    async fn stats(&self, user_id: &str) -> TodoResult<TodoStats> {
        let sql = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (
                    WHERE status IN ('draft', 'active') AND due_date <= now()
                ) AS overdue
            FROM todos
            WHERE user_id = $1
        "#;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [user_id.into()]);
        let row = StatsRow::find_by_statement(stmt).one(&self.db).await?;

        Ok(row
            .map(|r| TodoStats {
                total: r.total,
                active: r.active,
                completed: r.completed,
                overdue: r.overdue,
            })
            .unwrap_or_default())
    }

    async fn has_children(&self, user_id: &str, id: Uuid) -> TodoResult<bool> {
        let count = todo::Entity::find()
            .filter(todo::Column::UserId.eq(user_id))
            .filter(todo::Column::ParentTodoId.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, todo), fields(todo_id = %todo.id()))]
    async fn update(&self, todo: Todo) -> TodoResult<Todo> {
        let metadata = todo
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_value(m).ok());
        let sql = format!(
            r#"
            UPDATE todos SET
                title = $3,
                description = $4,
                priority = $5::todo_priority,
                status = $6::todo_status,
                due_date = $7,
                completed_at = $8,
                parent_todo_id = $9,
                category_id = $10,
                metadata = $11,
                sort_order = $12,
                updated_at = {NEXT_UPDATED_AT}
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                todo.id().into(),
                todo.user_id.clone().into(),
                todo.title.clone().into(),
                todo.description.clone().into(),
                todo.priority.to_string().into(),
                todo.status.to_string().into(),
                todo.due_date.into(),
                todo.completed_at.into(),
                todo.parent_todo_id.into(),
                todo.category_id.into(),
                metadata.into(),
                todo.sort_order.into(),
            ],
        );

        todo::Model::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| TodoError::todo_not_found(todo.id()))
    }

    #[instrument(skip(self))]
    async fn delete_cascade(&self, user_id: &str, id: Uuid) -> TodoResult<Vec<String>> {
        use sea_orm::ExprTrait;

        // Subtasks go with the parent through ON DELETE CASCADE, but their
        // comments and attachments have to be removed first.
        let ids: Vec<Uuid> = todo::Entity::find()
            .select_only()
            .column(todo::Column::Id)
            .filter(todo::Column::UserId.eq(user_id))
            .filter(
                todo::Column::Id
                    .eq(id)
                    .or(todo::Column::ParentTodoId.eq(id)),
            )
            .into_tuple()
            .all(&self.db)
            .await?;

        if !ids.contains(&id) {
            return Err(TodoError::todo_not_found(id));
        }

        let keys: Vec<String> = attachment::Entity::find()
            .select_only()
            .column(attachment::Column::StorageKey)
            .filter(attachment::Column::TodoId.is_in(ids.clone()))
            .into_tuple()
            .all(&self.db)
            .await?;

        comment::Entity::delete_many()
            .filter(comment::Column::TodoId.is_in(ids.clone()))
            .exec(&self.db)
            .await?;
        attachment::Entity::delete_many()
            .filter(attachment::Column::TodoId.is_in(ids))
            .exec(&self.db)
            .await?;

        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TodoError::todo_not_found(id));
        }

        Ok(keys)
    }

    #[instrument(skip(self, content))]
    async fn add_comment(
        &self,
        todo_id: Uuid,
        user_id: &str,
        content: String,
    ) -> TodoResult<Comment> {
        let base = Base::new();
        let model = comment::ActiveModel::from_new(todo_id, user_id, content, &base)
            .insert(&self.db)
            .await?;
        Ok(model.into())
    }

    async fn list_comments(&self, todo_id: Uuid, page: PageQuery) -> TodoResult<Page<Comment>> {
        let query = comment::Entity::find().filter(comment::Column::TodoId.eq(todo_id));
        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await?;
        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            page.page,
            page.limit,
            total,
        ))
    }

    async fn find_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<Option<Comment>> {
        let model = comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::TodoId.eq(todo_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    #[instrument(skip(self, comment), fields(comment_id = %comment.base.id))]
    async fn update_comment(&self, comment: Comment) -> TodoResult<Comment> {
        let sql = format!(
            "UPDATE todo_comments SET content = $3, updated_at = {NEXT_UPDATED_AT} \
             WHERE id = $1 AND todo_id = $2 RETURNING *"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                comment.base.id.into(),
                comment.todo_id.into(),
                comment.content.clone().into(),
            ],
        );
        comment::Model::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| TodoError::not_found("comment", comment.base.id))
    }

    async fn delete_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<bool> {
        let result = comment::Entity::delete_many()
            .filter(comment::Column::Id.eq(comment_id))
            .filter(comment::Column::TodoId.eq(todo_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, input), fields(todo_id = %input.todo_id))]
    async fn add_attachment(&self, input: NewAttachment) -> TodoResult<Attachment> {
        let base = Base::new();
        let model = attachment::ActiveModel::from((input, &base))
            .insert(&self.db)
            .await?;
        Ok(model.into())
    }

    async fn find_attachment(
        &self,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<Option<Attachment>> {
        let model = attachment::Entity::find_by_id(attachment_id)
            .filter(attachment::Column::TodoId.eq(todo_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn delete_attachment(&self, todo_id: Uuid, attachment_id: Uuid) -> TodoResult<bool> {
        let result = attachment::Entity::delete_many()
            .filter(attachment::Column::Id.eq(attachment_id))
            .filter(attachment::Column::TodoId.eq(todo_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl DueTodoSource for PgTodoRepository {
    #[instrument(skip(self))]
    async fn due_todos(&self, window: DueWindow, limit: u64) -> TodoResult<Vec<DueTodo>> {
        let mut query = todo::Entity::find()
            .filter(todo::Column::Status.is_in(OPEN_STATUSES))
            .filter(todo::Column::DueDate.lte(window.until));
        if let Some(after) = window.after {
            query = query.filter(todo::Column::DueDate.gt(after));
        }

        let models = query
            .order_by_asc(todo::Column::DueDate)
            .order_by_asc(todo::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| {
                let due_date = m.due_date?;
                Some(DueTodo {
                    id: m.id,
                    user_id: m.user_id,
                    title: m.title,
                    due_date: due_date.into(),
                })
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    #[instrument(skip(self, input))]
    async fn create(&self, user_id: &str, input: CreateCategory) -> TodoResult<Category> {
        let base = Base::new();
        let model = category::ActiveModel::from_create(user_id, input, &base)
            .insert(&self.db)
            .await?;
        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Category>> {
        let model = category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, user_id: &str, page: PageQuery) -> TodoResult<Page<Category>> {
        let query = category::Entity::find().filter(category::Column::UserId.eq(user_id));
        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await?;
        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            page.page,
            page.limit,
            total,
        ))
    }

    #[instrument(skip(self, category), fields(category_id = %category.base.id))]
    async fn update(&self, category: Category) -> TodoResult<Category> {
        let sql = format!(
            "UPDATE categories SET name = $3, color = $4, description = $5, icon = $6, \
             updated_at = {NEXT_UPDATED_AT} WHERE id = $1 AND user_id = $2 RETURNING *"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                category.base.id.into(),
                category.user_id.clone().into(),
                category.name.clone().into(),
                category.color.clone().into(),
                category.description.clone().into(),
                category.icon.clone().into(),
            ],
        );
        category::Model::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| TodoError::not_found("category", category.base.id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: &str, id: Uuid) -> TodoResult<bool> {
        let result = category::Entity::delete_many()
            .filter(category::Column::Id.eq(id))
            .filter(category::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
