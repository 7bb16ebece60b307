use axum::body::Bytes;
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{TodoError, TodoResult};
use crate::models::{
    Attachment, Category, Comment, CreateCategory, CreateComment, CreateTodo, DownloadUrl,
    NewAttachment, NewTodo, Page, PageQuery, PopulatedTodo, Todo, TodoFilter, TodoStats,
    UpdateCategory, UpdateComment, UpdateTodo, now_micros,
};
use crate::object_store::ObjectStore;
use crate::repository::{CategoryRepository, TodoRepository};

pub const DEFAULT_DOWNLOAD_TTL_SECS: i64 = 900;

/// Business rules for todos, their comments and attachments.
pub struct TodoService<R: TodoRepository, C: CategoryRepository> {
    todos: Arc<R>,
    categories: Arc<C>,
    objects: Arc<dyn ObjectStore>,
    download_ttl: Duration,
}

impl<R: TodoRepository, C: CategoryRepository> Clone for TodoService<R, C> {
    fn clone(&self) -> Self {
        Self {
            todos: self.todos.clone(),
            categories: self.categories.clone(),
            objects: self.objects.clone(),
            download_ttl: self.download_ttl,
        }
    }
}

impl<R: TodoRepository, C: CategoryRepository> TodoService<R, C> {
    pub fn new(todos: R, categories: C, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            todos: Arc::new(todos),
            categories: Arc::new(categories),
            objects,
            download_ttl: Duration::seconds(DEFAULT_DOWNLOAD_TTL_SECS),
        }
    }

    pub fn with_download_ttl(mut self, ttl: Duration) -> Self {
        self.download_ttl = ttl;
        self
    }

    /// A parent must exist for the principal and must not be a subtask itself.
    async fn check_parent(&self, user_id: &str, parent_id: Uuid) -> TodoResult<Todo> {
        let parent = self
            .todos
            .find_by_id(user_id, parent_id)
            .await?
            .ok_or_else(|| TodoError::todo_not_found(parent_id))?;
        if parent.is_subtask() {
            return Err(TodoError::CannotHaveChildren);
        }
        Ok(parent)
    }

    async fn check_category(&self, user_id: &str, category_id: Uuid) -> TodoResult<Category> {
        self.categories
            .find_by_id(user_id, category_id)
            .await?
            .ok_or_else(|| TodoError::not_found("category", category_id))
    }

    async fn require_todo(&self, user_id: &str, id: Uuid) -> TodoResult<Todo> {
        self.todos
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| TodoError::todo_not_found(id))
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_todo(&self, user_id: &str, input: CreateTodo) -> TodoResult<Todo> {
        input.validate()?;

        if let Some(parent_id) = input.parent_todo_id {
            self.check_parent(user_id, parent_id).await?;
        }
        if let Some(category_id) = input.category_id {
            self.check_category(user_id, category_id).await?;
        }

        let todo = self
            .todos
            .create(NewTodo::from_create(user_id, input, now_micros()))
            .await?;

        info!(
            event = "todo_created",
            todo_id = %todo.id(),
            title = %todo.title,
            category_id = ?todo.category_id,
            priority = %todo.priority,
            "todo created"
        );
        Ok(todo)
    }

    #[instrument(skip(self))]
    pub async fn get_todo(&self, user_id: &str, id: Uuid) -> TodoResult<PopulatedTodo> {
        self.todos
            .find_populated(user_id, id)
            .await?
            .ok_or_else(|| TodoError::todo_not_found(id))
    }

    #[instrument(skip(self, filter))]
    pub async fn list_todos(&self, user_id: &str, filter: TodoFilter) -> TodoResult<Page<Todo>> {
        filter.validate()?;
        if let (Some(from), Some(to)) = (filter.due_from, filter.due_to) {
            if from > to {
                return Err(TodoError::InvalidInput(
                    "dueFrom must not be after dueTo".to_string(),
                ));
            }
        }
        self.todos.list(user_id, filter).await
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, user_id: &str) -> TodoResult<TodoStats> {
        self.todos.stats(user_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_todo(&self, user_id: &str, id: Uuid, input: UpdateTodo) -> TodoResult<Todo> {
        input.validate()?;

        let mut todo = self.require_todo(user_id, id).await?;

        if let Some(Some(parent_id)) = input.parent_todo_id {
            if parent_id == id {
                return Err(TodoError::InvalidParent(
                    "a todo cannot be its own parent".to_string(),
                ));
            }
            self.check_parent(user_id, parent_id).await?;
            if self.todos.has_children(user_id, id).await? {
                return Err(TodoError::InvalidParent(
                    "a todo with subtasks cannot become a subtask".to_string(),
                ));
            }
        }
        if let Some(Some(category_id)) = input.category_id {
            self.check_category(user_id, category_id).await?;
        }

        todo.apply_update(input, now_micros());
        let todo = self.todos.update(todo).await?;

        info!(event = "todo_updated", todo_id = %id, status = %todo.status, "todo updated");
        Ok(todo)
    }

    /// Remove the todo, its subtasks, comments and attachments. Stored objects
    /// are deleted afterwards; failures there are only logged.
    #[instrument(skip(self))]
    pub async fn delete_todo(&self, user_id: &str, id: Uuid) -> TodoResult<()> {
        let keys = self.todos.delete_cascade(user_id, id).await?;
        let attachments = keys.len();
        self.delete_objects(keys).await;

        info!(event = "todo_deleted", todo_id = %id, attachments, "todo deleted");
        Ok(())
    }

    async fn delete_objects(&self, keys: Vec<String>) {
        for key in keys {
            if let Err(error) = self.objects.delete(&key).await {
                warn!(%key, %error, "failed to delete stored object");
            }
        }
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    #[instrument(skip(self, input))]
    pub async fn add_comment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        input: CreateComment,
    ) -> TodoResult<Comment> {
        input.validate()?;
        self.require_todo(user_id, todo_id).await?;

        let comment = self
            .todos
            .add_comment(todo_id, user_id, input.content)
            .await?;
        info!(event = "comment_added", todo_id = %todo_id, comment_id = %comment.base.id, "comment added");
        Ok(comment)
    }

    #[instrument(skip(self))]
    pub async fn list_comments(
        &self,
        user_id: &str,
        todo_id: Uuid,
        page: PageQuery,
    ) -> TodoResult<Page<Comment>> {
        page.validate()?;
        self.require_todo(user_id, todo_id).await?;
        self.todos.list_comments(todo_id, page).await
    }

    /// Comments by someone else are reported as missing.
    async fn require_own_comment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        comment_id: Uuid,
    ) -> TodoResult<Comment> {
        self.require_todo(user_id, todo_id).await?;
        self.todos
            .find_comment(todo_id, comment_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| TodoError::not_found("comment", comment_id))
    }

    #[instrument(skip(self, input))]
    pub async fn update_comment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        comment_id: Uuid,
        input: UpdateComment,
    ) -> TodoResult<Comment> {
        input.validate()?;
        let mut comment = self.require_own_comment(user_id, todo_id, comment_id).await?;
        comment.content = input.content;
        self.todos.update_comment(comment).await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        comment_id: Uuid,
    ) -> TodoResult<()> {
        self.require_own_comment(user_id, todo_id, comment_id).await?;
        if !self.todos.delete_comment(todo_id, comment_id).await? {
            return Err(TodoError::not_found("comment", comment_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_attachment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        file_name: String,
        content_type: String,
        bytes: Bytes,
    ) -> TodoResult<Attachment> {
        let file_name = file_name.trim().to_string();
        if file_name.is_empty() || file_name.chars().count() > 255 {
            return Err(TodoError::InvalidInput(
                "file name must be between 1 and 255 characters".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(TodoError::InvalidInput("file is empty".to_string()));
        }
        self.require_todo(user_id, todo_id).await?;

        let size_bytes = bytes.len() as i64;
        let storage_key = self
            .objects
            .put(&format!("todos/{todo_id}"), bytes, &content_type)
            .await?;

        let input = NewAttachment {
            todo_id,
            user_id: user_id.to_string(),
            file_name,
            content_type,
            size_bytes,
            storage_key: storage_key.clone(),
        };
        let attachment = match self.todos.add_attachment(input).await {
            Ok(attachment) => attachment,
            Err(err) => {
                self.delete_objects(vec![storage_key]).await;
                return Err(err);
            }
        };

        info!(
            event = "attachment_uploaded",
            todo_id = %todo_id,
            attachment_id = %attachment.base.id,
            size_bytes,
            "attachment uploaded"
        );
        Ok(attachment)
    }

    async fn require_attachment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<Attachment> {
        self.require_todo(user_id, todo_id).await?;
        self.todos
            .find_attachment(todo_id, attachment_id)
            .await?
            .ok_or_else(|| TodoError::not_found("attachment", attachment_id))
    }

    #[instrument(skip(self))]
    pub async fn download_url(
        &self,
        user_id: &str,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<DownloadUrl> {
        let attachment = self
            .require_attachment(user_id, todo_id, attachment_id)
            .await?;
        self.objects
            .presigned_url(&attachment.storage_key, self.download_ttl)
            .await
    }

    /// The row goes first; the stored object is removed best-effort.
    #[instrument(skip(self))]
    pub async fn delete_attachment(
        &self,
        user_id: &str,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<()> {
        let attachment = self
            .require_attachment(user_id, todo_id, attachment_id)
            .await?;
        if !self.todos.delete_attachment(todo_id, attachment_id).await? {
            return Err(TodoError::not_found("attachment", attachment_id));
        }
        self.delete_objects(vec![attachment.storage_key]).await;
        Ok(())
    }
}

/// Business rules for categories.
pub struct CategoryService<C: CategoryRepository> {
    repository: Arc<C>,
}

impl<C: CategoryRepository> Clone for CategoryService<C> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repository: C) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, user_id: &str, input: CreateCategory) -> TodoResult<Category> {
        input.validate()?;
        let category = self.repository.create(user_id, input).await?;
        info!(event = "category_created", category_id = %category.base.id, name = %category.name, "category created");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, user_id: &str, id: Uuid) -> TodoResult<Category> {
        self.repository
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| TodoError::not_found("category", id))
    }

    pub async fn list_categories(&self, user_id: &str, page: PageQuery) -> TodoResult<Page<Category>> {
        page.validate()?;
        self.repository.list(user_id, page).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        user_id: &str,
        id: Uuid,
        input: UpdateCategory,
    ) -> TodoResult<Category> {
        input.validate()?;
        let mut category = self.get_category(user_id, id).await?;
        category.apply_update(input);
        self.repository.update(category).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, user_id: &str, id: Uuid) -> TodoResult<()> {
        if !self.repository.delete(user_id, id).await? {
            return Err(TodoError::not_found("category", id));
        }
        Ok(())
    }
}
