use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::models::{
    Attachment, Base, Category, Comment, CreateCategory, NewAttachment, NewTodo, Page, PageQuery,
    PopulatedTodo, SortDirection, Todo, TodoFilter, TodoSort, TodoStats, TodoStatus, next_modified,
    now_micros, page_offset,
};

/// Data access for todos and the records hanging off them.
///
/// Every read and write is scoped by the owning principal. A row owned by
/// someone else is reported exactly like a missing row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Insert a todo; id and timestamps are assigned here.
    async fn create(&self, input: NewTodo) -> TodoResult<Todo>;

    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Todo>>;

    /// The todo with its category, direct children, comments and attachments.
    async fn find_populated(&self, user_id: &str, id: Uuid) -> TodoResult<Option<PopulatedTodo>>;

    async fn list(&self, user_id: &str, filter: TodoFilter) -> TodoResult<Page<Todo>>;

    async fn stats(&self, user_id: &str) -> TodoResult<TodoStats>;

    async fn has_children(&self, user_id: &str, id: Uuid) -> TodoResult<bool>;

    /// Persist the mutable fields of `todo` and advance `updated_at`.
    async fn update(&self, todo: Todo) -> TodoResult<Todo>;

    /// Delete the todo, its subtasks and their comments and attachments.
    /// Returns the object-store keys of the removed attachments.
    async fn delete_cascade(&self, user_id: &str, id: Uuid) -> TodoResult<Vec<String>>;

    async fn add_comment(&self, todo_id: Uuid, user_id: &str, content: String)
    -> TodoResult<Comment>;

    async fn list_comments(&self, todo_id: Uuid, page: PageQuery) -> TodoResult<Page<Comment>>;

    async fn find_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<Option<Comment>>;

    async fn update_comment(&self, comment: Comment) -> TodoResult<Comment>;

    async fn delete_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<bool>;

    async fn add_attachment(&self, input: NewAttachment) -> TodoResult<Attachment>;

    async fn find_attachment(
        &self,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<Option<Attachment>>;

    async fn delete_attachment(&self, todo_id: Uuid, attachment_id: Uuid) -> TodoResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, user_id: &str, input: CreateCategory) -> TodoResult<Category>;

    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Category>>;

    async fn list(&self, user_id: &str, page: PageQuery) -> TodoResult<Page<Category>>;

    async fn update(&self, category: Category) -> TodoResult<Category>;

    /// Todos referencing the category keep existing with no category.
    async fn delete(&self, user_id: &str, id: Uuid) -> TodoResult<bool>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) todos: HashMap<Uuid, Todo>,
    pub(crate) categories: HashMap<Uuid, Category>,
    pub(crate) comments: HashMap<Uuid, Comment>,
    pub(crate) attachments: HashMap<Uuid, Attachment>,
}

type SharedTables = Arc<RwLock<Tables>>;

/// Todo storage backed by process memory, for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    pub(crate) tables: SharedTables,
}

/// Category storage backed by process memory.
#[derive(Clone, Default)]
pub struct InMemoryCategoryRepository {
    tables: SharedTables,
}

/// A todo and a category repository over the same tables, so populated reads
/// and category deletion behave like the relational store.
pub fn in_memory_repositories() -> (InMemoryTodoRepository, InMemoryCategoryRepository) {
    let tables = SharedTables::default();
    (
        InMemoryTodoRepository {
            tables: tables.clone(),
        },
        InMemoryCategoryRepository { tables },
    )
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: &[T], page: u64, limit: u64) -> Page<T> {
    let total = items.len() as u64;
    let offset = page_offset(page, limit);
    let slice = items
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect();
    Page::new(slice, page, limit, total)
}

fn compare_todos(a: &Todo, b: &Todo, sort: TodoSort) -> Ordering {
    match sort {
        TodoSort::CreatedAt => a.base.created_at.cmp(&b.base.created_at),
        TodoSort::UpdatedAt => a.base.updated_at.cmp(&b.base.updated_at),
        TodoSort::DueDate => a.due_date.cmp(&b.due_date),
        TodoSort::Priority => a.priority.rank().cmp(&b.priority.rank()),
        TodoSort::Title => a.title.cmp(&b.title),
        TodoSort::SortOrder => a.sort_order.cmp(&b.sort_order),
    }
}

pub(crate) fn sort_todos(todos: &mut [Todo], sort: TodoSort, order: SortDirection) {
    todos.sort_by(|a, b| {
        // Undated todos go last in either direction
        if sort == TodoSort::DueDate {
            match (a.due_date, b.due_date) {
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                _ => {}
            }
        }
        let ord = compare_todos(a, b, sort).then_with(|| a.base.id.cmp(&b.base.id));
        match order {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

fn by_created(a: &Base, b: &Base) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, input: NewTodo) -> TodoResult<Todo> {
        let mut tables = self.tables.write().await;
        if let Some(parent) = input.parent_todo_id {
            if !tables.todos.contains_key(&parent) {
                return Err(TodoError::InvalidInput(
                    "referenced record does not exist".to_string(),
                ));
            }
        }
        let todo = input.into_todo(Base::new());
        tables.todos.insert(todo.id(), todo.clone());
        Ok(todo)
    }

    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Todo>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todos
            .get(&id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn find_populated(&self, user_id: &str, id: Uuid) -> TodoResult<Option<PopulatedTodo>> {
        let tables = self.tables.read().await;
        let Some(todo) = tables.todos.get(&id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };

        let category = todo
            .category_id
            .and_then(|cid| tables.categories.get(&cid))
            .cloned();

        let mut children: Vec<Todo> = tables
            .todos
            .values()
            .filter(|t| t.parent_todo_id == Some(id))
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| by_created(&a.base, &b.base))
        });

        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.todo_id == id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| by_created(&a.base, &b.base));

        let mut attachments: Vec<Attachment> = tables
            .attachments
            .values()
            .filter(|a| a.todo_id == id)
            .cloned()
            .collect();
        attachments.sort_by(|a, b| by_created(&a.base, &b.base));

        Ok(Some(PopulatedTodo {
            todo: todo.clone(),
            category,
            children,
            comments,
            attachments,
        }))
    }

    async fn list(&self, user_id: &str, filter: TodoFilter) -> TodoResult<Page<Todo>> {
        let now = now_micros();
        let tables = self.tables.read().await;
        let mut todos: Vec<Todo> = tables
            .todos
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t, now))
            .cloned()
            .collect();
        sort_todos(&mut todos, filter.sort, filter.order);
        Ok(paginate(&todos, filter.page, filter.limit))
    }

    async fn stats(&self, user_id: &str) -> TodoResult<TodoStats> {
        let now = now_micros();
        let tables = self.tables.read().await;
        let mut stats = TodoStats::default();
        for todo in tables.todos.values().filter(|t| t.user_id == user_id) {
            stats.total += 1;
            match todo.status {
                TodoStatus::Active => stats.active += 1,
                TodoStatus::Completed => stats.completed += 1,
                _ => {}
            }
            if todo.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        Ok(stats)
    }

    async fn has_children(&self, user_id: &str, id: Uuid) -> TodoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .todos
            .values()
            .any(|t| t.user_id == user_id && t.parent_todo_id == Some(id)))
    }

    async fn update(&self, todo: Todo) -> TodoResult<Todo> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .todos
            .get_mut(&todo.id())
            .filter(|t| t.user_id == todo.user_id)
            .ok_or_else(|| TodoError::todo_not_found(todo.id()))?;

        let base = Base {
            id: stored.base.id,
            created_at: stored.base.created_at,
            updated_at: next_modified(stored.base.updated_at),
        };
        *stored = Todo {
            base,
            user_id: stored.user_id.clone(),
            ..todo
        };
        Ok(stored.clone())
    }

    async fn delete_cascade(&self, user_id: &str, id: Uuid) -> TodoResult<Vec<String>> {
        let mut tables = self.tables.write().await;
        if !tables.todos.get(&id).is_some_and(|t| t.user_id == user_id) {
            return Err(TodoError::todo_not_found(id));
        }

        let mut doomed: Vec<Uuid> = tables
            .todos
            .values()
            .filter(|t| t.parent_todo_id == Some(id))
            .map(|t| t.id())
            .collect();
        doomed.push(id);

        tables.comments.retain(|_, c| !doomed.contains(&c.todo_id));
        let mut keys = Vec::new();
        tables.attachments.retain(|_, a| {
            if doomed.contains(&a.todo_id) {
                keys.push(a.storage_key.clone());
                false
            } else {
                true
            }
        });
        for todo_id in &doomed {
            tables.todos.remove(todo_id);
        }
        Ok(keys)
    }

    async fn add_comment(
        &self,
        todo_id: Uuid,
        user_id: &str,
        content: String,
    ) -> TodoResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.todos.contains_key(&todo_id) {
            return Err(TodoError::todo_not_found(todo_id));
        }
        let comment = Comment {
            base: Base::new(),
            todo_id,
            user_id: user_id.to_string(),
            content,
        };
        tables.comments.insert(comment.base.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, todo_id: Uuid, page: PageQuery) -> TodoResult<Page<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.todo_id == todo_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| by_created(&a.base, &b.base));
        Ok(paginate(&comments, page.page, page.limit))
    }

    async fn find_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.todo_id == todo_id)
            .cloned())
    }

    async fn update_comment(&self, comment: Comment) -> TodoResult<Comment> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .comments
            .get_mut(&comment.base.id)
            .filter(|c| c.todo_id == comment.todo_id)
            .ok_or_else(|| TodoError::not_found("comment", comment.base.id))?;
        stored.content = comment.content;
        stored.base.updated_at = next_modified(stored.base.updated_at);
        Ok(stored.clone())
    }

    async fn delete_comment(&self, todo_id: Uuid, comment_id: Uuid) -> TodoResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .comments
            .get(&comment_id)
            .is_some_and(|c| c.todo_id == todo_id);
        if owned {
            tables.comments.remove(&comment_id);
        }
        Ok(owned)
    }

    async fn add_attachment(&self, input: NewAttachment) -> TodoResult<Attachment> {
        let mut tables = self.tables.write().await;
        if !tables.todos.contains_key(&input.todo_id) {
            return Err(TodoError::todo_not_found(input.todo_id));
        }
        let attachment = Attachment {
            base: Base::new(),
            todo_id: input.todo_id,
            user_id: input.user_id,
            file_name: input.file_name,
            content_type: input.content_type,
            size_bytes: input.size_bytes,
            storage_key: input.storage_key,
        };
        tables
            .attachments
            .insert(attachment.base.id, attachment.clone());
        Ok(attachment)
    }

    async fn find_attachment(
        &self,
        todo_id: Uuid,
        attachment_id: Uuid,
    ) -> TodoResult<Option<Attachment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attachments
            .get(&attachment_id)
            .filter(|a| a.todo_id == todo_id)
            .cloned())
    }

    async fn delete_attachment(&self, todo_id: Uuid, attachment_id: Uuid) -> TodoResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .attachments
            .get(&attachment_id)
            .is_some_and(|a| a.todo_id == todo_id);
        if owned {
            tables.attachments.remove(&attachment_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, user_id: &str, input: CreateCategory) -> TodoResult<Category> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.user_id == user_id && c.name == input.name)
        {
            return Err(TodoError::Conflict(
                "a record with the same name already exists".to_string(),
            ));
        }
        let category = Category {
            base: Base::new(),
            user_id: user_id.to_string(),
            name: input.name,
            color: input.color,
            description: input.description,
            icon: input.icon,
        };
        tables
            .categories
            .insert(category.base.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, user_id: &str, id: Uuid) -> TodoResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str, page: PageQuery) -> TodoResult<Page<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.base.id.cmp(&b.base.id)));
        Ok(paginate(&categories, page.page, page.limit))
    }

    async fn update(&self, category: Category) -> TodoResult<Category> {
        let mut tables = self.tables.write().await;
        let id = category.base.id;
        if tables
            .categories
            .values()
            .any(|c| c.user_id == category.user_id && c.name == category.name && c.base.id != id)
        {
            return Err(TodoError::Conflict(
                "a record with the same name already exists".to_string(),
            ));
        }
        let stored = tables
            .categories
            .get_mut(&id)
            .filter(|c| c.user_id == category.user_id)
            .ok_or_else(|| TodoError::not_found("category", id))?;
        let updated_at = next_modified(stored.base.updated_at);
        *stored = Category {
            base: Base {
                updated_at,
                ..stored.base.clone()
            },
            ..category
        };
        Ok(stored.clone())
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> TodoResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables
            .categories
            .get(&id)
            .is_some_and(|c| c.user_id == user_id)
        {
            return Ok(false);
        }
        tables.categories.remove(&id);
        for todo in tables.todos.values_mut() {
            if todo.category_id == Some(id) {
                todo.category_id = None;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTodo, TodoPriority};

    fn new_todo(user: &str, title: &str) -> NewTodo {
        NewTodo::from_create(
            user,
            CreateTodo {
                title: title.into(),
                ..Default::default()
            },
            now_micros(),
        )
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_owner() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.create(new_todo("alice", "a")).await.unwrap();

        assert!(repo.find_by_id("alice", todo.id()).await.unwrap().is_some());
        assert!(repo.find_by_id("bob", todo.id()).await.unwrap().is_none());
        assert!(repo.find_populated("bob", todo.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_advances_updated_at() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.create(new_todo("alice", "a")).await.unwrap();

        let first = repo.update(todo.clone()).await.unwrap();
        let second = repo.update(first.clone()).await.unwrap();

        assert!(first.base.updated_at > todo.base.updated_at);
        assert!(second.base.updated_at > first.base.updated_at);
        assert_eq!(second.base.created_at, todo.base.created_at);
    }

    #[tokio::test]
    async fn test_update_of_foreign_todo_is_not_found() {
        let repo = InMemoryTodoRepository::new();
        let mut todo = repo.create(new_todo("alice", "a")).await.unwrap();
        todo.user_id = "bob".into();
        assert!(matches!(
            repo.update(todo).await,
            Err(TodoError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_sorts_and_paginates() {
        let repo = InMemoryTodoRepository::new();
        for (title, priority) in [
            ("one", TodoPriority::Low),
            ("two", TodoPriority::High),
            ("three", TodoPriority::Medium),
        ] {
            let mut input = new_todo("alice", title);
            input.priority = priority;
            repo.create(input).await.unwrap();
        }
        repo.create(new_todo("bob", "other")).await.unwrap();

        let page = repo
            .list(
                "alice",
                TodoFilter {
                    limit: 2,
                    sort: TodoSort::Priority,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn test_due_date_sort_puts_undated_last() {
        let repo = InMemoryTodoRepository::new();
        let now = now_micros();
        let mut early = new_todo("alice", "early");
        early.due_date = Some(now);
        let mut late = new_todo("alice", "late");
        late.due_date = Some(now + chrono::Duration::days(1));
        repo.create(early).await.unwrap();
        repo.create(late).await.unwrap();
        repo.create(new_todo("alice", "undated")).await.unwrap();

        for order in [SortDirection::Asc, SortDirection::Desc] {
            let page = repo
                .list(
                    "alice",
                    TodoFilter {
                        sort: TodoSort::DueDate,
                        order,
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(page.items.last().unwrap().title, "undated");
        }
    }

    #[tokio::test]
    async fn test_delete_cascade_collects_storage_keys() {
        let repo = InMemoryTodoRepository::new();
        let parent = repo.create(new_todo("alice", "parent")).await.unwrap();
        let mut child_input = new_todo("alice", "child");
        child_input.parent_todo_id = Some(parent.id());
        let child = repo.create(child_input).await.unwrap();

        for (todo_id, key) in [(parent.id(), "k1"), (child.id(), "k2")] {
            repo.add_attachment(NewAttachment {
                todo_id,
                user_id: "alice".into(),
                file_name: "f.txt".into(),
                content_type: "text/plain".into(),
                size_bytes: 3,
                storage_key: key.into(),
            })
            .await
            .unwrap();
        }
        repo.add_comment(child.id(), "alice", "hi".into())
            .await
            .unwrap();

        let mut keys = repo.delete_cascade("alice", parent.id()).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["k1", "k2"]);

        let tables = repo.tables.read().await;
        assert!(tables.todos.is_empty());
        assert!(tables.comments.is_empty());
        assert!(tables.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_category_names_unique_per_owner() {
        let repo = InMemoryCategoryRepository::new();
        let input = CreateCategory {
            name: "Work".into(),
            color: "#000000".into(),
            description: None,
            icon: None,
        };
        repo.create("alice", input.clone()).await.unwrap();
        assert!(matches!(
            repo.create("alice", input.clone()).await,
            Err(TodoError::Conflict(_))
        ));
        assert!(repo.create("bob", input).await.is_ok());
    }

    #[tokio::test]
    async fn test_category_delete_detaches_todos() {
        let (todos, categories) = in_memory_repositories();
        let category = categories
            .create(
                "alice",
                CreateCategory {
                    name: "Home".into(),
                    color: "#FFFFFF".into(),
                    description: None,
                    icon: None,
                },
            )
            .await
            .unwrap();
        let mut input = new_todo("alice", "sweep");
        input.category_id = Some(category.base.id);
        let todo = todos.create(input).await.unwrap();

        assert!(categories.delete("alice", category.base.id).await.unwrap());
        let reloaded = todos.find_by_id("alice", todo.id()).await.unwrap().unwrap();
        assert!(reloaded.category_id.is_none());
    }
}
