//! Todos Domain
//!
//! Per-user todos with one level of subtasks, categories, comments and
//! file attachments.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← axum routes, OpenAPI
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Ownership and hierarchy rules
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌──────────────┐
//! │ Repository  │      │ ObjectStore  │  ← attachment bytes
//! └──────┬──────┘      └──────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Records, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_todos::{
//!     CategoryService, LocalObjectStore, PgCategoryRepository, PgTodoRepository, TodoService,
//! };
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//! let objects = Arc::new(LocalObjectStore::new("./data", "http://localhost:8080/files", "secret"));
//!
//! let todos = TodoService::new(
//!     PgTodoRepository::new(db.clone()),
//!     PgCategoryRepository::new(db.clone()),
//!     objects,
//! );
//! let categories = CategoryService::new(PgCategoryRepository::new(db));
//! let app = domain_todos::handlers::router(todos, categories, 10 * 1024 * 1024);
//! # Ok(())
//! # }
//! ```

pub mod due;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod object_store;
pub mod postgres;
pub mod repository;
pub mod service;

pub use due::DueTodoSource;
pub use error::{TodoError, TodoResult};
pub use handlers::{ApiDoc, DEFAULT_MAX_UPLOAD_BYTES};
pub use models::{
    Attachment, Category, Comment, CreateCategory, CreateComment, CreateTodo, DownloadUrl,
    DueTodo, DueWindow, Page, PageQuery, PopulatedTodo, SortDirection, Todo, TodoFilter,
    TodoMetadata, TodoPriority, TodoSort, TodoStats, TodoStatus, UpdateCategory, UpdateComment,
    UpdateTodo,
};
pub use object_store::{InMemoryObjectStore, LocalObjectStore, ObjectStore};
pub use postgres::{PgCategoryRepository, PgTodoRepository};
pub use repository::{
    CategoryRepository, InMemoryCategoryRepository, InMemoryTodoRepository, TodoRepository,
    in_memory_repositories,
};
pub use service::{CategoryService, TodoService};
