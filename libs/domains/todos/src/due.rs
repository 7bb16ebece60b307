//! Selection of open todos by due date, read by the scheduled jobs.

use async_trait::async_trait;

use crate::error::TodoResult;
use crate::models::{DueTodo, DueWindow};
use crate::repository::InMemoryTodoRepository;

#[async_trait]
pub trait DueTodoSource: Send + Sync {
    /// Draft or active todos whose due date falls in `window`, earliest first,
    /// at most `limit` of them.
    async fn due_todos(&self, window: DueWindow, limit: u64) -> TodoResult<Vec<DueTodo>>;
}

#[async_trait]
impl DueTodoSource for InMemoryTodoRepository {
    async fn due_todos(&self, window: DueWindow, limit: u64) -> TodoResult<Vec<DueTodo>> {
        let tables = self.tables.read().await;
        let mut due: Vec<DueTodo> = tables
            .todos
            .values()
            .filter(|t| t.status.is_open())
            .filter_map(|t| {
                let due_date = t.due_date.filter(|d| window.contains(*d))?;
                Some(DueTodo {
                    id: t.id(),
                    user_id: t.user_id.clone(),
                    title: t.title.clone(),
                    due_date,
                })
            })
            .collect();
        due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
        due.truncate(limit as usize);
        Ok(due)
    }
}
