pub use sea_orm_migration::prelude::*;

mod m20250101_000000_create_categories;
mod m20250101_000001_create_todos;
mod m20250101_000002_create_todo_comments_and_attachments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000000_create_categories::Migration),
            Box::new(m20250101_000001_create_todos::Migration),
            Box::new(m20250101_000002_create_todo_comments_and_attachments::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 3);
    }
}
