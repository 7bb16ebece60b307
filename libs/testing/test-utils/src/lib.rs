//! Test infrastructure for the todo workspace.
//!
//! - [`TestDatabase`] (feature `postgres`, default): migrated Postgres container
//! - [`TestRedis`] (feature `redis`): Redis container with stream helpers
//! - [`TestDataBuilder`]: per-test deterministic ids and names
//! - [`assertions`]: messages that say which record failed
//!
//! Container tests are `#[ignore = "requires docker"]`; run them with
//! `cargo test -- --ignored`.

use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;
#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Seeded source of owner ids, UUIDs and record names, so reruns of a test
/// touch the same rows and different tests never collide.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test's name.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_todo");
    /// assert!(builder.user_id().starts_with("user-"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic id for the acting user, as carried by a bearer token subject
    pub fn user_id(&self) -> String {
        format!("user-{}", self.uuid())
    }

    /// A second user distinct from [`Self::user_id`], for ownership checks
    pub fn other_user_id(&self) -> String {
        format!("user-{}", Uuid::from_u64_pair(self.seed.rotate_left(17), !self.seed))
    }

    /// Deterministic UUID derived from the seed
    pub fn uuid(&self) -> Uuid {
        Uuid::from_u64_pair(self.seed, self.seed)
    }

    /// `test-<kind>-<seed>-<label>`, e.g. `builder.name("category", "work")`.
    /// Stays under the 100-character category name limit for short labels.
    pub fn name(&self, kind: &str, label: &str) -> String {
        format!("test-{kind}-{}-{label}", self.seed)
    }

    /// A `#RRGGBB` color derived from the seed.
    pub fn color(&self) -> String {
        format!("#{:06X}", self.seed & 0xFF_FFFF)
    }
}

pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    /// Unwraps `value`, naming `context` when it is missing.
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that `later` is strictly after `earlier`
    pub fn assert_strictly_after<T: PartialOrd + std::fmt::Debug>(later: T, earlier: T, context: &str) {
        assert!(
            later > earlier,
            "{}: expected {:?} to be after {:?}",
            context, later, earlier
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_data() {
        let a = TestDataBuilder::from_test_name("pg_update");
        let b = TestDataBuilder::from_test_name("pg_update");
        assert_eq!(a.user_id(), b.user_id());
        assert_eq!(a.name("todo", "main"), b.name("todo", "main"));
        assert_ne!(
            a.user_id(),
            TestDataBuilder::from_test_name("pg_list").user_id()
        );
    }

    #[test]
    fn test_name_and_color_shapes() {
        let builder = TestDataBuilder::new(0xABCDEF12);
        assert_eq!(builder.name("category", "work"), format!("test-category-{}-work", 0xABCDEF12u64));
        assert_eq!(builder.color(), "#CDEF12");
    }

    #[test]
    fn test_other_user_differs() {
        let builder = TestDataBuilder::from_test_name("owners");
        assert_ne!(builder.user_id(), builder.other_user_id());
        assert!(builder.user_id().starts_with("user-"));
    }
}
