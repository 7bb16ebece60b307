//! Sea-ORM entities for the todo tables.

pub mod attachment;
pub mod category;
pub mod comment;
pub mod todo;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::models::Base;

pub(crate) fn base(
    id: uuid::Uuid,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
) -> Base {
    Base {
        id,
        created_at: created_at.with_timezone(&Utc),
        updated_at: updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn tz(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.fixed_offset()
}
