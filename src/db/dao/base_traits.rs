use chrono::Utc;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Implemented by `#[base_entity]` for every entity.
pub trait HasCreatedAtColumn: sea_orm::EntityTrait {
    fn created_at_column() -> Self::Column;
}

pub trait HasIdActiveModel {
    fn set_id(&mut self, id: Uuid);
}

pub trait TimestampedActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone);
    fn set_updated_at(&mut self, ts: DateTimeWithTimeZone);
}

/// Fills the injected columns of a row about to be inserted.
pub fn stamp_new<A>(active: &mut A, id: Uuid)
where
    A: HasIdActiveModel + TimestampedActiveModel,
{
    let now = Utc::now().fixed_offset();
    active.set_id(id);
    active.set_created_at(now);
    active.set_updated_at(now);
}

pub fn stamp_updated<A: TimestampedActiveModel>(active: &mut A) {
    active.set_updated_at(Utc::now().fixed_offset());
}
