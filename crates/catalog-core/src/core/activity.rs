// crates/catalog-core/src/core/activity.rs
// ============================================================================
// Module: Activity Records
// Description: Timetable activity schema and its sparse patch.
// Purpose: Describe weekly scheduled lectures, seminars, and labs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Activity`] is one weekly slot in a timetable. Duration is strictly
//! positive and the start hour lies within `1..=24`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::CatalogError;
use crate::core::record::Record;
use crate::core::record::RecordId;
use crate::core::record::RecordPatch;
use crate::core::record::field_matches;
use crate::core::record::present;
use crate::core::record::required;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Earliest allowed start hour.
pub const MIN_HOUR: u8 = 1;
/// Latest allowed start hour.
pub const MAX_HOUR: u8 = 24;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
}

/// Activity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    /// Lecture.
    Lecture,
    /// Seminar.
    Seminar,
    /// Laboratory session.
    Lab,
}

/// Scheduled activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity identifier.
    pub id: RecordId,
    /// Activity name.
    pub name: String,
    /// Duration in hours (strictly positive).
    pub duration: u32,
    /// Teacher responsible for the activity.
    pub teacher: String,
    /// Room where the activity takes place.
    pub room: String,
    /// Day of the week.
    pub day: Weekday,
    /// Start hour (`1..=24`).
    pub hour: u8,
    /// Activity category.
    pub category: ActivityCategory,
}

/// Sparse activity filter or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPatch {
    /// Identifier constraint or new identifier.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Activity name.
    #[serde(default)]
    pub name: Option<String>,
    /// Duration in hours.
    #[serde(default)]
    pub duration: Option<u32>,
    /// Teacher name.
    #[serde(default)]
    pub teacher: Option<String>,
    /// Room name.
    #[serde(default)]
    pub room: Option<String>,
    /// Day of the week.
    #[serde(default)]
    pub day: Option<Weekday>,
    /// Start hour.
    #[serde(default)]
    pub hour: Option<u8>,
    /// Activity category.
    #[serde(default)]
    pub category: Option<ActivityCategory>,
}

// ============================================================================
// SECTION: Record Implementation
// ============================================================================

impl Record for Activity {
    type Patch = ActivityPatch;

    const RESOURCE: &'static str = "activities";
    const FIELDS: &'static [&'static str] =
        &["name", "duration", "teacher", "room", "day", "hour", "category"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn same_attributes(&self, other: &Self) -> bool {
        self.name == other.name
            && self.duration == other.duration
            && self.teacher == other.teacher
            && self.room == other.room
            && self.day == other.day
            && self.hour == other.hour
            && self.category == other.category
    }

    fn validate(&self) -> Result<(), CatalogError> {
        validate_duration(self.duration)?;
        validate_hour(self.hour)
    }
}

impl RecordPatch<Activity> for ActivityPatch {
    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn present_fields(&self) -> Vec<&'static str> {
        present([
            ("name", self.name.is_some()),
            ("duration", self.duration.is_some()),
            ("teacher", self.teacher.is_some()),
            ("room", self.room.is_some()),
            ("day", self.day.is_some()),
            ("hour", self.hour.is_some()),
            ("category", self.category.is_some()),
        ])
    }

    fn matches(&self, record: &Activity) -> bool {
        field_matches(self.id.as_ref(), &record.id)
            && field_matches(self.name.as_ref(), &record.name)
            && field_matches(self.duration.as_ref(), &record.duration)
            && field_matches(self.teacher.as_ref(), &record.teacher)
            && field_matches(self.room.as_ref(), &record.room)
            && field_matches(self.day.as_ref(), &record.day)
            && field_matches(self.hour.as_ref(), &record.hour)
            && field_matches(self.category.as_ref(), &record.category)
    }

    fn apply(&self, record: &mut Activity) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(duration) = self.duration {
            record.duration = duration;
        }
        if let Some(teacher) = &self.teacher {
            record.teacher.clone_from(teacher);
        }
        if let Some(room) = &self.room {
            record.room.clone_from(room);
        }
        if let Some(day) = self.day {
            record.day = day;
        }
        if let Some(hour) = self.hour {
            record.hour = hour;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
    }

    fn build(&self, id: RecordId) -> Result<Activity, CatalogError> {
        let mut missing = Vec::new();
        let name = required(self.name.as_ref(), "name", &mut missing);
        let duration = required(self.duration.as_ref(), "duration", &mut missing);
        let teacher = required(self.teacher.as_ref(), "teacher", &mut missing);
        let room = required(self.room.as_ref(), "room", &mut missing);
        let day = required(self.day.as_ref(), "day", &mut missing);
        let hour = required(self.hour.as_ref(), "hour", &mut missing);
        let category = required(self.category.as_ref(), "category", &mut missing);
        match (name, duration, teacher, room, day, hour, category) {
            (
                Some(name),
                Some(duration),
                Some(teacher),
                Some(room),
                Some(day),
                Some(hour),
                Some(category),
            ) => Ok(Activity {
                id,
                name,
                duration,
                teacher,
                room,
                day,
                hour,
                category,
            }),
            _ => Err(CatalogError::IncompleteForCreate {
                missing,
            }),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(duration) = self.duration {
            validate_duration(duration)?;
        }
        if let Some(hour) = self.hour {
            validate_hour(hour)?;
        }
        Ok(())
    }
}

impl From<&Activity> for ActivityPatch {
    fn from(activity: &Activity) -> Self {
        Self {
            id: Some(activity.id),
            name: Some(activity.name.clone()),
            duration: Some(activity.duration),
            teacher: Some(activity.teacher.clone()),
            room: Some(activity.room.clone()),
            day: Some(activity.day),
            hour: Some(activity.hour),
            category: Some(activity.category),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Rejects zero-length activities.
fn validate_duration(duration: u32) -> Result<(), CatalogError> {
    if duration == 0 {
        return Err(CatalogError::Validation("duration must be greater than zero".to_string()));
    }
    Ok(())
}

/// Rejects start hours outside `1..=24`.
fn validate_hour(hour: u8) -> Result<(), CatalogError> {
    if !(MIN_HOUR..=MAX_HOUR).contains(&hour) {
        return Err(CatalogError::Validation(format!(
            "hour must be within {MIN_HOUR}..={MAX_HOUR} (got {hour})"
        )));
    }
    Ok(())
}
