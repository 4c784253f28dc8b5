use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::ids::{CourseId, EventId, MaterialId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Pdf,
    Doc,
    Note,
}

/// Uploaded course material. Only the fields the dashboard and agenda read.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub course_id: CourseId,
    pub title: String,
    pub kind: MaterialKind,
    pub bookmarked: bool,
    pub reminder_at: Option<NaiveDateTime>,
}

impl Material {
    /// Bookmarked material with a study reminder on `date`.
    #[must_use]
    pub fn has_reminder_on(&self, date: NaiveDate) -> bool {
        self.bookmarked && self.reminder_at.is_some_and(|at| at.date() == date)
    }
}

/// A study event the learner placed on the calendar by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyEvent {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub description: Option<String>,
}
