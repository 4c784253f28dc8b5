//! Per-day calendar view combining quiz deadlines, material reminders and
//! hand-made study events.

use chrono::{NaiveDate, NaiveTime};

use crate::model::{EventId, Material, MaterialId, Quiz, QuizId, StudyEvent};

/// Which calendar sources the learner wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaFilter {
    pub deadlines: bool,
    pub reminders: bool,
}

impl Default for AgendaFilter {
    fn default() -> Self {
        Self {
            deadlines: true,
            reminders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgendaSource {
    QuizDeadline(QuizId),
    MaterialReminder(MaterialId),
    StudyEvent(EventId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    pub source: AgendaSource,
    pub title: String,
    pub time: Option<NaiveTime>,
}

/// Entries for `date`: deadlines first, then reminders, then study events,
/// each group in input order. Manual events are never filtered out.
#[must_use]
pub fn entries_for_date(
    date: NaiveDate,
    quizzes: &[Quiz],
    materials: &[Material],
    events: &[StudyEvent],
    filter: AgendaFilter,
) -> Vec<AgendaEntry> {
    let mut out = Vec::new();

    if filter.deadlines {
        out.extend(quizzes.iter().filter(|q| q.is_due_on(date)).map(|q| AgendaEntry {
            source: AgendaSource::QuizDeadline(q.id()),
            title: q.title().to_owned(),
            time: None,
        }));
    }

    if filter.reminders {
        out.extend(
            materials
                .iter()
                .filter(|m| m.has_reminder_on(date))
                .map(|m| AgendaEntry {
                    source: AgendaSource::MaterialReminder(m.id),
                    title: m.title.clone(),
                    time: m.reminder_at.map(|at| at.time()),
                }),
        );
    }

    out.extend(events.iter().filter(|e| e.date == date).map(|e| AgendaEntry {
        source: AgendaSource::StudyEvent(e.id),
        title: e.title.clone(),
        time: e.time,
    }));

    out
}
