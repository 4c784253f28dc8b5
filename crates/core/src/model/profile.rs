use thiserror::Error;

use crate::model::ids::ProfileId;

/// Points needed to climb one level.
pub const POINTS_PER_LEVEL: u64 = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("profile name cannot be empty")]
    EmptyName,
}

/// A learner and their accumulated experience points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    name: String,
    points: u64,
}

impl Profile {
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` if `name` is blank.
    pub fn new(id: ProfileId, name: impl Into<String>) -> Result<Self, ProfileError> {
        Self::from_persisted(id, name, 0)
    }

    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` if `name` is blank.
    pub fn from_persisted(
        id: ProfileId,
        name: impl Into<String>,
        points: u64,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self { id, name, points })
    }

    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn add_points(&mut self, amount: u32) {
        self.points = self.points.saturating_add(u64::from(amount));
    }

    #[must_use]
    pub fn level(&self) -> LevelProgress {
        LevelProgress::from_points(self.points)
    }
}

/// Level reached for a point total, and how far into the next level the learner is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: u64,
    pub points_into_level: u64,
    pub percent_to_next: f64,
}

impl LevelProgress {
    #[must_use]
    pub fn from_points(points: u64) -> Self {
        let points_into_level = points % POINTS_PER_LEVEL;
        #[allow(clippy::cast_precision_loss)]
        let percent_to_next = points_into_level as f64 / POINTS_PER_LEVEL as f64 * 100.0;
        Self {
            level: points / POINTS_PER_LEVEL + 1,
            points_into_level,
            percent_to_next,
        }
    }
}
