//! Ordered rotation of missions for the `next` action.

/// Missions visited in order, wrapping around at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionCycle {
    missions: Vec<String>,
    position: usize,
}

impl MissionCycle {
    /// Builds a cycle; blank entries are skipped.
    pub fn new<I, S>(missions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let missions = missions
            .into_iter()
            .map(Into::into)
            .filter(|mission: &String| !mission.trim().is_empty())
            .collect();
        Self {
            missions,
            position: 0,
        }
    }

    /// Whether the cycle has no missions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// Returns the next mission and advances the cursor.
    pub fn advance(&mut self) -> Option<&str> {
        if self.missions.is_empty() {
            return None;
        }
        let index = self.position % self.missions.len();
        self.position = (index + 1) % self.missions.len();
        self.missions.get(index).map(String::as_str)
    }

    /// Positions the cursor just after `mission` when it is part of the
    /// cycle. Returns whether it was found.
    pub fn resume_after(&mut self, mission: &str) -> bool {
        match self.missions.iter().position(|entry| entry == mission) {
            Some(index) => {
                self.position = (index + 1) % self.missions.len();
                true
            }
            None => false,
        }
    }

    /// Mission that [`MissionCycle::advance`] will return next.
    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        if self.missions.is_empty() {
            return None;
        }
        self.missions
            .get(self.position % self.missions.len())
            .map(String::as_str)
    }
}
