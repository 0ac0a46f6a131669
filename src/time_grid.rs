use crate::catalog::Session;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// Why a set of sessions cannot share one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Two sessions claim the same `(day, hour)` slot.
    Overlap {
        day: Weekday,
        hour: u8,
        first: String,
        second: String,
    },
    /// A session runs past the last hour of the day.
    OutOfRange {
        label: String,
        day: Weekday,
        start_hour: u8,
        duration_hours: u8,
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Overlap {
                day,
                hour,
                first,
                second,
            } => write!(
                f,
                "sessions '{first}' and '{second}' both occupy {day} {hour:02}:00"
            ),
            Conflict::OutOfRange {
                label,
                day,
                start_hour,
                duration_hours,
            } => write!(
                f,
                "session '{label}' on {day} starts at {start_hour:02}:00 and lasts {duration_hours}h, past the end of the day"
            ),
        }
    }
}

impl std::error::Error for Conflict {}

/// Weekly 7x24 occupancy matrix.
///
/// Each occupied cell holds the index of its session in `sessions`. A grid is
/// only ever produced by [`try_merge`], so it is always conflict free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGrid<S> {
    sessions: Vec<S>,
    cells: [[Option<usize>; HOURS_PER_DAY]; DAYS_PER_WEEK],
}

impl<S: AsRef<Session>> WeekGrid<S> {
    fn empty() -> Self {
        Self {
            sessions: Vec::new(),
            cells: [[None; HOURS_PER_DAY]; DAYS_PER_WEEK],
        }
    }

    /// Session occupying `(day, hour)`, if any.
    pub fn get(&self, day: Weekday, hour: u8) -> Option<&S> {
        let row = self.cells.get(day.num_days_from_monday() as usize)?;
        let idx = (*row.get(hour as usize)?)?;
        self.sessions.get(idx)
    }

    pub fn is_free(&self, day: Weekday, hour: u8) -> bool {
        self.get(day, hour).is_none()
    }

    pub fn sessions(&self) -> &[S] {
        &self.sessions
    }

    pub fn into_sessions(self) -> Vec<S> {
        self.sessions
    }

    /// Number of claimed hourly slots across the week.
    pub fn occupied_slots(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_some())
            .count()
    }

    /// Hours of `day` that are claimed, ascending.
    pub fn occupied_on(&self, day: Weekday) -> Vec<u8> {
        self.cells[day.num_days_from_monday() as usize]
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_some())
            .map(|(hour, _)| hour as u8)
            .collect()
    }

    fn claim(&mut self, session: S) -> Result<(), Conflict> {
        let (day, start, end) = {
            let s = session.as_ref();
            if s.end_hour() > HOURS_PER_DAY as u16 {
                return Err(Conflict::OutOfRange {
                    label: s.label.clone(),
                    day: s.day,
                    start_hour: s.start_hour,
                    duration_hours: s.duration_hours,
                });
            }
            (s.day, s.start_hour as usize, s.end_hour() as usize)
        };

        let idx = self.sessions.len();
        let row = &mut self.cells[day.num_days_from_monday() as usize];
        if let Some(hour) = (start..end).find(|&h| row[h].is_some()) {
            let occupant = row[hour].and_then(|i| self.sessions.get(i));
            return Err(Conflict::Overlap {
                day,
                hour: hour as u8,
                first: occupant
                    .map(|o| o.as_ref().label.clone())
                    .unwrap_or_default(),
                second: session.as_ref().label.clone(),
            });
        }
        for cell in &mut row[start..end] {
            *cell = Some(idx);
        }
        self.sessions.push(session);
        Ok(())
    }
}

/// Lays every session of every group onto a fresh week.
///
/// All or nothing: the first slot claimed twice aborts the merge and no
/// partial grid is returned. Zero-length sessions claim no slot.
pub fn try_merge<S>(groups: &[Vec<S>]) -> Result<WeekGrid<S>, Conflict>
where
    S: AsRef<Session> + Clone,
{
    merge_sessions(groups.iter().flatten())
}

/// Same as [`try_merge`] over a flat run of sessions.
pub fn merge_sessions<'a, S, I>(sessions: I) -> Result<WeekGrid<S>, Conflict>
where
    S: AsRef<Session> + Clone + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut grid = WeekGrid::empty();
    for session in sessions {
        grid.claim(session.clone())?;
    }
    Ok(grid)
}
