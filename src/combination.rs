//! Exhaustive search for conflict-free timetables.
//!
//! The number of combinations is the product of the section counts of the
//! requested courses, so the search grows exponentially with the number of
//! courses. Nothing is pruned or memoized: every combination is built and
//! merged on its own week grid. Callers asking for many multi-section courses
//! should check [`combination_count`] first or set a deadline through
//! [`SearchOptions`].

use crate::catalog::{Catalog, Course, ScheduledSession, Section, SectionId};
use crate::time_grid::{self, Conflict, WeekGrid};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Combinations handed to the rayon pool at a time.
const PARALLEL_BATCH: usize = 4096;

/// The section picked for one requested course, with its annotated sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChoice {
    pub course_code: String,
    pub section_id: SectionId,
    pub sessions: Vec<ScheduledSession>,
}

impl SectionChoice {
    fn new(course: &Course, section: &Section) -> Self {
        Self {
            course_code: course.code.clone(),
            section_id: section.id.clone(),
            sessions: section
                .sessions
                .iter()
                .map(|s| ScheduledSession::new(course, section, s))
                .collect(),
        }
    }
}

/// One section choice per requested course, in the requested order.
pub type Combination = Vec<SectionChoice>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChosenSection {
    pub course_code: String,
    pub section_id: SectionId,
}

/// A conflict-free combination: the sections it picks and the week they fill.
///
/// Picks are kept even for sections without sessions, which claim no slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    sections: Vec<ChosenSection>,
    grid: WeekGrid<ScheduledSession>,
}

impl Schedule {
    pub fn from_combination(combination: &[SectionChoice]) -> Result<Self, Conflict> {
        let grid = time_grid::merge_sessions(combination.iter().flat_map(|c| c.sessions.iter()))?;
        Ok(Self {
            sections: combination
                .iter()
                .map(|c| ChosenSection {
                    course_code: c.course_code.clone(),
                    section_id: c.section_id.clone(),
                })
                .collect(),
            grid,
        })
    }

    /// Picked sections, in the requested course order.
    pub fn sections(&self) -> &[ChosenSection] {
        &self.sections
    }

    pub fn grid(&self) -> &WeekGrid<ScheduledSession> {
        &self.grid
    }

    pub fn sessions(&self) -> &[ScheduledSession] {
        self.grid.sessions()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombinationError {
    UnknownCourse(String),
    UnknownSection {
        course_code: String,
        section_id: SectionId,
    },
    /// `checked` counts the combinations merged before the limit was hit.
    DeadlineExceeded {
        limit: Duration,
        checked: usize,
    },
}

impl fmt::Display for CombinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationError::UnknownCourse(code) => write!(f, "unknown course '{code}'"),
            CombinationError::UnknownSection {
                course_code,
                section_id,
            } => write!(f, "course '{course_code}' has no section '{section_id}'"),
            CombinationError::DeadlineExceeded { limit, checked } => write!(
                f,
                "schedule search exceeded its {}ms deadline after {checked} combination(s)",
                limit.as_millis()
            ),
        }
    }
}

impl std::error::Error for CombinationError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Merge combinations on the rayon thread pool. Output order is unchanged.
    pub parallel: bool,
    pub deadline: Option<Duration>,
}

/// Sessions of one section annotated with course and section details.
pub fn sessions_for_section(
    catalog: &Catalog,
    course_code: &str,
    section_id: &SectionId,
) -> Result<Vec<ScheduledSession>, CombinationError> {
    let course = catalog
        .course(course_code)
        .ok_or_else(|| CombinationError::UnknownCourse(course_code.to_string()))?;
    let section = course
        .section(section_id)
        .ok_or_else(|| CombinationError::UnknownSection {
            course_code: course_code.to_string(),
            section_id: section_id.clone(),
        })?;
    Ok(SectionChoice::new(course, section).sessions)
}

/// Lazy cartesian product over the sections of the requested courses.
///
/// The last course varies fastest, so items come out in lexicographic order
/// of (course order as requested, section order as stored).
#[derive(Debug, Clone)]
pub struct Combinations {
    factors: Vec<Vec<SectionChoice>>,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(factors: Vec<Vec<SectionChoice>>) -> Self {
        let done = factors.iter().any(Vec::is_empty);
        Self {
            indices: vec![0; factors.len()],
            factors,
            done,
        }
    }

    /// Total number of combinations this iterator yields from the start.
    pub fn total(&self) -> u128 {
        self.factors
            .iter()
            .fold(1u128, |acc, f| acc.saturating_mul(f.len() as u128))
    }

    fn advance(&mut self) {
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.factors[pos].len() {
                return;
            }
            self.indices[pos] = 0;
        }
        self.done = true;
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .indices
            .iter()
            .zip(&self.factors)
            .map(|(&idx, factor)| factor[idx].clone())
            .collect();
        self.advance();
        Some(item)
    }
}

fn section_choices(course: &Course) -> Vec<SectionChoice> {
    course
        .sections
        .values()
        .map(|section| SectionChoice::new(course, section))
        .collect()
}

pub fn combinations(
    catalog: &Catalog,
    course_codes: &[impl AsRef<str>],
) -> Result<Combinations, CombinationError> {
    let factors = course_codes
        .iter()
        .map(|code| {
            let code = code.as_ref();
            catalog
                .course(code)
                .map(section_choices)
                .ok_or_else(|| CombinationError::UnknownCourse(code.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Combinations::new(factors))
}

/// Combinations over a filtered catalog.
///
/// Course codes are checked against `unfiltered`, so only codes it lacks are
/// unknown. A course the filters removed counts as having no section and the
/// product is empty.
pub fn combinations_after_filter(
    unfiltered: &Catalog,
    filtered: &Catalog,
    course_codes: &[impl AsRef<str>],
) -> Result<Combinations, CombinationError> {
    let factors = course_codes
        .iter()
        .map(|code| {
            let code = code.as_ref();
            if unfiltered.course(code).is_none() {
                return Err(CombinationError::UnknownCourse(code.to_string()));
            }
            Ok(filtered.course(code).map(section_choices).unwrap_or_default())
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Combinations::new(factors))
}

/// Product of the section counts of the requested courses (saturating).
pub fn combination_count(
    catalog: &Catalog,
    course_codes: &[impl AsRef<str>],
) -> Result<u128, CombinationError> {
    course_codes.iter().try_fold(1u128, |acc, code| {
        let code = code.as_ref();
        let course = catalog
            .course(code)
            .ok_or_else(|| CombinationError::UnknownCourse(code.to_string()))?;
        Ok(acc.saturating_mul(course.sections.len() as u128))
    })
}

pub fn enumerate_combinations(
    catalog: &Catalog,
    course_codes: &[impl AsRef<str>],
) -> Result<Vec<Combination>, CombinationError> {
    Ok(combinations(catalog, course_codes)?.collect())
}

/// Every combination that lays out on one week without overlap, in
/// generation order. An empty result is a valid answer.
pub fn possible_schedules(
    catalog: &Catalog,
    course_codes: &[impl AsRef<str>],
) -> Result<Vec<Schedule>, CombinationError> {
    possible_schedules_with(catalog, course_codes, &SearchOptions::default())
}

pub fn possible_schedules_with(
    catalog: &Catalog,
    course_codes: &[impl AsRef<str>],
    options: &SearchOptions,
) -> Result<Vec<Schedule>, CombinationError> {
    search_schedules(combinations(catalog, course_codes)?, options)
}

/// Merges each combination and keeps the conflict-free ones, in order.
///
/// The parallel path pulls at most `PARALLEL_BATCH` combinations from the
/// odometer at a time. The deadline is checked before each combination
/// (sequential) or each batch (parallel).
pub fn search_schedules(
    mut combos: Combinations,
    options: &SearchOptions,
) -> Result<Vec<Schedule>, CombinationError> {
    let total = combos.total();
    debug!("searching {total} combination(s)");

    let started = Instant::now();
    let expired = |checked: usize| -> Result<(), CombinationError> {
        match options.deadline {
            Some(limit) if started.elapsed() >= limit => {
                Err(CombinationError::DeadlineExceeded { limit, checked })
            }
            _ => Ok(()),
        }
    };

    let mut schedules = Vec::new();
    let mut checked = 0usize;
    if options.parallel {
        loop {
            let batch: Vec<Combination> = combos.by_ref().take(PARALLEL_BATCH).collect();
            if batch.is_empty() {
                break;
            }
            expired(checked)?;
            let merged: Vec<Option<Schedule>> = batch
                .par_iter()
                .map(|combo| Schedule::from_combination(combo).ok())
                .collect();
            checked += batch.len();
            schedules.extend(merged.into_iter().flatten());
        }
    } else {
        for combo in combos {
            expired(checked)?;
            if let Ok(schedule) = Schedule::from_combination(&combo) {
                schedules.push(schedule);
            }
            checked += 1;
        }
    }

    info!(
        "{} of {total} combination(s) are conflict free ({:?})",
        schedules.len(),
        started.elapsed()
    );
    Ok(schedules)
}
