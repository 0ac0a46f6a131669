use crate::catalog::{Catalog, Section, SectionId};
use crate::time_grid::{self, Conflict};
use log::{debug, warn};
use std::fmt;

/// A section whose own sessions cannot coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionConflict {
    pub course_code: String,
    pub section_id: SectionId,
    pub conflict: Conflict,
}

impl fmt::Display for SectionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "course {} section {}: {}",
            self.course_code, self.section_id, self.conflict
        )
    }
}

impl std::error::Error for SectionConflict {}

/// Raised when a catalog holds at least one self-conflicting section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIntegrityError {
    pub failures: Vec<SectionConflict>,
}

impl fmt::Display for DataIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "catalog has {} self-conflicting section(s)",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DataIntegrityError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub sections_checked: usize,
    failures: Vec<SectionConflict>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[SectionConflict] {
        &self.failures
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Gate for callers that must not filter or combine an incoherent catalog.
    pub fn into_result(self) -> Result<(), DataIntegrityError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(DataIntegrityError {
                failures: self.failures,
            })
        }
    }
}

/// Checks that a section's sessions fit in one week without overlap.
pub fn validate_section(course_code: &str, section: &Section) -> Result<(), SectionConflict> {
    let singletons: Vec<Vec<_>> = section.sessions.iter().map(|s| vec![s.clone()]).collect();
    time_grid::try_merge(&singletons)
        .map(|_| ())
        .map_err(|conflict| SectionConflict {
            course_code: course_code.to_string(),
            section_id: section.id.clone(),
            conflict,
        })
}

pub fn section_is_valid(section: &Section) -> bool {
    validate_section("", section).is_ok()
}

/// Validates every section of every course, reporting each failure.
pub fn validate_catalog(catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (code, course) in &catalog.courses {
        for section in course.sections.values() {
            report.sections_checked += 1;
            if let Err(failure) = validate_section(code, section) {
                warn!("invalid section: {failure}");
                report.failures.push(failure);
            }
        }
    }
    debug!(
        "validated {} section(s), {} invalid",
        report.sections_checked,
        report.failures.len()
    );
    report
}
