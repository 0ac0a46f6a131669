use crate::catalog::{Catalog, Course, Session};
use log::debug;
use serde::{Deserialize, Serialize};

/// Derives a catalog holding only the sections whose sessions satisfy
/// `predicate`.
///
/// With `require_all_sessions` a section is kept when every session matches,
/// otherwise when at least one does. Kept sections are copied whole and a
/// course survives only if one of its sections does. The input is untouched.
pub fn filter_by<P>(catalog: &Catalog, predicate: P, require_all_sessions: bool) -> Catalog
where
    P: Fn(&Session) -> bool,
{
    let mut filtered = Catalog::with_metadata(catalog.metadata.clone());
    for course in catalog.courses.values() {
        let mut kept = Course {
            code: course.code.clone(),
            name: course.name.clone(),
            curriculum: course.curriculum.clone(),
            sections: Default::default(),
        };
        for section in course.sections.values() {
            let matching = section.sessions.iter().filter(|&s| predicate(s)).count();
            let keep = if require_all_sessions {
                matching == section.sessions.len()
            } else {
                matching > 0
            };
            if keep {
                kept.insert_section(section.clone());
            }
        }
        if !kept.sections.is_empty() {
            filtered.insert_course(kept);
        }
    }
    debug!(
        "filter kept {}/{} course(s), {}/{} section(s)",
        filtered.len(),
        catalog.len(),
        filtered.section_count(),
        catalog.section_count()
    );
    filtered
}

/// Sections taught (at least in part) by an instructor whose name contains
/// `needle`, ignoring case.
pub fn by_instructor(catalog: &Catalog, needle: &str) -> Catalog {
    let needle = needle.to_lowercase();
    filter_by(
        catalog,
        |s| s.instructor.to_lowercase().contains(&needle),
        false,
    )
}

/// Sections whose sessions all start at or after `hour`.
pub fn by_min_start(catalog: &Catalog, hour: u8) -> Catalog {
    filter_by(catalog, |s| s.start_hour >= hour, true)
}

/// Sections whose sessions all end at or before `hour`.
pub fn by_max_end(catalog: &Catalog, hour: u8) -> Catalog {
    filter_by(catalog, |s| s.end_hour() <= u16::from(hour), true)
}

/// Sections whose sessions all last exactly `hours`.
pub fn by_duration(catalog: &Catalog, hours: u8) -> Catalog {
    filter_by(catalog, |s| s.duration_hours == hours, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SessionFilter {
    Instructor(String),
    MinStart(u8),
    MaxEnd(u8),
    Duration(u8),
}

impl SessionFilter {
    pub fn apply(&self, catalog: &Catalog) -> Catalog {
        match self {
            SessionFilter::Instructor(needle) => by_instructor(catalog, needle),
            SessionFilter::MinStart(hour) => by_min_start(catalog, *hour),
            SessionFilter::MaxEnd(hour) => by_max_end(catalog, *hour),
            SessionFilter::Duration(hours) => by_duration(catalog, *hours),
        }
    }
}

/// Chains filters left to right, each one narrowing the previous result.
pub fn apply_filters(catalog: &Catalog, filters: &[SessionFilter]) -> Catalog {
    filters
        .iter()
        .fold(catalog.clone(), |acc, filter| filter.apply(&acc))
}
