use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// One weekly meeting of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub label: String,
    pub day: Weekday,
    pub start_hour: u8,
    pub duration_hours: u8,
    pub instructor: String,
}

impl Session {
    pub fn new(
        label: impl Into<String>,
        day: Weekday,
        start_hour: u8,
        duration_hours: u8,
        instructor: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            day,
            start_hour,
            duration_hours,
            instructor: instructor.into(),
        }
    }

    /// Exclusive end hour. Widened so out-of-range data never wraps.
    pub fn end_hour(&self) -> u16 {
        u16::from(self.start_hour) + u16::from(self.duration_hours)
    }

    /// Monday = 0 ... Sunday = 6.
    pub fn day_index(&self) -> usize {
        self.day.num_days_from_monday() as usize
    }

    fn sort_key(&self) -> (usize, u8, u8) {
        (self.day_index(), self.start_hour, self.duration_hours)
    }
}

impl AsRef<Session> for Session {
    fn as_ref(&self) -> &Session {
        self
    }
}

/// Section identifier as printed in the enrollment export.
///
/// Ids that are plain numbers sort numerically (`"2"` before `"10"`); the raw
/// string breaks ties so ordering stays consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }
}

impl Ord for SectionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SectionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SectionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub capacity: u32,
    pub enrolled: u32,
    pub sessions: Vec<Session>,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, capacity: u32, enrolled: u32, sessions: Vec<Session>) -> Self {
        let mut section = Self {
            id: id.into(),
            capacity,
            enrolled,
            sessions,
        };
        section.sort_sessions();
        section
    }

    pub fn push_session(&mut self, session: Session) {
        self.sessions.push(session);
        self.sort_sessions();
    }

    /// Orders sessions by day, then start hour, then duration.
    pub fn sort_sessions(&mut self) {
        self.sessions.sort_by_key(Session::sort_key);
    }

    pub fn available_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub curriculum: Option<String>,
    pub sections: BTreeMap<SectionId, Section>,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            curriculum: None,
            sections: BTreeMap::new(),
        }
    }

    /// Inserts or replaces the section stored under its own id.
    pub fn insert_section(&mut self, section: Section) -> Option<Section> {
        self.sections.insert(section.id.clone(), section)
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub source: String,
    pub retrieved_at: Option<NaiveDateTime>,
}

impl Default for CatalogMetadata {
    fn default() -> Self {
        Self {
            source: "unknown".to_string(),
            retrieved_at: None,
        }
    }
}

/// Full set of courses offered in one enrollment period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub metadata: CatalogMetadata,
    pub courses: BTreeMap<String, Course>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: CatalogMetadata) -> Self {
        Self {
            metadata,
            courses: BTreeMap::new(),
        }
    }

    pub fn insert_course(&mut self, course: Course) -> Option<Course> {
        self.courses.insert(course.code.clone(), course)
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.courses.values().map(|c| c.sections.len()).sum()
    }

    pub fn session_count(&self) -> usize {
        self.courses
            .values()
            .flat_map(|c| c.sections.values())
            .map(|s| s.sessions.len())
            .sum()
    }

    /// Restores the session ordering invariant after deserialization.
    pub fn normalize(&mut self) {
        for course in self.courses.values_mut() {
            for section in course.sections.values_mut() {
                section.sort_sessions();
            }
        }
    }
}

/// A session annotated with the course and section it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub course_code: String,
    pub course_name: String,
    pub section_id: SectionId,
    pub capacity: u32,
    pub enrolled: u32,
    #[serde(flatten)]
    pub session: Session,
}

impl ScheduledSession {
    pub fn new(course: &Course, section: &Section, session: &Session) -> Self {
        Self {
            course_code: course.code.clone(),
            course_name: course.name.clone(),
            section_id: section.id.clone(),
            capacity: section.capacity,
            enrolled: section.enrolled,
            session: session.clone(),
        }
    }
}

impl AsRef<Session> for ScheduledSession {
    fn as_ref(&self) -> &Session {
        &self.session
    }
}
