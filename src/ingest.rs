use crate::catalog::{Catalog, CatalogMetadata, Course, Section, SectionId, Session};
use crate::config::IngestConfig;
use chrono::Weekday;
use csv::StringRecord;
use log::debug;
use std::fmt;

/// Spanish day abbreviations used by the enrollment export, Monday first.
const DAY_ABBREVIATIONS: [(&str, Weekday); 7] = [
    ("lun", Weekday::Mon),
    ("mar", Weekday::Tue),
    ("mie", Weekday::Wed),
    ("jue", Weekday::Thu),
    ("vie", Weekday::Fri),
    ("sab", Weekday::Sat),
    ("dom", Weekday::Sun),
];

const COLUMN_COUNT: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    UnknownDay(String),
    MalformedTime(String),
    InvalidTimeRange { input: String, reason: String },
    MalformedCount { field: &'static str, value: String },
    MissingColumns { expected: usize, found: usize },
    /// Wraps another error with the 1-based data row it came from.
    Row { row: usize, source: Box<IngestError> },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::UnknownDay(day) => write!(f, "unknown day abbreviation '{day}'"),
            IngestError::MalformedTime(input) => write!(f, "malformed time string '{input}'"),
            IngestError::InvalidTimeRange { input, reason } => {
                write!(f, "invalid time range '{input}': {reason}")
            }
            IngestError::MalformedCount { field, value } => {
                write!(f, "invalid {field} '{value}' (expected a non-negative integer)")
            }
            IngestError::MissingColumns { expected, found } => {
                write!(f, "expected {expected} columns, found {found}")
            }
            IngestError::Row { row, source } => write!(f, "row {row}: {source}"),
        }
    }
}

impl std::error::Error for IngestError {}

pub type IngestResult<T> = Result<T, IngestError>;

/// Day and hour span decoded from a `"lun.08:00-10:00"` style string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub day: Weekday,
    pub start_hour: u8,
    pub duration_hours: u8,
}

pub fn parse_day(abbrev: &str) -> IngestResult<Weekday> {
    let key = abbrev.trim().to_lowercase();
    DAY_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, day)| *day)
        .ok_or_else(|| IngestError::UnknownDay(abbrev.to_string()))
}

fn parse_hour(clock: &str, input: &str) -> IngestResult<u8> {
    let hour = clock.split(':').next().unwrap_or_default();
    hour.parse::<u8>()
        .map_err(|_| IngestError::MalformedTime(input.to_string()))
}

/// Parses `"<day>.<HH>:MM-<HH>:MM"`. Minutes are ignored; the grid is hourly.
pub fn parse_time_slot(input: &str) -> IngestResult<TimeSlot> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let (day, range) = compact
        .split_once('.')
        .ok_or_else(|| IngestError::MalformedTime(input.to_string()))?;
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| IngestError::MalformedTime(input.to_string()))?;

    let day = parse_day(day)?;
    let start_hour = parse_hour(start, input)?;
    let end_hour = parse_hour(end, input)?;

    if end_hour < start_hour {
        return Err(IngestError::InvalidTimeRange {
            input: input.to_string(),
            reason: "ends before it starts".into(),
        });
    }
    if end_hour > 24 {
        return Err(IngestError::InvalidTimeRange {
            input: input.to_string(),
            reason: "ends after midnight".into(),
        });
    }

    Ok(TimeSlot {
        day,
        start_hour,
        duration_hours: end_hour - start_hour,
    })
}

/// Seat counts come out of the PDF extractor either as `"30"` or `"30.0"`.
/// Cells the extractor left blank count as zero.
fn parse_count(field: &'static str, value: &str) -> IngestResult<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = trimmed.parse::<u32>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Ok(f as u32)
        }
        _ => Err(IngestError::MalformedCount {
            field,
            value: value.to_string(),
        }),
    }
}

/// One session occurrence as exported by the enrollment system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub course_code: String,
    pub course_name: String,
    pub professor: String,
    pub curriculum: String,
    pub modality: String,
    pub mode: String,
    pub section_id: String,
    pub session_label: String,
    pub time: String,
    pub row_type: String,
    pub location: String,
    pub capacity: String,
    pub enrolled: String,
}

impl ScheduleRow {
    pub fn from_record(record: &StringRecord) -> IngestResult<Self> {
        if record.len() < COLUMN_COUNT {
            return Err(IngestError::MissingColumns {
                expected: COLUMN_COUNT,
                found: record.len(),
            });
        }
        // PDF extraction splits long cells over lines.
        let col = |idx: usize| record[idx].replace('\r', " ").trim().to_string();
        Ok(Self {
            course_code: col(0),
            course_name: col(1),
            professor: col(2),
            curriculum: col(3),
            modality: col(4),
            mode: col(5),
            section_id: col(6),
            session_label: col(7),
            time: col(8),
            row_type: col(9),
            location: col(10),
            capacity: col(11),
            enrolled: col(12),
        })
    }

    pub fn session(&self) -> IngestResult<Session> {
        let slot = parse_time_slot(&self.time)?;
        Ok(Session::new(
            self.session_label.clone(),
            slot.day,
            slot.start_hour,
            slot.duration_hours,
            self.professor.clone(),
        ))
    }
}

/// Groups general-schedule rows into courses and sections.
///
/// Rows of any other type are skipped. The first row seen for a course fixes
/// its name and curriculum, the first row for a section fixes its seat counts.
pub fn catalog_from_rows<I>(
    rows: I,
    config: &IngestConfig,
    metadata: CatalogMetadata,
) -> IngestResult<Catalog>
where
    I: IntoIterator<Item = ScheduleRow>,
{
    let mut catalog = Catalog::with_metadata(metadata);
    let mut skipped = 0usize;

    for (idx, row) in rows.into_iter().enumerate() {
        let at_row = |source: IngestError| IngestError::Row {
            row: idx + 1,
            source: Box::new(source),
        };

        if row.row_type != config.general_schedule_marker {
            skipped += 1;
            continue;
        }

        let session = row.session().map_err(at_row)?;
        let course = catalog
            .courses
            .entry(row.course_code.clone())
            .or_insert_with(|| {
                let mut course = Course::new(row.course_code.clone(), row.course_name.clone());
                if !row.curriculum.is_empty() {
                    course.curriculum = Some(row.curriculum.clone());
                }
                course
            });

        let section_id = SectionId::new(row.section_id.clone());
        if let Some(section) = course.sections.get_mut(&section_id) {
            section.push_session(session);
        } else {
            let capacity = parse_count("capacity", &row.capacity).map_err(at_row)?;
            let enrolled = parse_count("enrolled", &row.enrolled).map_err(at_row)?;
            course.insert_section(Section::new(section_id, capacity, enrolled, vec![session]));
        }
    }

    debug!(
        "ingested {} course(s), {} section(s); skipped {skipped} non-general row(s)",
        catalog.len(),
        catalog.section_count()
    );
    Ok(catalog)
}
