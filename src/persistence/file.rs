use super::{PersistenceError, PersistenceResult};
use crate::catalog::{Catalog, CatalogMetadata, ScheduledSession};
use crate::combination::{ChosenSection, Schedule};
use crate::config::IngestConfig;
use crate::ingest::{self, IngestError, ScheduleRow};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Reads the enrollment export: a header row followed by one row per
/// session occurrence.
pub fn read_catalog_csv<R: Read>(
    reader: R,
    config: &IngestConfig,
    metadata: CatalogMetadata,
) -> PersistenceResult<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = ScheduleRow::from_record(&record).map_err(|source| IngestError::Row {
            row: idx + 1,
            source: Box::new(source),
        })?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no schedule rows".into(),
        ));
    }

    Ok(ingest::catalog_from_rows(rows, config, metadata)?)
}

pub fn load_catalog_from_csv<P: AsRef<Path>>(
    path: P,
    config: &IngestConfig,
) -> PersistenceResult<Catalog> {
    let path = path.as_ref();
    let retrieved_at = fs::metadata(path)?
        .modified()
        .ok()
        .map(|t| DateTime::<Local>::from(t).naive_local());
    let metadata = CatalogMetadata {
        source: path.display().to_string(),
        retrieved_at,
    };
    let file = File::open(path)?;
    read_catalog_csv(file, config, metadata)
}

pub fn save_catalog_to_json<P: AsRef<Path>>(catalog: &Catalog, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, catalog)?;
    Ok(())
}

pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Catalog> {
    let file = File::open(path)?;
    let mut catalog: Catalog = serde_json::from_reader(file)?;
    for (code, course) in &catalog.courses {
        if code != &course.code {
            return Err(PersistenceError::InvalidData(format!(
                "course stored under '{code}' has code '{}'",
                course.code
            )));
        }
        for (id, section) in &course.sections {
            if id != &section.id {
                return Err(PersistenceError::InvalidData(format!(
                    "course {code}: section stored under '{id}' has id '{}'",
                    section.id
                )));
            }
        }
    }
    catalog.normalize();
    Ok(catalog)
}

#[derive(Serialize, Deserialize)]
struct ScheduleSnapshot {
    index: usize,
    sections: Vec<ChosenSection>,
    sessions: Vec<ScheduledSession>,
}

impl ScheduleSnapshot {
    fn from_schedule(index: usize, schedule: &Schedule) -> Self {
        Self {
            index,
            sections: schedule.sections().to_vec(),
            sessions: schedule.sessions().to_vec(),
        }
    }
}

pub fn save_schedules_to_json<P: AsRef<Path>>(
    schedules: &[Schedule],
    path: P,
) -> PersistenceResult<()> {
    let snapshots: Vec<ScheduleSnapshot> = schedules
        .iter()
        .enumerate()
        .map(|(idx, schedule)| ScheduleSnapshot::from_schedule(idx, schedule))
        .collect();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshots)?;
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct ScheduleCsvRecord {
    schedule: usize,
    course_code: String,
    course_name: String,
    section_id: String,
    session: String,
    day: u32,
    start_hour: u8,
    duration_hours: u8,
    instructor: String,
    capacity: u32,
    enrolled: u32,
}

impl ScheduleCsvRecord {
    fn new(schedule: usize, s: &ScheduledSession) -> Self {
        Self {
            schedule,
            course_code: s.course_code.clone(),
            course_name: s.course_name.clone(),
            section_id: s.section_id.to_string(),
            session: s.session.label.clone(),
            day: s.session.day.num_days_from_monday(),
            start_hour: s.session.start_hour,
            duration_hours: s.session.duration_hours,
            instructor: s.session.instructor.clone(),
            capacity: s.capacity,
            enrolled: s.enrolled,
        }
    }
}

/// Writes one row per session, tagged with the index of its schedule.
pub fn save_schedules_to_csv<P: AsRef<Path>>(
    schedules: &[Schedule],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for (idx, schedule) in schedules.iter().enumerate() {
        for session in schedule.sessions() {
            writer.serialize(ScheduleCsvRecord::new(idx, session))?;
        }
    }
    writer.flush()?;
    Ok(())
}
