use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The five weekdays the generator schedules over.
pub const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// A subject to be placed into the weekly grid.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    /// Number of 1-hour lectures to place per week, summed over all classes.
    pub total_hours: u32,
    /// Teachers eligible to teach this subject.
    pub teachers: Vec<String>,
    /// Cap on hours of this subject a single teacher may teach, and a
    /// single class may receive, per day.
    pub max_daily_hours: usize,
}

/// The complete input for one generation run.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub classroom_count: usize,
    pub classes: Vec<String>,
    pub days: Vec<String>,
    /// Whole-hour slots per day, indexed 0..daily_slot_count.
    pub daily_slot_count: usize,
    /// Subjects in declaration order; the generator processes them in this order.
    pub subjects: Vec<Subject>,
}

/// One committed (subject, teacher, class, classroom, day, slot) assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lecture {
    pub teacher: String,
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub classroom: String,
    pub day: String,
    pub slot: usize,
}

/// Per-classroom, per-day occupancy: classroom -> day -> one (subject, class)
/// entry per committed lecture.
pub type ClassroomOccupancy = HashMap<String, HashMap<String, Vec<(String, String)>>>;

/// Per-class, per-subject signed deviation from an even per-class share.
pub type SubjectHourDeviation = HashMap<String, HashMap<String, i64>>;

/// The generator's output: the lecture list plus its two derived summaries.
#[derive(Debug, Clone, Serialize)]
pub struct Timetable {
    pub lectures: Vec<Lecture>,
    pub classrooms: ClassroomOccupancy,
    pub subject_hours_difference: SubjectHourDeviation,
}

/// A subject as it appears in the request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequest {
    pub name: String,
    pub total_hours: u32,
    pub teachers: Vec<String>,
    pub max_daily_hours: usize,
}

/// Request body for `POST /api/generate-timetable`.
///
/// All fields are optional on the wire; absent ones fall back to the
/// defaults the frontend relies on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    #[serde(default = "default_num_classrooms")]
    pub num_classrooms: usize,
    #[serde(default = "default_classes")]
    pub classes: Vec<String>,
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_end_time")]
    pub end_time: String,
    #[serde(default)]
    pub subjects: Vec<SubjectRequest>,
}

fn default_num_classrooms() -> usize {
    3
}

fn default_classes() -> Vec<String> {
    vec!["10A".to_string(), "10B".to_string(), "10C".to_string()]
}

fn default_start_time() -> String {
    "08:30".to_string()
}

fn default_end_time() -> String {
    "17:30".to_string()
}

impl TimetableRequest {
    /// Maps the wire request into a [`ScheduleConfig`].
    ///
    /// The slot count is the whole-hour difference between start and end
    /// times; minutes are ignored. Days are fixed to Monday through Friday.
    pub fn to_config(&self) -> Result<ScheduleConfig, String> {
        let start_hour = parse_hour(&self.start_time)?;
        let end_hour = parse_hour(&self.end_time)?;
        if end_hour <= start_hour {
            return Err(format!(
                "End time {} must be later than start time {}",
                self.end_time, self.start_time
            ));
        }

        let subjects = self
            .subjects
            .iter()
            .map(|s| Subject {
                name: s.name.clone(),
                total_hours: s.total_hours,
                teachers: s.teachers.clone(),
                max_daily_hours: s.max_daily_hours,
            })
            .collect();

        Ok(ScheduleConfig {
            classroom_count: self.num_classrooms,
            classes: self.classes.clone(),
            days: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
            daily_slot_count: (end_hour - start_hour) as usize,
            subjects,
        })
    }
}

/// Extracts the hour component from an `"HH:MM"` string.
fn parse_hour(time: &str) -> Result<u32, String> {
    let (hour, _minute) = time
        .split_once(':')
        .ok_or_else(|| format!("Invalid time '{}': expected HH:MM", time))?;
    hour.parse::<u32>()
        .map_err(|_| format!("Invalid hour in time '{}'", time))
}

/// Response body: the timetable plus the echoed request start time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableResponse {
    #[serde(flatten)]
    pub timetable: Timetable,
    pub start_time: String,
}
