use crate::data::{
    ClassroomOccupancy, Lecture, ScheduleConfig, Subject, SubjectHourDeviation, Timetable,
};
use log::{debug, info};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Consecutive failed resamples tolerated before a subject forfeits its
/// remaining hours, as a multiple of classes x days x classrooms.
/// Bounds the retry loop so heavily contended configurations terminate
/// instead of spinning; successful placements never count against it.
const MAX_ATTEMPT_FACTOR: usize = 8;

type DailySlots = HashMap<String, HashMap<String, HashSet<usize>>>;

/// Booking state accumulated while placing lectures. One instance per
/// generation run; never shared across calls.
#[derive(Debug, Default)]
struct ScheduleState {
    /// (teacher, day) -> hours assigned that day.
    teacher_daily_load: HashMap<String, HashMap<String, usize>>,
    /// (teacher, day) -> occupied slots.
    teacher_daily_bookings: DailySlots,
    /// (classroom, day) -> occupied slots.
    classroom_daily_bookings: DailySlots,
    /// (class, day) -> occupied slots.
    class_daily_bookings: DailySlots,
    /// (class, subject) -> hours assigned so far.
    class_subject_hours: HashMap<String, HashMap<String, u32>>,
}

impl ScheduleState {
    fn teacher_load(&self, teacher: &str, day: &str) -> usize {
        self.teacher_daily_load
            .get(teacher)
            .and_then(|days| days.get(day))
            .copied()
            .unwrap_or(0)
    }

    fn booked_count(bookings: &DailySlots, key: &str, day: &str) -> usize {
        bookings
            .get(key)
            .and_then(|days| days.get(day))
            .map_or(0, HashSet::len)
    }

    fn is_booked(bookings: &DailySlots, key: &str, day: &str, slot: usize) -> bool {
        bookings
            .get(key)
            .and_then(|days| days.get(day))
            .is_some_and(|slots| slots.contains(&slot))
    }

    fn commit(&mut self, lecture: &Lecture) {
        *self
            .teacher_daily_load
            .entry(lecture.teacher.clone())
            .or_default()
            .entry(lecture.day.clone())
            .or_default() += 1;
        for (bookings, key) in [
            (&mut self.teacher_daily_bookings, &lecture.teacher),
            (&mut self.classroom_daily_bookings, &lecture.classroom),
            (&mut self.class_daily_bookings, &lecture.class_name),
        ] {
            bookings
                .entry(key.clone())
                .or_default()
                .entry(lecture.day.clone())
                .or_default()
                .insert(lecture.slot);
        }
        *self
            .class_subject_hours
            .entry(lecture.class_name.clone())
            .or_default()
            .entry(lecture.subject.clone())
            .or_default() += 1;
    }

    fn hours(&self, class_name: &str, subject: &str) -> u32 {
        self.class_subject_hours
            .get(class_name)
            .and_then(|subjects| subjects.get(subject))
            .copied()
            .unwrap_or(0)
    }
}

/// Generates a weekly timetable using the process-wide RNG.
pub fn generate_timetable(config: &ScheduleConfig) -> Timetable {
    generate(config, &mut rand::rng())
}

/// Generates a weekly timetable from `config`, drawing every random
/// choice from `rng`.
///
/// Placement is a randomized greedy heuristic: subjects are processed in
/// declaration order, and each hour is placed by sampling a teacher,
/// class, day, classroom, and slot that fit the daily caps and leave no
/// teacher, classroom, or class double-booked. Unplaceable hours are
/// dropped rather than reported as errors; they show up as negative
/// entries in the deviation summary.
pub fn generate<R: Rng + ?Sized>(config: &ScheduleConfig, rng: &mut R) -> Timetable {
    let start = Instant::now();
    let classrooms: Vec<String> = (1..=config.classroom_count)
        .map(|i| format!("CR{}", i))
        .collect();
    info!(
        "Placing {} subjects for {} classes over {} days ({} slots/day, {} classrooms)",
        config.subjects.len(),
        config.classes.len(),
        config.days.len(),
        config.daily_slot_count,
        classrooms.len()
    );

    let attempt_budget = MAX_ATTEMPT_FACTOR
        * config.classes.len().max(1)
        * config.days.len().max(1)
        * config.classroom_count.max(1);

    let mut state = ScheduleState::default();
    let mut lectures = Vec::new();
    for subject in &config.subjects {
        place_subject(
            config,
            subject,
            &classrooms,
            attempt_budget,
            &mut state,
            &mut lectures,
            rng,
        );
    }
    info!("Placed {} lectures in {:.2?}", lectures.len(), start.elapsed());

    let classrooms_view = build_occupancy(config, &classrooms, &lectures);
    let deviation = build_deviation(config, &state);

    Timetable {
        lectures,
        classrooms: classrooms_view,
        subject_hours_difference: deviation,
    }
}

/// Places up to `subject.total_hours` lectures for one subject,
/// resampling (teacher, class) on contention until the attempt budget
/// runs out. Only failed resamples count against the budget, so a
/// feasible subject places all its hours no matter how many it has.
fn place_subject<R: Rng + ?Sized>(
    config: &ScheduleConfig,
    subject: &Subject,
    classrooms: &[String],
    attempt_budget: usize,
    state: &mut ScheduleState,
    lectures: &mut Vec<Lecture>,
    rng: &mut R,
) {
    let mut hours_left = subject.total_hours;
    let mut failed_attempts = 0;

    while hours_left > 0 {
        if failed_attempts >= attempt_budget {
            debug!(
                "Attempt budget exhausted for {}: {} hours unplaced",
                subject.name, hours_left
            );
            break;
        }

        let (Some(teacher), Some(class_name)) =
            (subject.teachers.choose(rng), config.classes.choose(rng))
        else {
            break;
        };

        // Days where both the teacher's load and the class's bookings
        // are under the subject's daily cap.
        let available_days: Vec<&String> = config
            .days
            .iter()
            .filter(|day| {
                state.teacher_load(teacher, day) < subject.max_daily_hours
                    && ScheduleState::booked_count(&state.class_daily_bookings, class_name, day)
                        < subject.max_daily_hours
            })
            .collect();
        // No day fits this (teacher, class) pair: forfeit the subject's
        // remaining hours. They surface in the deviation summary.
        let Some(&day) = available_days.choose(rng) else {
            debug!(
                "No available day for {} with {} / {}: {} hours unplaced",
                subject.name, teacher, class_name, hours_left
            );
            break;
        };

        let available_classrooms: Vec<&String> = classrooms
            .iter()
            .filter(|classroom| {
                ScheduleState::booked_count(&state.classroom_daily_bookings, classroom, day)
                    < subject.max_daily_hours
            })
            .collect();
        let Some(&classroom) = available_classrooms.choose(rng) else {
            failed_attempts += 1;
            continue;
        };

        let available_slots: Vec<usize> = (0..config.daily_slot_count)
            .filter(|&slot| {
                !ScheduleState::is_booked(&state.classroom_daily_bookings, classroom, day, slot)
                    && !ScheduleState::is_booked(&state.class_daily_bookings, class_name, day, slot)
                    && !ScheduleState::is_booked(&state.teacher_daily_bookings, teacher, day, slot)
            })
            .collect();
        let Some(&slot) = available_slots.choose(rng) else {
            failed_attempts += 1;
            continue;
        };

        let lecture = Lecture {
            teacher: teacher.clone(),
            subject: subject.name.clone(),
            class_name: class_name.clone(),
            classroom: classroom.clone(),
            day: day.clone(),
            slot,
        };
        state.commit(&lecture);
        lectures.push(lecture);
        hours_left -= 1;
        failed_attempts = 0;
    }
}

/// Per-classroom, per-day view of committed lectures. Every classroom
/// and day appears, empty or not.
fn build_occupancy(
    config: &ScheduleConfig,
    classrooms: &[String],
    lectures: &[Lecture],
) -> ClassroomOccupancy {
    let mut occupancy: ClassroomOccupancy = classrooms
        .iter()
        .map(|classroom| {
            let days = config
                .days
                .iter()
                .map(|day| (day.clone(), Vec::new()))
                .collect();
            (classroom.clone(), days)
        })
        .collect();

    for lecture in lectures {
        if let Some(slots) = occupancy
            .get_mut(&lecture.classroom)
            .and_then(|days| days.get_mut(&lecture.day))
        {
            slots.push((lecture.subject.clone(), lecture.class_name.clone()));
        }
    }
    occupancy
}

/// Signed difference between each class's scheduled hours per subject
/// and an even per-class share of the subject's weekly target.
fn build_deviation(config: &ScheduleConfig, state: &ScheduleState) -> SubjectHourDeviation {
    let mut deviation = SubjectHourDeviation::new();
    for class_name in &config.classes {
        let per_subject = deviation.entry(class_name.clone()).or_default();
        for subject in &config.subjects {
            let expected = subject.total_hours as i64 / config.classes.len() as i64;
            let actual = state.hours(class_name, &subject.name) as i64;
            per_subject.insert(subject.name.clone(), actual - expected);
        }
    }
    deviation
}
