use chrono::{Duration, NaiveTime, Timelike};
use tracing::debug;

use crate::models::{ClockInterval, ClockIntervalInput, ScheduleError, SLOT_DURATION_MINUTES, clock_time};

/// Splits working hours into fixed-length windows and drops the ones touching lunch.
///
/// Windows are labelled `"hh:mm AM - hh:mm PM"`. The labels are the slot identity used
/// by bookings, so the format must stay stable once schedules are stored.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    duration_minutes: i64,
}

impl Default for SlotGenerator {
    fn default() -> Self {
        Self { duration_minutes: SLOT_DURATION_MINUTES }
    }
}

impl SlotGenerator {
    pub fn new(duration_minutes: i64) -> Result<Self, ScheduleError> {
        if duration_minutes <= 0 {
            return Err(ScheduleError::InvalidSchedule(
                "Slot duration must be positive".to_string(),
            ));
        }
        Ok(Self { duration_minutes })
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }

    pub fn generate(
        &self,
        working_hours: &ClockInterval,
        lunch_break: &ClockInterval,
    ) -> Result<Vec<String>, ScheduleError> {
        if !working_hours.is_well_formed() {
            return Err(ScheduleError::InvalidSchedule(
                "Working hours must end after they start".to_string(),
            ));
        }
        if !lunch_break.is_well_formed() {
            return Err(ScheduleError::InvalidSchedule(
                "Lunch break must end after it starts".to_string(),
            ));
        }

        let step = self.duration_minutes * 60;
        let work_start = seconds_of(working_hours.start);
        let work_end = seconds_of(working_hours.end);
        let lunch_start = seconds_of(lunch_break.start);
        let lunch_end = seconds_of(lunch_break.end);

        let mut slots = Vec::new();
        let mut cursor = work_start;

        while cursor + step <= work_end {
            let window_end = cursor + step;
            let overlaps_lunch = window_end > lunch_start && cursor < lunch_end;

            if !overlaps_lunch {
                let start = working_hours.start + Duration::seconds(cursor - work_start);
                let end = working_hours.start + Duration::seconds(window_end - work_start);
                slots.push(format_slot_label(start, end));
            }

            cursor = window_end;
        }

        debug!("Generated {} slots for {:?}", slots.len(), working_hours);
        Ok(slots)
    }
}

pub fn format_slot_label(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", start.format("%I:%M %p"), end.format("%I:%M %p"))
}

/// Parses a submitted interval, reporting which field was malformed.
pub fn parse_interval(field: &str, input: &ClockIntervalInput) -> Result<ClockInterval, ScheduleError> {
    let start = clock_time::parse(&input.start).ok_or_else(|| {
        ScheduleError::InvalidSchedule(format!("{}.start is not a valid time: {}", field, input.start))
    })?;
    let end = clock_time::parse(&input.end).ok_or_else(|| {
        ScheduleError::InvalidSchedule(format!("{}.end is not a valid time: {}", field, input.end))
    })?;
    Ok(ClockInterval::new(start, end))
}

fn seconds_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn interval(start: (u32, u32), end: (u32, u32)) -> ClockInterval {
        ClockInterval::new(at(start.0, start.1), at(end.0, end.1))
    }

    #[test]
    fn test_morning_with_lunch() {
        let slots = SlotGenerator::default()
            .generate(&interval((10, 0), (13, 0)), &interval((12, 0), (12, 30)))
            .unwrap();

        assert_eq!(
            slots,
            vec![
                "10:00 AM - 10:30 AM",
                "10:30 AM - 11:00 AM",
                "11:00 AM - 11:30 AM",
                "11:30 AM - 12:00 PM",
                "12:30 PM - 01:00 PM",
            ]
        );
    }

    #[test]
    fn test_afternoon_labels_use_twelve_hour_clock() {
        let slots = SlotGenerator::default()
            .generate(&interval((15, 30), (17, 0)), &interval((13, 0), (14, 0)))
            .unwrap();

        assert_eq!(
            slots,
            vec!["03:30 PM - 04:00 PM", "04:00 PM - 04:30 PM", "04:30 PM - 05:00 PM"]
        );
    }

    #[test]
    fn test_trailing_partial_window_dropped() {
        let slots = SlotGenerator::default()
            .generate(&interval((9, 0), (10, 45)), &interval((13, 0), (14, 0)))
            .unwrap();

        assert_eq!(slots.len(), 3);
        assert_eq!(slots.last().unwrap(), "10:00 AM - 10:30 AM");
    }

    #[test]
    fn test_unaligned_lunch_removes_every_touching_window() {
        let slots = SlotGenerator::default()
            .generate(&interval((10, 0), (13, 0)), &interval((11, 15), (11, 45)))
            .unwrap();

        assert_eq!(
            slots,
            vec![
                "10:00 AM - 10:30 AM",
                "10:30 AM - 11:00 AM",
                "12:00 PM - 12:30 PM",
                "12:30 PM - 01:00 PM",
            ]
        );
    }

    #[test]
    fn test_lunch_outside_working_hours_is_ignored() {
        let slots = SlotGenerator::default()
            .generate(&interval((8, 0), (9, 0)), &interval((12, 0), (13, 0)))
            .unwrap();

        assert_eq!(slots, vec!["08:00 AM - 08:30 AM", "08:30 AM - 09:00 AM"]);
    }

    #[test]
    fn test_lunch_covering_the_day_leaves_nothing() {
        let slots = SlotGenerator::default()
            .generate(&interval((10, 0), (12, 0)), &interval((9, 0), (13, 0)))
            .unwrap();

        assert!(slots.is_empty());
    }

    #[test]
    fn test_malformed_intervals_rejected() {
        let generator = SlotGenerator::default();

        assert_matches!(
            generator.generate(&interval((13, 0), (10, 0)), &interval((12, 0), (12, 30))),
            Err(ScheduleError::InvalidSchedule(_))
        );
        assert_matches!(
            generator.generate(&interval((10, 0), (13, 0)), &interval((12, 0), (12, 0))),
            Err(ScheduleError::InvalidSchedule(_))
        );
        assert_matches!(SlotGenerator::new(0), Err(ScheduleError::InvalidSchedule(_)));
    }

    #[test]
    fn test_windows_are_contiguous_and_avoid_lunch() {
        let generator = SlotGenerator::default();

        for start_hour in 6..12 {
            for end_hour in (start_hour + 1)..20 {
                for lunch_hour in 10..15 {
                    let working = interval((start_hour, 0), (end_hour, 0));
                    let lunch = interval((lunch_hour, 0), (lunch_hour, 30));
                    let slots = generator.generate(&working, &lunch).unwrap();

                    let total_windows = ((end_hour - start_hour) * 2) as usize;
                    let lunch_inside = lunch_hour >= start_hour && lunch_hour < end_hour;
                    let expected = if lunch_inside { total_windows - 1 } else { total_windows };
                    assert_eq!(slots.len(), expected);

                    let lunch_label = format_slot_label(at(lunch_hour, 0), at(lunch_hour, 30));
                    assert!(!slots.contains(&lunch_label));
                }
            }
        }
    }

    #[test]
    fn test_parse_interval_reports_field() {
        let input = ClockIntervalInput { start: "10:00".into(), end: "25:00".into() };
        let err = parse_interval("working_hours", &input).unwrap_err();
        assert_matches!(err, ScheduleError::InvalidSchedule(msg) if msg.contains("working_hours.end"));

        let ok = ClockIntervalInput { start: "09:00:00".into(), end: "17:30".into() };
        assert_eq!(parse_interval("lunch_break", &ok).unwrap(), interval((9, 0), (17, 30)));
    }

    #[test]
    fn test_parse_interval_rejects_seconds() {
        let input = ClockIntervalInput { start: "09:00:30".into(), end: "17:00".into() };
        let err = parse_interval("working_hours", &input).unwrap_err();
        assert_matches!(err, ScheduleError::InvalidSchedule(msg) if msg.contains("working_hours.start"));
    }
}
