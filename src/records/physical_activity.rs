use super::SocialPosting;
use crate::vertical::Vertical;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::time::Duration as StdDuration;

/// A social posting describing a physical activity such as a run, a swim or a hike.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysicalActivity {
    #[serde(flatten)]
    pub posting: SocialPosting,
    pub activity_type: Option<String>,
    /// In meters.
    pub distance: Option<f64>,
    /// In meters.
    pub elevation_high: Option<f64>,
    /// In meters.
    pub elevation_low: Option<f64>,
    pub kilocalories: Option<f64>,
    /// In meters per second.
    pub max_speed: Option<f64>,
    pub start_datetime: Option<DateTime<Utc>>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub end_latitude: Option<f64>,
    pub end_longitude: Option<f64>,
}

impl PhysicalActivity {
    pub fn new(mut posting: SocialPosting) -> Self {
        posting.base.vertical_name = Vertical::PhysicalActivity;
        PhysicalActivity {
            posting,
            activity_type: None,
            distance: None,
            elevation_high: None,
            elevation_low: None,
            kilocalories: None,
            max_speed: None,
            start_datetime: None,
            start_latitude: None,
            start_longitude: None,
            end_datetime: None,
            end_latitude: None,
            end_longitude: None,
        }
    }

    /// Sets the start and derives the end from `duration_seconds`. The end is only
    /// known when both the start and the duration are.
    pub fn set_timing(&mut self, start: Option<DateTime<Utc>>, duration_seconds: Option<u64>) {
        self.start_datetime = start;
        self.end_datetime = match (start, duration_seconds) {
            (Some(start), Some(seconds)) => Duration::from_std(StdDuration::from_secs(seconds))
                .ok()
                .and_then(|duration| start.checked_add_signed(duration)),
            _ => None,
        };
    }

    pub fn set_start_position(&mut self, latlng: Option<&[f64]>) {
        let (latitude, longitude) = split_latlng(latlng);
        self.start_latitude = latitude;
        self.start_longitude = longitude;
    }

    pub fn set_end_position(&mut self, latlng: Option<&[f64]>) {
        let (latitude, longitude) = split_latlng(latlng);
        self.end_latitude = latitude;
        self.end_longitude = longitude;
    }
}

// Both halves or neither.
fn split_latlng(latlng: Option<&[f64]>) -> (Option<f64>, Option<f64>) {
    match latlng {
        Some([latitude, longitude, ..]) => (Some(*latitude), Some(*longitude)),
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BaseVertical;
    use chrono::TimeZone;

    fn activity() -> PhysicalActivity {
        PhysicalActivity::new(SocialPosting::new(BaseVertical::new(
            Vertical::PhysicalActivity,
            "Strava",
            "1",
        )))
    }

    #[test]
    fn end_is_start_plus_duration() {
        let start = Utc.with_ymd_and_hms(2018, 5, 2, 12, 15, 9).unwrap();
        let mut activity = activity();
        activity.set_timing(Some(start), Some(4500));
        assert_eq!(activity.start_datetime, Some(start));
        assert_eq!(
            activity.end_datetime,
            Some(Utc.with_ymd_and_hms(2018, 5, 2, 13, 30, 9).unwrap())
        );
    }

    #[test]
    fn end_is_unknown_without_duration_or_start() {
        let start = Utc.with_ymd_and_hms(2018, 5, 2, 12, 15, 9).unwrap();
        let mut activity = activity();
        activity.set_timing(Some(start), None);
        assert_eq!(activity.end_datetime, None);
        activity.set_timing(None, Some(4500));
        assert_eq!(activity.end_datetime, None);
    }

    #[test]
    fn positions_are_never_half_populated() {
        let mut activity = activity();
        activity.set_start_position(Some(&[41.41, -41.41]));
        assert_eq!(activity.start_latitude, Some(41.41));
        assert_eq!(activity.start_longitude, Some(-41.41));

        activity.set_end_position(Some(&[42.42]));
        assert_eq!((activity.end_latitude, activity.end_longitude), (None, None));
        activity.set_end_position(None);
        assert_eq!((activity.end_latitude, activity.end_longitude), (None, None));
    }

    #[test]
    fn vertical_name_is_physical_activity() {
        assert_eq!(
            activity().posting.base.vertical_name,
            Vertical::PhysicalActivity
        );
    }
}
