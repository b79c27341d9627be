use chrono::{DateTime, Duration, Utc};

/// Number of tier boundaries: the early cutoff plus weeks 1 through 5.
pub const BOUNDARY_COUNT: usize = 6;

/// Days between the early cutoff and the start of week 1.
const EARLY_CUTOFF_DAYS: i64 = 14;

static BOUNDARY_LABELS: [&str; BOUNDARY_COUNT] = [
    "early cutoff",
    "week 1",
    "week 2",
    "week 3",
    "week 4",
    "week 5",
];

/// The six dates that separate refund tiers for one season.
///
/// Index 0 is the early cutoff (two weeks before week 1); indexes 1..=5 are
/// the starts of weeks 1 through 5. Boundaries are always non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSchedule {
    boundaries: [DateTime<Utc>; BOUNDARY_COUNT],
}

impl WeekSchedule {
    /// Build the unshifted schedule for a season starting at `season_start`.
    #[must_use]
    pub fn new(season_start: DateTime<Utc>) -> Self {
        let mut boundaries = [season_start; BOUNDARY_COUNT];
        boundaries[0] = season_start - Duration::days(EARLY_CUTOFF_DAYS);
        for week in 2..BOUNDARY_COUNT {
            boundaries[week] = boundaries[week - 1] + Duration::weeks(1);
        }
        Self { boundaries }
    }

    /// Build the schedule and apply every off-date in ascending order.
    ///
    /// The input does not need to be sorted.
    #[must_use]
    pub fn with_off_dates(season_start: DateTime<Utc>, off_dates: &[DateTime<Utc>]) -> Self {
        let mut sorted = off_dates.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut schedule = Self::new(season_start);
        for off_date in sorted {
            schedule.apply_off_date(off_date);
        }
        schedule
    }

    /// Shift the first boundary falling on `off_date`, and every boundary
    /// after it, one week later. Returns `false` when no boundary matches.
    pub fn apply_off_date(&mut self, off_date: DateTime<Utc>) -> bool {
        let target = off_date.date_naive();
        let Some(start) = self
            .boundaries
            .iter()
            .position(|b| b.date_naive() == target)
        else {
            return false;
        };

        for boundary in &mut self.boundaries[start..] {
            *boundary += Duration::weeks(1);
        }
        tracing::debug!(
            off_date = %target,
            shifted_from = BOUNDARY_LABELS[start],
            "applied off-date"
        );
        true
    }

    #[must_use]
    pub fn boundaries(&self) -> &[DateTime<Utc>; BOUNDARY_COUNT] {
        &self.boundaries
    }

    #[must_use]
    pub fn early_cutoff(&self) -> DateTime<Utc> {
        self.boundaries[0]
    }

    /// Start of week `n` (1-based), or `None` outside 1..=5.
    #[must_use]
    pub fn week_start(&self, n: usize) -> Option<DateTime<Utc>> {
        (1..BOUNDARY_COUNT)
            .contains(&n)
            .then(|| self.boundaries[n])
    }

    /// Start of the last week that still earns a refund tier.
    #[must_use]
    pub fn final_week_start(&self) -> DateTime<Utc> {
        self.boundaries[BOUNDARY_COUNT - 1]
    }

    /// Index of the first boundary strictly after `submitted_at`, or `None`
    /// once week 5 has started.
    #[must_use]
    pub fn tier_index(&self, submitted_at: DateTime<Utc>) -> Option<usize> {
        self.boundaries.iter().position(|b| *b > submitted_at)
    }

    /// Boundaries paired with their display labels.
    pub fn labeled(&self) -> impl Iterator<Item = (&'static str, DateTime<Utc>)> + '_ {
        BOUNDARY_LABELS.iter().copied().zip(self.boundaries.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dates::anchor;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        anchor(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn new_schedule_has_early_cutoff_and_five_weeks() {
        let schedule = WeekSchedule::new(ymd(2025, 10, 20));
        assert_eq!(
            schedule.boundaries(),
            &[
                ymd(2025, 10, 6),
                ymd(2025, 10, 20),
                ymd(2025, 10, 27),
                ymd(2025, 11, 3),
                ymd(2025, 11, 10),
                ymd(2025, 11, 17),
            ]
        );
        assert_eq!(schedule.early_cutoff(), ymd(2025, 10, 6));
        assert_eq!(schedule.final_week_start(), ymd(2025, 11, 17));
    }

    #[test]
    fn off_date_on_week_two_shifts_the_tail() {
        let schedule = WeekSchedule::with_off_dates(ymd(2025, 10, 20), &[ymd(2025, 10, 27)]);
        assert_eq!(
            schedule.boundaries(),
            &[
                ymd(2025, 10, 6),
                ymd(2025, 10, 20),
                ymd(2025, 11, 3),
                ymd(2025, 11, 10),
                ymd(2025, 11, 17),
                ymd(2025, 11, 24),
            ]
        );
    }

    #[test]
    fn off_date_on_last_week_only_shifts_last_boundary() {
        let schedule = WeekSchedule::with_off_dates(ymd(2025, 10, 20), &[ymd(2025, 11, 17)]);
        assert_eq!(schedule.week_start(4), Some(ymd(2025, 11, 10)));
        assert_eq!(schedule.week_start(5), Some(ymd(2025, 11, 24)));
    }

    #[test]
    fn consecutive_off_dates_compound() {
        // The second off-date only matches after the first one has shifted week 2 onto it.
        let schedule = WeekSchedule::with_off_dates(
            ymd(2025, 10, 20),
            &[ymd(2025, 10, 27), ymd(2025, 11, 3)],
        );
        assert_eq!(schedule.week_start(2), Some(ymd(2025, 11, 10)));
        assert_eq!(schedule.week_start(5), Some(ymd(2025, 12, 1)));
    }

    #[test]
    fn off_date_between_boundaries_is_ignored() {
        let mut schedule = WeekSchedule::new(ymd(2025, 10, 20));
        let before = schedule.clone();
        assert!(!schedule.apply_off_date(ymd(2025, 10, 22)));
        assert_eq!(schedule, before);
    }

    #[test]
    fn off_date_order_does_not_matter() {
        let start = ymd(2025, 10, 20);
        let a = WeekSchedule::with_off_dates(start, &[ymd(2025, 11, 3), ymd(2025, 10, 27)]);
        let b = WeekSchedule::with_off_dates(start, &[ymd(2025, 10, 27), ymd(2025, 11, 3)]);
        assert_eq!(a, b);
    }

    #[test]
    fn boundaries_stay_non_decreasing_after_shifts() {
        let schedule = WeekSchedule::with_off_dates(
            ymd(2025, 10, 20),
            &[ymd(2025, 10, 6), ymd(2025, 11, 10), ymd(2025, 11, 24)],
        );
        assert!(schedule.boundaries().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn tier_index_uses_strictly_greater_boundary() {
        let schedule = WeekSchedule::new(ymd(2025, 10, 20));
        assert_eq!(schedule.tier_index(ymd(2025, 9, 1)), Some(0));
        assert_eq!(schedule.tier_index(ymd(2025, 10, 6)), Some(1));
        assert_eq!(schedule.tier_index(ymd(2025, 10, 21)), Some(2));
        assert_eq!(schedule.tier_index(ymd(2025, 11, 17)), None);
    }

    #[test]
    fn week_start_rejects_out_of_range_weeks() {
        let schedule = WeekSchedule::new(ymd(2025, 10, 20));
        assert_eq!(schedule.week_start(0), None);
        assert_eq!(schedule.week_start(6), None);
        assert_eq!(schedule.week_start(1), Some(ymd(2025, 10, 20)));
    }

    #[test]
    fn labeled_pairs_every_boundary() {
        let schedule = WeekSchedule::new(ymd(2025, 10, 20));
        let labels: Vec<&str> = schedule.labeled().map(|(label, _)| label).collect();
        assert_eq!(labels.len(), BOUNDARY_COUNT);
        assert_eq!(labels[0], "early cutoff");
        assert_eq!(labels[5], "week 5");
    }
}
