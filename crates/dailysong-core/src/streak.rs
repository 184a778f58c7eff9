use chrono::NaiveDate;
use dailysong_types::api::StreakResponse;
use dailysong_types::models::User;

/// Derived posting-streak state stored on a user.
///
/// Invariants: `longest >= current`, and `current == 0` exactly when no post
/// has been recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_post_date: Option<NaiveDate>,
}

/// Which rule `Streak::record_post` applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakStep {
    /// First post ever.
    Started,
    /// Posted the day after the previous post.
    Extended,
    /// Same date as the previous post; nothing to count.
    Unchanged,
    /// Any other gap, including a date before the previous post.
    Reset,
}

impl Streak {
    pub fn new(current: u32, longest: u32, last_post_date: Option<NaiveDate>) -> Self {
        Self { current, longest, last_post_date }
    }

    /// Applies one accepted post to the streak.
    ///
    /// The caller guarantees `(user, posted_date)` was not posted before; a
    /// repeated date is tolerated as a no-op.
    pub fn record_post(&mut self, posted_date: NaiveDate) -> StreakStep {
        let step = match self.last_post_date {
            None => {
                self.current = 1;
                self.longest = self.longest.max(1);
                StreakStep::Started
            }
            Some(last) => match (posted_date - last).num_days() {
                1 => {
                    self.current += 1;
                    self.longest = self.longest.max(self.current);
                    StreakStep::Extended
                }
                0 => StreakStep::Unchanged,
                _ => {
                    self.current = 1;
                    StreakStep::Reset
                }
            },
        };

        self.last_post_date = Some(posted_date);
        step
    }

    /// Recomputes a streak from scratch by replaying post dates in the order
    /// given. Callers pass dates ascending.
    pub fn rebuild_from_history<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut streak = Self::default();
        for date in dates {
            streak.record_post(date);
        }
        streak
    }
}

impl From<Streak> for StreakResponse {
    fn from(streak: Streak) -> Self {
        Self {
            current_streak: streak.current,
            longest_streak: streak.longest,
            last_post_date: streak.last_post_date,
        }
    }
}

impl From<&User> for Streak {
    fn from(user: &User) -> Self {
        Self::new(user.current_streak, user.longest_streak, user.last_post_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn first_post_starts_streak() {
        let mut streak = Streak::default();
        assert_eq!(streak.record_post(day(5)), StreakStep::Started);
        assert_eq!(streak, Streak::new(1, 1, Some(day(5))));
    }

    #[test]
    fn consecutive_days_count_up() {
        let mut streak = Streak::default();
        for (n, d) in (1..=10).enumerate() {
            streak.record_post(day(d));
            assert_eq!(streak.current, n as u32 + 1);
            assert_eq!(streak.longest, streak.current);
        }
    }

    #[test]
    fn next_day_extends_and_gap_resets() {
        let base = Streak::new(5, 5, Some(day(5)));

        let mut next = base;
        assert_eq!(next.record_post(day(6)), StreakStep::Extended);
        assert_eq!(next.current, 6);
        assert_eq!(next.longest, 6);

        let mut gap = base;
        assert_eq!(gap.record_post(day(10)), StreakStep::Reset);
        assert_eq!(gap.current, 1);
        assert_eq!(gap.longest, 5);
        assert_eq!(gap.last_post_date, Some(day(10)));
    }

    #[test]
    fn same_day_is_a_no_op() {
        let mut streak = Streak::new(3, 4, Some(day(5)));
        assert_eq!(streak.record_post(day(5)), StreakStep::Unchanged);
        assert_eq!(streak, Streak::new(3, 4, Some(day(5))));
    }

    #[test]
    fn backdated_post_resets_and_moves_last_date() {
        let mut streak = Streak::new(3, 3, Some(day(10)));
        assert_eq!(streak.record_post(day(2)), StreakStep::Reset);
        assert_eq!(streak, Streak::new(1, 3, Some(day(2))));
    }

    #[test]
    fn longest_survives_reset() {
        let mut streak = Streak::default();
        for d in [1, 2, 3, 4, 10, 11, 20] {
            let before = streak.longest;
            streak.record_post(day(d));
            assert!(streak.longest >= before);
            assert!(streak.longest >= streak.current);
        }
        assert_eq!(streak, Streak::new(1, 4, Some(day(20))));
    }

    #[test]
    fn first_post_keeps_repaired_longest() {
        let mut streak = Streak::new(0, 7, None);
        streak.record_post(day(1));
        assert_eq!(streak, Streak::new(1, 7, Some(day(1))));
    }

    #[test]
    fn rebuild_matches_incremental() {
        let history = [1, 2, 3, 5, 6, 9, 10, 11, 12, 20];

        let mut incremental = Streak::default();
        for d in history {
            incremental.record_post(day(d));
        }

        let rebuilt = Streak::rebuild_from_history(history.map(day));
        assert_eq!(rebuilt, incremental);
        assert_eq!(rebuilt, Streak::new(1, 4, Some(day(20))));
    }

    #[test]
    fn rebuild_of_nothing_is_empty() {
        assert_eq!(Streak::rebuild_from_history(std::iter::empty()), Streak::default());
    }
}
