// Age derivation from season year and birth date.
//
// Age is the whole number of 365-day years between a birth anchor and a
// season anchor. The anchors depend on the configured `AgeConvention`.

use crate::records::{AgedRecord, JoinedRecord, PlayerRecord};
use agecurve_core::AgeConvention;
use chrono::NaiveDate;

const DAYS_PER_YEAR: i64 = 365;

fn season_anchor(season: i32, convention: AgeConvention) -> Option<NaiveDate> {
    match convention {
        AgeConvention::CalendarYear => NaiveDate::from_ymd_opt(season, 1, 1),
        AgeConvention::MidSeason => NaiveDate::from_ymd_opt(season, 6, 30),
    }
}

fn birth_anchor(player: &PlayerRecord, convention: AgeConvention) -> Option<NaiveDate> {
    let year = player.birth_year?;
    let january_first = || NaiveDate::from_ymd_opt(year, 1, 1);
    match convention {
        AgeConvention::CalendarYear => january_first(),
        // An impossible recorded date (e.g. month 13) falls back to the year.
        AgeConvention::MidSeason => player
            .birth_month
            .zip(player.birth_day)
            .and_then(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
            .or_else(january_first),
    }
}

/// Age in whole years, or `None` when either year is missing or out of
/// calendar range. With calendar-year anchors a non-negative span gives the
/// year difference; negative spans floor toward negative infinity, so a
/// leap season can land one below it.
pub fn age_in_years(
    season: Option<i32>,
    player: &PlayerRecord,
    convention: AgeConvention,
) -> Option<i32> {
    let season = season_anchor(season?, convention)?;
    let birth = birth_anchor(player, convention)?;
    let days = season.signed_duration_since(birth).num_days();
    i32::try_from(days.div_euclid(DAYS_PER_YEAR)).ok()
}

/// Attach an age to every joined record. The second element counts
/// records dropped because their age is undefined.
pub fn derive_ages<'a>(
    joined: Vec<JoinedRecord<'a>>,
    convention: AgeConvention,
) -> (Vec<AgedRecord<'a>>, usize) {
    let mut aged = Vec::with_capacity(joined.len());
    let mut undefined = 0;
    for record in joined {
        match age_in_years(record.performance.season, record.player, convention) {
            Some(age) => aged.push(AgedRecord {
                joined: record,
                age,
            }),
            None => undefined += 1,
        }
    }
    (aged, undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PerformanceRecord;

    fn calendar(season: i32, birth_year: i32) -> Option<i32> {
        age_in_years(
            Some(season),
            &PlayerRecord::new("p", Some(birth_year)),
            AgeConvention::CalendarYear,
        )
    }

    #[test]
    fn calendar_year_matches_year_difference() {
        assert_eq!(calendar(2020, 1990), Some(30));
        assert_eq!(calendar(2020, 1995), Some(25));
        assert_eq!(calendar(2020, 2000), Some(20));
        // Spans covering 8 leap days still floor to the year difference.
        assert_eq!(calendar(2024, 1992), Some(32));
        assert_eq!(calendar(1900, 1871), Some(29));
    }

    #[test]
    fn same_year_is_zero() {
        assert_eq!(calendar(2020, 2020), Some(0));
    }

    #[test]
    fn birth_after_season_floors_negative() {
        // 2020 is a leap year, so the span is -366 days.
        assert_eq!(calendar(2020, 2021), Some(-2));
        assert_eq!(calendar(2019, 2020), Some(-1));
    }

    #[test]
    fn missing_years_are_undefined() {
        let player = PlayerRecord::new("p", None);
        assert_eq!(age_in_years(Some(2020), &player, AgeConvention::CalendarYear), None);
        let player = PlayerRecord::new("p", Some(1990));
        assert_eq!(age_in_years(None, &player, AgeConvention::CalendarYear), None);
    }

    #[test]
    fn mid_season_uses_birth_date() {
        let summer_birthday = PlayerRecord::new("p", Some(1990)).with_birth_date(8, 15);
        // Not yet 30 on June 30, 2020.
        assert_eq!(
            age_in_years(Some(2020), &summer_birthday, AgeConvention::MidSeason),
            Some(29)
        );
        assert_eq!(
            age_in_years(Some(2020), &summer_birthday, AgeConvention::CalendarYear),
            Some(30)
        );

        let spring_birthday = PlayerRecord::new("p", Some(1990)).with_birth_date(4, 1);
        assert_eq!(
            age_in_years(Some(2020), &spring_birthday, AgeConvention::MidSeason),
            Some(30)
        );
    }

    #[test]
    fn mid_season_invalid_birth_date_falls_back_to_year() {
        let player = PlayerRecord::new("p", Some(1990)).with_birth_date(13, 40);
        assert_eq!(
            age_in_years(Some(2020), &player, AgeConvention::MidSeason),
            Some(30)
        );
    }

    #[test]
    fn derive_ages_counts_undefined() {
        let with_year = PlayerRecord::new("a", Some(1990));
        let without_year = PlayerRecord::new("b", None);
        let perf_a = PerformanceRecord::new("a", Some(2020));
        let perf_a_no_season = PerformanceRecord::new("a", None);
        let perf_b = PerformanceRecord::new("b", Some(2020));
        let joined = vec![
            JoinedRecord { performance: &perf_a, player: &with_year },
            JoinedRecord { performance: &perf_a_no_season, player: &with_year },
            JoinedRecord { performance: &perf_b, player: &without_year },
        ];

        let (aged, undefined) = derive_ages(joined, AgeConvention::CalendarYear);
        assert_eq!(aged.len(), 1);
        assert_eq!(aged[0].age, 30);
        assert_eq!(undefined, 2);
    }
}
