//! This file defines the budget for a calendar month and the month key type
//! used to address it.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize, de, ser};
use time::{Date, Month};

use crate::models::{DatabaseID, UserID};

/// An error returned when parsing a string into a [MonthKey] fails.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0} is not a valid month key, expected the format YYYY-MM")]
pub struct ParseMonthKeyError(String);

/// A calendar month, e.g. March 2024, used to address budgets.
///
/// The canonical text form is `YYYY-MM` with a zero-padded month, so keys sort
/// chronologically as strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// Create a month key for the given year and month.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month key that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year of the month key.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the month key.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        // Day one is valid for every month `time` can represent.
        Date::from_calendar_date(self.year, self.month, 1)
            .expect("the first day of a representable month is always valid")
    }

    /// The key for the following calendar month.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl FromStr for MonthKey {
    type Err = ParseMonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = || ParseMonthKeyError(s.to_string());

        let (year_text, month_text) = s.split_once('-').ok_or_else(parse_error)?;

        if year_text.len() != 4 || month_text.len() != 2 {
            return Err(parse_error());
        }

        let year: i32 = year_text.parse().map_err(|_| parse_error())?;
        let month_number: u8 = month_text.parse().map_err(|_| parse_error())?;
        let month = Month::try_from(month_number).map_err(|_| parse_error())?;

        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// A user's spending limit for one calendar month.
///
/// Budgets are created and updated through
/// [BudgetStore::upsert](crate::stores::BudgetStore::upsert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    id: DatabaseID,
    user_id: UserID,
    month_key: MonthKey,
    amount: f64,
}

impl Budget {
    /// Create a budget from its parts.
    ///
    /// This is intended for use by store implementations mapping database rows
    /// back into the domain type.
    pub fn new(id: DatabaseID, user_id: UserID, month_key: MonthKey, amount: f64) -> Self {
        Self {
            id,
            user_id,
            month_key,
            amount,
        }
    }

    /// The ID of the budget row.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the user the budget belongs to.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The calendar month the budget applies to.
    pub fn month_key(&self) -> MonthKey {
        self.month_key
    }

    /// The spending limit for the month. Zero means no limit has been set.
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

#[cfg(test)]
mod month_key_tests {
    use time::{Month, macros::date};

    use super::MonthKey;

    #[test]
    fn display_zero_pads_month() {
        let key = MonthKey::new(2024, Month::March);

        assert_eq!(key.to_string(), "2024-03");
    }

    #[test]
    fn parses_canonical_form() {
        let key: MonthKey = "2024-12".parse().unwrap();

        assert_eq!(key, MonthKey::new(2024, Month::December));
    }

    #[test]
    fn rejects_unpadded_and_malformed_keys() {
        for text in ["2024-3", "2024", "24-03", "2024-13", "2024-00", "abcd-ef"] {
            assert!(text.parse::<MonthKey>().is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn from_date_uses_calendar_month() {
        let key = MonthKey::from_date(date!(2024 - 02 - 29));

        assert_eq!(key, MonthKey::new(2024, Month::February));
    }

    #[test]
    fn next_rolls_over_december() {
        let key = MonthKey::new(2024, Month::December).next();

        assert_eq!(key, MonthKey::new(2025, Month::January));
    }

    #[test]
    fn first_day_bounds_cover_the_month() {
        let key = MonthKey::new(2024, Month::February);

        assert_eq!(key.first_day(), date!(2024 - 02 - 01));
        assert_eq!(key.next().first_day(), date!(2024 - 03 - 01));
    }

    #[test]
    fn keys_sort_chronologically() {
        let earlier = MonthKey::new(2024, Month::September);
        let later = MonthKey::new(2024, Month::October);

        assert!(earlier < later);
        assert!(earlier.to_string() < later.to_string());
    }
}
