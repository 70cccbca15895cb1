//! The recurrence engine.
//!
//! Recurring templates carry a due-date cursor (`next_due`). Syncing a user
//! walks each of their templates, stamps one concrete transaction for every
//! due date up to and including today, and advances the cursor past today.
//! The cursor is advanced with a compare-and-swap before any transactions are
//! inserted, so two overlapping syncs cannot both generate from the same
//! template.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::{
    Error,
    models::{Recurrence, Transaction, UserID},
    stores::TransactionStore,
};

/// The result of syncing a user's recurring templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// How many transactions were created.
    pub generated: u32,
    /// How many templates were checked successfully.
    pub processed: u32,
    /// How many templates were skipped due to an error or a concurrent sync.
    pub skipped: u32,
}

/// Generate all overdue transactions for a user's recurring templates.
///
/// Each template is handled independently: an error while generating from one
/// template counts it as skipped and does not stop the rest of the sync.
///
/// # Errors
/// Returns an error if the user's templates could not be listed.
pub fn sync<T>(store: &T, user_id: UserID, today: Date) -> Result<SyncOutcome, Error>
where
    T: TransactionStore,
{
    let templates = store.get_templates(user_id)?;
    let mut outcome = SyncOutcome::default();

    for template in templates {
        match sync_template(store, &template, today) {
            Ok(generated) => {
                outcome.processed += 1;
                outcome.generated += generated;
            }
            Err(error) => {
                tracing::warn!(
                    template_id = template.id(),
                    "skipping recurring template: {error}"
                );
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Generate the overdue transactions for a single template, returning how
/// many were created.
fn sync_template<T>(store: &T, template: &Transaction, today: Date) -> Result<u32, Error>
where
    T: TransactionStore,
{
    let recurrence = template.recurrence().ok_or(Error::MissingRecurrence)?;

    // A template that has never been synced starts its schedule one interval
    // after its own date.
    let cursor = match template.next_due() {
        Some(date) => date,
        None => next_occurrence(template.date(), recurrence)?,
    };

    let mut run_date = cursor;
    let mut due_dates = Vec::new();

    while run_date <= today {
        due_dates.push(run_date);
        run_date = next_occurrence(run_date, recurrence)?;
    }

    if due_dates.is_empty() {
        // Nothing due yet, but a freshly initialised cursor is still
        // persisted so later syncs resume from the same schedule.
        if template.next_due().is_none() {
            store.claim_next_due(template.id(), template.user_id(), None, cursor)?;
        }

        return Ok(0);
    }

    // Claim the cursor first. If another sync got there in the meantime this
    // fails with a conflict and no transactions are inserted.
    store.claim_next_due(template.id(), template.user_id(), template.next_due(), run_date)?;

    for due_date in &due_dates {
        store.insert(
            Transaction::build(
                template.title(),
                template.amount(),
                template.kind(),
                template.user_id(),
            )?
            .category(template.category())
            .date(*due_date)
            .generated_from(template.id()),
        )?;
    }

    Ok(due_dates.len() as u32)
}

/// The date one recurrence interval after `date`.
///
/// Monthly and yearly intervals clamp the day of the month when the target
/// month is shorter, e.g. monthly from January 31st lands on February 29th in
/// a leap year.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the result cannot be represented.
pub fn next_occurrence(date: Date, recurrence: Recurrence) -> Result<Date, Error> {
    match recurrence {
        Recurrence::Weekly => date
            .checked_add(Duration::days(7))
            .ok_or(Error::DateOutOfRange),
        Recurrence::Monthly => {
            let (year, month) = match date.month() {
                Month::December => (date.year() + 1, Month::January),
                month => (date.year(), month.next()),
            };
            let day = date.day().min(last_day_of_month(year, month));

            Date::from_calendar_date(year, month, day).map_err(|_| Error::DateOutOfRange)
        }
        Recurrence::Yearly => {
            let year = date.year() + 1;
            let day = date.day().min(last_day_of_month(year, date.month()));

            Date::from_calendar_date(year, date.month(), day).map_err(|_| Error::DateOutOfRange)
        }
    }
}

/// The number of days in the given month.
fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February if is_leap_year(year) => 29,
        Month::February => 28,
    }
}

/// Check if the given year is a leap year in the Gregorian calendar.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod next_occurrence_tests {
    use time::macros::date;

    use crate::models::Recurrence;

    use super::next_occurrence;

    #[test]
    fn weekly_adds_seven_days() {
        let next = next_occurrence(date!(2024 - 03 - 28), Recurrence::Weekly).unwrap();

        assert_eq!(next, date!(2024 - 04 - 04));
    }

    #[test]
    fn monthly_keeps_day_when_it_fits() {
        let next = next_occurrence(date!(2024 - 03 - 15), Recurrence::Monthly).unwrap();

        assert_eq!(next, date!(2024 - 04 - 15));
    }

    #[test]
    fn monthly_clamps_to_shorter_month() {
        let next = next_occurrence(date!(2024 - 01 - 31), Recurrence::Monthly).unwrap();

        assert_eq!(next, date!(2024 - 02 - 29));
    }

    #[test]
    fn monthly_clamps_to_february_in_common_year() {
        let next = next_occurrence(date!(2023 - 01 - 31), Recurrence::Monthly).unwrap();

        assert_eq!(next, date!(2023 - 02 - 28));
    }

    #[test]
    fn monthly_rolls_over_december() {
        let next = next_occurrence(date!(2024 - 12 - 31), Recurrence::Monthly).unwrap();

        assert_eq!(next, date!(2025 - 01 - 31));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = next_occurrence(date!(2024 - 02 - 29), Recurrence::Yearly).unwrap();

        assert_eq!(next, date!(2025 - 02 - 28));
    }

    #[test]
    fn yearly_keeps_ordinary_dates() {
        let next = next_occurrence(date!(2024 - 07 - 04), Recurrence::Yearly).unwrap();

        assert_eq!(next, date!(2025 - 07 - 04));
    }
}

#[cfg(test)]
mod sync_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        models::{PasswordHash, Recurrence, Transaction, TransactionKind, UserID},
        stores::{TransactionStore, UserStore, sqlite::{SqliteTransactionStore, SqliteUserStore}},
    };

    use super::{SyncOutcome, sync};

    fn get_store_and_user() -> (SqliteTransactionStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SqliteUserStore::new(connection.clone())
            .create(
                "Ruby",
                EmailAddress::from_str("ruby@example.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        (SqliteTransactionStore::new(connection), user.id())
    }

    #[test]
    fn sync_without_templates_does_nothing() {
        let (store, user_id) = get_store_and_user();

        let outcome = sync(&store, user_id, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(outcome, SyncOutcome::default());
    }

    #[test]
    fn first_sync_catches_up_from_template_date() {
        let (store, user_id) = get_store_and_user();
        let template = store
            .insert(
                Transaction::build("Rent", 1500.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 15))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        let outcome = sync(&store, user_id, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                generated: 2,
                processed: 1,
                skipped: 0
            }
        );

        let generated_dates: Vec<_> = store
            .get_for_user(user_id)
            .unwrap()
            .into_iter()
            .filter(|transaction| transaction.generated_from() == Some(template.id()))
            .map(|transaction| transaction.date())
            .collect();
        assert_eq!(generated_dates, vec![date!(2024 - 03 - 15), date!(2024 - 02 - 15)]);

        let cursor = store.get(template.id()).unwrap().next_due();
        assert_eq!(cursor, Some(date!(2024 - 04 - 15)));
    }

    #[test]
    fn catch_up_generates_every_missed_month() {
        let (store, user_id) = get_store_and_user();
        let template = store
            .insert(
                Transaction::build("Rent", 1500.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 01))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        let outcome = sync(&store, user_id, date!(2024 - 04 - 15)).unwrap();

        assert_eq!(outcome.generated, 3);
        let cursor = store.get(template.id()).unwrap().next_due();
        assert_eq!(cursor, Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn generated_transactions_are_never_templates() {
        let (store, user_id) = get_store_and_user();
        let template = store
            .insert(
                Transaction::build("Rent", 1500.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 01))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        sync(&store, user_id, date!(2024 - 04 - 15)).unwrap();

        for transaction in store.get_for_user(user_id).unwrap() {
            if transaction.generated_from() == Some(template.id()) {
                assert!(!transaction.is_template());
                assert_eq!(transaction.recurrence(), None);
            }
        }
    }

    #[test]
    fn occurrence_due_today_is_generated() {
        let (store, user_id) = get_store_and_user();
        store
            .insert(
                Transaction::build("Allowance", 20.0, TransactionKind::Income, user_id)
                    .unwrap()
                    .date(date!(2024 - 03 - 13))
                    .recurring(Recurrence::Weekly),
            )
            .unwrap();

        let outcome = sync(&store, user_id, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(outcome.generated, 1);
    }

    #[test]
    fn template_with_nothing_due_is_processed_without_output() {
        let (store, user_id) = get_store_and_user();
        let template = store
            .insert(
                Transaction::build("Rent", 1500.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 03 - 15))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        let outcome = sync(&store, user_id, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                generated: 0,
                processed: 1,
                skipped: 0
            }
        );

        // The first sync still pins the schedule down.
        let cursor = store.get(template.id()).unwrap().next_due();
        assert_eq!(cursor, Some(date!(2024 - 04 - 15)));
    }

    #[test]
    fn sync_is_idempotent_for_the_same_day() {
        let (store, user_id) = get_store_and_user();
        store
            .insert(
                Transaction::build("Gym", 25.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 02 - 01))
                    .recurring(Recurrence::Weekly),
            )
            .unwrap();

        let first = sync(&store, user_id, date!(2024 - 03 - 01)).unwrap();
        let second = sync(&store, user_id, date!(2024 - 03 - 01)).unwrap();

        assert!(first.generated > 0);
        assert_eq!(second.generated, 0);
        assert_eq!(second.processed, 1);
    }

    #[test]
    fn clamped_schedule_drifts_with_short_months() {
        let (store, user_id) = get_store_and_user();
        let template = store
            .insert(
                Transaction::build("Payday", 5000.0, TransactionKind::Income, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 31))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        sync(&store, user_id, date!(2024 - 03 - 31)).unwrap();

        let generated_dates: Vec<_> = store
            .get_for_user(user_id)
            .unwrap()
            .into_iter()
            .filter(|transaction| transaction.generated_from() == Some(template.id()))
            .map(|transaction| transaction.date())
            .collect();

        // The clamp applies to the running date, so the day drifts after a
        // short month.
        assert_eq!(generated_dates, vec![date!(2024 - 03 - 29), date!(2024 - 02 - 29)]);
    }

    #[test]
    fn template_without_recurrence_is_skipped() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));
        let store = SqliteTransactionStore::new(connection.clone());
        let user_id = SqliteUserStore::new(connection.clone())
            .create(
                "Ruby",
                EmailAddress::from_str("ruby@example.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap()
            .id();

        let template = store
            .insert(
                Transaction::build("Broken", 10.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 01))
                    .recurring(Recurrence::Weekly),
            )
            .unwrap();
        // Corrupt the stored recurrence so it maps back as unset.
        connection
            .lock()
            .unwrap()
            .execute(
                "UPDATE \"transaction\" SET recurrence = 'fortnightly' WHERE id = ?1",
                [template.id()],
            )
            .unwrap();

        let outcome = sync(&store, user_id, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                generated: 0,
                processed: 0,
                skipped: 1
            }
        );
    }

    #[test]
    fn sync_only_touches_the_given_user() {
        let (store, user_id) = get_store_and_user();
        store
            .insert(
                Transaction::build("Rent", 1500.0, TransactionKind::Expense, user_id)
                    .unwrap()
                    .date(date!(2024 - 01 - 01))
                    .recurring(Recurrence::Monthly),
            )
            .unwrap();

        let outcome = sync(&store, UserID::new(user_id.as_i64() + 1), date!(2024 - 03 - 20))
            .unwrap();

        assert_eq!(outcome, SyncOutcome::default());
    }
}
