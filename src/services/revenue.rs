use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct RevenueBucket {
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub fn parse(s: &str) -> Self {
        match s {
            "weekly" => Period::Week,
            "monthly" => Period::Month,
            _ => Period::Day,
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    let first = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first.unwrap_or(date)
}

fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

fn next_year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(date)
}

// Sums run over Decimal in Rust rather than SQL so cents never drift
// through float coercion.
fn bucketize<K: Ord>(
    rows: Vec<queries::RevenueRow>,
    key_and_label: impl Fn(NaiveDate) -> (K, String),
) -> Vec<RevenueBucket> {
    let mut buckets: BTreeMap<K, (String, Decimal)> = BTreeMap::new();
    for row in rows {
        let Some(amount) = row.amount else {
            tracing::warn!(
                booking = row.id,
                "approved booking has no payment, excluded from revenue"
            );
            continue;
        };
        let (key, label) = key_and_label(row.booking_date.date());
        let entry = buckets.entry(key).or_insert((label, Decimal::ZERO));
        entry.1 += amount;
    }

    buckets
        .into_values()
        .map(|(label, amount)| RevenueBucket { label, amount })
        .collect()
}

/// Approved revenue per weekday for the week containing `today`, Monday first.
pub fn daily_revenue(conn: &Connection, today: NaiveDate) -> Result<Vec<RevenueBucket>, AppError> {
    let start = week_start(today);
    let rows = queries::approved_revenue_rows(
        conn,
        &midnight(start),
        &midnight(start + Duration::days(7)),
    )?;
    Ok(bucketize(rows, |date| {
        (
            date.weekday().num_days_from_monday(),
            date.format("%a").to_string(),
        )
    }))
}

/// Approved revenue per ISO week for the month containing `today`.
pub fn weekly_revenue(conn: &Connection, today: NaiveDate) -> Result<Vec<RevenueBucket>, AppError> {
    let rows = queries::approved_revenue_rows(
        conn,
        &midnight(month_start(today)),
        &midnight(next_month_start(today)),
    )?;
    Ok(bucketize(rows, |date| {
        let week = date.iso_week().week();
        (week, format!("Week {week}"))
    }))
}

/// Approved revenue per month for the year containing `today`.
pub fn monthly_revenue(conn: &Connection, today: NaiveDate) -> Result<Vec<RevenueBucket>, AppError> {
    let rows = queries::approved_revenue_rows(
        conn,
        &midnight(year_start(today)),
        &midnight(next_year_start(today)),
    )?;
    Ok(bucketize(rows, |date| {
        (date.month(), date.format("%b").to_string())
    }))
}

pub fn revenue_series(
    conn: &Connection,
    period: Period,
    today: NaiveDate,
) -> Result<Vec<RevenueBucket>, AppError> {
    match period {
        Period::Day => daily_revenue(conn, today),
        Period::Week => weekly_revenue(conn, today),
        Period::Month => monthly_revenue(conn, today),
    }
}

fn total_between(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Result<Decimal, AppError> {
    let rows = queries::approved_revenue_rows(conn, start, end)?;
    Ok(rows.into_iter().filter_map(|r| r.amount).sum())
}

/// Sum of approved booking payments for one calendar day.
pub fn total_for_date(conn: &Connection, date: NaiveDate) -> Result<Decimal, AppError> {
    total_between(conn, &midnight(date), &midnight(date + Duration::days(1)))
}

/// Sum of approved booking payments for the day, week or month containing
/// `today`.
pub fn total_for_period(
    conn: &Connection,
    period: Period,
    today: NaiveDate,
) -> Result<Decimal, AppError> {
    let (start, end) = match period {
        Period::Day => (today, today + Duration::days(1)),
        Period::Week => {
            let start = week_start(today);
            (start, start + Duration::days(7))
        }
        Period::Month => (month_start(today), next_month_start(today)),
    };
    total_between(conn, &midnight(start), &midnight(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus, Payment};
    use crate::services::booking::generate_booking_id;
    use std::str::FromStr;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn seed_booking(
        conn: &Connection,
        user_id: i64,
        booked_at: &str,
        amount: Option<&str>,
        status: BookingStatus,
    ) {
        let payment_id = amount.map(|a| {
            let payment = Payment {
                id: 0,
                amount: dec(a),
                payment_date: None,
                status: Some("PAID".to_string()),
                qr_code_url: None,
                transaction_id: None,
                user_id: Some(user_id),
            };
            queries::create_payment(conn, &payment).unwrap()
        });

        let booking = Booking {
            id: 0,
            booking_id: generate_booking_id(conn).unwrap(),
            booking_date: dt(booked_at),
            status,
            user_id: Some(user_id),
            time_slot_id: None,
            payment_id,
        };
        queries::create_booking(conn, &booking).unwrap();
    }

    #[test]
    fn total_counts_only_approved_bookings() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        // 2026-03-03 is a Tuesday.
        seed_booking(&conn, user.id, "2026-03-03 09:00", Some("10.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 10:00", Some("12.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 11:00", Some("100.00"), BookingStatus::Rejected);
        seed_booking(&conn, user.id, "2026-03-03 12:00", Some("7.00"), BookingStatus::Pending);

        let total = total_for_date(&conn, date("2026-03-03")).unwrap();
        assert_eq!(total, dec("22.00"));
        assert_eq!(total.to_string(), "22.00");
    }

    #[test]
    fn daily_buckets_cover_current_week_in_weekday_order() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        // Week of Mon 2026-03-02 through Sun 2026-03-08.
        seed_booking(&conn, user.id, "2026-03-03 10:00", Some("12.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-02 10:00", Some("10.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 15:00", Some("5.50"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 16:00", Some("99.00"), BookingStatus::Rejected);
        // Previous week, outside the window.
        seed_booking(&conn, user.id, "2026-02-27 10:00", Some("40.00"), BookingStatus::Approved);

        let buckets = daily_revenue(&conn, date("2026-03-05")).unwrap();
        let got: Vec<(String, Decimal)> =
            buckets.into_iter().map(|b| (b.label, b.amount)).collect();
        assert_eq!(
            got,
            vec![
                ("Mon".to_string(), dec("10.00")),
                ("Tue".to_string(), dec("17.50")),
            ]
        );
    }

    #[test]
    fn weekly_buckets_cover_current_month() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        // March 2026: Mon 2026-03-02 opens ISO week 10.
        seed_booking(&conn, user.id, "2026-03-03 10:00", Some("10.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-10 10:00", Some("20.00"), BookingStatus::Approved);
        // April booking stays out of the March series.
        seed_booking(&conn, user.id, "2026-04-01 10:00", Some("70.00"), BookingStatus::Approved);

        let buckets = weekly_revenue(&conn, date("2026-03-15")).unwrap();
        let got: Vec<(String, Decimal)> =
            buckets.into_iter().map(|b| (b.label, b.amount)).collect();
        assert_eq!(
            got,
            vec![
                ("Week 10".to_string(), dec("10.00")),
                ("Week 11".to_string(), dec("20.00")),
            ]
        );
    }

    #[test]
    fn monthly_buckets_cover_current_year() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        seed_booking(&conn, user.id, "2026-01-15 10:00", Some("10.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 10:00", Some("20.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-20 10:00", Some("2.50"), BookingStatus::Approved);
        // Previous year.
        seed_booking(&conn, user.id, "2025-12-31 10:00", Some("99.00"), BookingStatus::Approved);

        let buckets = monthly_revenue(&conn, date("2026-06-01")).unwrap();
        let got: Vec<(String, Decimal)> =
            buckets.into_iter().map(|b| (b.label, b.amount)).collect();
        assert_eq!(
            got,
            vec![
                ("Jan".to_string(), dec("10.00")),
                ("Mar".to_string(), dec("22.50")),
            ]
        );
    }

    #[test]
    fn weekly_total_spans_monday_to_sunday() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        seed_booking(&conn, user.id, "2026-03-02 08:00", Some("10.00"), BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-08 22:00", Some("5.00"), BookingStatus::Approved);
        // Sunday of the previous week.
        seed_booking(&conn, user.id, "2026-03-01 10:00", Some("80.00"), BookingStatus::Approved);

        let total = total_for_period(&conn, Period::Week, date("2026-03-05")).unwrap();
        assert_eq!(total, dec("15.00"));
    }

    #[test]
    fn approved_booking_without_payment_is_excluded() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();

        seed_booking(&conn, user.id, "2026-03-03 10:00", None, BookingStatus::Approved);
        seed_booking(&conn, user.id, "2026-03-03 11:00", Some("12.00"), BookingStatus::Approved);

        assert_eq!(total_for_date(&conn, date("2026-03-03")).unwrap(), dec("12.00"));

        let buckets = daily_revenue(&conn, date("2026-03-03")).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].amount, dec("12.00"));
    }

    #[test]
    fn period_parse_defaults_to_day() {
        assert_eq!(Period::parse("daily"), Period::Day);
        assert_eq!(Period::parse("weekly"), Period::Week);
        assert_eq!(Period::parse("monthly"), Period::Month);
        assert_eq!(Period::parse("anything-else"), Period::Day);
    }

    #[test]
    fn week_start_is_stable_across_the_week() {
        let monday = date("2026-03-02");
        assert_eq!(week_start(monday), monday);
        assert_eq!(week_start(date("2026-03-05")), monday);
        assert_eq!(week_start(date("2026-03-08")), monday);
        assert_eq!(week_start(date("2026-03-09")), date("2026-03-09"));
    }
}
