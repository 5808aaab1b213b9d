use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use rusqlite::Connection;

use crate::db::queries::{self, BookingDetails};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::notification::BookingNotice;
use crate::services::tier;
use crate::state::AppState;

const BOOKING_ID_SPACE: u32 = 100_000;
const MAX_ID_ATTEMPTS: u32 = 50;

pub struct SlotRequest {
    pub court_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

pub struct NewBooking {
    pub user_id: i64,
    pub slot: SlotRequest,
    pub payment_id: Option<i64>,
}

pub struct BookingUpdate {
    pub status: BookingStatus,
    pub user_id: Option<i64>,
    pub time_slot_id: Option<i64>,
    pub payment_id: Option<i64>,
}

#[derive(Default)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub user_id: Option<i64>,
    pub time_slot_id: Option<i64>,
    pub payment_id: Option<i64>,
}

/// Draw random five digit codes until one is free. The space is small on
/// purpose (codes are read over the phone at the front desk), so give up
/// after a bounded number of collisions instead of spinning.
pub fn generate_booking_id(conn: &Connection) -> Result<String, AppError> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = format!("{:05}", rng.gen_range(0..BOOKING_ID_SPACE));
        if !queries::booking_id_taken(conn, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(AppError::Config(format!(
        "could not allocate a unique booking id after {MAX_ID_ATTEMPTS} attempts"
    )))
}

pub fn create_booking(state: &AppState, new: NewBooking) -> Result<Booking, AppError> {
    if new.slot.start_time >= new.slot.end_time {
        return Err(AppError::Validation(
            "start_time must be before end_time".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let tx = db.unchecked_transaction()?;

    if queries::get_user(&tx, new.user_id)?.is_none() {
        return Err(AppError::NotFound(format!("user {}", new.user_id)));
    }
    if queries::get_court(&tx, new.slot.court_id)?.is_none() {
        return Err(AppError::NotFound(format!("court {}", new.slot.court_id)));
    }
    if let Some(payment_id) = new.payment_id {
        if queries::get_payment(&tx, payment_id)?.is_none() {
            return Err(AppError::NotFound(format!("payment {payment_id}")));
        }
    }
    if queries::find_active_booking_for_slot(
        &tx,
        new.slot.court_id,
        &new.slot.start_time,
        &new.slot.end_time,
    )?
    .is_some()
    {
        return Err(AppError::Conflict(
            "time slot is already booked for this court".to_string(),
        ));
    }

    let slot = queries::create_time_slot(
        &tx,
        &new.slot.start_time,
        &new.slot.end_time,
        Some(new.slot.court_id),
    )?;
    let booking_id = generate_booking_id(&tx)?;

    let mut booking = Booking {
        id: 0,
        booking_id,
        booking_date: Utc::now().naive_utc(),
        status: BookingStatus::Pending,
        user_id: Some(new.user_id),
        time_slot_id: Some(slot.id),
        payment_id: new.payment_id,
    };
    booking.id = queries::create_booking(&tx, &booking)?;

    tier::recompute_for_user(&tx, new.user_id)?;

    tx.commit()?;

    tracing::info!(booking = booking.id, booking_id = %booking.booking_id, "booking created");
    Ok(booking)
}

pub async fn approve_booking(state: &AppState, id: i64) -> Result<Booking, AppError> {
    transition_booking(state, id, BookingStatus::Approved).await
}

pub async fn reject_booking(state: &AppState, id: i64) -> Result<Booking, AppError> {
    transition_booking(state, id, BookingStatus::Rejected).await
}

// The status change commits before any email goes out. A failed or skipped
// notification never rolls the booking back.
async fn transition_booking(
    state: &AppState,
    id: i64,
    status: BookingStatus,
) -> Result<Booking, AppError> {
    let (booking, notice) = {
        let db = state.db.lock().unwrap();
        let Some(mut booking) = queries::get_booking(&db, id)? else {
            return Err(AppError::NotFound(format!("booking {id}")));
        };

        queries::update_booking_status(&db, id, status)?;
        booking.status = status;

        let notice = queries::get_booking_details(&db, id)?.and_then(notice_from_details);
        (booking, notice)
    };

    tracing::info!(booking = booking.id, status = status.as_str(), "booking status changed");
    notify(state, booking.id, status, notice).await;
    Ok(booking)
}

pub async fn replace_booking(
    state: &AppState,
    id: i64,
    update: BookingUpdate,
) -> Result<Booking, AppError> {
    let (booking, notice) = {
        let db = state.db.lock().unwrap();
        let Some(existing) = queries::get_booking(&db, id)? else {
            return Err(AppError::NotFound(format!("booking {id}")));
        };

        validate_booking_refs(&db, update.user_id, update.time_slot_id, update.payment_id)?;

        let booking = Booking {
            id,
            booking_id: existing.booking_id,
            booking_date: existing.booking_date,
            status: update.status,
            user_id: update.user_id,
            time_slot_id: update.time_slot_id,
            payment_id: update.payment_id,
        };
        queries::update_booking(&db, &booking)?;

        // An update that lands in APPROVED carries the same side effect as
        // an explicit approval.
        let notice = if booking.status == BookingStatus::Approved {
            queries::get_booking_details(&db, id)?.and_then(notice_from_details)
        } else {
            None
        };
        (booking, notice)
    };

    if booking.status == BookingStatus::Approved {
        notify(state, booking.id, BookingStatus::Approved, notice).await;
    }
    Ok(booking)
}

pub fn patch_booking(state: &AppState, id: i64, patch: BookingPatch) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();
    let Some(mut booking) = queries::get_booking(&db, id)? else {
        return Err(AppError::NotFound(format!("booking {id}")));
    };

    validate_booking_refs(&db, patch.user_id, patch.time_slot_id, patch.payment_id)?;

    if let Some(status) = patch.status {
        booking.status = status;
    }
    if patch.user_id.is_some() {
        booking.user_id = patch.user_id;
    }
    if patch.time_slot_id.is_some() {
        booking.time_slot_id = patch.time_slot_id;
    }
    if patch.payment_id.is_some() {
        booking.payment_id = patch.payment_id;
    }

    queries::update_booking(&db, &booking)?;
    Ok(booking)
}

pub fn delete_booking(state: &AppState, id: i64) -> Result<(), AppError> {
    let db = state.db.lock().unwrap();
    // Linked time slot and payment rows stay behind for the audit trail.
    let removed = queries::delete_booking(&db, id)?;
    if removed {
        tracing::info!(booking = id, "booking deleted");
    }
    Ok(())
}

fn validate_booking_refs(
    conn: &Connection,
    user_id: Option<i64>,
    time_slot_id: Option<i64>,
    payment_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(id) = user_id {
        if queries::get_user(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("user {id}")));
        }
    }
    if let Some(id) = time_slot_id {
        if queries::get_time_slot(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("time slot {id}")));
        }
    }
    if let Some(id) = payment_id {
        if queries::get_payment(conn, id)?.is_none() {
            return Err(AppError::NotFound(format!("payment {id}")));
        }
    }
    Ok(())
}

async fn notify(state: &AppState, booking_pk: i64, status: BookingStatus, notice: Option<BookingNotice>) {
    let Some(notice) = notice else {
        tracing::warn!(
            booking = booking_pk,
            "booking has no slot or reachable user, skipping notification"
        );
        return;
    };

    let result = if status == BookingStatus::Approved {
        state.notifier.send_booking_confirmation(&notice).await
    } else {
        state.notifier.send_booking_rejection(&notice).await
    };

    if let Err(e) = result {
        tracing::error!(booking = booking_pk, error = %e, "failed to send booking notification");
    }
}

fn notice_from_details(details: BookingDetails) -> Option<BookingNotice> {
    let slot = details.slot?;
    let user = details.user?;
    let recipient = user.email?;

    Some(BookingNotice {
        booking_id: details.booking.booking_id,
        recipient,
        recipient_name: user.login,
        court_name: details.court.map(|c| c.name),
        sport_name: details.sport.map(|s| s.name),
        starts_at: slot.start_time,
        ends_at: slot.end_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed_booking(
        conn: &Connection,
        court_id: i64,
        user_id: i64,
        start: &str,
        end: &str,
        status: BookingStatus,
    ) -> i64 {
        let slot = queries::create_time_slot(conn, &dt(start), &dt(end), Some(court_id)).unwrap();
        let booking = Booking {
            id: 0,
            booking_id: generate_booking_id(conn).unwrap(),
            booking_date: Utc::now().naive_utc(),
            status,
            user_id: Some(user_id),
            time_slot_id: Some(slot.id),
            payment_id: None,
        };
        queries::create_booking(conn, &booking).unwrap()
    }

    #[test]
    fn booking_ids_are_five_digit_codes() {
        let conn = setup_db();
        for _ in 0..20 {
            let id = generate_booking_id(&conn).unwrap();
            assert_eq!(id.len(), 5);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn pending_booking_holds_its_slot() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let court = queries::create_court(&conn, "Court 1", None).unwrap();
        seed_booking(
            &conn,
            court.id,
            user.id,
            "2026-03-02 10:00",
            "2026-03-02 11:00",
            BookingStatus::Pending,
        );

        let held = queries::find_active_booking_for_slot(
            &conn,
            court.id,
            &dt("2026-03-02 10:00"),
            &dt("2026-03-02 11:00"),
        )
        .unwrap();
        assert!(held.is_some());
    }

    #[test]
    fn rejected_booking_releases_its_slot() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let court = queries::create_court(&conn, "Court 1", None).unwrap();
        seed_booking(
            &conn,
            court.id,
            user.id,
            "2026-03-02 10:00",
            "2026-03-02 11:00",
            BookingStatus::Rejected,
        );

        let held = queries::find_active_booking_for_slot(
            &conn,
            court.id,
            &dt("2026-03-02 10:00"),
            &dt("2026-03-02 11:00"),
        )
        .unwrap();
        assert!(held.is_none());
    }

    #[test]
    fn same_time_on_another_court_does_not_conflict() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let court_a = queries::create_court(&conn, "Court A", None).unwrap();
        let court_b = queries::create_court(&conn, "Court B", None).unwrap();
        seed_booking(
            &conn,
            court_a.id,
            user.id,
            "2026-03-02 10:00",
            "2026-03-02 11:00",
            BookingStatus::Approved,
        );

        let held = queries::find_active_booking_for_slot(
            &conn,
            court_b.id,
            &dt("2026-03-02 10:00"),
            &dt("2026-03-02 11:00"),
        )
        .unwrap();
        assert!(held.is_none());
    }

    #[test]
    fn generated_ids_skip_taken_codes() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let court = queries::create_court(&conn, "Court 1", None).unwrap();
        let id = seed_booking(
            &conn,
            court.id,
            user.id,
            "2026-03-02 10:00",
            "2026-03-02 11:00",
            BookingStatus::Pending,
        );

        let taken = queries::get_booking(&conn, id).unwrap().unwrap().booking_id;
        assert!(queries::booking_id_taken(&conn, &taken).unwrap());

        for _ in 0..20 {
            assert_ne!(generate_booking_id(&conn).unwrap(), taken);
        }
    }
}
