use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Client, TierLevel, TierVoucher};

/// Booking-count ladder. Counts every booking the user ever made, whatever
/// its status ended up as.
pub fn tier_for_count(total_bookings: i64) -> TierLevel {
    if total_bookings >= 21 {
        TierLevel::Platinum
    } else if total_bookings >= 11 {
        TierLevel::Gold
    } else if total_bookings >= 6 {
        TierLevel::Iron
    } else {
        TierLevel::Lead
    }
}

/// Recompute one client's tier from their booking count. Returns the new
/// level when a write happened, None when the stored tier already matched.
pub fn recompute_for_client(
    conn: &Connection,
    client: &Client,
) -> Result<Option<TierLevel>, AppError> {
    let Some(user_id) = client.user_id else {
        return Ok(None);
    };

    let total = queries::count_bookings_for_user(conn, user_id)?;
    let target = tier_for_count(total);

    let tier_row = queries::get_client_tier_by_name(conn, target.as_str())?.ok_or_else(|| {
        AppError::Config(format!(
            "client tier {} missing from reference data",
            target.as_str()
        ))
    })?;

    if client.tier_id == Some(tier_row.id) {
        return Ok(None);
    }

    queries::set_client_tier(conn, client.id, tier_row.id)?;
    tracing::info!(
        client = client.id,
        tier = target.as_str(),
        total_bookings = total,
        "client tier updated"
    );
    Ok(Some(target))
}

pub fn recompute_for_user(conn: &Connection, user_id: i64) -> Result<(), AppError> {
    match queries::get_client_by_user(conn, user_id)? {
        Some(client) => {
            recompute_for_client(conn, &client)?;
            Ok(())
        }
        None => {
            tracing::debug!("no client profile for user {user_id}, skipping tier recompute");
            Ok(())
        }
    }
}

pub struct ReconcileSummary {
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Sweep every client and reapply the ladder. Clients without a linked user
/// are logged and skipped, matching the per-booking recompute.
pub fn reconcile_all(conn: &Connection) -> Result<ReconcileSummary, AppError> {
    let clients = queries::list_clients(conn)?;
    let mut summary = ReconcileSummary {
        scanned: 0,
        updated: 0,
        skipped: 0,
    };

    for client in &clients {
        summary.scanned += 1;
        if client.user_id.is_none() {
            tracing::warn!(client = client.id, "client has no linked user, skipping tier update");
            summary.skipped += 1;
            continue;
        }
        if recompute_for_client(conn, client)?.is_some() {
            summary.updated += 1;
        }
    }

    Ok(summary)
}

pub fn assign_voucher(
    conn: &Connection,
    tier: TierLevel,
    voucher_type: &str,
) -> Result<TierVoucher, AppError> {
    let voucher = queries::upsert_voucher_for_tier(conn, tier, voucher_type)?;
    tracing::debug!(tier = tier.as_str(), voucher_type = voucher_type, "tier voucher assigned");
    Ok(voucher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus};
    use chrono::Utc;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_bookings(conn: &Connection, user_id: i64, count: i64) {
        for i in 0..count {
            let booking = Booking {
                id: 0,
                booking_id: format!("{:05}", 90_000 + i),
                booking_date: Utc::now().naive_utc(),
                status: BookingStatus::Pending,
                user_id: Some(user_id),
                time_slot_id: None,
                payment_id: None,
            };
            queries::create_booking(conn, &booking).unwrap();
        }
    }

    fn client_for_user(conn: &Connection, user_id: i64) -> Client {
        let client = Client {
            id: 0,
            name: Some("Test Client".to_string()),
            description: None,
            age: None,
            dob: None,
            tier_id: None,
            user_id: Some(user_id),
        };
        let id = queries::create_client(conn, &client).unwrap();
        queries::get_client(conn, id).unwrap().unwrap()
    }

    #[test]
    fn ladder_boundaries() {
        assert_eq!(tier_for_count(0), TierLevel::Lead);
        assert_eq!(tier_for_count(5), TierLevel::Lead);
        assert_eq!(tier_for_count(6), TierLevel::Iron);
        assert_eq!(tier_for_count(10), TierLevel::Iron);
        assert_eq!(tier_for_count(11), TierLevel::Gold);
        assert_eq!(tier_for_count(20), TierLevel::Gold);
        assert_eq!(tier_for_count(21), TierLevel::Platinum);
        assert_eq!(tier_for_count(100), TierLevel::Platinum);
    }

    #[test]
    fn recompute_writes_matching_tier() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let client = client_for_user(&conn, user.id);
        seed_bookings(&conn, user.id, 7);

        let changed = recompute_for_client(&conn, &client).unwrap();
        assert_eq!(changed, Some(TierLevel::Iron));

        let stored = queries::get_client(&conn, client.id).unwrap().unwrap();
        let iron = queries::get_client_tier_by_name(&conn, "IRON").unwrap().unwrap();
        assert_eq!(stored.tier_id, Some(iron.id));
    }

    #[test]
    fn recompute_skips_write_when_tier_already_matches() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let client = client_for_user(&conn, user.id);
        seed_bookings(&conn, user.id, 3);

        assert_eq!(
            recompute_for_client(&conn, &client).unwrap(),
            Some(TierLevel::Lead)
        );
        let stored = queries::get_client(&conn, client.id).unwrap().unwrap();
        assert_eq!(recompute_for_client(&conn, &stored).unwrap(), None);
    }

    #[test]
    fn recompute_fails_when_reference_tiers_missing() {
        let conn = setup_db();
        let user = queries::create_user(&conn, "alice", None, None).unwrap();
        let client = client_for_user(&conn, user.id);
        conn.execute("DELETE FROM client_tiers", []).unwrap();

        let err = recompute_for_client(&conn, &client).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn reconcile_counts_updates_and_skips() {
        let conn = setup_db();
        let user_a = queries::create_user(&conn, "alice", None, None).unwrap();
        let user_b = queries::create_user(&conn, "bob", None, None).unwrap();
        client_for_user(&conn, user_a.id);
        client_for_user(&conn, user_b.id);

        // Orphaned client rows are skipped, not failed.
        let orphan = Client {
            id: 0,
            name: Some("No User".to_string()),
            description: None,
            age: None,
            dob: None,
            tier_id: None,
            user_id: None,
        };
        queries::create_client(&conn, &orphan).unwrap();

        seed_bookings(&conn, user_a.id, 12);

        let summary = reconcile_all(&conn).unwrap();
        assert_eq!(summary.scanned, 3);
        // Both linked clients get a first-time tier write.
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.skipped, 1);

        // A second sweep finds nothing to change.
        let summary = reconcile_all(&conn).unwrap();
        assert_eq!(summary.updated, 0);
    }

    #[test]
    fn voucher_upsert_overwrites_existing_type() {
        let conn = setup_db();

        let first = assign_voucher(&conn, TierLevel::Gold, "DISCOUNT10").unwrap();
        let second = assign_voucher(&conn, TierLevel::Gold, "DISCOUNT20").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.voucher_type, "DISCOUNT20");
        assert_eq!(queries::list_tier_vouchers(&conn).unwrap().len(), 1);
    }
}
