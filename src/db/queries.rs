use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, Client, ClientTier, Court, Payment, Sport, TierLevel, TierVoucher,
    TimeSlot, User,
};

fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc())
}

// Amounts are money, so a row that does not parse is an error rather than
// a silent zero.
fn parse_amount(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("invalid stored amount: {s}"))
}

// ── Sports ──

pub fn create_sport(conn: &Connection, name: &str) -> anyhow::Result<Sport> {
    conn.execute("INSERT INTO sports (name) VALUES (?1)", params![name])?;
    Ok(Sport {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn get_sport(conn: &Connection, id: i64) -> anyhow::Result<Option<Sport>> {
    let result = conn.query_row(
        "SELECT id, name FROM sports WHERE id = ?1",
        params![id],
        |row| {
            Ok(Sport {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    );

    match result {
        Ok(sport) => Ok(Some(sport)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_sports(conn: &Connection) -> anyhow::Result<Vec<Sport>> {
    let mut stmt = conn.prepare("SELECT id, name FROM sports ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Sport {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut sports = vec![];
    for row in rows {
        sports.push(row?);
    }
    Ok(sports)
}

pub fn update_sport(conn: &Connection, sport: &Sport) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE sports SET name = ?1 WHERE id = ?2",
        params![sport.name, sport.id],
    )?;
    Ok(count > 0)
}

pub fn delete_sport(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sports WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Courts ──

pub fn create_court(conn: &Connection, name: &str, sport_id: Option<i64>) -> anyhow::Result<Court> {
    conn.execute(
        "INSERT INTO courts (name, sport_id) VALUES (?1, ?2)",
        params![name, sport_id],
    )?;
    Ok(Court {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        sport_id,
    })
}

pub fn get_court(conn: &Connection, id: i64) -> anyhow::Result<Option<Court>> {
    let result = conn.query_row(
        "SELECT id, name, sport_id FROM courts WHERE id = ?1",
        params![id],
        |row| {
            Ok(Court {
                id: row.get(0)?,
                name: row.get(1)?,
                sport_id: row.get(2)?,
            })
        },
    );

    match result {
        Ok(court) => Ok(Some(court)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_courts(conn: &Connection) -> anyhow::Result<Vec<Court>> {
    let mut stmt = conn.prepare("SELECT id, name, sport_id FROM courts ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Court {
            id: row.get(0)?,
            name: row.get(1)?,
            sport_id: row.get(2)?,
        })
    })?;

    let mut courts = vec![];
    for row in rows {
        courts.push(row?);
    }
    Ok(courts)
}

pub fn update_court(conn: &Connection, court: &Court) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE courts SET name = ?1, sport_id = ?2 WHERE id = ?3",
        params![court.name, court.sport_id, court.id],
    )?;
    Ok(count > 0)
}

pub fn delete_court(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM courts WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Time Slots ──

pub fn create_time_slot(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    court_id: Option<i64>,
) -> anyhow::Result<TimeSlot> {
    conn.execute(
        "INSERT INTO time_slots (start_time, end_time, court_id) VALUES (?1, ?2, ?3)",
        params![format_dt(start), format_dt(end), court_id],
    )?;
    Ok(TimeSlot {
        id: conn.last_insert_rowid(),
        start_time: *start,
        end_time: *end,
        court_id,
    })
}

pub fn get_time_slot(conn: &Connection, id: i64) -> anyhow::Result<Option<TimeSlot>> {
    let result = conn.query_row(
        "SELECT id, start_time, end_time, court_id FROM time_slots WHERE id = ?1",
        params![id],
        |row| {
            let start_str: String = row.get(1)?;
            let end_str: String = row.get(2)?;
            Ok(TimeSlot {
                id: row.get(0)?,
                start_time: parse_dt(&start_str),
                end_time: parse_dt(&end_str),
                court_id: row.get(3)?,
            })
        },
    );

    match result {
        Ok(slot) => Ok(Some(slot)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_time_slots(conn: &Connection) -> anyhow::Result<Vec<TimeSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time, court_id FROM time_slots ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let start_str: String = row.get(1)?;
        let end_str: String = row.get(2)?;
        Ok(TimeSlot {
            id: row.get(0)?,
            start_time: parse_dt(&start_str),
            end_time: parse_dt(&end_str),
            court_id: row.get(3)?,
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

pub fn update_time_slot(conn: &Connection, slot: &TimeSlot) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE time_slots SET start_time = ?1, end_time = ?2, court_id = ?3 WHERE id = ?4",
        params![
            format_dt(&slot.start_time),
            format_dt(&slot.end_time),
            slot.court_id,
            slot.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_time_slot(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM time_slots WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Users ──

pub fn create_user(
    conn: &Connection,
    login: &str,
    email: Option<&str>,
    lang_key: Option<&str>,
) -> anyhow::Result<User> {
    conn.execute(
        "INSERT INTO users (login, email, lang_key) VALUES (?1, ?2, ?3)",
        params![login, email, lang_key],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        login: login.to_string(),
        email: email.map(|s| s.to_string()),
        lang_key: lang_key.map(|s| s.to_string()),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, login, email, lang_key FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                login: row.get(1)?,
                email: row.get(2)?,
                lang_key: row.get(3)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_login(conn: &Connection, login: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, login, email, lang_key FROM users WHERE login = ?1",
        params![login],
        |row| {
            Ok(User {
                id: row.get(0)?,
                login: row.get(1)?,
                email: row.get(2)?,
                lang_key: row.get(3)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Client Tiers ──

pub fn create_client_tier(
    conn: &Connection,
    tier_name: &str,
    discount_percentage: Option<Decimal>,
) -> anyhow::Result<ClientTier> {
    conn.execute(
        "INSERT INTO client_tiers (tier_name, discount_percentage) VALUES (?1, ?2)",
        params![tier_name, discount_percentage.map(|d| d.to_string())],
    )?;
    Ok(ClientTier {
        id: conn.last_insert_rowid(),
        tier_name: tier_name.to_string(),
        discount_percentage,
    })
}

fn parse_client_tier_row(row: &rusqlite::Row) -> anyhow::Result<ClientTier> {
    let id: i64 = row.get(0)?;
    let tier_name: String = row.get(1)?;
    let discount_str: Option<String> = row.get(2)?;

    let discount_percentage = match discount_str {
        Some(s) => Some(parse_amount(&s)?),
        None => None,
    };

    Ok(ClientTier {
        id,
        tier_name,
        discount_percentage,
    })
}

pub fn get_client_tier(conn: &Connection, id: i64) -> anyhow::Result<Option<ClientTier>> {
    let result = conn.query_row(
        "SELECT id, tier_name, discount_percentage FROM client_tiers WHERE id = ?1",
        params![id],
        |row| Ok(parse_client_tier_row(row)),
    );

    match result {
        Ok(tier) => Ok(Some(tier?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_client_tier_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<ClientTier>> {
    let result = conn.query_row(
        "SELECT id, tier_name, discount_percentage FROM client_tiers WHERE tier_name = ?1",
        params![name],
        |row| Ok(parse_client_tier_row(row)),
    );

    match result {
        Ok(tier) => Ok(Some(tier?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_client_tiers(conn: &Connection) -> anyhow::Result<Vec<ClientTier>> {
    let mut stmt =
        conn.prepare("SELECT id, tier_name, discount_percentage FROM client_tiers ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| Ok(parse_client_tier_row(row)))?;

    let mut tiers = vec![];
    for row in rows {
        tiers.push(row??);
    }
    Ok(tiers)
}

pub fn update_client_tier(conn: &Connection, tier: &ClientTier) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE client_tiers SET tier_name = ?1, discount_percentage = ?2 WHERE id = ?3",
        params![
            tier.tier_name,
            tier.discount_percentage.map(|d| d.to_string()),
            tier.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_client_tier(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM client_tiers WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Clients ──

pub fn create_client(conn: &Connection, client: &Client) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO clients (name, description, age, dob, tier_id, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            client.name,
            client.description,
            client.age,
            client.dob.as_ref().map(format_dt),
            client.tier_id,
            client.user_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_client_row(row: &rusqlite::Row) -> rusqlite::Result<Client> {
    let dob_str: Option<String> = row.get(4)?;
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        age: row.get(3)?,
        dob: dob_str.map(|s| parse_dt(&s)),
        tier_id: row.get(5)?,
        user_id: row.get(6)?,
    })
}

pub fn get_client(conn: &Connection, id: i64) -> anyhow::Result<Option<Client>> {
    let result = conn.query_row(
        "SELECT id, name, description, age, dob, tier_id, user_id FROM clients WHERE id = ?1",
        params![id],
        parse_client_row,
    );

    match result {
        Ok(client) => Ok(Some(client)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_client_by_user(conn: &Connection, user_id: i64) -> anyhow::Result<Option<Client>> {
    let result = conn.query_row(
        "SELECT id, name, description, age, dob, tier_id, user_id FROM clients WHERE user_id = ?1",
        params![user_id],
        parse_client_row,
    );

    match result {
        Ok(client) => Ok(Some(client)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_clients(conn: &Connection) -> anyhow::Result<Vec<Client>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, age, dob, tier_id, user_id FROM clients ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], parse_client_row)?;

    let mut clients = vec![];
    for row in rows {
        clients.push(row?);
    }
    Ok(clients)
}

pub fn update_client(conn: &Connection, client: &Client) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE clients SET name = ?1, description = ?2, age = ?3, dob = ?4, tier_id = ?5, user_id = ?6
         WHERE id = ?7",
        params![
            client.name,
            client.description,
            client.age,
            client.dob.as_ref().map(format_dt),
            client.tier_id,
            client.user_id,
            client.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_client_tier(conn: &Connection, client_id: i64, tier_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE clients SET tier_id = ?1 WHERE id = ?2",
        params![tier_id, client_id],
    )?;
    Ok(count > 0)
}

pub fn delete_client(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM clients WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Payments ──

pub fn create_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO payments (amount, payment_date, status, qr_code_url, transaction_id, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            payment.amount.to_string(),
            payment.payment_date.as_ref().map(format_dt),
            payment.status,
            payment.qr_code_url,
            payment.transaction_id,
            payment.user_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let id: i64 = row.get(0)?;
    let amount_str: String = row.get(1)?;
    let payment_date_str: Option<String> = row.get(2)?;
    let status: Option<String> = row.get(3)?;
    let qr_code_url: Option<String> = row.get(4)?;
    let transaction_id: Option<String> = row.get(5)?;
    let user_id: Option<i64> = row.get(6)?;

    Ok(Payment {
        id,
        amount: parse_amount(&amount_str)?,
        payment_date: payment_date_str.map(|s| parse_dt(&s)),
        status,
        qr_code_url,
        transaction_id,
        user_id,
    })
}

pub fn get_payment(conn: &Connection, id: i64) -> anyhow::Result<Option<Payment>> {
    let result = conn.query_row(
        "SELECT id, amount, payment_date, status, qr_code_url, transaction_id, user_id
         FROM payments WHERE id = ?1",
        params![id],
        |row| Ok(parse_payment_row(row)),
    );

    match result {
        Ok(payment) => Ok(Some(payment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_payments(conn: &Connection) -> anyhow::Result<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, payment_date, status, qr_code_url, transaction_id, user_id
         FROM payments ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_payment_row(row)))?;

    let mut payments = vec![];
    for row in rows {
        payments.push(row??);
    }
    Ok(payments)
}

pub fn update_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE payments SET amount = ?1, payment_date = ?2, status = ?3, qr_code_url = ?4,
                transaction_id = ?5, user_id = ?6
         WHERE id = ?7",
        params![
            payment.amount.to_string(),
            payment.payment_date.as_ref().map(format_dt),
            payment.status,
            payment.qr_code_url,
            payment.transaction_id,
            payment.user_id,
            payment.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_payment(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM payments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (booking_id, booking_date, status, user_id, time_slot_id, payment_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            booking.booking_id,
            format_dt(&booking.booking_date),
            booking.status.as_str(),
            booking.user_id,
            booking.time_slot_id,
            booking.payment_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let booking_date_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    Ok(Booking {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        booking_date: parse_dt(&booking_date_str),
        status: BookingStatus::from_str(&status_str),
        user_id: row.get(4)?,
        time_slot_id: row.get(5)?,
        payment_id: row.get(6)?,
    })
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, booking_id, booking_date, status, user_id, time_slot_id, payment_id
         FROM bookings WHERE id = ?1",
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, booking_date, status, user_id, time_slot_id, payment_id
         FROM bookings ORDER BY booking_date DESC",
    )?;
    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, user_id = ?2, time_slot_id = ?3, payment_id = ?4
         WHERE id = ?5",
        params![
            booking.status.as_str(),
            booking.user_id,
            booking.time_slot_id,
            booking.payment_id,
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn booking_id_taken(conn: &Connection, booking_id: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// A slot is held by any booking that was not rejected. Rejected bookings
// release the court/time pair for rebooking.
pub fn find_active_booking_for_slot(
    conn: &Connection,
    court_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT b.id FROM bookings b
         INNER JOIN time_slots t ON b.time_slot_id = t.id
         WHERE t.court_id = ?1 AND t.start_time = ?2 AND t.end_time = ?3
           AND b.status != 'REJECTED'
         LIMIT 1",
        params![court_id, format_dt(start), format_dt(end)],
        |row| row.get(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn bookings_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, booking_date, status, user_id, time_slot_id, payment_id
         FROM bookings WHERE user_id = ?1 ORDER BY booking_date DESC",
    )?;
    let rows = stmt.query_map(params![user_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn count_bookings_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn bookings_for_court_between(
    conn: &Connection,
    court_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.booking_id, b.booking_date, b.status, b.user_id, b.time_slot_id, b.payment_id
         FROM bookings b
         INNER JOIN time_slots t ON b.time_slot_id = t.id
         WHERE t.court_id = ?1 AND t.start_time >= ?2 AND t.start_time < ?3
         ORDER BY t.start_time ASC",
    )?;
    let rows = stmt.query_map(params![court_id, format_dt(start), format_dt(end)], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub struct BookingDetails {
    pub booking: Booking,
    pub slot: Option<TimeSlot>,
    pub court: Option<Court>,
    pub sport: Option<Sport>,
    pub user: Option<User>,
}

pub fn get_booking_details(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingDetails>> {
    let Some(booking) = get_booking(conn, id)? else {
        return Ok(None);
    };

    let slot = match booking.time_slot_id {
        Some(slot_id) => get_time_slot(conn, slot_id)?,
        None => None,
    };
    let court = match slot.as_ref().and_then(|s| s.court_id) {
        Some(court_id) => get_court(conn, court_id)?,
        None => None,
    };
    let sport = match court.as_ref().and_then(|c| c.sport_id) {
        Some(sport_id) => get_sport(conn, sport_id)?,
        None => None,
    };
    let user = match booking.user_id {
        Some(user_id) => get_user(conn, user_id)?,
        None => None,
    };

    Ok(Some(BookingDetails {
        booking,
        slot,
        court,
        sport,
        user,
    }))
}

// ── Revenue ──

pub struct RevenueRow {
    pub id: i64,
    pub booking_date: NaiveDateTime,
    pub amount: Option<Decimal>,
}

pub fn approved_revenue_rows(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Vec<RevenueRow>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.booking_date, p.amount
         FROM bookings b
         LEFT JOIN payments p ON b.payment_id = p.id
         WHERE b.status = 'APPROVED' AND b.booking_date >= ?1 AND b.booking_date < ?2
         ORDER BY b.booking_date ASC",
    )?;

    let rows = stmt.query_map(params![format_dt(start), format_dt(end)], |row| {
        let booking_date_str: String = row.get(1)?;
        let amount_str: Option<String> = row.get(2)?;
        Ok((row.get::<_, i64>(0)?, booking_date_str, amount_str))
    })?;

    let mut revenue = vec![];
    for row in rows {
        let (id, booking_date_str, amount_str) = row?;
        let amount = match amount_str {
            Some(s) => Some(parse_amount(&s)?),
            None => None,
        };
        revenue.push(RevenueRow {
            id,
            booking_date: parse_dt(&booking_date_str),
            amount,
        });
    }
    Ok(revenue)
}

// ── Tier Vouchers ──

pub fn create_tier_voucher(
    conn: &Connection,
    tier: TierLevel,
    voucher_type: &str,
) -> anyhow::Result<TierVoucher> {
    conn.execute(
        "INSERT INTO tier_vouchers (tier, voucher_type) VALUES (?1, ?2)",
        params![tier.as_str(), voucher_type],
    )?;
    Ok(TierVoucher {
        id: conn.last_insert_rowid(),
        tier,
        voucher_type: voucher_type.to_string(),
    })
}

fn parse_voucher_row(row: &rusqlite::Row) -> anyhow::Result<TierVoucher> {
    let id: i64 = row.get(0)?;
    let tier_str: String = row.get(1)?;
    let voucher_type: String = row.get(2)?;

    let tier = TierLevel::from_str(&tier_str)
        .with_context(|| format!("unknown tier in tier_vouchers row {id}: {tier_str}"))?;

    Ok(TierVoucher {
        id,
        tier,
        voucher_type,
    })
}

pub fn get_tier_voucher(conn: &Connection, id: i64) -> anyhow::Result<Option<TierVoucher>> {
    let result = conn.query_row(
        "SELECT id, tier, voucher_type FROM tier_vouchers WHERE id = ?1",
        params![id],
        |row| Ok(parse_voucher_row(row)),
    );

    match result {
        Ok(voucher) => Ok(Some(voucher?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_voucher_by_tier(conn: &Connection, tier: TierLevel) -> anyhow::Result<Option<TierVoucher>> {
    let result = conn.query_row(
        "SELECT id, tier, voucher_type FROM tier_vouchers WHERE tier = ?1",
        params![tier.as_str()],
        |row| Ok(parse_voucher_row(row)),
    );

    match result {
        Ok(voucher) => Ok(Some(voucher?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_tier_vouchers(conn: &Connection) -> anyhow::Result<Vec<TierVoucher>> {
    let mut stmt = conn.prepare("SELECT id, tier, voucher_type FROM tier_vouchers ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| Ok(parse_voucher_row(row)))?;

    let mut vouchers = vec![];
    for row in rows {
        vouchers.push(row??);
    }
    Ok(vouchers)
}

pub fn update_tier_voucher(conn: &Connection, voucher: &TierVoucher) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE tier_vouchers SET tier = ?1, voucher_type = ?2 WHERE id = ?3",
        params![voucher.tier.as_str(), voucher.voucher_type, voucher.id],
    )?;
    Ok(count > 0)
}

pub fn upsert_voucher_for_tier(
    conn: &Connection,
    tier: TierLevel,
    voucher_type: &str,
) -> anyhow::Result<TierVoucher> {
    conn.execute(
        "INSERT INTO tier_vouchers (tier, voucher_type) VALUES (?1, ?2)
         ON CONFLICT(tier) DO UPDATE SET voucher_type = excluded.voucher_type",
        params![tier.as_str(), voucher_type],
    )?;

    conn.query_row(
        "SELECT id, tier, voucher_type FROM tier_vouchers WHERE tier = ?1",
        params![tier.as_str()],
        |row| Ok(parse_voucher_row(row)),
    )?
}

pub fn delete_tier_voucher(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM tier_vouchers WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
