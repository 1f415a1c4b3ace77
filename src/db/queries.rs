use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::AppError;
use crate::models::{
    Bedrooms, BookedBy, Booking, CleaningArea, HomeStyle, PaymentMethod, PaymentStatus, Provider,
    RefundStatus, RepairItem, ServiceKind, SlotStatus, SlotView, TimeLabel,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, customer_name, email, contact_number, first_line_of_address, \
     town, postcode, selected_date, selected_time_slot, service, cleaning_options, \
     repair_options, home_style, number_of_bedrooms, number_of_stories, message, total_price, \
     payment_method, payment_status, refund_status, paypal_order_id, mollie_payment_id, \
     capture_id, refund_id, refund_amount, refund_reason, refund_date, is_locked, \
     lock_expires_at, is_booked, booked_by, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                     ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33)"
        ),
        params![
            booking.id,
            booking.customer_name,
            booking.email,
            booking.contact_number,
            booking.first_line_of_address,
            booking.town,
            booking.postcode,
            fmt_date(booking.selected_date),
            booking.selected_time_slot.as_str(),
            booking.service.as_str(),
            serde_json::to_string(&booking.cleaning_options)?,
            serde_json::to_string(&booking.repair_options)?,
            booking.home_style.as_str(),
            booking.bedrooms.map(|b| b.as_str()),
            booking.stories,
            booking.message,
            booking.total_price.to_string(),
            booking.payment_method.as_str(),
            booking.payment_status.as_str(),
            booking.refund_status.as_str(),
            booking.paypal_order_id,
            booking.mollie_payment_id,
            booking.capture_id,
            booking.refund_id,
            booking.refund_amount.map(|a| a.to_string()),
            booking.refund_reason,
            booking.refund_date.map(fmt_datetime),
            booking.is_locked as i32,
            booking.lock_expires_at.map(fmt_datetime),
            booking.is_booked as i32,
            booking.booked_by.as_str(),
            fmt_datetime(booking.created_at),
            fmt_datetime(booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            customer_name = ?2, email = ?3, contact_number = ?4, first_line_of_address = ?5,
            town = ?6, postcode = ?7, selected_date = ?8, selected_time_slot = ?9, service = ?10,
            cleaning_options = ?11, repair_options = ?12, home_style = ?13,
            number_of_bedrooms = ?14, number_of_stories = ?15, message = ?16, total_price = ?17,
            payment_method = ?18, payment_status = ?19, refund_status = ?20,
            paypal_order_id = ?21, mollie_payment_id = ?22, capture_id = ?23, refund_id = ?24,
            refund_amount = ?25, refund_reason = ?26, refund_date = ?27, is_locked = ?28,
            lock_expires_at = ?29, is_booked = ?30, booked_by = ?31, updated_at = ?32
         WHERE id = ?1",
        params![
            booking.id,
            booking.customer_name,
            booking.email,
            booking.contact_number,
            booking.first_line_of_address,
            booking.town,
            booking.postcode,
            fmt_date(booking.selected_date),
            booking.selected_time_slot.as_str(),
            booking.service.as_str(),
            serde_json::to_string(&booking.cleaning_options)?,
            serde_json::to_string(&booking.repair_options)?,
            booking.home_style.as_str(),
            booking.bedrooms.map(|b| b.as_str()),
            booking.stories,
            booking.message,
            booking.total_price.to_string(),
            booking.payment_method.as_str(),
            booking.payment_status.as_str(),
            booking.refund_status.as_str(),
            booking.paypal_order_id,
            booking.mollie_payment_id,
            booking.capture_id,
            booking.refund_id,
            booking.refund_amount.map(|a| a.to_string()),
            booking.refund_reason,
            booking.refund_date.map(fmt_datetime),
            booking.is_locked as i32,
            booking.lock_expires_at.map(fmt_datetime),
            booking.is_booked as i32,
            booking.booked_by.as_str(),
            fmt_datetime(Utc::now().naive_utc()),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn bookings_on_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE selected_date = ?1 ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![fmt_date(date)], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn booking_by_provider_id(
    conn: &Connection,
    provider: Provider,
    payment_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let column = match provider {
        Provider::PayPal => "paypal_order_id",
        Provider::Mollie => "mollie_payment_id",
    };

    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {column} = ?1"),
        params![payment_id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn booking_by_capture_id(
    conn: &Connection,
    capture_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE capture_id = ?1"),
        params![capture_id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_provider_payment_id(
    conn: &Connection,
    booking_id: &str,
    provider: Provider,
    payment_id: &str,
) -> anyhow::Result<()> {
    let column = match provider {
        Provider::PayPal => "paypal_order_id",
        Provider::Mollie => "mollie_payment_id",
    };
    conn.execute(
        &format!("UPDATE bookings SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
        params![
            booking_id,
            payment_id,
            fmt_datetime(Utc::now().naive_utc())
        ],
    )?;
    Ok(())
}

/// Flip a pending booking to completed: paid, finally booked, soft lock
/// cleared. The caller is responsible for the idempotency check.
pub fn mark_payment_completed(
    conn: &Connection,
    booking_id: &str,
    capture_id: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET payment_status = 'completed', is_booked = 1, is_locked = 0,
            lock_expires_at = NULL, capture_id = COALESCE(?2, capture_id), updated_at = ?3
         WHERE id = ?1",
        params![
            booking_id,
            capture_id,
            fmt_datetime(Utc::now().naive_utc())
        ],
    )?;
    Ok(())
}

pub fn record_refund(
    conn: &Connection,
    booking_id: &str,
    refund_id: &str,
    amount: Decimal,
    reason: &str,
) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();
    conn.execute(
        "UPDATE bookings SET refund_status = 'completed', refund_id = ?2, refund_amount = ?3,
            refund_reason = ?4, refund_date = ?5, is_booked = 0, is_locked = 0,
            lock_expires_at = NULL, updated_at = ?5
         WHERE id = ?1",
        params![
            booking_id,
            refund_id,
            amount.to_string(),
            reason,
            fmt_datetime(now)
        ],
    )?;
    Ok(())
}

pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
}

/// Paginated admin listing with case-insensitive substring search across the
/// customer-facing text fields, newest first.
pub fn search_bookings(
    conn: &Connection,
    search: Option<&str>,
    page: i64,
    limit: i64,
) -> anyhow::Result<BookingPage> {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);

    let filter = "customer_name LIKE ?1 OR email LIKE ?1 OR contact_number LIKE ?1
         OR first_line_of_address LIKE ?1 OR town LIKE ?1 OR postcode LIKE ?1
         OR selected_time_slot LIKE ?1 OR service LIKE ?1 OR message LIKE ?1
         OR payment_method LIKE ?1 OR payment_status LIKE ?1 OR refund_status LIKE ?1
         OR booked_by LIKE ?1 OR number_of_bedrooms LIKE ?1";
    let pattern = format!("%{}%", search.unwrap_or(""));

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings WHERE {filter}"),
        params![pattern],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {filter}
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(params![pattern, limit, (page - 1) * limit], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }

    Ok(BookingPage {
        bookings,
        total,
        total_pages: (total + limit - 1) / limit,
        page,
    })
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let selected_date: String = row.get(7)?;
    let selected_time_slot: String = row.get(8)?;
    let service: String = row.get(9)?;
    let cleaning_options: String = row.get(10)?;
    let repair_options: String = row.get(11)?;
    let home_style: String = row.get(12)?;
    let bedrooms: Option<String> = row.get(13)?;
    let total_price: String = row.get(16)?;
    let payment_method: String = row.get(17)?;
    let payment_status: String = row.get(18)?;
    let refund_status: String = row.get(19)?;
    let refund_amount: Option<String> = row.get(24)?;
    let refund_date: Option<String> = row.get(26)?;
    let lock_expires_at: Option<String> = row.get(28)?;
    let booked_by: String = row.get(30)?;
    let created_at: String = row.get(31)?;
    let updated_at: String = row.get(32)?;

    Ok(Booking {
        customer_name: row.get(1)?,
        email: row.get(2)?,
        contact_number: row.get(3)?,
        first_line_of_address: row.get(4)?,
        town: row.get(5)?,
        postcode: row.get(6)?,
        selected_date: NaiveDate::parse_from_str(&selected_date, DATE_FMT)
            .map_err(|e| anyhow::anyhow!("booking {id}: bad selected_date: {e}"))?,
        selected_time_slot: TimeLabel::parse(&selected_time_slot)
            .ok_or_else(|| anyhow::anyhow!("booking {id}: unknown time slot"))?,
        service: ServiceKind::parse(&service)
            .ok_or_else(|| anyhow::anyhow!("booking {id}: unknown service"))?,
        cleaning_options: serde_json::from_str::<Vec<CleaningArea>>(&cleaning_options)
            .unwrap_or_default(),
        repair_options: serde_json::from_str::<Vec<RepairItem>>(&repair_options)
            .unwrap_or_default(),
        home_style: HomeStyle::parse(&home_style)
            .ok_or_else(|| anyhow::anyhow!("booking {id}: unknown home style"))?,
        bedrooms: bedrooms.as_deref().and_then(Bedrooms::parse),
        stories: row.get(14)?,
        message: row.get(15)?,
        total_price: total_price
            .parse::<Decimal>()
            .map_err(|e| anyhow::anyhow!("booking {id}: bad total_price: {e}"))?,
        payment_method: PaymentMethod::parse(&payment_method)
            .ok_or_else(|| anyhow::anyhow!("booking {id}: unknown payment method"))?,
        payment_status: PaymentStatus::parse(&payment_status),
        refund_status: RefundStatus::parse(&refund_status),
        paypal_order_id: row.get(20)?,
        mollie_payment_id: row.get(21)?,
        capture_id: row.get(22)?,
        refund_id: row.get(23)?,
        refund_amount: refund_amount.and_then(|a| a.parse().ok()),
        refund_reason: row.get(25)?,
        refund_date: refund_date.and_then(|d| NaiveDateTime::parse_from_str(&d, DATETIME_FMT).ok()),
        is_locked: row.get::<_, i32>(27)? != 0,
        lock_expires_at: lock_expires_at
            .and_then(|d| NaiveDateTime::parse_from_str(&d, DATETIME_FMT).ok()),
        is_booked: row.get::<_, i32>(29)? != 0,
        booked_by: BookedBy::parse(&booked_by),
        created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        updated_at: NaiveDateTime::parse_from_str(&updated_at, DATETIME_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        id,
    })
}

// ── Slot calendar ──

/// Reserve a slot for a booking in one conditional upsert. The write only
/// lands if the slot row is absent or currently neither booked nor blocked,
/// so concurrent reservations of the same (date, label) resolve to exactly
/// one winner.
pub fn reserve_slot(
    conn: &Connection,
    date: NaiveDate,
    label: TimeLabel,
    booking_id: &str,
) -> Result<(), AppError> {
    let changed = conn.execute(
        "INSERT INTO slots (date, time, booked_by) VALUES (?1, ?2, ?3)
         ON CONFLICT(date, time) DO UPDATE SET booked_by = excluded.booked_by
         WHERE slots.booked_by IS NULL AND slots.blocked_by IS NULL",
        params![fmt_date(date), label.as_str(), booking_id],
    )?;

    if changed == 0 {
        return Err(AppError::SlotUnavailable);
    }
    Ok(())
}

/// Clear a slot's booking reference, returning it to the available pool.
/// A missing row or an already-empty slot indicates the caller's view of the
/// calendar is inconsistent with the store.
pub fn release_slot(conn: &Connection, date: NaiveDate, label: TimeLabel) -> Result<(), AppError> {
    let booked_by: Option<Option<String>> = conn
        .query_row(
            "SELECT booked_by FROM slots WHERE date = ?1 AND time = ?2",
            params![fmt_date(date), label.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match booked_by {
        None => Err(AppError::NotFound(format!(
            "slot {} on {}",
            label.as_str(),
            date
        ))),
        Some(None) => Err(AppError::InvalidState(format!(
            "slot {} is not booked",
            label.as_str()
        ))),
        Some(Some(_)) => {
            conn.execute(
                "UPDATE slots SET booked_by = NULL WHERE date = ?1 AND time = ?2",
                params![fmt_date(date), label.as_str()],
            )?;
            Ok(())
        }
    }
}

/// Block a batch of labels on one date. Every label is guarded before any
/// write, so the batch lands whole or not at all.
pub fn block_slots(
    conn: &Connection,
    date: NaiveDate,
    labels: &[TimeLabel],
    admin_id: &str,
) -> Result<(), AppError> {
    for label in labels {
        let existing: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT booked_by, blocked_by FROM slots WHERE date = ?1 AND time = ?2",
                params![fmt_date(date), label.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            Some((Some(_), _)) => {
                return Err(AppError::InvalidState(format!(
                    "slot {} is already booked and cannot be blocked",
                    label.as_str()
                )))
            }
            Some((_, Some(_))) => {
                return Err(AppError::InvalidState(format!(
                    "slot {} is already blocked",
                    label.as_str()
                )))
            }
            _ => {}
        }
    }

    for label in labels {
        let changed = conn.execute(
            "INSERT INTO slots (date, time, blocked_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(date, time) DO UPDATE SET blocked_by = excluded.blocked_by
             WHERE slots.booked_by IS NULL AND slots.blocked_by IS NULL",
            params![fmt_date(date), label.as_str(), admin_id],
        )?;
        // the guard above saw this slot free, so a losing upsert means
        // another connection took it in between
        if changed == 0 {
            return Err(AppError::SlotUnavailable);
        }
    }
    Ok(())
}

pub fn block_slot(
    conn: &Connection,
    date: NaiveDate,
    label: TimeLabel,
    admin_id: &str,
) -> Result<(), AppError> {
    block_slots(conn, date, &[label], admin_id)
}

/// Lift a batch of blocks on one date. Only the admin who placed a block may
/// lift it; guards run for every label before any write.
pub fn unblock_slots(
    conn: &Connection,
    date: NaiveDate,
    labels: &[TimeLabel],
    admin_id: &str,
) -> Result<(), AppError> {
    for label in labels {
        let blocked_by: Option<Option<String>> = conn
            .query_row(
                "SELECT blocked_by FROM slots WHERE date = ?1 AND time = ?2",
                params![fmt_date(date), label.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match blocked_by {
            None => {
                return Err(AppError::NotFound(format!(
                    "slot {} on {}",
                    label.as_str(),
                    date
                )))
            }
            Some(None) => {
                return Err(AppError::InvalidState(format!(
                    "slot {} is not blocked",
                    label.as_str()
                )))
            }
            Some(Some(owner)) if owner != admin_id => {
                return Err(AppError::Forbidden(
                    "you cannot unblock a slot you didn't block".to_string(),
                ))
            }
            Some(Some(_)) => {}
        }
    }

    for label in labels {
        conn.execute(
            "UPDATE slots SET blocked_by = NULL WHERE date = ?1 AND time = ?2",
            params![fmt_date(date), label.as_str()],
        )?;
    }
    Ok(())
}

pub fn unblock_slot(
    conn: &Connection,
    date: NaiveDate,
    label: TimeLabel,
    admin_id: &str,
) -> Result<(), AppError> {
    unblock_slots(conn, date, &[label], admin_id)
}

/// The ordered 8-label view of one day, synthesizing `Available` for labels
/// with no stored row.
pub fn day_availability(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<SlotView>> {
    let mut stmt =
        conn.prepare("SELECT time, booked_by, blocked_by FROM slots WHERE date = ?1")?;
    let rows = stmt.query_map(params![fmt_date(date)], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut stored: Vec<(String, Option<String>, Option<String>)> = vec![];
    for row in rows {
        stored.push(row?);
    }

    Ok(TimeLabel::ALL
        .iter()
        .map(|label| {
            let row = stored.iter().find(|(time, _, _)| time == label.as_str());
            match row {
                Some((_, Some(booking_id), _)) => SlotView {
                    time: *label,
                    status: SlotStatus::Booked,
                    booked_by: Some(booking_id.clone()),
                    blocked_by: None,
                },
                Some((_, _, Some(admin_id))) => SlotView {
                    time: *label,
                    status: SlotStatus::Blocked,
                    booked_by: None,
                    blocked_by: Some(admin_id.clone()),
                },
                _ => SlotView {
                    time: *label,
                    status: SlotStatus::Available,
                    booked_by: None,
                    blocked_by: None,
                },
            }
        })
        .collect())
}

/// Dates in the inclusive range where every one of the 8 labels is blocked
/// by an admin. Used to disable days in the booking calendar.
pub fn fully_blocked_dates(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(
        "SELECT date FROM slots WHERE date >= ?1 AND date <= ?2
         GROUP BY date
         HAVING COUNT(*) = ?3
            AND SUM(CASE WHEN blocked_by IS NOT NULL THEN 1 ELSE 0 END) = ?3
         ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(
        params![fmt_date(start), fmt_date(end), TimeLabel::ALL.len() as i64],
        |row| row.get::<_, String>(0),
    )?;

    let mut dates = vec![];
    for row in rows {
        let date = row?;
        dates.push(
            NaiveDate::parse_from_str(&date, DATE_FMT)
                .map_err(|e| anyhow::anyhow!("bad slot date {date}: {e}"))?,
        );
    }
    Ok(dates)
}
