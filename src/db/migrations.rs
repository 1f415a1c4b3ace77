use anyhow::Context;
use rusqlite::Connection;

// Migrations are embedded so in-memory test databases get the full schema.
// Each entry is applied once and recorded in _migrations.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_bookings_and_slots",
    "CREATE TABLE IF NOT EXISTS bookings (
        id TEXT PRIMARY KEY,
        customer_name TEXT NOT NULL,
        email TEXT NOT NULL,
        contact_number TEXT NOT NULL,
        first_line_of_address TEXT NOT NULL,
        town TEXT NOT NULL,
        postcode TEXT NOT NULL,
        selected_date TEXT NOT NULL,
        selected_time_slot TEXT NOT NULL,
        service TEXT NOT NULL,
        cleaning_options TEXT NOT NULL DEFAULT '[]',
        repair_options TEXT NOT NULL DEFAULT '[]',
        home_style TEXT NOT NULL,
        number_of_bedrooms TEXT,
        number_of_stories TEXT,
        message TEXT,
        total_price TEXT NOT NULL,
        payment_method TEXT NOT NULL,
        payment_status TEXT NOT NULL DEFAULT 'pending',
        refund_status TEXT NOT NULL DEFAULT 'pending',
        paypal_order_id TEXT,
        mollie_payment_id TEXT,
        capture_id TEXT,
        refund_id TEXT,
        refund_amount TEXT,
        refund_reason TEXT,
        refund_date TEXT,
        is_locked INTEGER NOT NULL DEFAULT 0,
        lock_expires_at TEXT,
        is_booked INTEGER NOT NULL DEFAULT 0,
        booked_by TEXT NOT NULL DEFAULT 'customer',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(selected_date);
    CREATE INDEX IF NOT EXISTS idx_bookings_paypal_order
        ON bookings(paypal_order_id) WHERE paypal_order_id IS NOT NULL;
    CREATE INDEX IF NOT EXISTS idx_bookings_mollie_payment
        ON bookings(mollie_payment_id) WHERE mollie_payment_id IS NOT NULL;

    -- One row per (date, time label). booked_by holds a booking id,
    -- blocked_by an admin id; a slot is never both at once.
    CREATE TABLE IF NOT EXISTS slots (
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        booked_by TEXT,
        blocked_by TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE (date, time),
        CHECK (booked_by IS NULL OR blocked_by IS NULL)
    );",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
