use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::forms::{BookingDates, BookingForm, ClientForm, FormErrors};
use crate::models::{parse_money, parse_stored_datetime};

/// The booking submission couples two forms: the client identity and the
/// booking itself. Both are validated before anything is written, and
/// the save runs as one transaction so no partial state is observable.
#[derive(Debug, Default, Clone)]
pub struct BookingFlow {
    pub client: ClientForm,
    pub booking: BookingForm,
}

/// A fully validated submission, ready to persist.
#[derive(Debug, Clone)]
pub struct ValidBooking {
    pub client: ClientForm,
    pub dates: BookingDates,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("the room is already booked")]
    RoomTaken,
    #[error("the room does not exist")]
    UnknownRoom,
    #[error("a selected service does not exist")]
    UnknownService,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl BookingFlow {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            client: ClientForm::from_pairs(pairs),
            booking: BookingForm::from_pairs(pairs),
        }
    }

    /// Validates both forms, collecting every message before giving up.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidBooking, FormErrors> {
        let mut errors = self.client.validate();
        match self.booking.validate(now) {
            Ok(dates) if errors.is_empty() => Ok(ValidBooking {
                client: self.client.clone(),
                dates,
            }),
            Ok(_) => Err(errors),
            Err(booking_errors) => {
                errors.merge(booking_errors);
                Err(errors)
            }
        }
    }
}

/// Persists a validated submission: resolve-or-create the client, insert
/// the booking, attach the selected services, then compute the total.
/// All inside one transaction; a unique violation on the room maps to
/// [`BookingError::RoomTaken`].
pub async fn submit(pool: &SqlitePool, valid: &ValidBooking) -> Result<i64, BookingError> {
    let mut tx = pool.begin().await?;

    let client_id = resolve_or_create_client(&mut *tx, &valid.client).await?;

    let insert = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO bookings (client_id, room_id, start_book, end_book, total_price)
           VALUES (?, ?, ?, ?, '0')
           RETURNING id"#,
    )
    .bind(client_id)
    .bind(valid.dates.room_id)
    .bind(valid.dates.start.to_rfc3339())
    .bind(valid.dates.end.to_rfc3339())
    .fetch_one(&mut *tx)
    .await;

    let booking_id = match insert {
        Ok(id) => id,
        Err(sqlx::Error::Database(db))
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Err(BookingError::RoomTaken);
        }
        Err(sqlx::Error::Database(db))
            if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
        {
            return Err(BookingError::UnknownRoom);
        }
        Err(err) => return Err(err.into()),
    };

    for service_id in &valid.dates.service_ids {
        let link = sqlx::query(
            "INSERT OR IGNORE INTO booking_services (booking_id, service_id) VALUES (?, ?)",
        )
        .bind(booking_id)
        .bind(service_id)
        .execute(&mut *tx)
        .await;

        // A checkbox value that parses but names no service row is a
        // tampered form, not a server fault.
        match link {
            Ok(_) => {}
            Err(sqlx::Error::Database(db))
                if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
            {
                return Err(BookingError::UnknownService);
            }
            Err(err) => return Err(err.into()),
        }
    }

    calculate_total_price(&mut *tx, booking_id).await?;

    tx.commit().await?;
    Ok(booking_id)
}

/// Looks a client up by the unique name triple before inserting, so a
/// repeated submission resolves to the existing row instead of failing
/// on the constraint.
async fn resolve_or_create_client(
    conn: &mut SqliteConnection,
    client: &ClientForm,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar(
        r#"SELECT id FROM clients
           WHERE first_name = ? AND middle_name = ? AND last_name = ?
           LIMIT 1"#,
    )
    .bind(&client.first_name)
    .bind(&client.middle_name)
    .bind(&client.last_name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    sqlx::query_scalar(
        r#"INSERT INTO clients (first_name, middle_name, last_name, email)
           VALUES (?, ?, ?, ?)
           RETURNING id"#,
    )
    .bind(&client.first_name)
    .bind(&client.middle_name)
    .bind(&client.last_name)
    .bind(&client.email)
    .fetch_one(conn)
    .await
}

/// total = room price × whole days between start and end + sum of the
/// attached service prices. Fractional days truncate at the day count.
pub async fn calculate_total_price(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<Decimal, sqlx::Error> {
    let (start, end, room_price): (String, String, String) = sqlx::query_as(
        r#"SELECT b.start_book, b.end_book, r.price
           FROM bookings b
           JOIN rooms r ON b.room_id = r.id
           WHERE b.id = ?"#,
    )
    .bind(booking_id)
    .fetch_one(&mut *conn)
    .await?;

    let service_prices: Vec<String> = sqlx::query_scalar(
        r#"SELECT s.price FROM services s
           JOIN booking_services bs ON bs.service_id = s.id
           WHERE bs.booking_id = ?"#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    let days = match (parse_stored_datetime(&start), parse_stored_datetime(&end)) {
        (Some(start), Some(end)) => (end - start).num_seconds() / 86_400,
        _ => 0,
    };

    let services_total: Decimal = service_prices.iter().map(|price| parse_money(price)).sum();
    let total = parse_money(&room_price) * Decimal::from(days) + services_total;

    sqlx::query("UPDATE bookings SET total_price = ? WHERE id = ?")
        .bind(total.to_string())
        .bind(booking_id)
        .execute(conn)
        .await?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, testing};
    use crate::models::{BookingRow, ClientRow, RoomType, STATUS_APPROVED, STATUS_REJECTED};
    use chrono::{Duration, TimeZone};

    fn client(first: &str) -> ClientForm {
        ClientForm {
            first_name: first.to_string(),
            middle_name: "M".to_string(),
            last_name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
        }
    }

    fn valid(room_id: i64, days: i64, service_ids: Vec<i64>) -> ValidBooking {
        let start = Utc.with_ymd_and_hms(2027, 1, 10, 12, 0, 0).unwrap();
        ValidBooking {
            client: client("Ada"),
            dates: BookingDates {
                room_id,
                start,
                end: start + Duration::days(days),
                service_ids,
            },
        }
    }

    async fn booking(pool: &sqlx::SqlitePool, id: i64) -> BookingRow {
        sqlx::query_as("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn duplicate_client_resolves_to_existing_row() {
        let pool = testing::pool().await;
        let first = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let second = testing::insert_room(&pool, RoomType::Average, "10.00").await;

        let a = submit(&pool, &valid(first.id, 1, vec![])).await.unwrap();
        let mut repeat = valid(second.id, 1, vec![]);
        repeat.client.email = "changed@example.com".to_string();
        let b = submit(&pool, &repeat).await.unwrap();

        let (first_client, second_client) =
            (booking(&pool, a).await.client_id, booking(&pool, b).await.client_id);
        assert_eq!(first_client, second_client);

        let clients: Vec<ClientRow> = sqlx::query_as("SELECT * FROM clients")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(clients.len(), 1);
        // The existing row wins; the resubmitted email is not applied.
        assert_eq!(clients[0].email, "tester@example.com");
    }

    #[actix_web::test]
    async fn total_price_covers_room_days_and_services() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Vip, "100.00").await;
        assert_eq!(room.slug, format!("vip-{}", room.id));
        let service = testing::insert_service(&pool, "Breakfast", "20.00").await;

        let id = submit(&pool, &valid(room.id, 2, vec![service])).await.unwrap();

        let row = booking(&pool, id).await;
        assert_eq!(row.total_decimal(), "220.00".parse().unwrap());
    }

    #[actix_web::test]
    async fn fractional_days_truncate_at_the_day_count() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Comfort, "80.00").await;

        let start = Utc.with_ymd_and_hms(2027, 1, 10, 12, 0, 0).unwrap();
        let submission = ValidBooking {
            client: client("Grace"),
            dates: BookingDates {
                room_id: room.id,
                start,
                end: start + Duration::hours(36),
                service_ids: vec![],
            },
        };
        let id = submit(&pool, &submission).await.unwrap();

        let row = booking(&pool, id).await;
        assert_eq!(row.total_decimal(), "80.00".parse().unwrap());
    }

    #[actix_web::test]
    async fn a_room_can_only_be_booked_once() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;

        submit(&pool, &valid(room.id, 1, vec![])).await.unwrap();
        let second = ValidBooking {
            client: client("Grace"),
            ..valid(room.id, 3, vec![])
        };
        let err = submit(&pool, &second).await.unwrap_err();
        assert!(matches!(err, BookingError::RoomTaken));

        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bookings, 1);
    }

    #[actix_web::test]
    async fn unknown_service_id_is_rejected_and_rolled_back() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;

        let err = submit(&pool, &valid(room.id, 1, vec![9999])).await.unwrap_err();
        assert!(matches!(err, BookingError::UnknownService));

        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(bookings, 0);
    }

    #[actix_web::test]
    async fn failed_submission_leaves_no_partial_rows() {
        let pool = testing::pool().await;

        // Nonexistent room: the client resolved inside the transaction
        // must not survive the rollback.
        let err = submit(&pool, &valid(999, 1, vec![])).await.unwrap_err();
        assert!(matches!(err, BookingError::UnknownRoom));

        let clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(clients, 0);
    }

    #[actix_web::test]
    async fn booked_room_leaves_the_available_listing() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        submit(&pool, &valid(room.id, 1, vec![])).await.unwrap();

        let rooms = db::available_rooms(&pool, false).await.unwrap();
        assert!(rooms.iter().all(|r| r.id != room.id));
    }

    #[actix_web::test]
    async fn accepting_a_request_is_idempotent() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let id = submit(&pool, &valid(room.id, 1, vec![])).await.unwrap();

        assert_eq!(db::pending_bookings(&pool).await.unwrap().len(), 1);

        db::set_booking_status(&pool, id, STATUS_APPROVED).await.unwrap();
        db::set_booking_status(&pool, id, STATUS_APPROVED).await.unwrap();
        assert_eq!(booking(&pool, id).await.approve_status, STATUS_APPROVED);
        assert!(db::pending_bookings(&pool).await.unwrap().is_empty());

        // Transitions out of a terminal state are not blocked.
        db::set_booking_status(&pool, id, STATUS_REJECTED).await.unwrap();
        assert_eq!(booking(&pool, id).await.approve_status, STATUS_REJECTED);
    }

    #[actix_web::test]
    async fn deleting_a_booking_frees_the_room() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let service = testing::insert_service(&pool, "Spa", "35.00").await;
        let id = submit(&pool, &valid(room.id, 1, vec![service])).await.unwrap();

        assert!(db::delete_booking(&pool, id).await.unwrap());

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM booking_services")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);

        let rooms = db::available_rooms(&pool, false).await.unwrap();
        assert!(rooms.iter().any(|r| r.id == room.id));
    }
}
