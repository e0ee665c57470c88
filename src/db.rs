use std::{fs, path::Path};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::models::{
    slugify, BookingDetailRow, BookingRow, CommentRow, RoomRow, RoomType, ServiceRow,
    DEFAULT_ROOM_IMAGE, STATUS_PENDING,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Seeds the service catalog. Services are reference data with no admin
/// editing surface, so defaults are inserted once on an empty table.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let services = [
        ("Breakfast", "Continental breakfast served in the room.", "20.00"),
        ("Spa access", "Full-day access to the spa and pool area.", "35.00"),
        ("Airport transfer", "Pickup and drop-off at the airport.", "50.00"),
    ];

    for (title, description, price) in services {
        sqlx::query("INSERT INTO services (title, description, price) VALUES (?, ?, ?)")
            .bind(title)
            .bind(description)
            .bind(price)
            .execute(pool)
            .await?;
    }

    Ok(())
}

pub struct NewRoom {
    pub room_type: RoomType,
    pub price: Decimal,
    pub image: Option<String>,
    pub description: String,
    pub slug: Option<String>,
}

/// Creates a room in two explicit phases inside one transaction: insert
/// the row, then finalize it once the id is known (the slug is derived
/// from the type label and id when none was supplied).
pub async fn create_room(pool: &SqlitePool, new: NewRoom) -> Result<RoomRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let image = new
        .image
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM_IMAGE.to_string());

    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO rooms (room_type, slug, price, image, description)
           VALUES (?, '', ?, ?, ?)
           RETURNING id"#,
    )
    .bind(new.room_type as i64)
    .bind(new.price.to_string())
    .bind(image)
    .bind(new.description)
    .fetch_one(&mut *tx)
    .await?;

    let slug = match new.slug.filter(|slug| !slug.trim().is_empty()) {
        Some(slug) => slug,
        None => slugify(&format!("{} {}", new.room_type.label(), id)),
    };
    sqlx::query("UPDATE rooms SET slug = ? WHERE id = ?")
        .bind(&slug)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let room = sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(room)
}

pub async fn fetch_room_by_slug(pool: &SqlitePool, slug: &str) -> Option<RoomRow> {
    sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE slug = ? LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .unwrap_or(None)
}

pub async fn fetch_room_by_id(pool: &SqlitePool, id: i64) -> Option<RoomRow> {
    sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE id = ? LIMIT 1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .unwrap_or(None)
}

/// Rooms visible to clients: not hidden and without a booking. With
/// `liked_only` the list is further narrowed to favorites.
pub async fn available_rooms(
    pool: &SqlitePool,
    liked_only: bool,
) -> Result<Vec<RoomRow>, sqlx::Error> {
    let base = r#"SELECT r.* FROM rooms r
         WHERE r.is_hidden = 0
           AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.room_id = r.id)"#;
    let query = if liked_only {
        format!("{base} AND r.is_liked = 1 ORDER BY r.id DESC")
    } else {
        format!("{base} ORDER BY r.id DESC")
    };
    sqlx::query_as::<_, RoomRow>(&query).fetch_all(pool).await
}

pub async fn all_rooms(pool: &SqlitePool) -> Result<Vec<RoomRow>, sqlx::Error> {
    sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms ORDER BY id DESC")
        .fetch_all(pool)
        .await
}

pub async fn set_room_liked(pool: &SqlitePool, id: i64, liked: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET is_liked = ? WHERE id = ?")
        .bind(liked as i64)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_room_hidden(pool: &SqlitePool, id: i64, hidden: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET is_hidden = ? WHERE id = ?")
        .bind(hidden as i64)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes a room with its comments and booking in one transaction.
/// The schema-level cascade remains as a backstop.
pub async fn delete_room(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "DELETE FROM booking_services WHERE booking_id IN (SELECT id FROM bookings WHERE room_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM bookings WHERE room_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE room_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn booking_for_room(pool: &SqlitePool, room_id: i64) -> Option<BookingRow> {
    sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE room_id = ? LIMIT 1")
        .bind(room_id)
        .fetch_optional(pool)
        .await
        .unwrap_or(None)
}

/// True when the room's booking has been approved.
pub async fn room_is_reserved(pool: &SqlitePool, room_id: i64) -> bool {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bookings WHERE room_id = ? AND approve_status = 1",
    )
    .bind(room_id)
    .fetch_one(pool)
    .await
    .unwrap_or(0)
        > 0
}

pub async fn comments_for_room(
    pool: &SqlitePool,
    room_id: i64,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(
        "SELECT * FROM comments WHERE room_id = ? ORDER BY created DESC, id DESC",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await
}

pub async fn add_comment(pool: &SqlitePool, room_id: i64, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO comments (content, room_id, created) VALUES (?, ?, ?)")
        .bind(content)
        .bind(room_id)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn all_services(pool: &SqlitePool) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>("SELECT * FROM services ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn has_bookings(pool: &SqlitePool) -> bool {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
        > 0
}

const BOOKING_DETAIL_SELECT: &str = r#"SELECT b.id, b.start_book, b.end_book, b.total_price, b.approve_status,
           c.first_name AS client_first_name, c.last_name AS client_last_name,
           c.email AS client_email,
           r.slug AS room_slug, r.room_type, r.price AS room_price
      FROM bookings b
      JOIN clients c ON b.client_id = c.id
      JOIN rooms r ON b.room_id = r.id"#;

pub async fn all_bookings(pool: &SqlitePool) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    let query = format!("{BOOKING_DETAIL_SELECT} ORDER BY b.id DESC");
    sqlx::query_as::<_, BookingDetailRow>(&query)
        .fetch_all(pool)
        .await
}

pub async fn pending_bookings(pool: &SqlitePool) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    let query = format!("{BOOKING_DETAIL_SELECT} WHERE b.approve_status = ? ORDER BY b.id DESC");
    sqlx::query_as::<_, BookingDetailRow>(&query)
        .bind(STATUS_PENDING)
        .fetch_all(pool)
        .await
}

pub async fn booking_detail(pool: &SqlitePool, id: i64) -> Option<BookingDetailRow> {
    let query = format!("{BOOKING_DETAIL_SELECT} WHERE b.id = ? LIMIT 1");
    sqlx::query_as::<_, BookingDetailRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .unwrap_or(None)
}

pub async fn set_booking_status(
    pool: &SqlitePool,
    id: i64,
    status: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE bookings SET approve_status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_booking(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM booking_services WHERE booking_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn services_for_booking(
    pool: &SqlitePool,
    booking_id: i64,
) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT s.* FROM services s
           JOIN booking_services bs ON bs.service_id = s.id
           WHERE bs.booking_id = ?
           ORDER BY s.id"#,
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomType, DEFAULT_ROOM_IMAGE};

    #[actix_web::test]
    async fn room_slug_derives_from_type_and_id() {
        let pool = testing::pool().await;
        let first = testing::insert_room(&pool, RoomType::Vip, "100.00").await;
        assert_eq!(first.slug, format!("vip-{}", first.id));
        assert_eq!(first.image, DEFAULT_ROOM_IMAGE);

        let second = testing::insert_room(&pool, RoomType::Comfort, "55.50").await;
        assert_eq!(second.slug, format!("comfort-{}", second.id));
        assert_ne!(first.slug, second.slug);
    }

    #[actix_web::test]
    async fn explicit_slug_is_kept() {
        let pool = testing::pool().await;
        let room = create_room(
            &pool,
            NewRoom {
                room_type: RoomType::Average,
                price: "10.00".parse().unwrap(),
                image: Some("rooms/2026/08/29/pic.png".to_string()),
                description: "Quiet room".to_string(),
                slug: Some("garden-view".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(room.slug, "garden-view");
        assert_eq!(room.image, "rooms/2026/08/29/pic.png");
    }

    #[actix_web::test]
    async fn available_rooms_excludes_hidden() {
        let pool = testing::pool().await;
        let visible = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let hidden = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        set_room_hidden(&pool, hidden.id, true).await.unwrap();

        let rooms = available_rooms(&pool, false).await.unwrap();
        let ids: Vec<i64> = rooms.iter().map(|r| r.id).collect();
        assert!(ids.contains(&visible.id));
        assert!(!ids.contains(&hidden.id));
    }

    #[actix_web::test]
    async fn favorites_require_like_flag() {
        let pool = testing::pool().await;
        let plain = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let liked = testing::insert_room(&pool, RoomType::Comfort, "20.00").await;
        set_room_liked(&pool, liked.id, true).await.unwrap();

        let favorites = available_rooms(&pool, true).await.unwrap();
        let ids: Vec<i64> = favorites.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![liked.id]);
        assert!(!ids.contains(&plain.id));
    }

    #[actix_web::test]
    async fn deleting_a_room_removes_its_comments() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        add_comment(&pool, room.id, "Nice view").await.unwrap();

        delete_room(&pool, room.id).await.unwrap();

        assert!(fetch_room_by_id(&pool, room.id).await.is_none());
        let comments = comments_for_room(&pool, room.id).await.unwrap();
        assert!(comments.is_empty());
    }

    #[actix_web::test]
    async fn comments_come_back_newest_first() {
        let pool = testing::pool().await;
        let room = testing::insert_room(&pool, RoomType::Average, "10.00").await;
        let entries = [
            ("oldest", "2026-08-01T00:00:00+00:00"),
            ("middle", "2026-08-02T00:00:00+00:00"),
            ("newest", "2026-08-03T00:00:00+00:00"),
        ];
        for (text, created) in entries {
            sqlx::query("INSERT INTO comments (content, room_id, created) VALUES (?, ?, ?)")
                .bind(text)
                .bind(room.id)
                .bind(created)
                .execute(&pool)
                .await
                .unwrap();
        }
        let comments = comments_for_room(&pool, room.id).await.unwrap();
        let order: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(order, vec!["newest", "middle", "oldest"]);
    }
}
