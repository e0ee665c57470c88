use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

pub const STATUS_PENDING: i64 = 0;
pub const STATUS_APPROVED: i64 = 1;
pub const STATUS_REJECTED: i64 = 2;

pub const DEFAULT_ROOM_IMAGE: &str = "defaults/default.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomType {
    Average = 1,
    Comfort = 2,
    Vip = 3,
}

impl RoomType {
    pub fn from_code(code: i64) -> Option<RoomType> {
        match code {
            1 => Some(RoomType::Average),
            2 => Some(RoomType::Comfort),
            3 => Some(RoomType::Vip),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoomType::Average => "Average",
            RoomType::Comfort => "Comfort",
            RoomType::Vip => "VIP",
        }
    }

    pub fn all() -> [RoomType; 3] {
        [RoomType::Average, RoomType::Comfort, RoomType::Vip]
    }
}

pub fn status_label(status: i64) -> &'static str {
    match status {
        STATUS_APPROVED => "Approved",
        STATUS_REJECTED => "Rejected",
        _ => "Pending",
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    pub id: i64,
    pub room_type: i64,
    pub slug: String,
    pub price: String,
    pub image: String,
    pub description: String,
    pub is_hidden: i64,
    pub is_liked: i64,
}

impl RoomRow {
    pub fn type_label(&self) -> &'static str {
        RoomType::from_code(self.room_type)
            .map(RoomType::label)
            .unwrap_or("Average")
    }

    pub fn price_decimal(&self) -> Decimal {
        parse_money(&self.price)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub room_id: i64,
    pub created: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
}

impl ServiceRow {
    pub fn price_decimal(&self) -> Decimal {
        parse_money(&self.price)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: i64,
    pub client_id: i64,
    pub room_id: i64,
    pub start_book: String,
    pub end_book: String,
    pub total_price: String,
    pub approve_status: i64,
}

impl BookingRow {
    pub fn total_decimal(&self) -> Decimal {
        parse_money(&self.total_price)
    }
}

/// Booking joined with its client and room for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingDetailRow {
    pub id: i64,
    pub start_book: String,
    pub end_book: String,
    pub total_price: String,
    pub approve_status: i64,
    pub client_first_name: String,
    pub client_last_name: String,
    pub client_email: String,
    pub room_slug: String,
    pub room_type: i64,
    pub room_price: String,
}

impl BookingDetailRow {
    pub fn room_type_label(&self) -> &'static str {
        RoomType::from_code(self.room_type)
            .map(RoomType::label)
            .unwrap_or("Average")
    }
}

pub fn parse_money(raw: &str) -> Decimal {
    raw.trim().parse().unwrap_or_default()
}

/// Parses a stored RFC 3339 timestamp back into UTC.
pub fn parse_stored_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Parses an HTML `datetime-local` value ("2026-08-29T14:30"), treated as UTC.
pub fn parse_form_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .ok()
}

/// Human-readable rendering of a stored timestamp; falls back to the
/// raw value when it does not parse.
pub fn format_datetime(raw: &str) -> String {
    parse_stored_datetime(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
