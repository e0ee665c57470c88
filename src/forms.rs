use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{parse_form_datetime, RoomType};

/// Accumulated validation messages for one submission: per-field entries
/// plus form-level entries that belong to no single field.
#[derive(Debug, Default, Clone)]
pub struct FormErrors {
    pub fields: Vec<(&'static str, String)>,
    pub form: Vec<String>,
}

impl FormErrors {
    pub fn field(&mut self, name: &'static str, message: &str) {
        self.fields.push((name, message.to_string()));
    }

    pub fn form_level(&mut self, message: &str) {
        self.form.push(message.to_string());
    }

    pub fn merge(&mut self, other: FormErrors) {
        self.fields.extend(other.fields);
        self.form.extend(other.form);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty()
    }

    /// Flat message list for template rendering.
    pub fn messages(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field.replace('_', " "), message))
            .collect();
        all.extend(self.form.iter().cloned());
        all
    }
}

fn value_of(pairs: &[(String, String)], name: &str) -> String {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

fn values_of(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct ClientForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
}

impl ClientForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            first_name: value_of(pairs, "first_name"),
            middle_name: value_of(pairs, "middle_name"),
            last_name: value_of(pairs, "last_name"),
            email: value_of(pairs, "email"),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        for (name, value) in [
            ("first_name", &self.first_name),
            ("middle_name", &self.middle_name),
            ("last_name", &self.last_name),
        ] {
            if value.is_empty() {
                errors.field(name, "This field is required.");
            }
        }
        if self.email.is_empty() {
            errors.field("email", "This field is required.");
        } else if !self.email.contains('@') {
            errors.field("email", "Enter a valid email address.");
        }
        errors
    }
}

#[derive(Debug, Default, Clone)]
pub struct BookingForm {
    pub room: String,
    pub start_book: String,
    pub end_book: String,
    pub services: Vec<String>,
}

/// Validated booking fields with parsed dates.
#[derive(Debug, Clone)]
pub struct BookingDates {
    pub room_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub service_ids: Vec<i64>,
}

impl BookingForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            room: value_of(pairs, "room"),
            start_book: value_of(pairs, "start_book"),
            end_book: value_of(pairs, "end_book"),
            services: values_of(pairs, "services"),
        }
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<BookingDates, FormErrors> {
        let mut errors = FormErrors::default();

        let room_id = self.room.parse::<i64>().ok();
        if room_id.is_none() {
            errors.field("room", "Please choose a room to book.");
        }

        let start = parse_date_field(&self.start_book, "start_book", &mut errors);
        let end = parse_date_field(&self.end_book, "end_book", &mut errors);

        if let Some(start) = start {
            if start <= now {
                errors.field("start_book", "Start date must be in the future.");
            }
        }
        if let Some(end) = end {
            if end <= now {
                errors.field("end_book", "End date must be in the future.");
            }
        }

        // Date ordering is a single form-level error, not tied to a field.
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                errors.form_level(
                    "Invalid booking dates. Please ensure that the start booking date \
                     is not later than the end booking date.",
                );
            }
        }

        let service_ids: Vec<i64> = self
            .services
            .iter()
            .filter_map(|raw| raw.parse().ok())
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(BookingDates {
            room_id: room_id.unwrap_or_default(),
            start: start.unwrap_or(now),
            end: end.unwrap_or(now),
            service_ids,
        })
    }
}

fn parse_date_field(
    raw: &str,
    name: &'static str,
    errors: &mut FormErrors,
) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        errors.field(name, "This field is required.");
        return None;
    }
    let parsed = parse_form_datetime(raw);
    if parsed.is_none() {
        errors.field(name, "Enter a valid date and time.");
    }
    parsed
}

#[derive(Debug, Default, Clone)]
pub struct RoomForm {
    pub room_type: String,
    pub price: String,
    pub description: String,
    pub image: Option<String>,
}

/// Validated room fields ready for the store.
#[derive(Debug, Clone)]
pub struct RoomFields {
    pub room_type: RoomType,
    pub price: Decimal,
    pub description: String,
    pub image: Option<String>,
}

impl RoomForm {
    pub fn validate(&self) -> Result<RoomFields, FormErrors> {
        let mut errors = FormErrors::default();

        let room_type = self
            .room_type
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(RoomType::from_code);
        if room_type.is_none() {
            errors.field("room_type", "Choose a valid room type.");
        }

        let price = self.price.trim().parse::<Decimal>().ok();
        match price {
            None => errors.field("price", "Enter a valid price."),
            Some(price) if price < Decimal::ZERO => {
                errors.field("price", "Price cannot be negative.")
            }
            Some(_) => {}
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(RoomFields {
            room_type: room_type.unwrap_or(RoomType::Average),
            price: price.unwrap_or_default(),
            description: self.description.trim().to_string(),
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommentForm {
    pub content: String,
}

impl CommentForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.content.trim().is_empty() {
            errors.field("content", "This field is required.");
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use crate::models::RoomType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn client_form_requires_names_and_email() {
        let form = ClientForm::from_pairs(&pairs(&[("first_name", "Ada")]));
        let errors = form.validate();
        let fields: Vec<&str> = errors.fields.iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["middle_name", "last_name", "email"]);
    }

    #[test]
    fn client_form_rejects_malformed_email() {
        let form = ClientForm {
            first_name: "Ada".into(),
            middle_name: "King".into(),
            last_name: "Lovelace".into(),
            email: "not-an-email".into(),
        };
        let errors = form.validate();
        assert_eq!(errors.fields.len(), 1);
        assert_eq!(errors.fields[0].0, "email");
    }

    #[test]
    fn booking_form_parses_fields_and_services() {
        let form = BookingForm::from_pairs(&pairs(&[
            ("room", "3"),
            ("start_book", "2026-09-01T12:00"),
            ("end_book", "2026-09-03T12:00"),
            ("services", "1"),
            ("services", "2"),
            ("services", "bogus"),
        ]));
        let dates = form.validate(now()).unwrap();
        assert_eq!(dates.room_id, 3);
        assert_eq!(dates.service_ids, vec![1, 2]);
        assert_eq!(dates.end - dates.start, Duration::days(2));
    }

    #[test]
    fn booking_dates_must_be_in_the_future() {
        let form = BookingForm {
            room: "1".into(),
            start_book: "2026-08-01T12:00".into(),
            end_book: "2026-08-02T12:00".into(),
            services: Vec::new(),
        };
        let errors = form.validate(now()).unwrap_err();
        let fields: Vec<&str> = errors.fields.iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["start_book", "end_book"]);
    }

    #[test]
    fn date_order_violation_is_a_single_form_level_error() {
        let form = BookingForm {
            room: "1".into(),
            start_book: "2026-09-05T12:00".into(),
            end_book: "2026-09-01T12:00".into(),
            services: Vec::new(),
        };
        let errors = form.validate(now()).unwrap_err();
        assert!(errors.fields.is_empty());
        assert_eq!(errors.form.len(), 1);
    }

    #[test]
    fn room_form_validates_type_and_price() {
        let form = RoomForm {
            room_type: "3".into(),
            price: "100.00".into(),
            description: " Sea view ".into(),
            image: None,
        };
        let fields = form.validate().unwrap();
        assert_eq!(fields.room_type, RoomType::Vip);
        assert_eq!(fields.description, "Sea view");

        let bad = RoomForm {
            room_type: "9".into(),
            price: "-5".into(),
            description: String::new(),
            image: None,
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.fields.len(), 2);
    }
}
