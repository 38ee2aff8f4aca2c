//! Database row types. These map directly to SQLite rows and stay independent
//! of the API models in `evently-types`; the `into_*` methods do the conversion.

use anyhow::{Context, Result};
use uuid::Uuid;

use evently_types::models::{Badge, Event, Payment, Role, Tag, Trend, User};

use crate::parse_timestamp;

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    raw.parse::<Uuid>()
        .with_context(|| format!("Corrupt {} '{}'", what, raw))
}

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub image: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id, "user id")?,
            name: self.name,
            email: self.email,
            role: self.role.parse::<Role>().map_err(anyhow::Error::msg)?,
            image: self.image,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }

    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }
}

pub struct EventRow {
    pub id: String,
    pub organizer_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: String,
    pub price_cents: i64,
    pub created_at: String,
}

impl EventRow {
    pub fn into_event(self) -> Result<Event> {
        Ok(Event {
            id: parse_id(&self.id, "event id")?,
            organizer_id: parse_id(&self.organizer_id, "organizer id")?,
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: parse_timestamp(&self.starts_at)?,
            price_cents: self.price_cents,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct TagRow {
    pub id: String,
    pub name: String,
}

impl TagRow {
    pub fn into_tag(self) -> Result<Tag> {
        Ok(Tag {
            id: parse_id(&self.id, "tag id")?,
            name: self.name,
        })
    }
}

/// `content` is ciphertext; decryption happens above the DB layer.
pub struct PrivateMessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct PaymentRow {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub reference: String,
    pub created_at: String,
}

impl PaymentRow {
    pub fn into_payment(self) -> Result<Payment> {
        Ok(Payment {
            id: parse_id(&self.id, "payment id")?,
            event_id: parse_id(&self.event_id, "event id")?,
            amount_cents: self.amount_cents,
            reference: self.reference,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct BadgeRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub earned_at: String,
}

impl BadgeRow {
    pub fn into_badge(self) -> Result<Badge> {
        Ok(Badge {
            id: parse_id(&self.id, "badge id")?,
            user_id: parse_id(&self.user_id, "user id")?,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            earned_at: parse_timestamp(&self.earned_at)?,
        })
    }
}

pub struct TrendRow {
    pub kind: String,
    pub name: String,
    pub count: i64,
    pub updated_at: String,
}

impl TrendRow {
    pub fn into_trend(self) -> Result<Trend> {
        Ok(Trend {
            kind: self.kind,
            name: self.name,
            count: self.count,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
