//! Domain model structs persisted in the catalog database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the HTTP
//! layer; input structs also derive `Deserialize`.

use annonces_shared::constants::DEFAULT_CURRENCY;
use annonces_shared::validation::{is_blank, is_valid_email, is_valid_phone};
use annonces_shared::{
    Category, CategoryAttributes, EventKind, ListingStatus, ListingType, StaffRole,
    ValidationError,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A classified ad as stored, with its JSON columns already decoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub listing_type: ListingType,
    pub price: f64,
    pub currency: String,
    /// Free-form location text ("Glass, delivery possible").
    pub location: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub contact_clicks: i64,
    pub shares: i64,
    /// Opaque category attribute map.
    pub category_payload: Map<String, Value>,
    /// Ordered photo references (URLs or stored paths).
    pub photos: Vec<String>,
    pub videos: Vec<String>,
}

impl Listing {
    /// Typed view of the payload.  A payload that does not fit the category's
    /// shape yields the empty attribute set.
    pub fn attributes(&self) -> CategoryAttributes {
        CategoryAttributes::from_structured_map(self.category, &self.category_payload)
            .unwrap_or_else(|e| {
                tracing::warn!(listing_id = self.id, error = %e, "category payload does not decode");
                CategoryAttributes::empty(self.category)
            })
    }
}

/// Fields for [`Database::create_listing`](crate::Database::create_listing).
///
/// Required values are modelled as `Option`/possibly-blank strings so that a
/// half-filled form can be validated into a complete list of reasons.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    /// Defaults to FCFA when blank.
    pub currency: String,
    pub location: Option<String>,
    pub city: String,
    pub neighborhood: Option<String>,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub contact_whatsapp: Option<String>,
    /// Defaults to draft.
    pub status: Option<ListingStatus>,
    pub expires_at: Option<DateTime<Utc>>,
    pub category_payload: Map<String, Value>,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
}

impl NewListing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        listing_type: ListingType,
        price: f64,
        city: impl Into<String>,
        contact_name: impl Into<String>,
        contact_phone: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: Some(category),
            listing_type: Some(listing_type),
            price: Some(price),
            currency: DEFAULT_CURRENCY.to_string(),
            city: city.into(),
            contact_name: contact_name.into(),
            contact_phone: contact_phone.into(),
            ..Default::default()
        }
    }

    /// Attach a typed attribute set.  The variant decides the category.
    pub fn with_attributes(mut self, attributes: impl Into<CategoryAttributes>) -> Self {
        let attributes = attributes.into();
        self.category = Some(attributes.category());
        self.category_payload = attributes.to_structured_map();
        self
    }

    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Collect every violated rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut reasons = Vec::new();

        if is_blank(&self.title) {
            reasons.push("title is required".to_string());
        }
        if is_blank(&self.description) {
            reasons.push("description is required".to_string());
        }
        if self.category.is_none() {
            reasons.push("category is required".to_string());
        }
        if self.listing_type.is_none() {
            reasons.push("listing type is required".to_string());
        }
        match self.price {
            None => reasons.push("price is required".to_string()),
            Some(price) => check_price(price, &mut reasons),
        }
        if is_blank(&self.city) {
            reasons.push("city is required".to_string());
        }
        if is_blank(&self.contact_name) {
            reasons.push("contact name is required".to_string());
        }
        if is_blank(&self.contact_phone) {
            reasons.push("contact phone is required".to_string());
        } else {
            check_phone("contact phone", &self.contact_phone, &mut reasons);
        }
        if let Some(whatsapp) = self.contact_whatsapp.as_deref().filter(|w| !is_blank(w)) {
            check_phone("whatsapp number", whatsapp, &mut reasons);
        }
        check_email(self.contact_email.as_deref(), &mut reasons);

        ValidationError::check(reasons)
    }
}

/// Partial update for [`Database::update_listing`](crate::Database::update_listing).
///
/// Only `Some` fields are written.  For nullable text columns an empty string
/// clears the value; `expires_at: Some(None)` (JSON `null`) clears the
/// expiry.  Payload and media lists replace the stored value wholesale.
/// Counters are not updatable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub status: Option<ListingStatus>,
    #[serde(deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub category_payload: Option<Map<String, Value>>,
    pub photos: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
}

impl ListingUpdate {
    pub fn status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Provided required fields must not be blanked out.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut reasons = Vec::new();

        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("city", &self.city),
            ("contact name", &self.contact_name),
            ("contact phone", &self.contact_phone),
        ];
        for (name, value) in required {
            if value.as_deref().is_some_and(is_blank) {
                reasons.push(format!("{name} cannot be empty"));
            }
        }
        if let Some(price) = self.price {
            check_price(price, &mut reasons);
        }
        if let Some(phone) = self.contact_phone.as_deref().filter(|p| !is_blank(p)) {
            check_phone("contact phone", phone, &mut reasons);
        }
        if let Some(whatsapp) = self.contact_whatsapp.as_deref().filter(|w| !is_blank(w)) {
            check_phone("whatsapp number", whatsapp, &mut reasons);
        }
        check_email(self.contact_email.as_deref(), &mut reasons);

        ValidationError::check(reasons)
    }
}

fn check_price(price: f64, reasons: &mut Vec<String>) {
    if !price.is_finite() {
        reasons.push("price must be a number".to_string());
    } else if price < 0.0 {
        reasons.push("price must not be negative".to_string());
    }
}

fn check_phone(field: &str, phone: &str, reasons: &mut Vec<String>) {
    if !is_valid_phone(phone) {
        reasons.push(format!("{field} {phone:?} is not a Gabonese number"));
    }
}

/// A field that is present in the JSON, even as `null`, becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_email(email: Option<&str>, reasons: &mut Vec<String>) {
    if let Some(email) = email.filter(|e| !is_blank(e)) {
        if !is_valid_email(email) {
            reasons.push(format!("contact email {email:?} is not a valid address"));
        }
    }
}

// ---------------------------------------------------------------------------
// Engagement events
// ---------------------------------------------------------------------------

/// One row of the append-only engagement log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementEvent {
    pub id: i64,
    /// `None` for events whose listing reference was never set.
    pub listing_id: Option<i64>,
    pub kind: EventKind,
    /// Channel label such as `whatsapp` or `facebook`.
    pub source: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub extra: Option<Value>,
}

/// Input for [`Database::record_event`](crate::Database::record_event).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEvent {
    pub listing_id: Option<i64>,
    pub kind: EventKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Defaults to the recording time.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: Option<Value>,
}

impl NewEvent {
    pub fn new(listing_id: i64, kind: EventKind) -> Self {
        Self {
            listing_id: Some(listing_id),
            kind,
            source: None,
            ip: None,
            user_agent: None,
            occurred_at: None,
            extra: None,
        }
    }

    /// Event not attached to any listing.
    pub fn orphan(kind: EventKind) -> Self {
        Self {
            listing_id: None,
            ..Self::new(0, kind)
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_requester(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A visitor account.  The password hash is produced and checked by the
/// authentication layer; the store only keeps it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A back-office account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: StaffRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Closed time interval `[start, end]` over event timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[end - days, end]`, or `None` when the start falls outside the
    /// representable range.
    pub fn days_before(end: DateTime<Utc>, days: i64) -> Option<Self> {
        let start = Duration::try_days(days).and_then(|d| end.checked_sub_signed(d))?;
        Some(Self { start, end })
    }

    /// The last `days` days up to now.
    pub fn last_days(days: i64) -> Option<Self> {
        Self::days_before(Utc::now(), days)
    }
}

/// Per-listing engagement inside a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingPerformance {
    pub listing_id: i64,
    pub title: String,
    pub category: Category,
    pub city: String,
    pub price: f64,
    pub views: i64,
    pub contact_clicks: i64,
    pub shares: i64,
    /// `contact_clicks / views * 100`, one decimal, 0 without views.
    pub contact_rate: f64,
    pub created_at: DateTime<Utc>,
}

/// Per-category totals inside a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRollup {
    pub category: Category,
    /// Published listings in the category.
    pub listings: i64,
    pub views: i64,
    pub contact_clicks: i64,
    pub shares: i64,
    pub views_per_listing: f64,
    pub clicks_per_listing: f64,
    pub contact_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

/// Events of one kind on one UTC day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub day: NaiveDate,
    pub kind: EventKind,
    pub count: i64,
}

/// Dashboard headline figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    pub views: i64,
    pub contact_clicks: i64,
    pub shares: i64,
    /// Published listings right now (not windowed).
    pub active_listings: i64,
    pub contact_rate: f64,
    pub share_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_counts_back_from_its_end() {
        let end = Utc.with_ymd_and_hms(2020, 1, 31, 0, 0, 0).unwrap();
        let window = TimeWindow::days_before(end, 30).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, end);
    }

    #[test]
    fn out_of_range_window_is_none() {
        assert!(TimeWindow::last_days(1_000_000_000).is_none());
        assert!(TimeWindow::last_days(i64::MAX).is_none());
        assert!(TimeWindow::last_days(30).is_some());
    }
}
