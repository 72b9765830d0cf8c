// Typed records for the JSON the tours, bookings, messaging and media services return

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::ApiError;

// Backend decimals come through either as JSON numbers or as strings ("120.00")
pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "decimal")] f64);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
}

// Python services emit naive ISO timestamps; treat them as UTC
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Tours
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TourImage {
    #[serde(default)]
    pub id: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tour {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    // Free text such as "3 days / 2 nights"
    pub duration: String,
    #[serde(default)]
    pub location: String,
    pub max_participants: u32,
    #[serde(default)]
    pub difficulty_level: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub available_dates: Vec<String>,
    #[serde(default)]
    pub images: Vec<TourImage>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tour {
    pub fn main_image(&self) -> Option<&TourImage> {
        self.images
            .iter()
            .find(|image| image.is_main)
            .or_else(|| self.images.iter().min_by_key(|image| image.display_order))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourImageInput {
    pub image_url: String,
    pub is_main: bool,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

// Admin create body; the server assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourInput {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub location: String,
    pub max_participants: u32,
    pub difficulty_level: String,
    pub includes: Vec<String>,
    pub available_dates: Vec<String>,
    pub images: Vec<TourImageInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_dates: Option<Vec<String>>,
    // Replaces the whole gallery when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<TourImageInput>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupPricing {
    pub id: String,
    pub tour_id: String,
    pub min_participants: u32,
    pub max_participants: u32,
    #[serde(deserialize_with = "decimal")]
    pub price_per_person: f64,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPricingInput {
    pub min_participants: u32,
    pub max_participants: u32,
    pub price_per_person: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupPricingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_person: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TourTag {
    pub id: String,
    pub tour_id: String,
    pub tag_id: String,
    pub tag: Tag,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Non-binding, server computed estimate for a tour and a group size.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceQuote {
    #[serde(deserialize_with = "decimal")]
    pub price_per_person: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_price: f64,
    pub participants: u32,
    pub pricing_tier: String,
}

impl PriceQuote {
    // Reject payloads that decode but cannot be shown to a customer
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.participants == 0 {
            return Err(ApiError::InvalidResponse(
                "price quote for zero participants".to_string(),
            ));
        }
        if !self.price_per_person.is_finite()
            || !self.total_price.is_finite()
            || self.price_per_person < 0.0
            || self.total_price < 0.0
        {
            return Err(ApiError::InvalidResponse(format!(
                "price quote with invalid amounts: {} / {}",
                self.price_per_person, self.total_price
            )));
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRequest {
    pub customer_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub tour_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_participants: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub tour_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_participants: u32,
    #[serde(deserialize_with = "decimal")]
    pub price_per_person: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_price: f64,
    pub status: BookingStatus,
    #[serde(default)]
    pub admin_viewed: bool,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

// Request body shared by the legacy availability and price endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityRequest {
    pub tour_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_participants: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub message: String,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub unavailable_dates: Vec<String>,
}

impl AvailabilityResult {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
            max_participants: None,
            unavailable_dates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceBreakdownDetail {
    #[serde(default, deserialize_with = "optional_decimal")]
    pub base_price_per_day: Option<f64>,
    #[serde(default, deserialize_with = "decimal")]
    pub seasonal_adjustment: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub group_discount_amount: f64,
    pub duration_days: u32,
    pub participants: u32,
    #[serde(default)]
    pub calculation_steps: Vec<String>,
}

// Seasonal/group calculation returned by the legacy bookings endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceBreakdown {
    pub tour_id: String,
    #[serde(deserialize_with = "decimal")]
    pub base_price_per_person: f64,
    #[serde(deserialize_with = "decimal")]
    pub seasonal_multiplier: f64,
    #[serde(deserialize_with = "decimal")]
    pub group_discount_percentage: f64,
    #[serde(deserialize_with = "decimal")]
    pub price_per_person: f64,
    #[serde(deserialize_with = "decimal")]
    pub total_price: f64,
    pub number_of_participants: u32,
    pub duration_days: u32,
    #[serde(default)]
    pub season_name: Option<String>,
    pub breakdown: PriceBreakdownDetail,
}

impl From<PriceBreakdown> for PriceQuote {
    fn from(item: PriceBreakdown) -> Self {
        PriceQuote {
            price_per_person: item.price_per_person,
            total_price: item.total_price,
            participants: item.number_of_participants,
            pricing_tier: item.season_name.unwrap_or_else(|| "standard".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Language {
    pub id: String,
    pub code: String,
    pub name: String,
    pub native_name: String,
    #[serde(default)]
    pub flag_emoji: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Language {
    // Languages the site ships translations for even when the tours service is down
    pub fn builtin() -> Vec<Language> {
        vec![
            Language {
                id: "builtin-en".to_string(),
                code: "en".to_string(),
                name: "English".to_string(),
                native_name: "English".to_string(),
                flag_emoji: "\u{1F1EC}\u{1F1E7}".to_string(),
                is_active: true,
                is_default: true,
                created_at: None,
            },
            Language {
                id: "builtin-fr".to_string(),
                code: "fr".to_string(),
                name: "French".to_string(),
                native_name: "Fran\u{E7}ais".to_string(),
                flag_emoji: "\u{1F1EB}\u{1F1F7}".to_string(),
                is_active: true,
                is_default: false,
                created_at: None,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageInput {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag_emoji: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TourLanguages {
    pub tour_id: String,
    pub available_languages: Vec<String>,
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReviewForm {
    pub tour_id: String,
    pub tour_title: String,
    pub customer_name: String,
    pub customer_email: String,
    pub booking_id: String,
    #[serde(default)]
    pub already_submitted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    pub rating: u8,
    pub review_text: Option<String>,
    pub customer_name: String,
}

// Verified, approved review shown on the tour page
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TourReview {
    pub id: String,
    pub rating: u8,
    #[serde(default)]
    pub review_text: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RatingStats {
    // 0.0 when the tour has no reviews yet
    #[serde(default, deserialize_with = "decimal")]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetailsPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: ContactDetailsPayload,
}

impl ContactMessage {
    // The messaging service redirects `to` to the admin inbox
    pub fn contact_form(data: ContactDetailsPayload) -> Self {
        Self {
            to: data.email.clone(),
            subject: data.subject.clone(),
            template: "contact_form".to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContactReceipt {
    pub message: String,
    pub notification_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
    pub recipient: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    pub status: DeliveryStatus,
    #[serde(default, deserialize_with = "timestamp")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub file_size: u64,
    pub mime_type: String,
    pub filename: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageUploadReceipt {
    pub url: String,
    pub filename: String,
    pub file_size: u64,
    pub mime_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaStats {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub storage_used: u64,
    #[serde(default)]
    pub storage_available: u64,
}

// Raw file handed to the media service as multipart form data
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: String,
    pub content: bytes::Bytes,
}
