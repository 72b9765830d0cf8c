// Contracts for the four backend services the booking site consumes
// Each method is a single request/response: no retries, no caching, one timeout per call

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    AvailabilityRequest, AvailabilityResult, BookingRequest, BookingResponse, BookingStatus,
    ContactMessage, ContactReceipt, GroupPricing, GroupPricingInput, GroupPricingPatch,
    ImageUpload, ImageUploadReceipt, Language, LanguageInput, LanguagePatch, MediaItem,
    MediaStats, Notification, PriceBreakdown, PriceQuote, RatingStats, ReviewForm,
    ReviewSubmission, Tag, TagInput, Tour, TourInput, TourPatch, TourReview, TourTag,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ApiError {
    // Transient failures are recoverable by re-attempting the same call
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::NetworkError(_) | ApiError::Timeout(_) => true,
            ApiError::ApiResponseError { status_code, .. } => {
                *status_code >= 500 || *status_code == 408 || *status_code == 429
            }
            ApiError::InvalidResponse(_) | ApiError::Serialization(_) | ApiError::Other(_) => {
                false
            }
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::ApiResponseError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

// Client side call statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_timeout: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

// Optional language for translated tour content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lang(pub Option<String>);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Lang(Some(code.into()))
    }

    pub fn any() -> Self {
        Lang(None)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
pub trait ToursApi: Send + Sync + 'static {
    async fn list_tours(&self, lang: &Lang) -> Result<Vec<Tour>, ApiError>;

    async fn get_tour(&self, tour_id: &str, lang: &Lang) -> Result<Tour, ApiError>;

    async fn create_tour(&self, tour: &TourInput) -> Result<Tour, ApiError>;

    async fn update_tour(&self, tour_id: &str, patch: &TourPatch) -> Result<Tour, ApiError>;

    async fn delete_tour(&self, tour_id: &str) -> Result<(), ApiError>;

    // First three tours for the landing page
    async fn featured_tours(&self, lang: &Lang) -> Result<Vec<Tour>, ApiError>;

    // GET /tours/{id}/calculate-price?participants=N
    async fn price_quote(&self, tour_id: &str, participants: u32)
        -> Result<PriceQuote, ApiError>;

    async fn group_pricing(&self, tour_id: &str) -> Result<Vec<GroupPricing>, ApiError>;

    async fn create_group_pricing(
        &self,
        tour_id: &str,
        tier: &GroupPricingInput,
    ) -> Result<GroupPricing, ApiError>;

    async fn update_group_pricing(
        &self,
        pricing_id: &str,
        patch: &GroupPricingPatch,
    ) -> Result<GroupPricing, ApiError>;

    async fn delete_group_pricing(&self, pricing_id: &str) -> Result<(), ApiError>;

    async fn tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn create_tag(&self, tag: &TagInput) -> Result<Tag, ApiError>;

    async fn update_tag(&self, tag_id: &str, tag: &TagInput) -> Result<Tag, ApiError>;

    async fn delete_tag(&self, tag_id: &str) -> Result<(), ApiError>;

    async fn tour_tags(&self, tour_id: &str) -> Result<Vec<TourTag>, ApiError>;

    async fn add_tag_to_tour(&self, tour_id: &str, tag_id: &str) -> Result<TourTag, ApiError>;

    async fn remove_tag_from_tour(&self, tour_id: &str, tag_id: &str) -> Result<(), ApiError>;

    async fn languages(&self, active_only: bool) -> Result<Vec<Language>, ApiError>;

    async fn create_language(&self, language: &LanguageInput) -> Result<Language, ApiError>;

    async fn update_language(
        &self,
        language_id: &str,
        patch: &LanguagePatch,
    ) -> Result<Language, ApiError>;

    async fn delete_language(&self, language_id: &str) -> Result<(), ApiError>;

    // Language codes a tour has translations for
    async fn tour_languages(&self, tour_id: &str) -> Result<Vec<String>, ApiError>;

    async fn review_form(&self, token: &str) -> Result<ReviewForm, ApiError>;

    async fn submit_review(&self, token: &str, review: &ReviewSubmission)
        -> Result<(), ApiError>;

    // Submitted reviews, newest first
    async fn tour_reviews(&self, tour_id: &str) -> Result<Vec<TourReview>, ApiError>;

    async fn rating_stats(&self, tour_id: &str) -> Result<RatingStats, ApiError>;
}

#[async_trait]
pub trait BookingsApi: Send + Sync + 'static {
    // The server re-validates availability and price authoritatively
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingResponse, ApiError>;

    async fn get_booking(&self, booking_id: &str) -> Result<BookingResponse, ApiError>;

    async fn list_bookings(&self) -> Result<Vec<BookingResponse>, ApiError>;

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<BookingResponse, ApiError>;

    async fn mark_booking_viewed(&self, booking_id: &str) -> Result<(), ApiError>;

    // Older flow: explicit availability check with start and end dates
    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResult, ApiError>;

    // Older flow: seasonal and group discount calculation
    async fn calculate_price(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<PriceBreakdown, ApiError>;
}

#[async_trait]
pub trait MessagingApi: Send + Sync + 'static {
    async fn send_contact(&self, message: &ContactMessage) -> Result<ContactReceipt, ApiError>;

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError>;

    async fn notification(&self, notification_id: &str) -> Result<Notification, ApiError>;
}

#[async_trait]
pub trait MediaApi: Send + Sync + 'static {
    async fn gallery(&self) -> Result<Vec<MediaItem>, ApiError>;

    async fn upload_gallery_image(
        &self,
        image: ImageUpload,
        caption: Option<String>,
    ) -> Result<MediaItem, ApiError>;

    async fn delete_gallery_image(&self, media_id: &str) -> Result<(), ApiError>;

    async fn upload_tour_image(&self, image: ImageUpload) -> Result<ImageUploadReceipt, ApiError>;

    async fn media_stats(&self) -> Result<MediaStats, ApiError>;
}

// Convenience for building the legacy request body
pub fn availability_request(
    tour_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    participants: u32,
) -> AvailabilityRequest {
    AvailabilityRequest {
        tour_id: tour_id.to_string(),
        start_date,
        end_date,
        number_of_participants: participants,
    }
}
