// Client library for the Morocco tours booking site: service clients and the booking estimation workflow

pub mod api;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod estimate;
pub mod http_client;
pub mod language_cache;
pub mod models;
pub mod notify;
pub mod telemetry;
pub mod validation;

#[cfg(test)]
mod mock_server;

// Re-export key types for convenience
pub use api::{ApiError, BookingsApi, ClientStats, Lang, MediaApi, MessagingApi, ToursApi};
pub use booking::{
    BookingDraft, BookingWorkflow, ContactDetails, EstimationMode, NotReady, SubmitError,
    WorkflowOptions, WorkflowState,
};
pub use catalog::{CatalogError, TourDetails};
pub use config::{ClientConfig, ConfigError, Service, ServiceEndpoints};
pub use estimate::{derive_end_date, format_price, parse_duration_days};
pub use http_client::HttpApiClient;
pub use language_cache::{ActiveLanguages, LanguageCache, MemoryLanguageCache};
pub use models::{
    AvailabilityResult, BookingRequest, BookingResponse, BookingStatus, Language, PriceQuote,
    RatingStats, Tour, TourInput, TourPatch, TourReview,
};
pub use notify::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use validation::ValidationError;
