// reqwest implementation of the service contracts

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::api::{ApiError, BookingsApi, ClientStats, Lang, MediaApi, MessagingApi, ToursApi};
use crate::config::{ClientConfig, Service, ServiceEndpoints};
use crate::models::{
    AvailabilityRequest, AvailabilityResult, BookingRequest, BookingResponse, BookingStatus,
    ContactMessage, ContactReceipt, GroupPricing, GroupPricingInput, GroupPricingPatch,
    ImageUpload, ImageUploadReceipt, Language, LanguageInput, LanguagePatch, MediaItem,
    MediaStats, Notification, PriceBreakdown, PriceQuote, RatingStats, ReviewForm,
    ReviewSubmission, Tag, TagInput, Tour, TourInput, TourLanguages, TourPatch, TourReview,
    TourTag,
};

// Parsed base URL per service
#[derive(Debug, Clone)]
struct BaseUrls {
    tours: Url,
    bookings: Url,
    messaging: Url,
    media: Url,
}

impl BaseUrls {
    fn parse(endpoints: &ServiceEndpoints) -> Result<Self, ApiError> {
        let parse = |service: Service| {
            let raw = endpoints.url_for(service);
            match Url::parse(raw) {
                Ok(url) if !url.cannot_be_a_base() => Ok(url),
                Ok(_) => Err(ApiError::Other(format!(
                    "{} URL cannot take a path: {}",
                    service.as_str(),
                    raw
                ))),
                Err(e) => Err(ApiError::Other(format!(
                    "invalid {} URL {}: {}",
                    service.as_str(),
                    raw,
                    e
                ))),
            }
        };
        Ok(Self {
            tours: parse(Service::Tours)?,
            bookings: parse(Service::Bookings)?,
            messaging: parse(Service::Messaging)?,
            media: parse(Service::Media)?,
        })
    }

    // Each segment is percent-encoded on its own, so ids holding '/' or '?' stay one segment
    fn url(&self, service: Service, segments: &[&str]) -> Url {
        let mut url = match service {
            Service::Tours => self.tours.clone(),
            Service::Bookings => self.bookings.clone(),
            Service::Messaging => self.messaging.clone(),
            Service::Media => self.media.clone(),
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    bases: BaseUrls,
    timeout_ms: u64,
    stats: Arc<Mutex<ClientStats>>,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bases: BaseUrls::parse(&config.endpoints)?,
            timeout_ms: config.timeout_ms,
            stats: Arc::new(Mutex::new(ClientStats::default())),
        })
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    // Builder plus the encoded path used in log lines
    fn request(&self, service: Service, method: &Method, segments: &[&str]) -> (RequestBuilder, String) {
        let url = self.bases.url(service, segments);
        let path = url.path().to_string();
        (self.client.request(method.clone(), url), path)
    }

    // Sends the request, records stats and turns transport or status failures into ApiError
    async fn execute(
        &self,
        service: Service,
        method: &Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        debug!(service = service.as_str(), %method, path, "API request");
        let started = Instant::now();
        let result = request.send().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let err = self.classify(err);
                self.record(elapsed_ms, Some(&err));
                warn!(service = service.as_str(), %method, path, error = %err, "API request failed");
                return Err(err);
            }
        };

        let status = response.status();
        debug!(service = service.as_str(), path, status = status.as_u16(), "API response");
        if status.is_success() {
            self.record(elapsed_ms, None);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::ApiResponseError {
            status_code: status.as_u16(),
            message: error_detail(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        };
        self.record(elapsed_ms, Some(&err));
        warn!(service = service.as_str(), %method, path, error = %err, "API request rejected");
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        service: Service,
        method: &Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(service, method, path, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} {}: {}", service.as_str(), path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, service: Service, segments: &[&str]) -> Result<T, ApiError> {
        let (request, path) = self.request(service, &Method::GET, segments);
        self.fetch(service, &Method::GET, &path, request).await
    }

    async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        service: Service,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, ApiError> {
        let (request, path) = self.request(service, &Method::GET, segments);
        self.fetch(service, &Method::GET, &path, request.query(query))
            .await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        service: Service,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let (request, path) = self.request(service, &method, segments);
        self.fetch(service, &method, &path, request.json(body)).await
    }

    // For endpoints whose reply body carries nothing the caller needs
    async fn send_empty(&self, service: Service, method: Method, segments: &[&str]) -> Result<(), ApiError> {
        let (request, path) = self.request(service, &method, segments);
        self.execute(service, &method, &path, request).await?;
        Ok(())
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        service: Service,
        segments: &[&str],
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let (request, path) = self.request(service, &Method::POST, segments);
        self.fetch(service, &Method::POST, &path, request.multipart(form))
            .await
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout_ms)
        } else if err.is_connect() || err.is_request() {
            ApiError::NetworkError(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Other(err.to_string())
        }
    }

    fn record(&self, elapsed_ms: f64, failure: Option<&ApiError>) {
        let mut stats = self.stats.lock();
        stats.requests_sent += 1;
        match failure {
            None => stats.requests_succeeded += 1,
            Some(ApiError::Timeout(_)) => {
                stats.requests_failed += 1;
                stats.requests_timeout += 1;
            }
            Some(_) => stats.requests_failed += 1,
        }

        let n = stats.requests_sent as f64;
        stats.average_response_time_ms =
            (stats.average_response_time_ms * (n - 1.0) + elapsed_ms) / n;
        if elapsed_ms > stats.max_response_time_ms {
            stats.max_response_time_ms = elapsed_ms;
        }
    }
}

// FastAPI reports failures as {"detail": "..."} or {"detail": [...]}
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn lang_query(lang: &Lang) -> Vec<(&'static str, String)> {
    lang.as_deref()
        .map(|code| vec![("lang", code.to_string())])
        .unwrap_or_default()
}

fn image_part(image: ImageUpload) -> Result<reqwest::multipart::Part, ApiError> {
    reqwest::multipart::Part::stream(image.content)
        .file_name(image.filename)
        .mime_str(&image.mime_type)
        .map_err(|e| ApiError::Serialization(format!("invalid mime type: {}", e)))
}

#[async_trait]
impl ToursApi for HttpApiClient {
    async fn list_tours(&self, lang: &Lang) -> Result<Vec<Tour>, ApiError> {
        self.get_query(Service::Tours, &["tours"], &lang_query(lang))
            .await
    }

    async fn get_tour(&self, tour_id: &str, lang: &Lang) -> Result<Tour, ApiError> {
        self.get_query(Service::Tours, &["tours", tour_id], &lang_query(lang))
            .await
    }

    async fn create_tour(&self, tour: &TourInput) -> Result<Tour, ApiError> {
        self.send_json(Service::Tours, Method::POST, &["tours"], tour)
            .await
    }

    async fn update_tour(&self, tour_id: &str, patch: &TourPatch) -> Result<Tour, ApiError> {
        self.send_json(Service::Tours, Method::PUT, &["tours", tour_id], patch)
            .await
    }

    async fn delete_tour(&self, tour_id: &str) -> Result<(), ApiError> {
        self.send_empty(Service::Tours, Method::DELETE, &["tours", tour_id])
            .await
    }

    async fn featured_tours(&self, lang: &Lang) -> Result<Vec<Tour>, ApiError> {
        let mut query = lang_query(lang);
        query.push(("limit", "3".to_string()));
        self.get_query(Service::Tours, &["tours"], &query).await
    }

    async fn price_quote(
        &self,
        tour_id: &str,
        participants: u32,
    ) -> Result<PriceQuote, ApiError> {
        let quote: PriceQuote = self
            .get_query(
                Service::Tours,
                &["tours", tour_id, "calculate-price"],
                &[("participants", participants)],
            )
            .await?;
        quote.validate()
    }

    async fn group_pricing(&self, tour_id: &str) -> Result<Vec<GroupPricing>, ApiError> {
        self.get(Service::Tours, &["tours", tour_id, "group-pricing"])
            .await
    }

    async fn create_group_pricing(
        &self,
        tour_id: &str,
        tier: &GroupPricingInput,
    ) -> Result<GroupPricing, ApiError> {
        self.send_json(
            Service::Tours,
            Method::POST,
            &["tours", tour_id, "group-pricing"],
            tier,
        )
        .await
    }

    async fn update_group_pricing(
        &self,
        pricing_id: &str,
        patch: &GroupPricingPatch,
    ) -> Result<GroupPricing, ApiError> {
        self.send_json(Service::Tours, Method::PUT, &["group-pricing", pricing_id], patch)
            .await
    }

    async fn delete_group_pricing(&self, pricing_id: &str) -> Result<(), ApiError> {
        self.send_empty(Service::Tours, Method::DELETE, &["group-pricing", pricing_id])
            .await
    }

    async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.get(Service::Tours, &["tags"]).await
    }

    async fn create_tag(&self, tag: &TagInput) -> Result<Tag, ApiError> {
        self.send_json(Service::Tours, Method::POST, &["tags"], tag)
            .await
    }

    async fn update_tag(&self, tag_id: &str, tag: &TagInput) -> Result<Tag, ApiError> {
        self.send_json(Service::Tours, Method::PUT, &["tags", tag_id], tag)
            .await
    }

    async fn delete_tag(&self, tag_id: &str) -> Result<(), ApiError> {
        self.send_empty(Service::Tours, Method::DELETE, &["tags", tag_id])
            .await
    }

    async fn tour_tags(&self, tour_id: &str) -> Result<Vec<TourTag>, ApiError> {
        self.get(Service::Tours, &["tours", tour_id, "tags"]).await
    }

    async fn add_tag_to_tour(&self, tour_id: &str, tag_id: &str) -> Result<TourTag, ApiError> {
        let body = serde_json::json!({ "tag_id": tag_id });
        self.send_json(Service::Tours, Method::POST, &["tours", tour_id, "tags"], &body)
            .await
    }

    async fn remove_tag_from_tour(&self, tour_id: &str, tag_id: &str) -> Result<(), ApiError> {
        self.send_empty(
            Service::Tours,
            Method::DELETE,
            &["tours", tour_id, "tags", tag_id],
        )
        .await
    }

    async fn languages(&self, active_only: bool) -> Result<Vec<Language>, ApiError> {
        self.get_query(Service::Tours, &["languages"], &[("active_only", active_only)])
            .await
    }

    async fn create_language(&self, language: &LanguageInput) -> Result<Language, ApiError> {
        self.send_json(Service::Tours, Method::POST, &["languages"], language)
            .await
    }

    async fn update_language(
        &self,
        language_id: &str,
        patch: &LanguagePatch,
    ) -> Result<Language, ApiError> {
        self.send_json(Service::Tours, Method::PUT, &["languages", language_id], patch)
            .await
    }

    async fn delete_language(&self, language_id: &str) -> Result<(), ApiError> {
        self.send_empty(Service::Tours, Method::DELETE, &["languages", language_id])
            .await
    }

    async fn tour_languages(&self, tour_id: &str) -> Result<Vec<String>, ApiError> {
        let languages: TourLanguages = self
            .get(Service::Tours, &["tours", tour_id, "available-languages"])
            .await?;
        Ok(languages.available_languages)
    }

    async fn review_form(&self, token: &str) -> Result<ReviewForm, ApiError> {
        self.get(Service::Tours, &["reviews", "form", token]).await
    }

    async fn submit_review(
        &self,
        token: &str,
        review: &ReviewSubmission,
    ) -> Result<(), ApiError> {
        let (request, path) = self.request(Service::Tours, &Method::POST, &["reviews", "submit", token]);
        self.execute(Service::Tours, &Method::POST, &path, request.json(review))
            .await?;
        Ok(())
    }

    async fn tour_reviews(&self, tour_id: &str) -> Result<Vec<TourReview>, ApiError> {
        self.get(Service::Tours, &["tours", tour_id, "reviews"]).await
    }

    async fn rating_stats(&self, tour_id: &str) -> Result<RatingStats, ApiError> {
        self.get(Service::Tours, &["tours", tour_id, "rating-stats"])
            .await
    }
}

#[async_trait]
impl BookingsApi for HttpApiClient {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingResponse, ApiError> {
        self.send_json(Service::Bookings, Method::POST, &["bookings"], request)
            .await
    }

    async fn get_booking(&self, booking_id: &str) -> Result<BookingResponse, ApiError> {
        self.get(Service::Bookings, &["bookings", booking_id]).await
    }

    async fn list_bookings(&self) -> Result<Vec<BookingResponse>, ApiError> {
        self.get(Service::Bookings, &["bookings"]).await
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<BookingResponse, ApiError> {
        let body = serde_json::json!({ "status": status });
        self.send_json(Service::Bookings, Method::PUT, &["bookings", booking_id], &body)
            .await
    }

    async fn mark_booking_viewed(&self, booking_id: &str) -> Result<(), ApiError> {
        self.send_empty(
            Service::Bookings,
            Method::PATCH,
            &["bookings", booking_id, "mark-viewed"],
        )
        .await
    }

    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResult, ApiError> {
        self.send_json(
            Service::Bookings,
            Method::POST,
            &["bookings", "check-availability"],
            request,
        )
        .await
    }

    async fn calculate_price(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<PriceBreakdown, ApiError> {
        self.send_json(
            Service::Bookings,
            Method::POST,
            &["bookings", "calculate-price"],
            request,
        )
        .await
    }
}

#[async_trait]
impl MessagingApi for HttpApiClient {
    async fn send_contact(&self, message: &ContactMessage) -> Result<ContactReceipt, ApiError> {
        self.send_json(Service::Messaging, Method::POST, &["contact"], message)
            .await
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get(Service::Messaging, &["notifications"]).await
    }

    async fn notification(&self, notification_id: &str) -> Result<Notification, ApiError> {
        self.get(Service::Messaging, &["notifications", notification_id])
            .await
    }
}

#[async_trait]
impl MediaApi for HttpApiClient {
    async fn gallery(&self) -> Result<Vec<MediaItem>, ApiError> {
        self.get(Service::Media, &["gallery"]).await
    }

    async fn upload_gallery_image(
        &self,
        image: ImageUpload,
        caption: Option<String>,
    ) -> Result<MediaItem, ApiError> {
        let mut form = reqwest::multipart::Form::new().part("file", image_part(image)?);
        if let Some(caption) = caption {
            form = form.text("caption", caption);
        }
        self.send_multipart(Service::Media, &["gallery", "upload"], form)
            .await
    }

    async fn delete_gallery_image(&self, media_id: &str) -> Result<(), ApiError> {
        self.send_empty(Service::Media, Method::DELETE, &["gallery", media_id])
            .await
    }

    async fn upload_tour_image(&self, image: ImageUpload) -> Result<ImageUploadReceipt, ApiError> {
        let form = reqwest::multipart::Form::new().part("file", image_part(image)?);
        self.send_multipart(Service::Media, &["upload", "tour-image"], form)
            .await
    }

    async fn media_stats(&self) -> Result<MediaStats, ApiError> {
        self.get(Service::Media, &["stats"]).await
    }
}
