// Scriptable in-memory stand-in for the tours and bookings services

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::{ApiError, BookingsApi, Lang, ToursApi};
use crate::models::{
    AvailabilityRequest, AvailabilityResult, BookingRequest, BookingResponse, BookingStatus,
    GroupPricing, GroupPricingInput, GroupPricingPatch, Language, LanguageInput, LanguagePatch,
    PriceBreakdown, PriceBreakdownDetail, PriceQuote, RatingStats, ReviewForm, ReviewSubmission,
    Tag, TagInput, Tour, TourImage, TourImageInput, TourInput, TourPatch, TourReview, TourTag,
};

pub fn tour(id: &str, duration: &str, max_participants: u32, price: f64) -> Tour {
    Tour {
        id: id.to_string(),
        title: format!("Tour {}", id),
        description: "A journey through Morocco".to_string(),
        price,
        duration: duration.to_string(),
        location: "Marrakech".to_string(),
        max_participants,
        difficulty_level: "Easy".to_string(),
        includes: Vec::new(),
        available_dates: Vec::new(),
        images: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

pub struct MockServer {
    tours: Mutex<HashMap<String, Tour>>,
    pricing: Mutex<Vec<GroupPricing>>,
    tags: Mutex<Vec<Tag>>,
    tour_tags: Mutex<Vec<TourTag>>,
    languages: Mutex<Vec<Language>>,
    bookings: Mutex<Vec<BookingResponse>>,
    // Submitted reviews keyed by tour id
    reviews: Mutex<Vec<(String, TourReview)>>,
    // Response delay keyed by participant count, falling back to `delay`
    quote_delays: Mutex<HashMap<u32, Duration>>,
    delay: Mutex<Duration>,
    fail_next_quotes: AtomicUsize,
    fail_next_bookings: AtomicUsize,
    fail_languages: AtomicBool,
    available: AtomicBool,
    next_id: AtomicUsize,
    pub quote_calls: AtomicUsize,
    pub availability_calls: AtomicUsize,
    pub booking_calls: AtomicUsize,
    pub language_calls: AtomicUsize,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            tours: Mutex::new(HashMap::new()),
            pricing: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
            tour_tags: Mutex::new(Vec::new()),
            languages: Mutex::new(Language::builtin()),
            bookings: Mutex::new(Vec::new()),
            reviews: Mutex::new(Vec::new()),
            quote_delays: Mutex::new(HashMap::new()),
            delay: Mutex::new(Duration::ZERO),
            fail_next_quotes: AtomicUsize::new(0),
            fail_next_bookings: AtomicUsize::new(0),
            fail_languages: AtomicBool::new(false),
            available: AtomicBool::new(true),
            next_id: AtomicUsize::new(1),
            quote_calls: AtomicUsize::new(0),
            availability_calls: AtomicUsize::new(0),
            booking_calls: AtomicUsize::new(0),
            language_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tour(self, tour: Tour) -> Self {
        self.tours.lock().insert(tour.id.clone(), tour);
        self
    }

    pub fn add_pricing(&self, tour_id: &str, min: u32, max: u32, price_per_person: f64) {
        let id = self.next_id("gp");
        self.pricing.lock().push(GroupPricing {
            id,
            tour_id: tour_id.to_string(),
            min_participants: min,
            max_participants: max,
            price_per_person,
            created_at: None,
        });
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn set_quote_delay(&self, participants: u32, delay: Duration) {
        self.quote_delays.lock().insert(participants, delay);
    }

    pub fn fail_next_quotes(&self, count: usize) {
        self.fail_next_quotes.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_bookings(&self, count: usize) {
        self.fail_next_bookings.store(count, Ordering::SeqCst);
    }

    pub fn fail_languages(&self, fail: bool) {
        self.fail_languages.store(fail, Ordering::SeqCst);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_languages(&self, languages: Vec<Language>) {
        *self.languages.lock() = languages;
    }

    pub fn bookings(&self) -> Vec<BookingResponse> {
        self.bookings.lock().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn gallery(&self, images: &[TourImageInput]) -> Vec<TourImage> {
        images
            .iter()
            .map(|image| TourImage {
                id: Some(self.next_id("img")),
                image_url: image.image_url.clone(),
                is_main: image.is_main,
                display_order: image.display_order,
                alt_text: image.alt_text.clone(),
            })
            .collect()
    }

    async fn simulate_latency(&self, participants: Option<u32>) {
        let delay = participants
            .and_then(|p| self.quote_delays.lock().get(&p).copied())
            .unwrap_or_else(|| *self.delay.lock());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn find_tour(&self, tour_id: &str) -> Result<Tour, ApiError> {
        self.tours
            .lock()
            .get(tour_id)
            .cloned()
            .ok_or_else(|| not_found("Tour not found"))
    }

    // Tier price when one matches, otherwise the tour's base price
    fn price_for(&self, tour: &Tour, participants: u32) -> (f64, String) {
        self.pricing
            .lock()
            .iter()
            .find(|tier| {
                tier.tour_id == tour.id
                    && tier.min_participants <= participants
                    && participants <= tier.max_participants
            })
            .map(|tier| {
                (
                    tier.price_per_person,
                    format!("{}-{} people", tier.min_participants, tier.max_participants),
                )
            })
            .unwrap_or_else(|| (tour.price, "base price".to_string()))
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError::ApiResponseError {
        status_code: 404,
        message: message.to_string(),
    }
}

fn server_error() -> ApiError {
    ApiError::ApiResponseError {
        status_code: 500,
        message: "Internal Server Error".to_string(),
    }
}

#[async_trait]
impl ToursApi for MockServer {
    async fn list_tours(&self, _lang: &Lang) -> Result<Vec<Tour>, ApiError> {
        self.simulate_latency(None).await;
        let mut tours: Vec<Tour> = self.tours.lock().values().cloned().collect();
        tours.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tours)
    }

    async fn get_tour(&self, tour_id: &str, _lang: &Lang) -> Result<Tour, ApiError> {
        self.simulate_latency(None).await;
        self.find_tour(tour_id)
    }

    async fn create_tour(&self, input: &TourInput) -> Result<Tour, ApiError> {
        let id = self.next_id("tour");
        let created = Tour {
            id: id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            price: input.price,
            duration: input.duration.clone(),
            location: input.location.clone(),
            max_participants: input.max_participants,
            difficulty_level: input.difficulty_level.clone(),
            includes: input.includes.clone(),
            available_dates: input.available_dates.clone(),
            images: self.gallery(&input.images),
            created_at: None,
            updated_at: None,
        };
        self.tours.lock().insert(id, created.clone());
        Ok(created)
    }

    async fn update_tour(&self, tour_id: &str, patch: &TourPatch) -> Result<Tour, ApiError> {
        let mut tours = self.tours.lock();
        let tour = tours
            .get_mut(tour_id)
            .ok_or_else(|| not_found("Tour not found"))?;
        if let Some(title) = &patch.title {
            tour.title = title.clone();
        }
        if let Some(description) = &patch.description {
            tour.description = description.clone();
        }
        if let Some(price) = patch.price {
            tour.price = price;
        }
        if let Some(duration) = &patch.duration {
            tour.duration = duration.clone();
        }
        if let Some(location) = &patch.location {
            tour.location = location.clone();
        }
        if let Some(max) = patch.max_participants {
            tour.max_participants = max;
        }
        if let Some(level) = &patch.difficulty_level {
            tour.difficulty_level = level.clone();
        }
        if let Some(includes) = &patch.includes {
            tour.includes = includes.clone();
        }
        if let Some(dates) = &patch.available_dates {
            tour.available_dates = dates.clone();
        }
        if let Some(images) = &patch.images {
            tour.images = self.gallery(images);
        }
        Ok(tour.clone())
    }

    async fn delete_tour(&self, tour_id: &str) -> Result<(), ApiError> {
        self.tours
            .lock()
            .remove(tour_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Tour not found"))
    }

    async fn featured_tours(&self, lang: &Lang) -> Result<Vec<Tour>, ApiError> {
        let mut tours = self.list_tours(lang).await?;
        tours.truncate(3);
        Ok(tours)
    }

    async fn price_quote(
        &self,
        tour_id: &str,
        participants: u32,
    ) -> Result<PriceQuote, ApiError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(Some(participants)).await;
        if Self::take_failure(&self.fail_next_quotes) {
            return Err(server_error());
        }

        let tour = self.find_tour(tour_id)?;
        let (price_per_person, pricing_tier) = self.price_for(&tour, participants);
        PriceQuote {
            price_per_person,
            total_price: price_per_person * participants as f64,
            participants,
            pricing_tier,
        }
        .validate()
    }

    async fn group_pricing(&self, tour_id: &str) -> Result<Vec<GroupPricing>, ApiError> {
        self.simulate_latency(None).await;
        Ok(self
            .pricing
            .lock()
            .iter()
            .filter(|tier| tier.tour_id == tour_id)
            .cloned()
            .collect())
    }

    async fn create_group_pricing(
        &self,
        tour_id: &str,
        tier: &GroupPricingInput,
    ) -> Result<GroupPricing, ApiError> {
        self.find_tour(tour_id)?;
        let created = GroupPricing {
            id: self.next_id("gp"),
            tour_id: tour_id.to_string(),
            min_participants: tier.min_participants,
            max_participants: tier.max_participants,
            price_per_person: tier.price_per_person,
            created_at: None,
        };
        self.pricing.lock().push(created.clone());
        Ok(created)
    }

    async fn update_group_pricing(
        &self,
        pricing_id: &str,
        patch: &GroupPricingPatch,
    ) -> Result<GroupPricing, ApiError> {
        let mut pricing = self.pricing.lock();
        let tier = pricing
            .iter_mut()
            .find(|tier| tier.id == pricing_id)
            .ok_or_else(|| not_found("Group pricing not found"))?;
        if let Some(min) = patch.min_participants {
            tier.min_participants = min;
        }
        if let Some(max) = patch.max_participants {
            tier.max_participants = max;
        }
        if let Some(price) = patch.price_per_person {
            tier.price_per_person = price;
        }
        Ok(tier.clone())
    }

    async fn delete_group_pricing(&self, pricing_id: &str) -> Result<(), ApiError> {
        let mut pricing = self.pricing.lock();
        let before = pricing.len();
        pricing.retain(|tier| tier.id != pricing_id);
        if pricing.len() == before {
            return Err(not_found("Group pricing not found"));
        }
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        Ok(self.tags.lock().clone())
    }

    async fn create_tag(&self, tag: &TagInput) -> Result<Tag, ApiError> {
        let created = Tag {
            id: self.next_id("tag"),
            name: tag.name.clone(),
            icon: tag.icon.clone(),
            created_at: None,
        };
        self.tags.lock().push(created.clone());
        Ok(created)
    }

    async fn update_tag(&self, tag_id: &str, tag: &TagInput) -> Result<Tag, ApiError> {
        let mut tags = self.tags.lock();
        let existing = tags
            .iter_mut()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| not_found("Tag not found"))?;
        existing.name = tag.name.clone();
        existing.icon = tag.icon.clone();
        Ok(existing.clone())
    }

    async fn delete_tag(&self, tag_id: &str) -> Result<(), ApiError> {
        self.tags.lock().retain(|t| t.id != tag_id);
        self.tour_tags.lock().retain(|t| t.tag_id != tag_id);
        Ok(())
    }

    async fn tour_tags(&self, tour_id: &str) -> Result<Vec<TourTag>, ApiError> {
        self.simulate_latency(None).await;
        Ok(self
            .tour_tags
            .lock()
            .iter()
            .filter(|t| t.tour_id == tour_id)
            .cloned()
            .collect())
    }

    async fn add_tag_to_tour(&self, tour_id: &str, tag_id: &str) -> Result<TourTag, ApiError> {
        self.find_tour(tour_id)?;
        let tag = self
            .tags
            .lock()
            .iter()
            .find(|t| t.id == tag_id)
            .cloned()
            .ok_or_else(|| not_found("Tag not found"))?;
        let link = TourTag {
            id: self.next_id("tt"),
            tour_id: tour_id.to_string(),
            tag_id: tag_id.to_string(),
            tag,
            created_at: None,
        };
        self.tour_tags.lock().push(link.clone());
        Ok(link)
    }

    async fn remove_tag_from_tour(&self, tour_id: &str, tag_id: &str) -> Result<(), ApiError> {
        self.tour_tags
            .lock()
            .retain(|t| !(t.tour_id == tour_id && t.tag_id == tag_id));
        Ok(())
    }

    async fn languages(&self, active_only: bool) -> Result<Vec<Language>, ApiError> {
        self.language_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(None).await;
        if self.fail_languages.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        Ok(self
            .languages
            .lock()
            .iter()
            .filter(|l| !active_only || l.is_active)
            .cloned()
            .collect())
    }

    async fn create_language(&self, language: &LanguageInput) -> Result<Language, ApiError> {
        let created = Language {
            id: self.next_id("lang"),
            code: language.code.clone(),
            name: language.name.clone(),
            native_name: language.native_name.clone(),
            flag_emoji: language.flag_emoji.clone(),
            is_active: language.is_active.unwrap_or(true),
            is_default: false,
            created_at: None,
        };
        self.languages.lock().push(created.clone());
        Ok(created)
    }

    async fn update_language(
        &self,
        language_id: &str,
        patch: &LanguagePatch,
    ) -> Result<Language, ApiError> {
        let mut languages = self.languages.lock();
        let language = languages
            .iter_mut()
            .find(|l| l.id == language_id)
            .ok_or_else(|| not_found("Language not found"))?;
        if let Some(name) = &patch.name {
            language.name = name.clone();
        }
        if let Some(native_name) = &patch.native_name {
            language.native_name = native_name.clone();
        }
        if let Some(flag) = &patch.flag_emoji {
            language.flag_emoji = flag.clone();
        }
        if let Some(active) = patch.is_active {
            language.is_active = active;
        }
        Ok(language.clone())
    }

    async fn delete_language(&self, language_id: &str) -> Result<(), ApiError> {
        self.languages.lock().retain(|l| l.id != language_id);
        Ok(())
    }

    async fn tour_languages(&self, tour_id: &str) -> Result<Vec<String>, ApiError> {
        self.find_tour(tour_id)?;
        Ok(vec!["en".to_string()])
    }

    async fn review_form(&self, token: &str) -> Result<ReviewForm, ApiError> {
        let booking = self
            .bookings
            .lock()
            .iter()
            .find(|b| b.id == token)
            .cloned()
            .ok_or_else(|| not_found("Review link is invalid or expired"))?;
        let tour = self.find_tour(&booking.tour_id)?;
        Ok(ReviewForm {
            tour_id: tour.id,
            tour_title: tour.title,
            customer_name: booking.customer_name,
            customer_email: booking.email,
            booking_id: booking.id,
            already_submitted: false,
        })
    }

    async fn submit_review(
        &self,
        token: &str,
        review: &ReviewSubmission,
    ) -> Result<(), ApiError> {
        let form = self.review_form(token).await?;
        let stored = TourReview {
            id: self.next_id("review"),
            rating: review.rating,
            review_text: review.review_text.clone(),
            customer_name: review.customer_name.clone(),
            is_verified: true,
            created_at: None,
        };
        self.reviews.lock().push((form.tour_id, stored));
        Ok(())
    }

    async fn tour_reviews(&self, tour_id: &str) -> Result<Vec<TourReview>, ApiError> {
        self.simulate_latency(None).await;
        Ok(self
            .reviews
            .lock()
            .iter()
            .rev()
            .filter(|(id, _)| id == tour_id)
            .map(|(_, review)| review.clone())
            .collect())
    }

    async fn rating_stats(&self, tour_id: &str) -> Result<RatingStats, ApiError> {
        let ratings: Vec<f64> = self
            .reviews
            .lock()
            .iter()
            .filter(|(id, _)| id == tour_id)
            .map(|(_, review)| f64::from(review.rating))
            .collect();
        if ratings.is_empty() {
            return Ok(RatingStats::default());
        }
        Ok(RatingStats {
            average_rating: ratings.iter().sum::<f64>() / ratings.len() as f64,
            total_reviews: ratings.len() as u32,
        })
    }
}

#[async_trait]
impl BookingsApi for MockServer {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingResponse, ApiError> {
        self.booking_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(None).await;
        if Self::take_failure(&self.fail_next_bookings) {
            return Err(ApiError::ApiResponseError {
                status_code: 503,
                message: "Service temporarily unavailable".to_string(),
            });
        }

        let tour = self.find_tour(&request.tour_id)?;
        let (price_per_person, _) = self.price_for(&tour, request.number_of_participants);
        let booking = BookingResponse {
            id: self.next_id("booking"),
            customer_name: request.customer_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            tour_id: request.tour_id.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            number_of_participants: request.number_of_participants,
            price_per_person,
            total_price: price_per_person * request.number_of_participants as f64,
            status: BookingStatus::Pending,
            admin_viewed: false,
            created_at: None,
            updated_at: None,
        };
        self.bookings.lock().push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: &str) -> Result<BookingResponse, ApiError> {
        self.bookings
            .lock()
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| not_found("Booking not found"))
    }

    async fn list_bookings(&self) -> Result<Vec<BookingResponse>, ApiError> {
        Ok(self.bookings())
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<BookingResponse, ApiError> {
        let mut bookings = self.bookings.lock();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| not_found("Booking not found"))?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn mark_booking_viewed(&self, booking_id: &str) -> Result<(), ApiError> {
        let mut bookings = self.bookings.lock();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| not_found("Booking not found"))?;
        booking.admin_viewed = true;
        Ok(())
    }

    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResult, ApiError> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(Some(request.number_of_participants))
            .await;
        let tour = self.find_tour(&request.tour_id)?;
        if !self.available.load(Ordering::SeqCst) {
            return Ok(AvailabilityResult::unavailable("Tour is fully booked for these dates"));
        }
        if request.number_of_participants > tour.max_participants {
            return Ok(AvailabilityResult {
                available: false,
                message: format!("Maximum {} participants", tour.max_participants),
                max_participants: Some(tour.max_participants),
                unavailable_dates: Vec::new(),
            });
        }
        Ok(AvailabilityResult {
            available: true,
            message: "Tour is available".to_string(),
            max_participants: Some(tour.max_participants),
            unavailable_dates: Vec::new(),
        })
    }

    async fn calculate_price(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<PriceBreakdown, ApiError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_next_quotes) {
            return Err(server_error());
        }
        let tour = self.find_tour(&request.tour_id)?;
        let days = ((request.end_date - request.start_date).num_days() + 1).max(1) as u32;
        let participants = request.number_of_participants;
        let (per_day, _) = self.price_for(&tour, participants);
        Ok(PriceBreakdown {
            tour_id: tour.id.clone(),
            base_price_per_person: per_day,
            seasonal_multiplier: 1.0,
            group_discount_percentage: 0.0,
            price_per_person: per_day,
            total_price: per_day * days as f64 * participants as f64,
            number_of_participants: participants,
            duration_days: days,
            season_name: Some("High season".to_string()),
            breakdown: PriceBreakdownDetail {
                base_price_per_day: Some(per_day),
                seasonal_adjustment: 0.0,
                group_discount_amount: 0.0,
                duration_days: days,
                participants,
                calculation_steps: Vec::new(),
            },
        })
    }
}
