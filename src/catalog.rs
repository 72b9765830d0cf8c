// Tour detail page data and admin-side checks on pricing tiers and reviews

use futures::try_join;
use tracing::debug;

use crate::api::{ApiError, Lang, ToursApi};
use crate::estimate::{format_price, parse_duration_days};
use crate::models::{
    GroupPricing, GroupPricingInput, RatingStats, ReviewSubmission, Tag, Tour, TourInput,
    TourReview,
};
use crate::validation::{self, ValidationError};

pub const MAX_REVIEW_LENGTH: usize = 1000;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_TOUR_PARTICIPANTS: u32 = 50;
pub const DIFFICULTY_LEVELS: [&str; 3] = ["Easy", "Moderate", "Challenging"];

#[derive(Debug, Clone, PartialEq)]
pub struct TourDetails {
    pub tour: Tour,
    // Sorted by min_participants
    pub pricing: Vec<GroupPricing>,
    pub tags: Vec<Tag>,
    // Newest first, as the service returns them
    pub reviews: Vec<TourReview>,
    pub rating: RatingStats,
}

impl TourDetails {
    /// Fetches the tour with its pricing tiers, tags, reviews and rating summary concurrently.
    pub async fn load(api: &dyn ToursApi, tour_id: &str, lang: &Lang) -> Result<Self, ApiError> {
        let (tour, mut pricing, tour_tags, reviews, rating) = try_join!(
            api.get_tour(tour_id, lang),
            api.group_pricing(tour_id),
            api.tour_tags(tour_id),
            api.tour_reviews(tour_id),
            api.rating_stats(tour_id),
        )?;
        pricing.sort_by_key(|tier| tier.min_participants);
        debug!(
            tour_id,
            tiers = pricing.len(),
            tags = tour_tags.len(),
            reviews = reviews.len(),
            "tour details loaded"
        );

        Ok(Self {
            tour,
            pricing,
            tags: tour_tags.into_iter().map(|link| link.tag).collect(),
            reviews,
            rating,
        })
    }

    // None until the tour has a counted review
    pub fn rating_label(&self) -> Option<String> {
        match self.rating.total_reviews {
            0 => None,
            1 => Some(format!("Rated {:.1} from 1 review", self.rating.average_rating)),
            n => Some(format!("Rated {:.1} from {} reviews", self.rating.average_rating, n)),
        }
    }

    pub fn tier_for(&self, participants: u32) -> Option<&GroupPricing> {
        self.pricing.iter().find(|tier| {
            tier.min_participants <= participants && participants <= tier.max_participants
        })
    }

    // What the detail page shows before a quote exists
    pub fn price_per_person(&self, participants: u32) -> f64 {
        self.tier_for(participants)
            .map_or(self.tour.price, |tier| tier.price_per_person)
    }

    pub fn starting_price(&self) -> f64 {
        self.pricing
            .iter()
            .map(|tier| tier.price_per_person)
            .fold(self.tour.price, f64::min)
    }

    pub fn duration_days(&self) -> u32 {
        parse_duration_days(&self.tour.duration)
    }

    pub fn tier_labels(&self) -> Vec<String> {
        self.pricing
            .iter()
            .map(|tier| {
                format!(
                    "{}-{} people: {} per person",
                    tier.min_participants,
                    tier.max_participants,
                    format_price(tier.price_per_person)
                )
            })
            .collect()
    }
}

/// Checks a new or edited tier against the tour's other tiers.
///
/// `exclude_id` names the tier being edited so it is not compared against itself.
pub fn validate_tier(
    tier: &GroupPricingInput,
    existing: &[GroupPricing],
    exclude_id: Option<&str>,
) -> Result<(), ValidationError> {
    if tier.min_participants < 1 {
        return Err(ValidationError::InvalidTier(
            "minimum participants must be at least 1".to_string(),
        ));
    }
    if tier.min_participants > tier.max_participants {
        return Err(ValidationError::InvalidTier(format!(
            "minimum ({}) is above maximum ({})",
            tier.min_participants, tier.max_participants
        )));
    }
    if tier.price_per_person <= 0.0 || !tier.price_per_person.is_finite() {
        return Err(ValidationError::InvalidTier(
            "price per person must be positive".to_string(),
        ));
    }

    let overlapping = existing
        .iter()
        .filter(|other| Some(other.id.as_str()) != exclude_id)
        .find(|other| {
            tier.min_participants <= other.max_participants
                && other.min_participants <= tier.max_participants
        });
    match overlapping {
        Some(other) => Err(ValidationError::InvalidTier(format!(
            "{}-{} overlaps existing tier {}-{}",
            tier.min_participants,
            tier.max_participants,
            other.min_participants,
            other.max_participants
        ))),
        None => Ok(()),
    }
}

/// Checks a tour form before it is created or saved.
pub fn validate_tour(tour: &TourInput) -> Result<(), ValidationError> {
    validation::required("title", &tour.title)?;
    validation::max_len("title", &tour.title, MAX_TITLE_LENGTH)?;
    if tour.description.trim().chars().count() < MIN_DESCRIPTION_LENGTH {
        return Err(ValidationError::InvalidTour(format!(
            "description needs at least {} characters",
            MIN_DESCRIPTION_LENGTH
        )));
    }
    if tour.price <= 0.0 || !tour.price.is_finite() {
        return Err(ValidationError::InvalidTour("price must be positive".to_string()));
    }
    // Two decimal places at most
    let cents = tour.price * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        return Err(ValidationError::InvalidTour(format!(
            "price {} has more than two decimal places",
            tour.price
        )));
    }
    validation::required("duration", &tour.duration)?;
    validation::required("location", &tour.location)?;
    validation::in_range("max_participants", tour.max_participants, 1, MAX_TOUR_PARTICIPANTS)?;
    if !DIFFICULTY_LEVELS.contains(&tour.difficulty_level.as_str()) {
        return Err(ValidationError::InvalidTour(format!(
            "unknown difficulty level {:?}",
            tour.difficulty_level
        )));
    }
    Ok(())
}

/// Validates a tour form and creates it.
pub async fn create_tour(api: &dyn ToursApi, tour: &TourInput) -> Result<Tour, CatalogError> {
    validate_tour(tour)?;
    Ok(api.create_tour(tour).await?)
}

pub fn validate_review(review: &ReviewSubmission) -> Result<(), ValidationError> {
    validation::in_range("rating", u32::from(review.rating), 1, 5)?;
    validation::required("customer_name", &review.customer_name)?;
    if let Some(text) = &review.review_text {
        validation::max_len("review_text", text, MAX_REVIEW_LENGTH)?;
    }
    Ok(())
}

/// Validates a review locally and then submits it with the link token.
pub async fn submit_review(
    api: &dyn ToursApi,
    token: &str,
    review: &ReviewSubmission,
) -> Result<(), CatalogError> {
    validate_review(review)?;
    api.submit_review(token, review).await?;
    Ok(())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
