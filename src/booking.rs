// Booking estimation workflow
//
// Keeps the derived end date and the price quote in step with the tour, start date and
// group size a customer is editing. Every input change bumps a generation counter; a
// debounced task snapshots the inputs with that generation and only writes its result
// back when the generation is still current. Superseded responses are dropped, never
// cancelled, so arrival order does not matter.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{availability_request, ApiError, BookingsApi, ToursApi};
use crate::config::ClientConfig;
use crate::estimate::derive_end_date;
use crate::models::{AvailabilityResult, BookingRequest, BookingResponse, PriceQuote, Tour};
use crate::notify::{Notice, Notifier};
use crate::validation::{self, ValidationError};

pub const QUOTE_UNAVAILABLE: &str = "Unable to calculate price right now";
pub const AVAILABILITY_UNKNOWN: &str = "Unable to check availability";
pub const BOOKING_SUBMITTED: &str = "Booking request submitted successfully!";
pub const BOOKING_FAILED: &str = "Failed to create booking. Please try again.";

/// Contact fields of the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub special_requests: Option<String>,
}

impl ContactDetails {
    pub fn new(customer_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            email: email.into(),
            phone: None,
            special_requests: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_special_requests(mut self, requests: impl Into<String>) -> Self {
        self.special_requests = Some(requests.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("customer_name", &self.customer_name)?;
        validation::email(&self.email)
    }
}

// Empty optional fields are not sent at all
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client-only aggregate of a booking in progress. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub tour: Option<Tour>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub participants: u32,
    pub contact: ContactDetails,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            tour: None,
            start_date: None,
            end_date: None,
            participants: 1,
            contact: ContactDetails::default(),
        }
    }
}

impl BookingDraft {
    fn refresh_end_date(&mut self) {
        self.end_date = match (&self.tour, self.start_date) {
            (Some(tour), Some(start)) => Some(derive_end_date(&tour.duration, start)),
            _ => None,
        };
    }
}

// Inputs an estimate was computed from, tagged with the generation that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub generation: u64,
    pub tour_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub participants: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimationMode {
    // Tour service quote by group size
    #[default]
    GroupPricing,
    // Bookings service availability check followed by seasonal price calculation
    Legacy,
}

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub mode: EstimationMode,
    pub debounce: Duration,
    pub timeout: Duration,
}

impl WorkflowOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            mode: EstimationMode::GroupPricing,
            debounce: config.quote_debounce(),
            timeout: config.timeout(),
        }
    }

    pub fn with_mode(mut self, mode: EstimationMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// What a booking form renders: the draft inputs plus the estimate that matches them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub generation: u64,
    pub tour_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub participants: u32,
    pub quote: Option<PriceQuote>,
    pub availability: Option<AvailabilityResult>,
    // Debounce wait or request outstanding for the current inputs
    pub is_pending: bool,
    // Request outstanding for the current inputs
    pub is_computing: bool,
    pub quote_unavailable: bool,
    pub is_submitting: bool,
}

impl WorkflowState {
    pub fn is_settled(&self) -> bool {
        !self.is_pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReady {
    NoTour,
    NoStartDate,
    NoQuote,
    Computing,
    Submitting,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Booking not ready: {0:?}")]
    NotReady(NotReady),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
struct Inner {
    draft: BookingDraft,
    generation: u64,
    quote: Option<PriceQuote>,
    availability: Option<AvailabilityResult>,
    pending: bool,
    computing: bool,
    quote_unavailable: bool,
    submitting: bool,
}

impl Inner {
    // Any input change: drop the estimate, re-derive the end date, start a new generation
    fn invalidate(&mut self) {
        self.generation += 1;
        self.quote = None;
        self.availability = None;
        self.computing = false;
        self.quote_unavailable = false;
        self.draft.refresh_end_date();
    }

    fn snapshot(&self) -> Option<DraftSnapshot> {
        let tour = self.draft.tour.as_ref()?;
        Some(DraftSnapshot {
            generation: self.generation,
            tour_id: tour.id.clone(),
            start_date: self.draft.start_date?,
            end_date: self.draft.end_date?,
            participants: self.draft.participants,
        })
    }

    fn is_current(&self, snapshot: &DraftSnapshot) -> bool {
        self.generation == snapshot.generation
    }

    fn state(&self) -> WorkflowState {
        WorkflowState {
            generation: self.generation,
            tour_id: self.draft.tour.as_ref().map(|t| t.id.clone()),
            start_date: self.draft.start_date,
            end_date: self.draft.end_date,
            participants: self.draft.participants,
            quote: self.quote.clone(),
            availability: self.availability.clone(),
            is_pending: self.pending,
            is_computing: self.computing,
            quote_unavailable: self.quote_unavailable,
            is_submitting: self.submitting,
        }
    }

    fn not_ready(&self) -> Option<NotReady> {
        if self.draft.tour.is_none() {
            Some(NotReady::NoTour)
        } else if self.draft.start_date.is_none() || self.draft.end_date.is_none() {
            Some(NotReady::NoStartDate)
        } else if self.submitting {
            Some(NotReady::Submitting)
        } else if self.computing || self.pending {
            Some(NotReady::Computing)
        } else if self.quote.is_none() {
            Some(NotReady::NoQuote)
        } else {
            None
        }
    }
}

struct Estimate {
    quote: Option<PriceQuote>,
    availability: Option<AvailabilityResult>,
}

struct Shared {
    tours: Arc<dyn ToursApi>,
    bookings: Arc<dyn BookingsApi>,
    notifier: Arc<dyn Notifier>,
    options: WorkflowOptions,
    state: Mutex<Inner>,
    updates: watch::Sender<WorkflowState>,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.state());
    }

    async fn call<T, F>(&self, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match tokio::time::timeout(self.options.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.options.timeout.as_millis() as u64)),
        }
    }

    async fn recompute(self: Arc<Self>, snapshot: DraftSnapshot) {
        tokio::time::sleep(self.options.debounce).await;

        {
            let mut inner = self.state.lock();
            if !inner.is_current(&snapshot) {
                debug!(generation = snapshot.generation, "estimate superseded during debounce");
                return;
            }
            inner.computing = true;
            self.publish(&inner);
        }

        debug!(?snapshot, mode = ?self.options.mode, "requesting estimate");
        let outcome = match self.options.mode {
            EstimationMode::GroupPricing => self
                .call(self.tours.price_quote(&snapshot.tour_id, snapshot.participants))
                .await
                .map(|quote| Estimate {
                    quote: Some(quote),
                    availability: None,
                }),
            EstimationMode::Legacy => self.legacy_estimate(&snapshot).await,
        };
        self.finish(&snapshot, outcome);
    }

    async fn legacy_estimate(&self, snapshot: &DraftSnapshot) -> Result<Estimate, ApiError> {
        let request = availability_request(
            &snapshot.tour_id,
            snapshot.start_date,
            snapshot.end_date,
            snapshot.participants,
        );

        let availability = self.call(self.bookings.check_availability(&request)).await?;
        if !availability.available {
            return Ok(Estimate {
                quote: None,
                availability: Some(availability),
            });
        }

        // Show availability while the price is still on its way
        {
            let mut inner = self.state.lock();
            if !inner.is_current(snapshot) {
                return Ok(Estimate {
                    quote: None,
                    availability: None,
                });
            }
            inner.availability = Some(availability.clone());
            self.publish(&inner);
        }

        let breakdown = self.call(self.bookings.calculate_price(&request)).await?;
        Ok(Estimate {
            quote: Some(PriceQuote::from(breakdown).validate()?),
            availability: Some(availability),
        })
    }

    fn finish(&self, snapshot: &DraftSnapshot, outcome: Result<Estimate, ApiError>) {
        let failure = {
            let mut inner = self.state.lock();
            if !inner.is_current(snapshot) {
                debug!(
                    generation = snapshot.generation,
                    current = inner.generation,
                    "discarding stale estimate"
                );
                return;
            }

            inner.computing = false;
            inner.pending = false;
            let failure = match outcome {
                Ok(estimate) => {
                    inner.quote = estimate.quote;
                    inner.availability = estimate.availability;
                    inner.quote_unavailable = false;
                    None
                }
                Err(err) => {
                    inner.quote = None;
                    inner.quote_unavailable = true;
                    if self.options.mode == EstimationMode::Legacy {
                        inner.availability = Some(AvailabilityResult::unavailable(AVAILABILITY_UNKNOWN));
                    }
                    Some(err)
                }
            };
            self.publish(&inner);
            failure
        };

        match failure {
            None => debug!(generation = snapshot.generation, "estimate applied"),
            Some(err) => {
                warn!(tour_id = %snapshot.tour_id, participants = snapshot.participants, error = %err, "estimate failed");
                self.notifier.notify(Notice::error(QUOTE_UNAVAILABLE));
            }
        }
    }
}

/// One booking form's estimation state. Cheap to clone; clones share the same draft.
///
/// Input setters spawn onto the current Tokio runtime and must be called from within one.
#[derive(Clone)]
pub struct BookingWorkflow {
    shared: Arc<Shared>,
}

impl BookingWorkflow {
    pub fn new(
        tours: Arc<dyn ToursApi>,
        bookings: Arc<dyn BookingsApi>,
        notifier: Arc<dyn Notifier>,
        options: WorkflowOptions,
    ) -> Self {
        let inner = Inner::default();
        let (updates, _) = watch::channel(inner.state());
        Self {
            shared: Arc::new(Shared {
                tours,
                bookings,
                notifier,
                options,
                state: Mutex::new(inner),
                updates,
            }),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.shared.state.lock().state()
    }

    pub fn draft(&self) -> BookingDraft {
        self.shared.state.lock().draft.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.shared.updates.subscribe()
    }

    /// Waits until the estimate for the current inputs has been applied or has failed.
    pub async fn settled(&self) -> WorkflowState {
        let mut updates = self.subscribe();
        loop {
            let state = updates.borrow_and_update().clone();
            if state.is_settled() {
                return state;
            }
            if updates.changed().await.is_err() {
                return self.state();
            }
        }
    }

    pub fn set_tour(&self, tour: Tour) {
        self.mutate(|draft| {
            if draft.tour.as_ref() == Some(&tour) {
                return false;
            }
            // Keep the group size inside the new tour's limit
            draft.participants = draft.participants.clamp(1, tour.max_participants.max(1));
            draft.tour = Some(tour);
            true
        });
    }

    pub fn clear_tour(&self) {
        self.mutate(|draft| draft.tour.take().is_some());
    }

    pub fn set_start_date(&self, start_date: NaiveDate) {
        self.mutate(|draft| draft.start_date.replace(start_date) != Some(start_date));
    }

    pub fn clear_start_date(&self) {
        self.mutate(|draft| draft.start_date.take().is_some());
    }

    /// Rejects group sizes outside `1..=max_participants` of the selected tour and leaves
    /// the draft untouched.
    pub fn set_participants(&self, participants: u32) -> Result<(), ValidationError> {
        self.try_mutate(|draft| {
            let max = draft
                .tour
                .as_ref()
                .map_or(u32::MAX, |tour| tour.max_participants);
            validation::in_range("number_of_participants", participants, 1, max)?;
            Ok(std::mem::replace(&mut draft.participants, participants) != participants)
        })
    }

    /// Starts a fresh estimate for the current inputs, even when none of them changed.
    pub fn retry_estimate(&self) {
        self.mutate(|_| true);
    }

    // Contact fields do not feed the estimate
    pub fn set_contact(&self, contact: ContactDetails) {
        let mut inner = self.shared.state.lock();
        inner.draft.contact = contact;
    }

    pub fn can_submit(&self) -> bool {
        let inner = self.shared.state.lock();
        inner.not_ready().is_none() && inner.draft.contact.validate().is_ok()
    }

    /// Sends the booking when a quote for the current inputs is on screen and the contact
    /// fields are filled in. No request is made otherwise. A failed request keeps the
    /// draft so the customer can retry.
    pub async fn submit(&self) -> Result<BookingResponse, SubmitError> {
        let (request, generation) = {
            let mut inner = self.shared.state.lock();
            if let Some(reason) = inner.not_ready() {
                debug!(?reason, "submit rejected");
                return Err(SubmitError::NotReady(reason));
            }
            inner.draft.contact.validate()?;

            let draft = &inner.draft;
            let (Some(tour), Some(start_date), Some(end_date)) =
                (&draft.tour, draft.start_date, draft.end_date)
            else {
                return Err(SubmitError::NotReady(NotReady::NoStartDate));
            };
            let request = BookingRequest {
                customer_name: draft.contact.customer_name.trim().to_string(),
                email: draft.contact.email.trim().to_string(),
                phone: non_blank(&draft.contact.phone),
                tour_id: tour.id.clone(),
                start_date,
                end_date,
                number_of_participants: draft.participants,
                special_requests: non_blank(&draft.contact.special_requests),
            };
            inner.submitting = true;
            self.shared.publish(&inner);
            (request, inner.generation)
        };

        debug!(?request, "create_booking called");
        let result = self
            .shared
            .call(self.shared.bookings.create_booking(&request))
            .await;

        {
            let mut inner = self.shared.state.lock();
            inner.submitting = false;
            if result.is_ok() {
                let next_generation = inner.generation.max(generation);
                *inner = Inner {
                    generation: next_generation,
                    ..Inner::default()
                };
                inner.invalidate();
            }
            self.shared.publish(&inner);
        }

        match result {
            Ok(booking) => {
                info!(booking_id = %booking.id, tour_id = %booking.tour_id, "booking submitted");
                self.shared.notifier.notify(Notice::success(BOOKING_SUBMITTED));
                Ok(booking)
            }
            Err(err) => {
                warn!(tour_id = %request.tour_id, error = %err, "booking submission failed");
                self.shared.notifier.notify(Notice::error(BOOKING_FAILED));
                Err(SubmitError::Api(err))
            }
        }
    }

    fn mutate<F>(&self, change: F)
    where
        F: FnOnce(&mut BookingDraft) -> bool,
    {
        match self.try_mutate::<Infallible, _>(|draft| Ok(change(draft))) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    // The change runs under the same lock as the generation bump, so checks inside it
    // see the draft they apply to
    fn try_mutate<E, F>(&self, change: F) -> Result<(), E>
    where
        F: FnOnce(&mut BookingDraft) -> Result<bool, E>,
    {
        let snapshot = {
            let mut inner = self.shared.state.lock();
            let changed = change(&mut inner.draft)?;
            // Entering the same value again after a failed estimate asks again
            if !changed && !inner.quote_unavailable {
                return Ok(());
            }
            inner.invalidate();
            let snapshot = inner.snapshot();
            inner.pending = snapshot.is_some();
            self.shared.publish(&inner);
            snapshot
        };

        if let Some(snapshot) = snapshot {
            tokio::spawn(Arc::clone(&self.shared).recompute(snapshot));
        }
        Ok(())
    }
}
