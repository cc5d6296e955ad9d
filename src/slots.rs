// Delivery slots
//
// Orders are booked into fixed daily slots. A slot closes at its cutoff hour
// on the delivery day, in Lagos local time.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// West Africa Time, UTC+1 with no daylight saving
const LAGOS_UTC_OFFSET_SECS: i32 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("Unknown delivery slot: {0}")]
    UnknownSlot(String),

    #[error("Delivery slot {slot} on {date} is no longer available")]
    Unavailable { date: NaiveDate, slot: String },
}

/// A bookable delivery window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeliverySlot {
    /// Slot start, `HH:MM`
    #[schema(example = "10:00")]
    pub time: String,
    #[schema(example = "10:00 AM")]
    pub label: String,
    /// Hour of the delivery day after which the slot can no longer be booked
    #[schema(example = 8)]
    pub cutoff_hour: u32,
}

impl DeliverySlot {
    pub fn new(time: &str, label: &str, cutoff_hour: u32) -> Self {
        Self {
            time: time.to_string(),
            label: label.to_string(),
            cutoff_hour,
        }
    }
}

/// The daily slot table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchedule {
    slots: Vec<DeliverySlot>,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        Self::new(vec![
            DeliverySlot::new("08:00", "8:00 AM", 6),
            DeliverySlot::new("10:00", "10:00 AM", 8),
            DeliverySlot::new("12:00", "12:00 PM", 10),
            DeliverySlot::new("15:00", "3:00 PM", 13),
            DeliverySlot::new("17:00", "5:00 PM", 15),
        ])
    }
}

impl SlotSchedule {
    pub fn new(slots: Vec<DeliverySlot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[DeliverySlot] {
        &self.slots
    }

    pub fn find(&self, time: &str) -> Option<&DeliverySlot> {
        self.slots.iter().find(|slot| slot.time == time)
    }

    /// Slots that can still be booked for `date` as of `now`
    pub fn available_slots(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> Vec<DeliverySlot> {
        let today = now.date_naive();
        if date < today {
            return Vec::new();
        }
        if date > today {
            return self.slots.clone();
        }

        let hour = now.hour();
        self.slots
            .iter()
            .filter(|slot| slot.cutoff_hour > hour)
            .cloned()
            .collect()
    }

    /// Check that `slot` exists and is still open for `date`
    pub fn validate_booking(
        &self,
        date: NaiveDate,
        slot: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<DeliverySlot, SlotError> {
        let known = self
            .find(slot)
            .ok_or_else(|| SlotError::UnknownSlot(slot.to_string()))?;

        if !self
            .available_slots(date, now)
            .iter()
            .any(|open| open.time == known.time)
        {
            tracing::debug!("Slot {} on {} closed as of {}", slot, date, now);
            return Err(SlotError::Unavailable {
                date,
                slot: slot.to_string(),
            });
        }

        Ok(known.clone())
    }
}

pub fn lagos_offset() -> FixedOffset {
    FixedOffset::east_opt(LAGOS_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in Lagos
pub fn lagos_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&lagos_offset())
}

/// Query parameters for slot availability
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    /// Delivery date, defaults to today in Lagos
    pub date: Option<NaiveDate>,
}

/// Handler for GET /api/slots
/// Lists the slots still open for a delivery date
#[utoipa::path(
    get,
    path = "/api/slots",
    params(SlotQuery),
    responses(
        (status = 200, description = "Open delivery slots", body = Vec<DeliverySlot>)
    ),
    tag = "slots"
)]
pub async fn available_slots_handler(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Json<Vec<DeliverySlot>> {
    let now = lagos_now();
    let date = query.date.unwrap_or_else(|| now.date_naive());
    Json(state.slots.available_slots(date, now))
}
