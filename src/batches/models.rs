use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::batches::{BatchError, BatchResult, Version};

/// Batch status enum representing the delivery lifecycle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Ready,
    Assigned,
    OutForDelivery,
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Ready => "ready",
            BatchStatus::Assigned => "assigned",
            BatchStatus::OutForDelivery => "out_for_delivery",
            BatchStatus::Completed => "completed",
        }
    }

    /// The status that immediately follows this one, if any
    pub fn next(&self) -> Option<BatchStatus> {
        match self {
            BatchStatus::Pending => Some(BatchStatus::Ready),
            BatchStatus::Ready => Some(BatchStatus::Assigned),
            BatchStatus::Assigned => Some(BatchStatus::OutForDelivery),
            BatchStatus::OutForDelivery => Some(BatchStatus::Completed),
            BatchStatus::Completed => None,
        }
    }

    /// Orders may join or leave a batch only before a driver is assigned
    pub fn accepts_orders(&self) -> bool {
        matches!(self, BatchStatus::Pending | BatchStatus::Ready)
    }

    pub fn allows_driver_assignment(&self) -> bool {
        matches!(
            self,
            BatchStatus::Assigned | BatchStatus::OutForDelivery | BatchStatus::Completed
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl Default for BatchStatus {
    fn default() -> Self {
        BatchStatus::Pending
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BatchStatus::Pending),
            "ready" => Ok(BatchStatus::Ready),
            "assigned" => Ok(BatchStatus::Assigned),
            "out_for_delivery" => Ok(BatchStatus::OutForDelivery),
            "completed" => Ok(BatchStatus::Completed),
            _ => Err(format!("Invalid batch status: {}", s)),
        }
    }
}

/// Grouping key of a delivery batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct BatchKey {
    pub date: NaiveDate,
    /// Slot start time, `HH:MM`
    pub slot: String,
    pub estate_or_hotel: String,
    pub shop_id: String,
}

impl BatchKey {
    pub fn new(
        date: NaiveDate,
        slot: impl Into<String>,
        estate_or_hotel: impl Into<String>,
        shop_id: impl Into<String>,
    ) -> Self {
        Self {
            date,
            slot: slot.into(),
            estate_or_hotel: estate_or_hotel.into(),
            shop_id: shop_id.into(),
        }
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} @ {} / {}",
            self.date, self.slot, self.estate_or_hotel, self.shop_id
        )
    }
}

/// An order inside a batch and the amount it contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchMember {
    pub order_id: String,
    #[schema(value_type = String, example = "1000.00")]
    pub total: Decimal,
}

/// A set of orders sharing date, slot, destination and shop, dispatched together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Batch {
    pub id: Uuid,
    /// Bumped on every committed write
    #[schema(value_type = u64)]
    pub version: Version,
    pub date: NaiveDate,
    #[schema(example = "10:00")]
    pub slot: String,
    #[schema(example = "Lekki Gardens Phase 2")]
    pub estate_or_hotel: String,
    pub shop_id: String,
    /// Member orders in the order they joined
    pub order_ids: Vec<String>,
    /// Amount recorded for each member, parallel to `order_ids`
    pub members: Vec<BatchMember>,
    pub order_count: u32,
    #[schema(value_type = String, example = "4000.00")]
    pub total_value: Decimal,
    pub threshold: u32,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub van_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Create an empty pending batch for a key
    pub fn new(id: Uuid, key: &BatchKey, threshold: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            version: 0,
            date: key.date,
            slot: key.slot.clone(),
            estate_or_hotel: key.estate_or_hotel.clone(),
            shop_id: key.shop_id.clone(),
            order_ids: Vec::new(),
            members: Vec::new(),
            order_count: 0,
            total_value: Decimal::ZERO,
            threshold,
            status: BatchStatus::Pending,
            driver_name: None,
            van_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> BatchKey {
        BatchKey::new(
            self.date,
            self.slot.clone(),
            self.estate_or_hotel.clone(),
            self.shop_id.clone(),
        )
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.member(order_id).is_some()
    }

    pub fn member(&self, order_id: &str) -> Option<&BatchMember> {
        self.members.iter().find(|member| member.order_id == order_id)
    }

    /// Add an order and its amount to the member list, count and value together
    pub fn add_member(&mut self, order_id: &str, total: Decimal) -> BatchResult<()> {
        let total_value = self
            .total_value
            .checked_add(total)
            .ok_or_else(|| BatchError::InvalidInput("batch value overflows".to_string()))?;

        self.total_value = total_value;
        self.order_ids.push(order_id.to_string());
        self.members.push(BatchMember {
            order_id: order_id.to_string(),
            total,
        });
        self.order_count += 1;
        Ok(())
    }

    /// Take an order out, subtracting the amount it was added with
    pub fn remove_member(&mut self, order_id: &str) -> Option<BatchMember> {
        let position = self
            .members
            .iter()
            .position(|member| member.order_id == order_id)?;

        let member = self.members.remove(position);
        self.order_ids.retain(|id| id != order_id);
        self.order_count -= 1;
        self.total_value -= member.total;
        Some(member)
    }

    /// Stamp a mutation: next version and a fresh `updated_at`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }

    pub fn meets_threshold(&self) -> bool {
        self.order_count >= self.threshold
    }
}

/// Query parameters for listing batches
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchFilter {
    pub date: Option<NaiveDate>,
    pub slot: Option<String>,
    pub estate_or_hotel: Option<String>,
    pub shop_id: Option<String>,
    pub status: Option<BatchStatus>,
}

impl BatchFilter {
    pub fn matches(&self, batch: &Batch) -> bool {
        self.date.map_or(true, |date| batch.date == date)
            && self.slot.as_ref().map_or(true, |slot| &batch.slot == slot)
            && self
                .estate_or_hotel
                .as_ref()
                .map_or(true, |estate| batch.estate_or_hotel.eq_ignore_ascii_case(estate))
            && self.shop_id.as_ref().map_or(true, |shop| &batch.shop_id == shop)
            && self.status.map_or(true, |status| batch.status == status)
    }
}

/// Request DTO for advancing a batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceBatchRequest {
    pub status: BatchStatus,
}

/// Request DTO for assigning a driver and van to a batch
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignDriverRequest {
    #[schema(example = "Chinedu Okafor")]
    #[validate(length(min = 1, max = 100, message = "Driver name must be 1-100 characters"))]
    pub driver_name: String,
    #[schema(example = "LSD-482-KJ")]
    #[validate(length(min = 1, max = 20, message = "Van number must be 1-20 characters"))]
    pub van_number: String,
}
