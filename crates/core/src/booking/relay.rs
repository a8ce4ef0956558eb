use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::booking::submission::BookingRequest;

/// Acknowledgement returned by the booking backend for an accepted
/// submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReceipt {
    pub reference: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("booking relay rejected the request: {reason}")]
    Rejected { reason: String },
    #[error("booking relay unreachable: {reason}")]
    Unreachable { reason: String },
}

/// Delivery seam for booking submissions. The HTTP implementation lives in
/// the relay crate; this trait keeps the core free of transport concerns.
#[async_trait]
pub trait BookingRelay: Send + Sync {
    async fn deliver(&self, request: &BookingRequest) -> Result<RelayReceipt, RelayError>;
}

/// Accepts every submission locally without delivering it anywhere.
/// Backs bookings that stay on the operator's machine.
#[derive(Clone, Debug, Default)]
pub struct NoopRelay;

#[async_trait]
impl BookingRelay for NoopRelay {
    async fn deliver(&self, _request: &BookingRequest) -> Result<RelayReceipt, RelayError> {
        Ok(RelayReceipt { reference: format!("BK-LOCAL-{}", Uuid::new_v4()) })
    }
}
