//! Outbound integrations for pricebook.
//!
//! This crate holds every HTTP surface the quoting core stays free of:
//! - **Booking delivery** (`client`) - POSTs confirmed bookings to the backend
//! - **Promo validation** (`promo`) - checks codes against the promotion service
//! - **WhatsApp hand-off** (`whatsapp`) - wa.me deep links with the quote prefilled
//!
//! The HTTP clients implement traits defined in `pricebook-core`, so the
//! pricing and booking logic can be exercised with in-memory fakes.

pub mod client;
pub mod promo;
pub mod whatsapp;

pub use client::HttpBookingRelay;
pub use promo::HttpPromoValidator;
pub use whatsapp::{handoff_message, quote_handoff_link};
