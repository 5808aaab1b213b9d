pub mod booking;
pub mod client;
pub mod court;
pub mod payment;
pub mod sport;
pub mod tier;
pub mod time_slot;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use client::Client;
pub use court::Court;
pub use payment::Payment;
pub use sport::Sport;
pub use tier::{ClientTier, TierLevel, TierVoucher};
pub use time_slot::TimeSlot;
pub use user::User;
