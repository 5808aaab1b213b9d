pub mod bookings;
pub mod client_tiers;
pub mod clients;
pub mod courts;
pub mod health;
pub mod payments;
pub mod revenue;
pub mod sports;
pub mod tier_vouchers;
pub mod time_slots;
