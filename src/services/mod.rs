pub mod booking;
pub mod notification;
pub mod revenue;
pub mod tier;
