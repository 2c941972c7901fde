//! Interview scheduling — Google Calendar availability lookup and booking.

pub mod calendar;
pub mod handlers;
