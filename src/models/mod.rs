//! Domain models for ConnectHub.
//!
//! Rows decoded from the hosted tables, plus the payloads written back.
//! Remote data is decoded leniently: older rows carry JSON text where newer
//! ones carry arrays or objects.

pub mod activity;
pub mod agent_request;
pub mod booking;
pub mod complaint;
pub mod feedback;
pub mod notification;
pub mod place;
pub mod profile;

mod lenient;

// Re-export all models for convenient access
pub use activity::{Activity, NewActivity};
pub use agent_request::{AgentRequest, NewAgentRequest};
pub use booking::{Booking, BookingStatus, NewBooking, TimelineEntry};
pub use complaint::{Complaint, NewComplaint};
pub use feedback::{Feedback, NewFeedback};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use place::{Location, PlaceSource, PublicPlace, DEFAULT_LOCATION, LOCATIONS};
pub use profile::{AgentProfile, AgentRequestStatus, Profile};
