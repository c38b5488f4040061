use crate::auth::NavMenu;
use crate::error::{AppError, AppResult};
use crate::format::parse_date;
use crate::models::{Booking, Location, NewActivity, NewBooking, NewNotification, NotificationKind};
use crate::notify::Toast;
use crate::repositories::{ActivityRepository, BookingRepository, NotificationRepository};
use crate::services::{failed, invalid};
use crate::AppContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Location detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    pub location: &'static Location,
    pub nav: NavMenu,
}

/// Location details and booking requests
pub struct LocationService {
    ctx: Arc<AppContext>,
}

impl LocationService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn view(&self, location_id: Option<&str>) -> LocationView {
        let status = self.ctx.resolver.status().await;
        LocationView {
            location: Location::find(location_id),
            nav: NavMenu::for_status(&status),
        }
    }

    /// File a booking inquiry for a location.
    ///
    /// Visitors may book without an account; the follow-up activity entry
    /// is only written for signed-in users.
    pub async fn request_booking(
        &self,
        location_id: Option<&str>,
        visitors: u32,
        start_date: Option<&str>,
    ) -> AppResult<Booking> {
        let start_date = start_date.map(str::trim).filter(|d| !d.is_empty());
        if let Some(date) = start_date {
            if parse_date(date).is_none() {
                return invalid(&self.ctx, "Please choose a valid date");
            }
        }

        let location = Location::find(location_id);
        let user_id = self.ctx.resolver.status().await.user.map(|u| u.id());
        let request = NewBooking::inquiry(
            user_id,
            location.id,
            visitors.max(1),
            start_date.map(str::to_string),
        );

        let store = match self.ctx.client().await {
            Ok(client) => client.store,
            Err(e) => return failed(&self.ctx, "Booking request", e, "Failed to submit booking request".to_string()),
        };

        let booking = match BookingRepository::new(store.clone()).create(&request).await {
            Ok(booking) => booking,
            Err(e) => {
                return failed(
                    &self.ctx,
                    "Booking request",
                    AppError::from(e),
                    "Failed to submit booking request".to_string(),
                )
            }
        };
        info!("Booking {} requested for {}", booking.id, location.id);

        if let Some(user_id) = user_id {
            let activity = NewActivity::for_booking(user_id, "Created booking request", booking.id);
            if let Err(e) = ActivityRepository::new(store.clone()).create(&activity).await {
                warn!("Activity entry for booking {} not written: {}", booking.id, e);
            }
        }

        let notification =
            NewNotification::for_booking(user_id, user_id, NotificationKind::BookingCreated, booking.id);
        if let Err(e) = NotificationRepository::new(store).create(&notification).await {
            warn!("Notification for booking {} not written: {}", booking.id, e);
        }

        self.ctx.notify(Toast::success(
            "Booking request submitted. We will notify you when confirmed.",
        ));
        Ok(booking)
    }
}
