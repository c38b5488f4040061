use crate::error::RepositoryResult;
use crate::models::{PlaceSource, PublicPlace};
use crate::repositories::fetch_all;
use crate::store::{tables, Query, TableStore};
use std::sync::Arc;

/// Repository for publicly readable places and listings
pub struct PlaceRepository {
    store: Arc<dyn TableStore>,
}

impl PlaceRepository {
    /// Create a new PlaceRepository
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Every row of `source`, newest first.
    ///
    /// `places` and `listings` only expose rows flagged public.
    pub async fn find_public(&self, source: PlaceSource) -> RepositoryResult<Vec<PublicPlace>> {
        let (table, query) = match source {
            PlaceSource::TouristPlace => (tables::TOURIST_PLACES, Query::new()),
            PlaceSource::Place => (tables::PLACES, Query::new().eq("is_public", true)),
            PlaceSource::Listing => (tables::LISTINGS, Query::new().eq("is_public", true)),
        };

        let mut places: Vec<PublicPlace> =
            fetch_all(self.store.as_ref(), table, &query.newest_first()).await?;
        for place in &mut places {
            place.source = source;
        }
        Ok(places)
    }
}
