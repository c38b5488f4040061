use crate::models::{PlaceSource, PublicPlace};
use crate::repositories::PlaceRepository;
use crate::services::or_empty;
use crate::AppContext;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Category filter value that matches everything
pub const ALL_CATEGORIES: &str = "all";

/// Explore page: public places with a category filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreView {
    pub category: String,
    pub places: Vec<PublicPlace>,
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

impl ExploreView {
    pub fn build(places: Vec<PublicPlace>, category: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(ALL_CATEGORIES)
            .to_string();
        let counts = category_counts(&places);
        let total = places.len();

        Self {
            places: filter_by_category(places, &category),
            category,
            counts,
            total,
        }
    }
}

/// Places in `category`, or all of them for `all`
pub fn filter_by_category(places: Vec<PublicPlace>, category: &str) -> Vec<PublicPlace> {
    if category == ALL_CATEGORIES {
        return places;
    }
    places
        .into_iter()
        .filter(|place| place.category() == category)
        .collect()
}

/// Number of places per category
pub fn category_counts(places: &[PublicPlace]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for place in places {
        *counts.entry(place.category().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Public reads; no session is needed
pub struct ExploreService {
    ctx: Arc<AppContext>,
}

impl ExploreService {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Load every public source; a failing source contributes nothing
    pub async fn load(&self, category: Option<&str>) -> ExploreView {
        let store = match self.ctx.client().await {
            Ok(client) => client.store,
            Err(e) => {
                warn!("Backend client not available: {}", e);
                return ExploreView::build(Vec::new(), category);
            }
        };

        let places = PlaceRepository::new(store);
        let (tourist, public, listings) = futures::join!(
            places.find_public(PlaceSource::TouristPlace),
            places.find_public(PlaceSource::Place),
            places.find_public(PlaceSource::Listing)
        );

        let mut all = or_empty("tourist places", tourist);
        all.extend(or_empty("places", public));
        all.extend(or_empty("listings", listings));
        ExploreView::build(all, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(category: &str) -> PublicPlace {
        serde_json::from_value(json!({"id": 1, "name": "x", "category": category})).unwrap()
    }

    #[test]
    fn test_filter_and_counts() {
        let places = vec![place("waterfall"), place("temple"), place("waterfall")];

        let view = ExploreView::build(places.clone(), Some("waterfall"));
        assert_eq!(view.places.len(), 2);
        assert_eq!(view.total, 3);
        assert_eq!(view.counts["waterfall"], 2);
        assert_eq!(view.counts["temple"], 1);

        let everything = ExploreView::build(places, None);
        assert_eq!(everything.category, ALL_CATEGORIES);
        assert_eq!(everything.places.len(), 3);
    }
}
