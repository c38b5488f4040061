use crate::models::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table a public place was read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    #[default]
    TouristPlace,
    Place,
    Listing,
}

/// A publicly readable place or listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicPlace {
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub source: PlaceSource,
}

impl PublicPlace {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Untitled")
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("other")
    }
}

/// A destination with a detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: &'static str,
    pub title: &'static str,
    pub rating: &'static str,
    pub description: &'static str,
    pub image: &'static str,
}

/// Location shown when none or an unknown one is requested
pub const DEFAULT_LOCATION: &str = "chitrakote";

pub static LOCATIONS: [Location; 3] = [
    Location {
        id: "chitrakote",
        title: "Chitrakote Waterfall",
        rating: "4.8",
        description: "Chitrakote Falls is often called the \"Niagara Falls of India\". The waterfall cascades from a height of about 90 feet and is at its fullest during the monsoon. A must-visit in Bastar.",
        image: "https://images.unsplash.com/photo-1621682333008-0130db99806e?w=1200&q=80",
    },
    Location {
        id: "danteshwari",
        title: "Danteshwari Temple",
        rating: "4.9",
        description: "One of the 52 Shakti Peethas. The presiding deity is Goddess Danteshwari, revered across Bastar. Ancient temple with deep cultural significance.",
        image: "https://images.unsplash.com/photo-1590050752117-238cb0fb12b1?w=1200&q=80",
    },
    Location {
        id: "kanger",
        title: "Kanger Valley National Park",
        rating: "4.7",
        description: "Pristine wilderness with unique caves, waterfalls and diverse wildlife. Home to the famous Kutumsar Cave and Tirathgarh Falls.",
        image: "https://images.unsplash.com/photo-1542640244-7e672d6cef4e?w=1200&q=80",
    },
];

impl Location {
    /// Look up a location, falling back to the default one
    pub fn find(id: Option<&str>) -> &'static Location {
        let wanted = id.unwrap_or(DEFAULT_LOCATION);
        LOCATIONS
            .iter()
            .find(|location| location.id == wanted)
            .unwrap_or(&LOCATIONS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_location_falls_back_to_default() {
        assert_eq!(Location::find(Some("kanger")).title, "Kanger Valley National Park");
        assert_eq!(Location::find(Some("atlantis")).id, DEFAULT_LOCATION);
        assert_eq!(Location::find(None).id, DEFAULT_LOCATION);
    }

    #[test]
    fn test_public_place_accepts_numeric_ids() {
        let place: PublicPlace =
            serde_json::from_value(json!({"id": 42, "title": "Tirathgarh Falls"})).unwrap();
        assert_eq!(place.id, "42");
        assert_eq!(place.display_name(), "Tirathgarh Falls");
        assert_eq!(place.category(), "other");
    }
}
