use serde::{Deserialize, Serialize};

/// A customer review from the published reviews snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Review {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: String,
}

impl Review {
    pub fn new(author: &str, rating: f64, text: &str) -> Self {
        Review {
            author_name: author.to_string(),
            rating: Some(rating),
            text: text.to_string(),
        }
    }
}

/// Shape of `reviews.json`: the review list, an optional precomputed
/// average and the place details carrying the opening hours.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSnapshot {
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub place: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    #[serde(default)]
    pub regular_opening_hours: Option<RegularOpeningHours>,
    #[serde(default)]
    pub special_opening_hours: Option<SpecialOpeningHours>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegularOpeningHours {
    #[serde(default, alias = "weekday_text")]
    pub weekday_descriptions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpecialOpeningHours {
    #[serde(default)]
    pub special_hour_periods: Vec<SpecialHourPeriod>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialHourPeriod {
    #[serde(default)]
    pub start_date: Option<DateParts>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct DateParts {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
}

impl ReviewsSnapshot {
    pub fn weekday_descriptions(&self) -> &[String] {
        self.place
            .as_ref()
            .and_then(|p| p.regular_opening_hours.as_ref())
            .map(|r| r.weekday_descriptions.as_slice())
            .unwrap_or(&[])
    }

    pub fn special_periods(&self) -> &[SpecialHourPeriod] {
        self.place
            .as_ref()
            .and_then(|p| p.special_opening_hours.as_ref())
            .map(|s| s.special_hour_periods.as_slice())
            .unwrap_or(&[])
    }
}
