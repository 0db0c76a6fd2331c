use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Store the bearer credential used for authenticated backend calls
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
}

/// Horizontal swipe over the current image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeRequest {
    pub dx: f64,
}

/// Tap on the current image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapRequest {
    pub x: f64,
    pub width: f64,
}

/// What the user chose in the match dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissAction {
    #[default]
    KeepSwiping,
    SendMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DismissRequest {
    #[serde(default)]
    pub action: DismissAction,
}

/// Travel-details form submitted from the trip creation screen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TravelDetailsForm {
    pub category: crate::models::Category,
    #[validate(length(min = 1))]
    #[serde(rename = "fromCity", default)]
    pub from_city: String,
    #[validate(length(min = 1))]
    #[serde(rename = "toCity", default)]
    pub to_city: String,
    #[serde(rename = "travelDate")]
    pub travel_date: NaiveDate,
    #[validate(range(min = 1, max = 8))]
    #[serde(default = "default_seats")]
    pub seats: u8,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_seats() -> u8 {
    1
}
