use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Anything that carries a stable identifier used for deduplication
pub trait Identified {
    fn id(&self) -> &str;
}

/// Profile shown in the discovery feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId", alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(rename = "dateOfBirth", default)]
    pub date_of_birth: Option<NaiveDate>,
    pub city: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attributes: ProfileAttributes,
}

impl Profile {
    /// Stored age, falling back to the age derived from the date of birth
    pub fn age_on(&self, today: NaiveDate) -> Option<u8> {
        self.age
            .or_else(|| self.date_of_birth.and_then(|dob| age_from_birth(dob, today)))
    }
}

impl Identified for Profile {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Optional free-form profile details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(rename = "eatingPreference", default)]
    pub eating: Option<String>,
    #[serde(rename = "drinkingPreference", default)]
    pub drinking: Option<String>,
    #[serde(rename = "datingType", default)]
    pub dating_type: Option<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

/// Named listing partition with its own pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cities,
    Guider,
    Inbox,
    Requests,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cities => "cities",
            Category::Guider => "guider",
            Category::Inbox => "inbox",
            Category::Requests => "requests",
        }
    }

    /// Trip categories are served by the listing endpoint, chat ones by the inbox channel
    pub fn is_trip(&self) -> bool {
        matches!(self, Category::Cities | Category::Guider)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cities" => Ok(Category::Cities),
            "guider" => Ok(Category::Guider),
            "inbox" => Ok(Category::Inbox),
            "requests" => Ok(Category::Requests),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestedIn {
    Male,
    Female,
    #[default]
    Everyone,
}

/// Trip posted in the Cities or Guider category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripListing {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "ownerName", default)]
    pub owner_name: String,
    #[serde(rename = "fromCity", default)]
    pub from_city: Option<String>,
    #[serde(rename = "toCity", default)]
    pub to_city: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(rename = "dateOfBirth", default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(rename = "isVerified", default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(rename = "travelDate", default)]
    pub travel_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TripListing {
    pub fn age_on(&self, today: NaiveDate) -> Option<u8> {
        self.age
            .or_else(|| self.date_of_birth.and_then(|dob| age_from_birth(dob, today)))
    }

    /// All city fields present on this listing, whatever its category
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        [&self.from_city, &self.to_city, &self.city]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }
}

impl Identified for TripListing {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Row of the chat inbox or chat request list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "peerId")]
    pub peer_id: String,
    #[serde(rename = "peerName", default)]
    pub peer_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread: u32,
}

impl Identified for ChatEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Produced when a like hits a profile satisfying the match predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(rename = "profileId")]
    pub profile_id: String,
    pub name: String,
    pub image: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: DateTime<Utc>,
}

/// Named-route transition requested from the UI shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub route: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RouteRequest {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Declarative listing filter owned by the filter screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FilterCriteria {
    #[validate(length(min = 1))]
    #[serde(default = "default_city")]
    pub city: String,
    #[validate(range(min = 18, max = 100))]
    #[serde(rename = "minAge", default = "default_min_age")]
    pub min_age: u8,
    #[validate(range(min = 18, max = 100))]
    #[serde(rename = "maxAge", default = "default_max_age")]
    pub max_age: u8,
    #[serde(rename = "verifiedOnly", default)]
    pub verified_only: bool,
    #[serde(rename = "interestedIn", default)]
    pub interested_in: InterestedIn,
}

pub const ALL_CITIES: &str = "all";

fn default_city() -> String { ALL_CITIES.to_string() }
fn default_min_age() -> u8 { 18 }
fn default_max_age() -> u8 { 100 }

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            city: default_city(),
            min_age: default_min_age(),
            max_age: default_max_age(),
            verified_only: false,
            interested_in: InterestedIn::Everyone,
        }
    }
}

impl FilterCriteria {
    pub fn matches_all_cities(&self) -> bool {
        self.city.trim().eq_ignore_ascii_case(ALL_CITIES)
    }
}

/// Whole years elapsed between `dob` and `today`
pub fn age_from_birth(dob: NaiveDate, today: NaiveDate) -> Option<u8> {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u8::try_from(years).ok()
}
