use chrono::NaiveDate;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::models::{FilterCriteria, Gender, InterestedIn, TripListing};

/// Errors for filter criteria that cannot be evaluated
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("invalid filter: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("minimum age {min} exceeds maximum age {max}")]
    InvertedAgeRange { min: u8, max: u8 },
}

/// Fields the filter predicates examine
pub trait Filterable {
    fn city_fields(&self) -> Vec<&str>;
    fn age_on(&self, today: NaiveDate) -> Option<u8>;
    fn verified(&self) -> Option<bool>;
    fn gender(&self) -> Option<Gender>;
}

impl Filterable for TripListing {
    fn city_fields(&self) -> Vec<&str> {
        self.cities().collect()
    }

    fn age_on(&self, today: NaiveDate) -> Option<u8> {
        TripListing::age_on(self, today)
    }

    fn verified(&self) -> Option<bool> {
        self.is_verified
    }

    fn gender(&self) -> Option<Gender> {
        self.gender
    }
}

/// Check field ranges and that the age range is not inverted
pub fn validate_criteria(criteria: &FilterCriteria) -> Result<(), CriteriaError> {
    criteria.validate()?;
    if criteria.min_age > criteria.max_age {
        return Err(CriteriaError::InvertedAgeRange {
            min: criteria.min_age,
            max: criteria.max_age,
        });
    }
    Ok(())
}

/// Evaluate every active predicate against one item
///
/// A field that an active predicate needs but the item lacks fails the item.
#[inline]
pub fn matches_criteria<T: Filterable>(item: &T, criteria: &FilterCriteria, today: NaiveDate) -> bool {
    if !criteria.matches_all_cities() {
        let needle = criteria.city.trim().to_lowercase();
        let hit = item
            .city_fields()
            .iter()
            .any(|city| city.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }

    match item.age_on(today) {
        Some(age) if age >= criteria.min_age && age <= criteria.max_age => {}
        _ => return false,
    }

    if criteria.verified_only && item.verified() != Some(true) {
        return false;
    }

    match criteria.interested_in {
        InterestedIn::Everyone => true,
        InterestedIn::Male => item.gender() == Some(Gender::Male),
        InterestedIn::Female => item.gender() == Some(Gender::Female),
    }
}

/// Derive the visible subset, preserving collection order
pub fn apply_filter<'a, T: Filterable>(
    items: &'a [T],
    criteria: &FilterCriteria,
    today: NaiveDate,
) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_criteria(*item, criteria, today))
        .collect()
}
