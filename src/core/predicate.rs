use crate::models::Profile;

/// Decides whether liking a profile produces a match
///
/// The client has no reciprocal data, so implementations are stand-ins for
/// the backend's mutual-interest check.
pub trait MatchPredicate: Send + Sync {
    fn is_match(&self, profile: &Profile) -> bool;
}

impl<F> MatchPredicate for F
where
    F: Fn(&Profile) -> bool + Send + Sync,
{
    fn is_match(&self, profile: &Profile) -> bool {
        self(profile)
    }
}

/// Matches profiles located in one target city (case-insensitive)
#[derive(Debug, Clone)]
pub struct CityMatch {
    target_city: String,
}

impl CityMatch {
    pub fn new(target_city: impl Into<String>) -> Self {
        Self {
            target_city: target_city.into().trim().to_string(),
        }
    }

    pub fn target_city(&self) -> &str {
        &self.target_city
    }
}

impl MatchPredicate for CityMatch {
    #[inline]
    fn is_match(&self, profile: &Profile) -> bool {
        !self.target_city.is_empty()
            && profile.city.trim().eq_ignore_ascii_case(&self.target_city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileAttributes;

    fn profile_in(city: &str) -> Profile {
        Profile {
            id: "p".to_string(),
            name: "P".to_string(),
            age: Some(25),
            date_of_birth: None,
            city: city.to_string(),
            bio: None,
            images: vec!["img".to_string()],
            attributes: ProfileAttributes::default(),
        }
    }

    #[test]
    fn test_city_match_ignores_case_and_whitespace() {
        let predicate = CityMatch::new("Jaipur");
        assert!(predicate.is_match(&profile_in("jaipur ")));
        assert!(!predicate.is_match(&profile_in("Delhi")));
    }

    #[test]
    fn test_empty_target_never_matches() {
        let predicate = CityMatch::new("  ");
        assert!(!predicate.is_match(&profile_in("")));
    }

    #[test]
    fn test_closure_predicate() {
        let predicate = |p: &Profile| p.age == Some(25);
        assert!(predicate.is_match(&profile_in("Goa")));
    }
}
