use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::predicate::MatchPredicate;
use crate::models::{MatchEvent, Profile};

/// Horizontal displacement below which a swipe is ignored
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// Errors raised by feed transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("feed has no profiles with images")]
    Empty,

    #[error("another transition is still pending")]
    Busy,

    #[error("no match is awaiting dismissal")]
    NoPendingMatch,
}

/// Position inside the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedCursor {
    #[serde(rename = "profileIndex")]
    pub profile_index: usize,
    #[serde(rename = "imageIndex")]
    pub image_index: usize,
}

/// Identifies one scheduled transient completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransitionTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    NoMatch,
    Disliking,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedPhase {
    Viewing,
    /// Advancement suspended until the match dialog is dismissed
    MatchFound(MatchEvent),
    /// Animated state that advances once its presentation interval elapses
    Transient {
        kind: TransientKind,
        ticket: TransitionTicket,
    },
}

impl FeedPhase {
    pub fn name(&self) -> &'static str {
        match self {
            FeedPhase::Viewing => "viewing",
            FeedPhase::MatchFound(_) => "match_found",
            FeedPhase::Transient { kind: TransientKind::NoMatch, .. } => "no_match",
            FeedPhase::Transient { kind: TransientKind::Disliking, .. } => "disliking",
        }
    }
}

/// Result of a like
#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    Matched(MatchEvent),
    NoMatch(TransitionTicket),
}

/// Swipe/like state machine over an already-loaded profile collection
pub struct FeedMachine {
    profiles: Vec<Profile>,
    cursor: FeedCursor,
    phase: FeedPhase,
    predicate: Arc<dyn MatchPredicate>,
    swipe_threshold: f64,
    next_ticket: u64,
}

impl std::fmt::Debug for FeedMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedMachine")
            .field("profiles", &self.profiles.len())
            .field("cursor", &self.cursor)
            .field("phase", &self.phase)
            .finish()
    }
}

impl FeedMachine {
    /// Profiles without images are skipped; `Empty` if none remain
    pub fn new(
        profiles: Vec<Profile>,
        predicate: Arc<dyn MatchPredicate>,
    ) -> Result<Self, FeedError> {
        let profiles: Vec<Profile> = profiles
            .into_iter()
            .filter(|p| {
                if p.images.is_empty() {
                    tracing::warn!("Skipping profile {} without images", p.id);
                }
                !p.images.is_empty()
            })
            .collect();
        if profiles.is_empty() {
            return Err(FeedError::Empty);
        }

        Ok(Self {
            profiles,
            cursor: FeedCursor::default(),
            phase: FeedPhase::Viewing,
            predicate,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            next_ticket: 0,
        })
    }

    pub fn with_swipe_threshold(mut self, threshold: f64) -> Self {
        self.swipe_threshold = threshold.abs();
        self
    }

    pub fn cursor(&self) -> FeedCursor {
        self.cursor
    }

    pub fn phase(&self) -> &FeedPhase {
        &self.phase
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn current_profile(&self) -> &Profile {
        &self.profiles[self.cursor.profile_index]
    }

    pub fn current_image(&self) -> &str {
        &self.current_profile().images[self.cursor.image_index]
    }

    fn ensure_viewing(&self) -> Result<(), FeedError> {
        match self.phase {
            FeedPhase::Viewing => Ok(()),
            _ => Err(FeedError::Busy),
        }
    }

    /// Returns whether the image pointer moved
    pub fn next_image(&mut self) -> Result<bool, FeedError> {
        self.ensure_viewing()?;
        let count = self.current_profile().images.len();
        if self.cursor.image_index + 1 >= count {
            return Ok(false);
        }
        self.cursor.image_index += 1;
        Ok(true)
    }

    /// Returns whether the image pointer moved
    pub fn previous_image(&mut self) -> Result<bool, FeedError> {
        self.ensure_viewing()?;
        if self.cursor.image_index == 0 {
            return Ok(false);
        }
        self.cursor.image_index -= 1;
        Ok(true)
    }

    /// Interpret a horizontal swipe; displacements inside the dead zone are ignored
    pub fn swipe(&mut self, dx: f64) -> Result<bool, FeedError> {
        self.ensure_viewing()?;
        if dx > self.swipe_threshold {
            self.next_image()
        } else if dx < -self.swipe_threshold {
            self.previous_image()
        } else {
            Ok(false)
        }
    }

    /// Tap on the left half pages back, right half pages forward
    pub fn tap(&mut self, x: f64, width: f64) -> Result<bool, FeedError> {
        self.ensure_viewing()?;
        if width <= 0.0 || !x.is_finite() {
            return Ok(false);
        }
        if x < width / 2.0 {
            self.previous_image()
        } else {
            self.next_image()
        }
    }

    pub fn like(&mut self) -> Result<LikeOutcome, FeedError> {
        self.ensure_viewing()?;
        let profile = self.current_profile();

        if self.predicate.is_match(profile) {
            let event = MatchEvent {
                profile_id: profile.id.clone(),
                name: profile.name.clone(),
                image: profile.images[0].clone(),
                matched_at: chrono::Utc::now(),
            };
            tracing::debug!("Match found with profile {}", event.profile_id);
            self.phase = FeedPhase::MatchFound(event.clone());
            return Ok(LikeOutcome::Matched(event));
        }

        let ticket = self.start_transient(TransientKind::NoMatch);
        Ok(LikeOutcome::NoMatch(ticket))
    }

    pub fn dislike(&mut self) -> Result<TransitionTicket, FeedError> {
        self.ensure_viewing()?;
        Ok(self.start_transient(TransientKind::Disliking))
    }

    /// Close the match dialog and move on to the next profile
    pub fn dismiss_match(&mut self) -> Result<MatchEvent, FeedError> {
        match std::mem::replace(&mut self.phase, FeedPhase::Viewing) {
            FeedPhase::MatchFound(event) => {
                self.advance();
                Ok(event)
            }
            other => {
                self.phase = other;
                Err(FeedError::NoPendingMatch)
            }
        }
    }

    /// Finish a transient state. Stale or unknown tickets are ignored.
    pub fn complete(&mut self, ticket: TransitionTicket) -> bool {
        match self.phase {
            FeedPhase::Transient { ticket: pending, .. } if pending == ticket => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn start_transient(&mut self, kind: TransientKind) -> TransitionTicket {
        let ticket = TransitionTicket(self.next_ticket);
        self.next_ticket += 1;
        self.phase = FeedPhase::Transient { kind, ticket };
        ticket
    }

    fn advance(&mut self) {
        self.cursor = FeedCursor {
            profile_index: (self.cursor.profile_index + 1) % self.profiles.len(),
            image_index: 0,
        };
        self.phase = FeedPhase::Viewing;
    }
}
