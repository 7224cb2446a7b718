//! Reconnection target selection
//!
//! Resolution order:
//! 1. the profile's own preference, if reachable
//! 2. in sticky mode, the endpoint the session was on before the break
//! 3. the directory's candidates, filtered and ranked by the mode
//!
//! `None` means nothing qualified; the caller counts it as a failed attempt.

use super::types::*;
use crate::config::constants::{HIGH_LOAD_THRESHOLD, IDEAL_LOAD_MAX, IDEAL_LOAD_MIN, LOW_LOAD_THRESHOLD};
use crate::config::ReconnectConfig;
use crate::core::{BreakError, CredentialProfile};
use crate::session::EndpointDirectory;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

/// Load ranking score, lower is better
///
/// Loads inside the ideal band score by distance from its centre; loads
/// outside it are penalised, overcrowding more than emptiness.
pub fn load_score(load: u32) -> u32 {
    if load < IDEAL_LOAD_MIN {
        (IDEAL_LOAD_MIN - load) * 2
    } else if load > IDEAL_LOAD_MAX {
        (load - IDEAL_LOAD_MAX).saturating_mul(3)
    } else {
        load.abs_diff((IDEAL_LOAD_MIN + IDEAL_LOAD_MAX) / 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSelector {
    mode: SelectionMode,
    region: Option<Region>,
    avoid_low_load: bool,
    avoid_high_load: bool,
    respect_service_tier: bool,
}

impl EndpointSelector {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            mode: config.endpoint_selection_mode,
            region: config.region_preference.region(),
            avoid_low_load: config.avoid_low_load,
            avoid_high_load: config.avoid_high_load,
            respect_service_tier: config.respect_service_tier,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Directory query for this profile
    pub fn query(&self, profile: &CredentialProfile) -> EndpointQuery {
        EndpointQuery {
            premium_only: self.respect_service_tier && profile.premium,
            avoid_low_load: self.avoid_low_load,
            avoid_high_load: self.avoid_high_load,
        }
    }

    /// Query the directory and pick a target
    pub fn select(
        &self,
        directory: &dyn EndpointDirectory,
        profile: &CredentialProfile,
        last_known: Option<EndpointId>,
    ) -> Result<Option<EndpointId>, BreakError> {
        let candidates = directory
            .query(&self.query(profile))
            .map_err(BreakError::Directory)?;

        let choice = self.select_from(&candidates, profile, last_known, &mut rand::thread_rng());
        debug!(
            mode = self.mode.as_str(),
            candidates = candidates.len(),
            choice = ?choice,
            "Endpoint selection"
        );
        Ok(choice)
    }

    /// Pick a target from an already fetched candidate list
    pub fn select_from<R: Rng + ?Sized>(
        &self,
        candidates: &[EndpointCandidate],
        profile: &CredentialProfile,
        last_known: Option<EndpointId>,
        rng: &mut R,
    ) -> Option<EndpointId> {
        if let Some(id) = self.preferred(candidates, profile, rng) {
            return Some(id);
        }

        if self.mode == SelectionMode::StickyPreferred {
            if let Some(id) = last_known.filter(|id| reachable(candidates, *id)) {
                return Some(id);
            }
        }

        let qualifying: Vec<&EndpointCandidate> = candidates
            .iter()
            .filter(|c| c.accessible && self.tier_ok(c, profile) && self.load_ok(c))
            .collect();
        let regional: Vec<&EndpointCandidate> = qualifying
            .iter()
            .copied()
            .filter(|c| self.region.map_or(true, |r| c.region == r))
            .collect();
        let pool = if regional.is_empty() { &qualifying } else { &regional };

        match self.mode {
            SelectionMode::Random => qualifying.choose(rng).map(|c| c.id),
            SelectionMode::StickyPreferred | SelectionMode::RegionalRandom => {
                pool.choose(rng).map(|c| c.id)
            }
            SelectionMode::BestLoad => pool
                .iter()
                .min_by_key(|c| (load_score(c.load), c.id))
                .map(|c| c.id),
            SelectionMode::BestLatency => pool
                .iter()
                .min_by_key(|c| (c.latency.is_none(), c.latency, load_score(c.load), c.id))
                .map(|c| c.id),
        }
    }

    /// Resolve the profile's own endpoint preference
    fn preferred<R: Rng + ?Sized>(
        &self,
        candidates: &[EndpointCandidate],
        profile: &CredentialProfile,
        rng: &mut R,
    ) -> Option<EndpointId> {
        let premium = match profile.preferred? {
            EndpointPreference::Specific(id) => {
                return reachable(candidates, id).then_some(id);
            }
            EndpointPreference::AnyPremium if self.respect_service_tier && !profile.premium => {
                warn!(
                    identity = %profile.identity,
                    "Profile prefers premium endpoints but is free tier, ignoring preference"
                );
                return None;
            }
            EndpointPreference::AnyPremium => true,
            EndpointPreference::AnyFree => false,
        };

        let matching: Vec<&EndpointCandidate> = candidates
            .iter()
            .filter(|c| c.accessible && c.premium == premium && self.load_ok(c))
            .collect();
        let regional: Vec<&EndpointCandidate> = matching
            .iter()
            .copied()
            .filter(|c| self.region.map_or(true, |r| c.region == r))
            .collect();

        if regional.is_empty() {
            matching.choose(rng).map(|c| c.id)
        } else {
            regional.choose(rng).map(|c| c.id)
        }
    }

    fn tier_ok(&self, candidate: &EndpointCandidate, profile: &CredentialProfile) -> bool {
        !self.respect_service_tier || candidate.premium == profile.premium
    }

    fn load_ok(&self, candidate: &EndpointCandidate) -> bool {
        !(self.avoid_low_load && candidate.load < LOW_LOAD_THRESHOLD)
            && !(self.avoid_high_load && candidate.load > HIGH_LOAD_THRESHOLD)
    }
}

fn reachable(candidates: &[EndpointCandidate], id: EndpointId) -> bool {
    candidates.iter().any(|c| c.id == id && c.accessible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn selector(mode: SelectionMode, region: RegionPreference) -> EndpointSelector {
        EndpointSelector::new(&ReconnectConfig {
            endpoint_selection_mode: mode,
            region_preference: region,
            ..ReconnectConfig::default()
        })
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn free() -> CredentialProfile {
        CredentialProfile::new("player")
    }

    #[test]
    fn test_premium_preference_ignored_for_free_profile() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500),
            EndpointCandidate::new(101, Region::Europe, 500).premium(),
        ];
        let mut profile = free();
        profile.preferred = Some(EndpointPreference::AnyPremium);
        let s = selector(SelectionMode::StickyPreferred, RegionPreference::Any);

        for _ in 0..20 {
            assert_eq!(s.select_from(&candidates, &profile, None, &mut rng()), Some(EndpointId(1)));
        }

        let premium = profile.clone().premium();
        assert_eq!(s.select_from(&candidates, &premium, None, &mut rng()), Some(EndpointId(101)));
    }

    #[test]
    fn test_load_score_bands() {
        assert_eq!(load_score(500), 0);
        assert_eq!(load_score(200), 300);
        assert_eq!(load_score(800), 300);
        assert_eq!(load_score(100), 200);
        assert_eq!(load_score(900), 300);
        assert_eq!(load_score(0), 400);
    }

    #[test]
    fn test_best_load_prefers_ideal_band() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 100),
            EndpointCandidate::new(2, Region::Europe, 500),
            EndpointCandidate::new(3, Region::Europe, 1500),
        ];
        let s = selector(SelectionMode::BestLoad, RegionPreference::Any);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(2)));
    }

    #[test]
    fn test_best_load_tie_breaks_by_lowest_id() {
        let candidates = vec![
            EndpointCandidate::new(9, Region::Europe, 400),
            EndpointCandidate::new(4, Region::Europe, 600),
        ];
        let s = selector(SelectionMode::BestLoad, RegionPreference::Any);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(4)));
    }

    #[test]
    fn test_load_filters() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 10),
            EndpointCandidate::new(2, Region::Europe, 1900),
        ];
        let s = selector(SelectionMode::Random, RegionPreference::Any);
        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), None);

        let relaxed = EndpointSelector::new(&ReconnectConfig {
            endpoint_selection_mode: SelectionMode::BestLoad,
            avoid_low_load: false,
            avoid_high_load: false,
            ..ReconnectConfig::default()
        });
        assert_eq!(relaxed.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(1)));
    }

    #[test]
    fn test_service_tier_respected() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500).premium(),
            EndpointCandidate::new(2, Region::Europe, 900),
        ];
        let s = selector(SelectionMode::BestLoad, RegionPreference::Any);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(2)));
        let member = CredentialProfile::new("member").premium();
        assert_eq!(s.select_from(&candidates, &member, None, &mut rng()), Some(EndpointId(1)));
        assert!(s.query(&member).premium_only);
        assert!(!s.query(&free()).premium_only);
    }

    #[test]
    fn test_profile_specific_endpoint_wins_when_reachable() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500),
            EndpointCandidate::new(2, Region::Europe, 500),
        ];
        let s = selector(SelectionMode::BestLoad, RegionPreference::Any);
        let profile = free().prefer_endpoint(EndpointId(2));

        assert_eq!(s.select_from(&candidates, &profile, None, &mut rng()), Some(EndpointId(2)));

        let blocked = vec![
            EndpointCandidate::new(1, Region::Europe, 500),
            EndpointCandidate::new(2, Region::Europe, 500).inaccessible(),
        ];
        assert_eq!(s.select_from(&blocked, &profile, None, &mut rng()), Some(EndpointId(1)));
    }

    #[test]
    fn test_profile_any_free_stays_on_free_endpoints() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500).premium(),
            EndpointCandidate::new(2, Region::Asia, 500),
        ];
        let s = selector(SelectionMode::Random, RegionPreference::Europe);
        let profile = free().prefer(EndpointPreference::AnyFree);

        for _ in 0..20 {
            assert_eq!(s.select_from(&candidates, &profile, None, &mut rng()), Some(EndpointId(2)));
        }
    }

    #[test]
    fn test_sticky_reuses_last_known() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500),
            EndpointCandidate::new(7, Region::Europe, 500),
        ];
        let s = selector(SelectionMode::StickyPreferred, RegionPreference::Any);

        assert_eq!(
            s.select_from(&candidates, &free(), Some(EndpointId(7)), &mut rng()),
            Some(EndpointId(7))
        );
        // Unknown last endpoint falls through to a random pick
        let pick = s.select_from(&candidates, &free(), Some(EndpointId(99)), &mut rng());
        assert!(matches!(pick, Some(EndpointId(1)) | Some(EndpointId(7))));
    }

    #[test]
    fn test_regional_random_falls_back_to_any_region() {
        let candidates = vec![EndpointCandidate::new(3, Region::Asia, 500)];
        let s = selector(SelectionMode::RegionalRandom, RegionPreference::Europe);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(3)));
    }

    #[test]
    fn test_regional_random_stays_in_region() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Asia, 500),
            EndpointCandidate::new(2, Region::Europe, 500),
            EndpointCandidate::new(3, Region::Asia, 500),
        ];
        let s = selector(SelectionMode::RegionalRandom, RegionPreference::Europe);
        let mut rng = rng();

        for _ in 0..20 {
            assert_eq!(s.select_from(&candidates, &free(), None, &mut rng), Some(EndpointId(2)));
        }
    }

    #[test]
    fn test_best_latency_ranks_unmeasured_last() {
        let candidates = vec![
            EndpointCandidate::new(1, Region::Europe, 500),
            EndpointCandidate::new(2, Region::Europe, 1500).with_latency(Duration::from_millis(80)),
            EndpointCandidate::new(3, Region::Europe, 500).with_latency(Duration::from_millis(20)),
        ];
        let s = selector(SelectionMode::BestLatency, RegionPreference::Any);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), Some(EndpointId(3)));

        let unmeasured = vec![
            EndpointCandidate::new(1, Region::Europe, 900),
            EndpointCandidate::new(2, Region::Europe, 500),
        ];
        assert_eq!(s.select_from(&unmeasured, &free(), None, &mut rng()), Some(EndpointId(2)));
    }

    #[test]
    fn test_inaccessible_endpoints_skipped() {
        let candidates = vec![EndpointCandidate::new(1, Region::Europe, 500).inaccessible()];
        let s = selector(SelectionMode::Random, RegionPreference::Any);

        assert_eq!(s.select_from(&candidates, &free(), None, &mut rng()), None);
    }
}
