// geomatch_service/src/engine.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use models::errors::Result;
use models::facility::{AttentionTier, Facility};
use models::geo::Geolocation;

use crate::catalog::FacilityCatalog;
use crate::conditions::{any_critical, required_specialties};
use crate::distance::haversine_km;

const TIER_BONUS_THIRD: i32 = 15;
const TIER_BONUS_SECOND: i32 = 5;
const ICU_CRITICAL_BONUS: i32 = 20;
const TRAUMA_CRITICAL_BONUS: i32 = 10;

/// When two scores differ by this margin or less, the nearer facility wins.
/// Keeps a marginal score edge from overriding a materially closer option.
const SCORE_TIE_MARGIN: i32 = 10;

/// Capability requirements applied to a distance query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CapabilityFilters {
    pub require_emergency: bool,
    pub require_24h: bool,
    pub require_icu: bool,
    pub require_trauma: bool,
}

impl CapabilityFilters {
    fn accepts(&self, facility: &Facility) -> bool {
        (!self.require_emergency || facility.has_emergency)
            && (!self.require_24h || facility.has_24h)
            && (!self.require_icu || facility.has_icu)
            && (!self.require_trauma || facility.has_trauma)
    }
}

/// A ranked facility. `score` is present only for condition-based queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityMatch {
    pub facility: Facility,
    pub distance_km: f64,
    pub score: Option<u8>,
}

/// Pure-read ranking engine over the facility catalog. Safe to query
/// concurrently with anything, including other geomatch queries.
pub struct GeomatchEngine {
    catalog: Arc<dyn FacilityCatalog>,
}

impl GeomatchEngine {
    pub fn new(catalog: Arc<dyn FacilityCatalog>) -> Self {
        GeomatchEngine { catalog }
    }

    /// Active facilities with known coordinates within `radius_km` of the
    /// origin, capability-filtered, nearest first, truncated to `limit`.
    pub async fn nearby_by_distance(
        &self,
        origin: Geolocation,
        radius_km: f64,
        limit: usize,
        filters: &CapabilityFilters,
    ) -> Result<Vec<FacilityMatch>> {
        let facilities = self.catalog.active_facilities().await?;

        let mut matches: Vec<FacilityMatch> = facilities
            .into_iter()
            .filter(|f| filters.accepts(f))
            .filter_map(|f| {
                let (lat, lon) = f.coordinates()?;
                let distance_km = haversine_km(origin.latitude, origin.longitude, lat, lon);
                (distance_km <= radius_km).then_some(FacilityMatch {
                    facility: f,
                    distance_km,
                    score: None,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        matches.truncate(limit);
        Ok(matches)
    }

    /// Condition-aware ranking. Maps each condition to its required
    /// specialties (baseline "emergency" always included), considers only
    /// facilities with an active emergency department, scores specialty
    /// coverage with tier and criticality bonuses, and ranks by score with a
    /// margin-bounded nearer-first promotion, or purely by distance when
    /// `prioritize` is false.
    pub async fn nearby_by_condition(
        &self,
        origin: Geolocation,
        conditions: &[String],
        radius_km: f64,
        limit: usize,
        prioritize: bool,
    ) -> Result<Vec<FacilityMatch>> {
        let required = required_specialties(conditions);
        let has_critical = any_critical(conditions);
        let facilities = self.catalog.active_facilities().await?;

        let mut matches: Vec<FacilityMatch> = facilities
            .into_iter()
            .filter(|f| f.has_emergency)
            .filter_map(|f| {
                let (lat, lon) = f.coordinates()?;
                let distance_km = haversine_km(origin.latitude, origin.longitude, lat, lon);
                if distance_km > radius_km {
                    return None;
                }
                let score = score_facility(&f, &required, has_critical);
                Some(FacilityMatch {
                    facility: f,
                    distance_km,
                    score: Some(score),
                })
            })
            .collect();

        if prioritize {
            rank_prioritized(&mut matches);
        } else {
            matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        }

        matches.truncate(limit);
        debug!(
            candidates = matches.len(),
            conditions = conditions.len(),
            prioritize,
            "condition-based geomatch complete"
        );
        Ok(matches)
    }
}

/// Prioritized order: score descending with distance as the secondary key,
/// then nearer facilities are promoted past any facility scoring at most
/// `SCORE_TIE_MARGIN` higher. The promotion uses adjacent swaps only, so a
/// facility never jumps one whose score lead exceeds the margin. Each swap
/// removes one distance inversion, so the pass terminates, and unlike a
/// pairwise margin comparator the result is a deterministic total order
/// (margin chains such as 48/38/33 cannot cycle).
fn rank_prioritized(matches: &mut [FacilityMatch]) {
    matches.sort_by(|a, b| {
        let score_a = i32::from(a.score.unwrap_or(0));
        let score_b = i32::from(b.score.unwrap_or(0));
        score_b
            .cmp(&score_a)
            .then_with(|| a.distance_km.total_cmp(&b.distance_km))
    });

    let mut swapped = true;
    while swapped {
        swapped = false;
        for i in 1..matches.len() {
            let lead = i32::from(matches[i - 1].score.unwrap_or(0))
                - i32::from(matches[i].score.unwrap_or(0));
            if lead <= SCORE_TIE_MARGIN && matches[i].distance_km < matches[i - 1].distance_km {
                matches.swap(i - 1, i);
                swapped = true;
            }
        }
    }
}

/// 0-100 heuristic: specialty coverage, then tier bonus, then criticality
/// bonus, clamped.
fn score_facility(
    facility: &Facility,
    required: &std::collections::HashSet<String>,
    has_critical: bool,
) -> u8 {
    let matched = facility
        .specialties
        .iter()
        .filter(|s| required.contains(s.trim().to_lowercase().as_str()))
        .count();

    let mut score = (100.0 * matched as f64 / required.len() as f64).round() as i32;

    score += match facility.tier {
        AttentionTier::ThirdLevel => TIER_BONUS_THIRD,
        AttentionTier::SecondLevel => TIER_BONUS_SECOND,
        AttentionTier::FirstLevel => 0,
    };

    if has_critical && facility.has_icu {
        score += ICU_CRITICAL_BONUS;
        if facility.has_trauma {
            score += TRAUMA_CRITICAL_BONUS;
        }
    }

    score.clamp(0, 100) as u8
}
