//! Tunable engine configuration with documented defaults and validation.
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn check_min(field: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min {
        return Err(ConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

/// Game clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "ClockConfig::default_quarter_seconds")]
    pub quarter_seconds: u32,
}

impl ClockConfig {
    const fn default_quarter_seconds() -> u32 {
        900
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "clock.quarter_seconds",
            f64::from(self.quarter_seconds),
            60.0,
            3_600.0,
        )
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            quarter_seconds: Self::default_quarter_seconds(),
        }
    }
}

/// Field position policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Neutral restart spot.
    #[serde(default = "FieldConfig::default_delta_base")]
    pub delta_base: i32,
    /// Deepest restart a trailing team can receive (the opponent's 20).
    #[serde(default = "FieldConfig::default_trailing_cap")]
    pub trailing_cap: i32,
    #[serde(default = "FieldConfig::default_bonus_start")]
    pub bonus_start: i32,
    #[serde(default = "FieldConfig::default_series_distance")]
    pub series_distance: i32,
}

impl FieldConfig {
    const fn default_delta_base() -> i32 {
        20
    }

    const fn default_trailing_cap() -> i32 {
        80
    }

    const fn default_bonus_start() -> i32 {
        25
    }

    const fn default_series_distance() -> i32 {
        20
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("field.delta_base", f64::from(self.delta_base), 1.0, 99.0)?;
        check_range(
            "field.trailing_cap",
            f64::from(self.trailing_cap),
            f64::from(self.delta_base),
            99.0,
        )?;
        check_range("field.bonus_start", f64::from(self.bonus_start), 1.0, 99.0)?;
        check_range(
            "field.series_distance",
            f64::from(self.series_distance),
            1.0,
            50.0,
        )
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            delta_base: Self::default_delta_base(),
            trailing_cap: Self::default_trailing_cap(),
            bonus_start: Self::default_bonus_start(),
            series_distance: Self::default_series_distance(),
        }
    }
}

/// Points per scoring channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "ScoringConfig::default_touchdown")]
    pub touchdown: u32,
    #[serde(default = "ScoringConfig::default_drop_kick")]
    pub drop_kick: u32,
    #[serde(default = "ScoringConfig::default_place_kick")]
    pub place_kick: u32,
    #[serde(default = "ScoringConfig::default_safety")]
    pub safety: u32,
    #[serde(default = "ScoringConfig::default_pindown")]
    pub pindown: u32,
}

impl ScoringConfig {
    const fn default_touchdown() -> u32 {
        9
    }

    const fn default_drop_kick() -> u32 {
        5
    }

    const fn default_place_kick() -> u32 {
        3
    }

    const fn default_safety() -> u32 {
        2
    }

    const fn default_pindown() -> u32 {
        1
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("scoring.touchdown", self.touchdown),
            ("scoring.drop_kick", self.drop_kick),
            ("scoring.place_kick", self.place_kick),
            ("scoring.safety", self.safety),
            ("scoring.pindown", self.pindown),
        ] {
            check_range(field, f64::from(value), 1.0, 20.0)?;
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            touchdown: Self::default_touchdown(),
            drop_kick: Self::default_drop_kick(),
            place_kick: Self::default_place_kick(),
            safety: Self::default_safety(),
            pindown: Self::default_pindown(),
        }
    }
}

/// Composure swings and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposureConfig {
    #[serde(default = "ComposureConfig::default_baseline")]
    pub baseline: f64,
    #[serde(default = "ComposureConfig::default_floor")]
    pub floor: f64,
    #[serde(default = "ComposureConfig::default_ceiling")]
    pub ceiling: f64,
    #[serde(default = "ComposureConfig::default_tilt")]
    pub tilt_below: f64,
    #[serde(default = "ComposureConfig::default_surge")]
    pub surge_above: f64,
    /// Fraction of the gap to baseline closed at the start of each drive.
    #[serde(default = "ComposureConfig::default_drive_decay")]
    pub drive_decay: f64,
    #[serde(default = "ComposureConfig::default_touchdown_swing")]
    pub touchdown_swing: f64,
    #[serde(default = "ComposureConfig::default_kick_swing")]
    pub kick_swing: f64,
    #[serde(default = "ComposureConfig::default_minor_swing")]
    pub minor_swing: f64,
    #[serde(default = "ComposureConfig::default_takeaway_gain")]
    pub takeaway_gain: f64,
    #[serde(default = "ComposureConfig::default_giveaway_loss")]
    pub giveaway_loss: f64,
    #[serde(default = "ComposureConfig::default_sack_gain")]
    pub sack_gain: f64,
    #[serde(default = "ComposureConfig::default_sack_loss")]
    pub sack_loss: f64,
    #[serde(default = "ComposureConfig::default_explosive_swing")]
    pub explosive_swing: f64,
}

impl ComposureConfig {
    const fn default_baseline() -> f64 {
        100.0
    }
    const fn default_floor() -> f64 {
        60.0
    }
    const fn default_ceiling() -> f64 {
        140.0
    }
    const fn default_tilt() -> f64 {
        80.0
    }
    const fn default_surge() -> f64 {
        120.0
    }
    const fn default_drive_decay() -> f64 {
        0.15
    }
    const fn default_touchdown_swing() -> f64 {
        8.0
    }
    const fn default_kick_swing() -> f64 {
        4.0
    }
    const fn default_minor_swing() -> f64 {
        3.0
    }
    const fn default_takeaway_gain() -> f64 {
        6.0
    }
    const fn default_giveaway_loss() -> f64 {
        7.0
    }
    const fn default_sack_gain() -> f64 {
        2.0
    }
    const fn default_sack_loss() -> f64 {
        3.0
    }
    const fn default_explosive_swing() -> f64 {
        2.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("composure.floor", self.floor, 1.0, self.baseline)?;
        check_range("composure.ceiling", self.ceiling, self.baseline, 500.0)?;
        check_range("composure.tilt_below", self.tilt_below, self.floor, self.baseline)?;
        check_range("composure.surge_above", self.surge_above, self.baseline, self.ceiling)?;
        check_range("composure.drive_decay", self.drive_decay, 0.0, 1.0)?;
        for (field, value) in [
            ("composure.touchdown_swing", self.touchdown_swing),
            ("composure.kick_swing", self.kick_swing),
            ("composure.minor_swing", self.minor_swing),
            ("composure.takeaway_gain", self.takeaway_gain),
            ("composure.giveaway_loss", self.giveaway_loss),
            ("composure.sack_gain", self.sack_gain),
            ("composure.sack_loss", self.sack_loss),
            ("composure.explosive_swing", self.explosive_swing),
        ] {
            check_min(field, value, 0.0)?;
        }
        Ok(())
    }
}

impl Default for ComposureConfig {
    fn default() -> Self {
        Self {
            baseline: Self::default_baseline(),
            floor: Self::default_floor(),
            ceiling: Self::default_ceiling(),
            tilt_below: Self::default_tilt(),
            surge_above: Self::default_surge(),
            drive_decay: Self::default_drive_decay(),
            touchdown_swing: Self::default_touchdown_swing(),
            kick_swing: Self::default_kick_swing(),
            minor_swing: Self::default_minor_swing(),
            takeaway_gain: Self::default_takeaway_gain(),
            giveaway_loss: Self::default_giveaway_loss(),
            sack_gain: Self::default_sack_gain(),
            sack_loss: Self::default_sack_loss(),
            explosive_swing: Self::default_explosive_swing(),
        }
    }
}

/// Defensive adaptation ("solved puzzle") tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    #[serde(default = "AdaptationConfig::default_drive_threshold")]
    pub drive_threshold: u32,
    #[serde(default = "AdaptationConfig::default_half_threshold")]
    pub half_threshold: u32,
    #[serde(default = "AdaptationConfig::default_base_chance")]
    pub base_chance: f64,
    /// Solve chance added per 50 points of instinct above average.
    #[serde(default = "AdaptationConfig::default_instinct_scale")]
    pub instinct_scale: f64,
    #[serde(default = "AdaptationConfig::default_deception_scale")]
    pub deception_scale: f64,
    /// Solve chance added per call beyond the threshold.
    #[serde(default = "AdaptationConfig::default_excess_step")]
    pub excess_step: f64,
    #[serde(default = "AdaptationConfig::default_max_solve_chance")]
    pub max_solve_chance: f64,
    #[serde(default = "AdaptationConfig::default_suppression")]
    pub suppression: f64,
    #[serde(default = "AdaptationConfig::default_avoid_plays")]
    pub avoid_plays: u32,
    #[serde(default = "AdaptationConfig::default_decay_step")]
    pub decay_step: f64,
    #[serde(default = "AdaptationConfig::default_halftime_bonus")]
    pub halftime_bonus: f64,
}

impl AdaptationConfig {
    const fn default_drive_threshold() -> u32 {
        3
    }
    const fn default_half_threshold() -> u32 {
        8
    }
    const fn default_base_chance() -> f64 {
        0.1
    }
    const fn default_instinct_scale() -> f64 {
        0.3
    }
    const fn default_deception_scale() -> f64 {
        0.25
    }
    const fn default_excess_step() -> f64 {
        0.04
    }
    const fn default_max_solve_chance() -> f64 {
        0.8
    }
    const fn default_suppression() -> f64 {
        0.15
    }
    const fn default_avoid_plays() -> u32 {
        3
    }
    const fn default_decay_step() -> f64 {
        0.34
    }
    const fn default_halftime_bonus() -> f64 {
        0.1
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_min("adaptation.drive_threshold", f64::from(self.drive_threshold), 1.0)?;
        check_min("adaptation.half_threshold", f64::from(self.half_threshold), 1.0)?;
        check_range("adaptation.base_chance", self.base_chance, 0.0, 1.0)?;
        check_range("adaptation.instinct_scale", self.instinct_scale, 0.0, 1.0)?;
        check_range("adaptation.deception_scale", self.deception_scale, 0.0, 1.0)?;
        check_range("adaptation.excess_step", self.excess_step, 0.0, 0.5)?;
        check_range("adaptation.max_solve_chance", self.max_solve_chance, 0.0, 0.8)?;
        check_range("adaptation.suppression", self.suppression, 0.0, 0.9)?;
        check_min("adaptation.avoid_plays", f64::from(self.avoid_plays), 1.0)?;
        check_range("adaptation.decay_step", self.decay_step, 0.01, 1.0)?;
        check_range("adaptation.halftime_bonus", self.halftime_bonus, 0.0, 1.0)
    }
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            drive_threshold: Self::default_drive_threshold(),
            half_threshold: Self::default_half_threshold(),
            base_chance: Self::default_base_chance(),
            instinct_scale: Self::default_instinct_scale(),
            deception_scale: Self::default_deception_scale(),
            excess_step: Self::default_excess_step(),
            max_solve_chance: Self::default_max_solve_chance(),
            suppression: Self::default_suppression(),
            avoid_plays: Self::default_avoid_plays(),
            decay_step: Self::default_decay_step(),
            halftime_bonus: Self::default_halftime_bonus(),
        }
    }
}

/// Play selection zones and bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Record weighted candidates for every snap.
    #[serde(default)]
    pub trace: bool,
    /// Yards to goal at or inside which the deep red zone applies.
    #[serde(default = "SelectorConfig::default_red_zone_yards")]
    pub red_zone_yards: i32,
    /// Yards to goal at or inside which scoring kicks get the range boost.
    #[serde(default = "SelectorConfig::default_kick_zone_yards")]
    pub kick_zone_yards: i32,
    #[serde(default = "SelectorConfig::default_short_yardage")]
    pub short_yardage: i32,
    #[serde(default = "SelectorConfig::default_long_yardage")]
    pub long_yardage: i32,
    #[serde(default = "SelectorConfig::default_red_zone_kick_factor")]
    pub red_zone_kick_factor: f64,
    /// Scoring-kick weight multiplier when out of the kicker's range.
    #[serde(default = "SelectorConfig::default_out_of_range_factor")]
    pub out_of_range_factor: f64,
}

impl SelectorConfig {
    const fn default_red_zone_yards() -> i32 {
        10
    }
    const fn default_kick_zone_yards() -> i32 {
        40
    }
    const fn default_short_yardage() -> i32 {
        3
    }
    const fn default_long_yardage() -> i32 {
        12
    }
    const fn default_red_zone_kick_factor() -> f64 {
        0.5
    }
    const fn default_out_of_range_factor() -> f64 {
        0.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("selector.red_zone_yards", f64::from(self.red_zone_yards), 1.0, 30.0)?;
        check_range(
            "selector.kick_zone_yards",
            f64::from(self.kick_zone_yards),
            f64::from(self.red_zone_yards),
            80.0,
        )?;
        check_range("selector.short_yardage", f64::from(self.short_yardage), 1.0, 10.0)?;
        check_range(
            "selector.long_yardage",
            f64::from(self.long_yardage),
            f64::from(self.short_yardage),
            50.0,
        )?;
        check_range("selector.red_zone_kick_factor", self.red_zone_kick_factor, 0.0, 1.0)?;
        check_range("selector.out_of_range_factor", self.out_of_range_factor, 0.0, 1.0)
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            trace: false,
            red_zone_yards: Self::default_red_zone_yards(),
            kick_zone_yards: Self::default_kick_zone_yards(),
            short_yardage: Self::default_short_yardage(),
            long_yardage: Self::default_long_yardage(),
            red_zone_kick_factor: Self::default_red_zone_kick_factor(),
            out_of_range_factor: Self::default_out_of_range_factor(),
        }
    }
}

/// Penalty rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficiatingConfig {
    #[serde(default = "OfficiatingConfig::default_penalty_rate")]
    pub penalty_rate: f64,
    /// Share of flags thrown on the offense (holding) rather than the defense.
    #[serde(default = "OfficiatingConfig::default_offense_share")]
    pub offense_share: f64,
}

impl OfficiatingConfig {
    const fn default_penalty_rate() -> f64 {
        0.03
    }
    const fn default_offense_share() -> f64 {
        0.55
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("officiating.penalty_rate", self.penalty_rate, 0.0, 0.5)?;
        check_range("officiating.offense_share", self.offense_share, 0.0, 1.0)
    }
}

impl Default for OfficiatingConfig {
    fn default() -> Self {
        Self {
            penalty_rate: Self::default_penalty_rate(),
            offense_share: Self::default_offense_share(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub composure: ComposureConfig,
    #[serde(default)]
    pub adaptation: AdaptationConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub officiating: OfficiatingConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or a validation error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        self.field.validate()?;
        self.scoring.validate()?;
        self.composure.validate()?;
        self.adaptation.validate()?;
        self.selector.validate()?;
        self.officiating.validate()?;
        Ok(())
    }

    /// Apply a partial overlay on top of this configuration.
    #[must_use]
    pub fn merge_overlay(&self, overlay: &EngineConfigOverlay) -> Self {
        let mut merged = self.clone();
        if let Some(seconds) = overlay.quarter_seconds {
            merged.clock.quarter_seconds = seconds;
        }
        if let Some(field) = overlay.field.as_ref() {
            merged.field = merged.field.with_overlay(field);
        }
        if let Some(adaptation) = overlay.adaptation.as_ref() {
            merged.adaptation = merged.adaptation.with_overlay(adaptation);
        }
        if let Some(trace) = overlay.trace {
            merged.selector.trace = trace;
        }
        if let Some(rate) = overlay.penalty_rate {
            merged.officiating.penalty_rate = rate;
        }
        if let Some(decay) = overlay.composure_drive_decay {
            merged.composure.drive_decay = decay;
        }
        merged
    }
}

/// Partial configuration for tuning runs. Absent keys keep the base value.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfigOverlay {
    pub quarter_seconds: Option<u32>,
    #[serde(default)]
    pub field: Option<FieldConfigOverlay>,
    #[serde(default)]
    pub adaptation: Option<AdaptationConfigOverlay>,
    pub trace: Option<bool>,
    pub penalty_rate: Option<f64>,
    pub composure_drive_decay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldConfigOverlay {
    pub delta_base: Option<i32>,
    pub trailing_cap: Option<i32>,
    pub bonus_start: Option<i32>,
    pub series_distance: Option<i32>,
}

impl FieldConfig {
    #[must_use]
    fn with_overlay(&self, overlay: &FieldConfigOverlay) -> Self {
        Self {
            delta_base: overlay.delta_base.unwrap_or(self.delta_base),
            trailing_cap: overlay.trailing_cap.unwrap_or(self.trailing_cap),
            bonus_start: overlay.bonus_start.unwrap_or(self.bonus_start),
            series_distance: overlay.series_distance.unwrap_or(self.series_distance),
        }
    }
}

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdaptationConfigOverlay {
    pub base_chance: Option<f64>,
    pub max_solve_chance: Option<f64>,
    pub suppression: Option<f64>,
    pub drive_threshold: Option<u32>,
    pub half_threshold: Option<u32>,
}

impl AdaptationConfig {
    #[must_use]
    fn with_overlay(&self, overlay: &AdaptationConfigOverlay) -> Self {
        let mut merged = self.clone();
        if let Some(chance) = overlay.base_chance {
            merged.base_chance = chance;
        }
        if let Some(max) = overlay.max_solve_chance {
            merged.max_solve_chance = max;
        }
        if let Some(suppression) = overlay.suppression {
            merged.suppression = suppression;
        }
        if let Some(threshold) = overlay.drive_threshold {
            merged.drive_threshold = threshold;
        }
        if let Some(threshold) = overlay.half_threshold {
            merged.half_threshold = threshold;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_json_uses_documented_defaults() {
        let cfg = EngineConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.scoring.touchdown, 9);
        assert_eq!(cfg.field.bonus_start, 25);
        assert_eq!(cfg.clock.quarter_seconds, 900);
    }

    #[test]
    fn solve_chance_cap_cannot_exceed_eighty_percent() {
        let err = EngineConfig::from_json(r#"{"adaptation": {"max_solve_chance": 0.95}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "adaptation.max_solve_chance",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overlay_only_touches_named_fields() {
        let base = EngineConfig::default();
        let overlay: EngineConfigOverlay =
            serde_json::from_str(r#"{"penalty_rate": 0.0, "adaptation": {"base_chance": 0.6}}"#)
                .unwrap();
        let merged = base.merge_overlay(&overlay);
        assert!(merged.officiating.penalty_rate.abs() < f64::EPSILON);
        assert!((merged.adaptation.base_chance - 0.6).abs() < f64::EPSILON);
        assert_eq!(merged.adaptation.drive_threshold, 3);
        assert_eq!(merged.field, base.field);
        merged.validate().unwrap();
    }
}
