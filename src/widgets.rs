//! Baker's percentage calculator and temperature conversion.

use serde::Serialize;

pub const SALT_RATIO: f64 = 0.02;
pub const STARTER_RATIO: f64 = 0.20;
pub const DEFAULT_FLOUR_GRAMS: f64 = 1000.0;
pub const DEFAULT_HYDRATION_PERCENT: f64 = 75.0;
/// Largest flour weight the calculator accepts, in grams.
pub const MAX_FLOUR_GRAMS: f64 = 1_000_000_000.0;
/// Largest hydration the calculator accepts, in percent.
pub const MAX_HYDRATION_PERCENT: f64 = 1_000.0;

/// Ingredient weights in whole grams for a given flour weight and hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BakersPercentages {
    pub flour: i64,
    pub water: i64,
    pub salt: i64,
    pub starter: i64,
    pub total: i64,
}

impl BakersPercentages {
    /// Negative, NaN or infinite inputs count as zero; larger inputs are
    /// clamped to [`MAX_FLOUR_GRAMS`] and [`MAX_HYDRATION_PERCENT`].
    pub fn compute(flour_grams: f64, hydration_percent: f64) -> Self {
        let flour_grams = sanitize(flour_grams).min(MAX_FLOUR_GRAMS);
        let hydration_percent = sanitize(hydration_percent).min(MAX_HYDRATION_PERCENT);
        let flour = round_half_up(flour_grams);
        let water = round_half_up(flour_grams * (hydration_percent / 100.0));
        let salt = round_half_up(flour_grams * SALT_RATIO);
        let starter = round_half_up(flour_grams * STARTER_RATIO);
        Self {
            flour,
            water,
            salt,
            starter,
            total: flour
                .saturating_add(water)
                .saturating_add(salt)
                .saturating_add(starter),
        }
    }
}

impl Default for BakersPercentages {
    fn default() -> Self {
        Self::compute(DEFAULT_FLOUR_GRAMS, DEFAULT_HYDRATION_PERCENT)
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round_one_decimal(celsius * 9.0 / 5.0 + 32.0)
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round_one_decimal((fahrenheit - 32.0) * 5.0 / 9.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

// Halves round toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_recipe_matches_calculator_defaults() {
        let recipe = BakersPercentages::default();
        assert_eq!(recipe.flour, 1000);
        assert_eq!(recipe.water, 750);
        assert_eq!(recipe.salt, 20);
        assert_eq!(recipe.starter, 200);
        assert_eq!(recipe.total, 1970);
    }

    #[test]
    fn fractional_grams_round_to_whole_numbers() {
        let recipe = BakersPercentages::compute(525.0, 68.0);
        assert_eq!(recipe.water, 357);
        assert_eq!(recipe.salt, 11);
        assert_eq!(recipe.starter, 105);
    }

    #[test]
    fn invalid_inputs_count_as_zero() {
        let recipe = BakersPercentages::compute(f64::NAN, -10.0);
        assert_eq!(recipe.total, 0);
        let no_water = BakersPercentages::compute(500.0, f64::INFINITY);
        assert_eq!(no_water.water, 0);
        assert_eq!(no_water.flour, 500);
    }

    #[test]
    fn huge_inputs_are_clamped_instead_of_overflowing() {
        let recipe = BakersPercentages::compute(1e300, 75.0);
        assert_eq!(recipe.flour, 1_000_000_000);
        assert_eq!(recipe.water, 750_000_000);
        assert_eq!(recipe.total, 1_970_000_000);

        let soaked = BakersPercentages::compute(1e300, 1e300);
        assert_eq!(soaked.water, 10_000_000_000);
        assert!(soaked.total > 0);
    }

    #[test]
    fn temperatures_convert_both_ways() {
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(24.0), 75.2);
        assert_eq!(fahrenheit_to_celsius(78.0), 25.6);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40.0);
    }
}
