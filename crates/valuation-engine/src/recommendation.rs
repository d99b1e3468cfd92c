use valuation_core::{Recommendation, RecommendationBands};

use crate::composite::effective_low;
use crate::models::PriceBands;

/// Floor, buy limit and sell limit for a consensus target. `None` without a
/// positive target.
pub fn price_bands(
    current_price: f64,
    consensus_target: Option<f64>,
    average_low: Option<f64>,
    bands: &RecommendationBands,
) -> Option<PriceBands> {
    let target = consensus_target.filter(|t| t.is_finite() && *t > 0.0)?;
    let floor_price = effective_low(current_price, average_low) * bands.floor_factor;
    if !floor_price.is_finite() {
        return None;
    }
    Some(PriceBands {
        floor_price,
        buy_limit: floor_price + (target - floor_price) * bands.buy_fraction,
        sell_limit: target * bands.sell_factor,
    })
}

/// BUY below the buy limit, SELL above the sell limit, HOLD otherwise.
/// Always HOLD without a target or a usable price.
pub fn classify(current_price: f64, bands: Option<&PriceBands>) -> Recommendation {
    let Some(bands) = bands else {
        return Recommendation::Hold;
    };
    if !current_price.is_finite() || current_price <= 0.0 {
        return Recommendation::Hold;
    }
    if current_price < bands.buy_limit {
        Recommendation::Buy
    } else if current_price > bands.sell_limit {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bands_for(price: f64, target: Option<f64>) -> Option<PriceBands> {
        price_bands(price, target, Some(10.0), &RecommendationBands::default())
    }

    #[test]
    fn test_price_bands() {
        let b = bands_for(50.0, Some(109.0)).unwrap();
        assert_relative_eq!(b.floor_price, 9.0, epsilon = 1e-12);
        assert_relative_eq!(b.buy_limit, 9.0 + 100.0 * 0.33, epsilon = 1e-9);
        assert_relative_eq!(b.sell_limit, 109.0);
    }

    #[test]
    fn test_three_zones() {
        assert_eq!(classify(30.0, bands_for(30.0, Some(109.0)).as_ref()), Recommendation::Buy);
        assert_eq!(classify(80.0, bands_for(80.0, Some(109.0)).as_ref()), Recommendation::Hold);
        assert_eq!(classify(150.0, bands_for(150.0, Some(109.0)).as_ref()), Recommendation::Sell);
    }

    #[test]
    fn test_hold_without_target() {
        for price in [1.0, 50.0, 10_000.0] {
            let bands = bands_for(price, None);
            assert!(bands.is_none());
            assert_eq!(classify(price, bands.as_ref()), Recommendation::Hold);
        }
        assert!(bands_for(50.0, Some(0.0)).is_none());
    }

    #[test]
    fn test_sell_factor_variant() {
        let bands = RecommendationBands {
            sell_factor: 0.95,
            ..RecommendationBands::default()
        };
        let b = price_bands(100.0, Some(104.0), Some(60.0), &bands).unwrap();
        assert_eq!(classify(100.0, Some(&b)), Recommendation::Sell);
    }
}
