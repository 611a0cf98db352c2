//! Value-proportional sizers.

use crate::config::ConfigError;
use crate::domain::FillSizing;
use crate::sizers::{finish, Sizer, SizingContext};

/// Size an order at `percent`% of broker value at the current close.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentSizer {
    percent: f64,
    whole_units: bool,
}

impl PercentSizer {
    pub fn new(percent: f64, whole_units: bool) -> Result<Self, ConfigError> {
        if !(percent.is_finite() && percent > 0.0 && percent <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "percent sizer needs 0 < percent <= 100, got {percent}"
            )));
        }
        Ok(Self {
            percent,
            whole_units,
        })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

impl Sizer for PercentSizer {
    fn size(&self, ctx: &SizingContext) -> f64 {
        let unit = ctx.price * ctx.mult;
        if !(unit.is_finite() && unit > 0.0) || ctx.value <= 0.0 {
            return 0.0;
        }
        finish(ctx.value * self.percent / 100.0 / unit, self.whole_units)
    }

    fn name(&self) -> &str {
        "PercentOfValue"
    }
}

/// Spend all available cash.
///
/// `size` estimates the quantity at the current close; orders carry
/// [`FillSizing::CashPercent`] so the broker spends the cash at the actual
/// fill price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllInSizer {
    whole_units: bool,
}

impl AllInSizer {
    pub fn new(whole_units: bool) -> Self {
        Self { whole_units }
    }
}

impl Sizer for AllInSizer {
    fn size(&self, ctx: &SizingContext) -> f64 {
        let unit = ctx.price * ctx.mult;
        if !(unit.is_finite() && unit > 0.0) || ctx.cash <= 0.0 {
            return 0.0;
        }
        finish(ctx.cash / unit, self.whole_units)
    }

    fn name(&self) -> &str {
        "AllIn"
    }

    fn fill_sizing(&self) -> Option<FillSizing> {
        Some(FillSizing::CashPercent {
            percent: 100.0,
            whole_units: self.whole_units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizers::ctx;

    #[test]
    fn percent_of_value() {
        let sizer = PercentSizer::new(25.0, false).unwrap();
        assert_eq!(sizer.size(&ctx(5_000.0, 10_000.0, 50.0)), 50.0);
    }

    #[test]
    fn percent_whole_units_truncates() {
        let sizer = PercentSizer::new(10.0, true).unwrap();
        // 1000 / 30 = 33.33
        assert_eq!(sizer.size(&ctx(10_000.0, 10_000.0, 30.0)), 33.0);
    }

    #[test]
    fn percent_out_of_range() {
        assert!(PercentSizer::new(0.0, false).is_err());
        assert!(PercentSizer::new(150.0, false).is_err());
    }

    #[test]
    fn all_in_uses_cash_not_value() {
        let sizer = AllInSizer::new(false);
        assert_eq!(sizer.size(&ctx(1_000.0, 10_000.0, 4.0)), 250.0);
        assert_eq!(AllInSizer::new(true).size(&ctx(1_000.0, 1_000.0, 3.0)), 333.0);
    }

    #[test]
    fn no_cash_no_size() {
        assert_eq!(AllInSizer::default().size(&ctx(0.0, 0.0, 4.0)), 0.0);
    }

    #[test]
    fn all_in_defers_to_fill_price() {
        assert_eq!(
            AllInSizer::new(true).fill_sizing(),
            Some(FillSizing::CashPercent {
                percent: 100.0,
                whole_units: true
            })
        );
        assert_eq!(PercentSizer::new(10.0, false).unwrap().fill_sizing(), None);
    }
}
