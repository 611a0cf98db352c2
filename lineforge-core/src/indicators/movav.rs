//! Moving-average selector used by composite indicators.

use serde::{Deserialize, Serialize};

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::{dema, ema, hma, kama, sma, wma, zlema};

/// Which moving average a composite uses for its smoothing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovAv {
    #[default]
    Sma,
    Ema,
    Smma,
    Wma,
    Dema,
    Tema,
    Hma,
    Zlema,
    Kama,
}

impl MovAv {
    pub const ALL: [MovAv; 9] = [
        MovAv::Sma,
        MovAv::Ema,
        MovAv::Smma,
        MovAv::Wma,
        MovAv::Dema,
        MovAv::Tema,
        MovAv::Hma,
        MovAv::Zlema,
        MovAv::Kama,
    ];

    /// Register this average of `input` over `period` bars.
    pub fn build(self, g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
        match self {
            MovAv::Sma => sma::sma(g, input, period),
            MovAv::Ema => ema::ema(g, input, period),
            MovAv::Smma => ema::smma(g, input, period),
            MovAv::Wma => wma::wma(g, input, period),
            MovAv::Dema => dema::dema(g, input, period),
            MovAv::Tema => dema::tema(g, input, period),
            MovAv::Hma => hma::hma(g, input, period),
            MovAv::Zlema => zlema::zlema(g, input, period),
            MovAv::Kama => kama::kama(
                g,
                input,
                kama::KamaParams {
                    period,
                    ..kama::KamaParams::default()
                },
            ),
        }
    }

    /// Minperiod of the average over a data line.
    pub fn minperiod(self, period: usize) -> usize {
        match self {
            MovAv::Sma | MovAv::Ema | MovAv::Smma | MovAv::Wma => period,
            MovAv::Dema => 2 * period - 1,
            MovAv::Tema => 3 * period - 2,
            MovAv::Hma => period + ((period as f64).sqrt() as usize).max(1) - 1,
            MovAv::Zlema => period + (period - 1) / 2,
            MovAv::Kama => period + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedId;

    #[test]
    fn graph_minperiod_matches_formula() {
        for kind in MovAv::ALL {
            for period in [1usize, 2, 5, 30] {
                let mut g = IndicatorGraph::new(1);
                let line = kind.build(&mut g, LineRef::close(FeedId(0)), period).unwrap();
                assert_eq!(g.minperiod_of(line).unwrap(), kind.minperiod(period), "{kind:?}({period})");
            }
        }
    }

    #[test]
    fn default_catalogue_values() {
        assert_eq!(MovAv::Dema.minperiod(30), 59);
        assert_eq!(MovAv::Tema.minperiod(30), 88);
        assert_eq!(MovAv::Hma.minperiod(30), 34);
        assert_eq!(MovAv::Zlema.minperiod(30), 44);
        assert_eq!(MovAv::Kama.minperiod(30), 31);
    }

    #[test]
    fn deserializes_snake_case() {
        let kind: MovAv = serde_json::from_str("\"zlema\"").unwrap();
        assert_eq!(kind, MovAv::Zlema);
    }
}
