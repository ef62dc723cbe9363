//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low, TR[i] = true_range(close[i-1]).
//! Seed at bar n-1 with the mean of the first n true ranges, then
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::ohlcv::OhlcvBar;

pub fn atr_values(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.range()
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut atr = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(atr);
    for i in period..bars.len() {
        atr = (atr * (period - 1) as f64 + tr[i]) / period as f64;
        out[i] = Some(atr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::ohlc_bars;

    fn staircase() -> Vec<OhlcvBar> {
        ohlc_bars(&[
            (105.0, 110.0, 100.0, 105.0),
            (110.0, 115.0, 105.0, 110.0),
            (115.0, 120.0, 110.0, 115.0),
            (120.0, 125.0, 115.0, 120.0),
        ])
    }

    #[test]
    fn atr_warmup() {
        let atr = atr_values(&staircase(), 3);
        assert!(atr[0].is_none());
        assert!(atr[1].is_none());
        assert!(atr[2].is_some());
    }

    #[test]
    fn atr_seed_is_average() {
        let atr = atr_values(&staircase(), 3);
        assert!((atr[2].unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let atr = atr_values(&staircase(), 3);
        let expected = (10.0 * 2.0 + 10.0) / 3.0;
        assert!((atr[3].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_handles_gaps() {
        let bars = ohlc_bars(&[
            (105.0, 110.0, 100.0, 105.0),
            (125.0, 130.0, 120.0, 125.0),
            (115.0, 120.0, 110.0, 115.0),
        ]);
        let atr = atr_values(&bars, 2);
        // TR[1] = |130 - 105| = 25, seed = (10 + 25) / 2
        assert!((atr[1].unwrap() - 17.5).abs() < 1e-9);
        assert!(atr[2].is_some());
    }

    #[test]
    fn atr_insufficient_bars() {
        let atr = atr_values(&staircase()[..2], 5);
        assert!(atr.iter().all(Option::is_none));
    }
}
