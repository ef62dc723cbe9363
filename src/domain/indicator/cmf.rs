//! Chaikin Money Flow.
//!
//! MFM = ((C − L) − (H − C)) / (H − L), MFV = MFM × V,
//! CMF = Σ MFV / Σ V over `period` bars.

use crate::domain::indicator::EPSILON;
use crate::domain::ohlcv::OhlcvBar;

pub fn cmf_values(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 {
        return out;
    }
    let mfv: Vec<f64> = bars
        .iter()
        .map(|b| {
            let range = b.range();
            let mfm = if range > 0.0 {
                ((b.close - b.low) - (b.high - b.close)) / range
            } else {
                0.0
            };
            mfm * b.volume
        })
        .collect();

    for i in (period - 1)..bars.len() {
        let window = i + 1 - period..=i;
        let flow: f64 = mfv[window.clone()].iter().sum();
        let volume: f64 = bars[window].iter().map(|b| b.volume).sum();
        out[i] = Some(flow / volume.max(EPSILON));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::bar;

    #[test]
    fn cmf_close_at_high_is_one() {
        let bars: Vec<OhlcvBar> = (0..3).map(|i| bar(i, 10.0, 12.0, 8.0, 12.0, 100.0)).collect();
        let cmf = cmf_values(&bars, 3);
        assert!(cmf[1].is_none());
        assert!((cmf[2].unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cmf_close_at_low_is_minus_one() {
        let bars: Vec<OhlcvBar> = (0..3).map(|i| bar(i, 10.0, 12.0, 8.0, 8.0, 100.0)).collect();
        assert!((cmf_values(&bars, 2)[2].unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn cmf_zero_volume_is_zero() {
        let bars: Vec<OhlcvBar> = (0..3).map(|i| bar(i, 10.0, 12.0, 8.0, 11.0, 0.0)).collect();
        assert_eq!(cmf_values(&bars, 2)[2], Some(0.0));
    }
}
