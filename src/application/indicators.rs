//! Indicator engine.
//!
//! Computes the full indicator set over an ordered OHLCV series. Every value
//! at bar `i` uses data at or before bar `i` only. Rolling windows follow the
//! full-window convention: a window of `w` is undefined (None) until `w`
//! observations exist. The assembler, not this module, decides what to do
//! with incomplete rows.

use crate::domain::features::FeatureRow;
use crate::domain::market::PriceSeries;
use statrs::statistics::Statistics;

const SMA_FAST: usize = 10;
const SMA_SLOW: usize = 30;
const EMA_SPAN: usize = 12;
const RSI_WINDOW: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const STOCH_WINDOW: usize = 14;
const BB_WINDOW: usize = 20;
const BB_STD_DEV: f64 = 2.0;
const ATR_WINDOW: usize = 14;
const VOLUME_WINDOW: usize = 20;
const VOLATILITY_WINDOW: usize = 20;
const VOLUME_SPIKE_RATIO: f64 = 1.5;

/// The longest rolling window in the feature set; series at or below this
/// length produce no complete rows.
pub const LARGEST_WINDOW: usize = SMA_SLOW;

/// Compute one `FeatureRow` per bar. Output length always equals input length.
pub fn compute(series: &PriceSeries) -> Vec<FeatureRow> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }

    let closes: Vec<f64> = series.candles.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = series.candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = series.candles.iter().map(|c| c.low).collect();
    let volumes: Vec<f64> = series.candles.iter().map(|c| c.volume).collect();

    let sma_10 = rolling(&closes, SMA_FAST, |w| w.iter().mean());
    let sma_30 = rolling(&closes, SMA_SLOW, |w| w.iter().mean());
    let ema_12 = ema(&closes, EMA_SPAN);
    let rsi = relative_strength_index(&closes);
    let (macd, macd_signal) = macd_lines(&closes);
    let stoch_k = stochastic_k(&closes, &highs, &lows);
    let bb_middle = rolling(&closes, BB_WINDOW, |w| w.iter().mean());
    let bb_std = rolling(&closes, BB_WINDOW, |w| w.iter().std_dev());
    let atr = average_true_range(&closes, &highs, &lows);
    let obv = on_balance_volume(&closes, &volumes);
    let volume_ma = rolling(&volumes, VOLUME_WINDOW, |w| w.iter().mean());
    let returns = pct_change(&closes);
    let volatility = rolling_opt(&returns, VOLATILITY_WINDOW, |w| w.iter().std_dev());

    (0..n)
        .map(|i| {
            let bb_upper = match (bb_middle[i], bb_std[i]) {
                (Some(m), Some(s)) => Some(m + BB_STD_DEV * s),
                _ => None,
            };
            let bb_lower = match (bb_middle[i], bb_std[i]) {
                (Some(m), Some(s)) => Some(m - BB_STD_DEV * s),
                _ => None,
            };

            // Flag features coerce missing inputs to 0, so they are defined
            // on every bar.
            let ma_signal = match (sma_10[i], sma_30[i]) {
                (Some(fast), Some(slow)) if fast > slow => 1.0,
                _ => 0.0,
            };
            let rsi_signal = match rsi[i] {
                Some(r) if r > 30.0 && r < 70.0 => 1.0,
                _ => 0.0,
            };
            let volume_spike = match volume_ma[i] {
                Some(vma) if volumes[i] > VOLUME_SPIKE_RATIO * vma => 1.0,
                _ => 0.0,
            };

            FeatureRow {
                timestamp: series.candles[i].timestamp,
                sma_10: sma_10[i],
                sma_30: sma_30[i],
                ema_12: Some(ema_12[i]),
                rsi: rsi[i],
                macd: Some(macd[i]),
                macd_signal: Some(macd_signal[i]),
                stoch_k: stoch_k[i],
                bb_upper,
                bb_middle: bb_middle[i],
                bb_lower,
                atr: atr[i],
                obv: Some(obv[i]),
                volume_ma: volume_ma[i],
                returns: returns[i],
                volatility: volatility[i],
                price_range: Some((highs[i] - lows[i]) / closes[i]),
                ma_signal: Some(ma_signal),
                rsi_signal: Some(rsi_signal),
                volume_spike: Some(volume_spike),
            }
        })
        .collect()
}

/// Apply `f` over each fully-populated trailing window.
fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 >= window {
                Some(f(&values[i + 1 - window..=i]))
            } else {
                None
            }
        })
        .collect()
}

/// Like `rolling`, over a series that already has leading gaps: the window is
/// defined only when every member is.
fn rolling_opt(
    values: &[Option<f64>],
    window: usize,
    f: impl Fn(&[f64]) -> f64,
) -> Vec<Option<f64>> {
    let mut buf = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            buf.clear();
            for v in &values[i + 1 - window..=i] {
                buf.push((*v)?);
            }
            Some(f(&buf))
        })
        .collect()
}

/// Exponentially weighted mean with span-based decay (alpha = 2/(span+1)) and
/// no minimum-periods floor: early values are weighted over the history that
/// exists, so the output is defined from the first bar.
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut num = 0.0;
    let mut den = 0.0;
    for &v in values {
        num = v + decay * num;
        den = 1.0 + decay * den;
        out.push(num / den);
    }
    out
}

/// RSI(14) over one-bar close deltas: RS = mean gain / mean loss over the
/// window. A window with gains and zero losses saturates at 100; a window
/// with neither (flat closes) is undefined and propagates as missing.
fn relative_strength_index(closes: &[f64]) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(n);
    gains.push(None);
    losses.push(None);
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let gain_ma = rolling_opt(&gains, RSI_WINDOW, |w| w.iter().mean());
    let loss_ma = rolling_opt(&losses, RSI_WINDOW, |w| w.iter().mean());

    gain_ma
        .iter()
        .zip(loss_ma.iter())
        .map(|(g, l)| match (g, l) {
            (Some(gain), Some(loss)) => {
                if *loss == 0.0 {
                    if *gain == 0.0 { None } else { Some(100.0) }
                } else {
                    let rs = gain / loss;
                    Some(100.0 - 100.0 / (1.0 + rs))
                }
            }
            _ => None,
        })
        .collect()
}

/// MACD = EMA(12) - EMA(26); signal = EMA(9) of the MACD line.
fn macd_lines(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);
    let macd: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal = ema(&macd, MACD_SIGNAL);
    (macd, signal)
}

/// Stochastic %K(14). A window where the high equals the low has no defined
/// oscillator position; that is missing data, not a division by zero.
fn stochastic_k(closes: &[f64], highs: &[f64], lows: &[f64]) -> Vec<Option<f64>> {
    let low_min = rolling(lows, STOCH_WINDOW, |w| {
        w.iter().cloned().fold(f64::INFINITY, f64::min)
    });
    let high_max = rolling(highs, STOCH_WINDOW, |w| {
        w.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    });

    (0..closes.len())
        .map(|i| match (low_min[i], high_max[i]) {
            (Some(lo), Some(hi)) if hi > lo => Some((closes[i] - lo) / (hi - lo) * 100.0),
            _ => None,
        })
        .collect()
}

/// ATR(14): rolling mean of the true range. The first bar has no previous
/// close, so its true range is just high - low.
fn average_true_range(closes: &[f64], highs: &[f64], lows: &[f64]) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let hl = highs[i] - lows[i];
        let range = if i == 0 {
            hl
        } else {
            let hc = (highs[i] - closes[i - 1]).abs();
            let lc = (lows[i] - closes[i - 1]).abs();
            hl.max(hc).max(lc)
        };
        tr.push(range);
    }
    rolling(&tr, ATR_WINDOW, |w| w.iter().mean())
}

/// On-balance volume: a cumulative fold over close direction, seeded at 0.
/// The recurrence is inherently sequential; one O(n) pass.
fn on_balance_volume(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(closes.len());
    let mut obv = 0.0;
    for i in 0..closes.len() {
        if i > 0 {
            if closes[i] > closes[i - 1] {
                obv += volumes[i];
            } else if closes[i] < closes[i - 1] {
                obv -= volumes[i];
            }
        }
        out.push(obv);
    }
    out
}

/// One-bar percentage change; undefined on the first bar.
fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                None
            } else {
                Some((values[i] - values[i - 1]) / values[i - 1])
            }
        })
        .collect()
}
