//! Risk/reward levels derived from the session open and the prior day's range.

use serde::Serialize;

const RISK_FRACTION: f64 = 0.01;
const TARGET_FRACTION: f64 = 0.015;
const RANGE_MULTIPLIER: f64 = 0.55;
const STOPLOSS_FRACTION: f64 = 0.0135;
/// Price tick on NSE equities.
const TICK_SIZE: f64 = 0.05;

/// Entry, stop and target levels for a long and a short breakout trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelSet {
    #[serde(rename = "Buy_Entry")]
    pub buy_entry: f64,
    #[serde(rename = "Sell_Entry")]
    pub sell_entry: f64,
    #[serde(rename = "Buy_Stoploss")]
    pub buy_stoploss: f64,
    #[serde(rename = "Sell_Stoploss")]
    pub sell_stoploss: f64,
    #[serde(rename = "Buy_Stopgain")]
    pub buy_stopgain: f64,
    #[serde(rename = "Sell_Stopgain")]
    pub sell_stopgain: f64,
    #[serde(rename = "Shares_count")]
    pub shares: i64,
}

/// Snap `value` to the nearest multiple of `base`, then round to cents.
///
/// Ties go to the even multiple.
pub fn round_to_base(value: f64, base: f64) -> f64 {
    round2(base * (value / base).round_ties_even())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn calculate(open: f64, prior_high: f64, prior_low: f64, capital: f64) -> LevelSet {
    let risk_per_trade = capital * RISK_FRACTION;
    let target_profit = capital * TARGET_FRACTION;
    let range = prior_high - prior_low;

    let buy_entry = round_to_base(open + range * RANGE_MULTIPLIER, TICK_SIZE);
    let sell_entry = round_to_base(open - range * RANGE_MULTIPLIER, TICK_SIZE);

    let buy_stoploss = round_to_base(buy_entry * (1.0 - STOPLOSS_FRACTION), TICK_SIZE);
    let sell_stoploss = round_to_base(sell_entry * (1.0 + STOPLOSS_FRACTION), TICK_SIZE);

    let risk_buy = buy_entry - buy_stoploss;
    let shares = if risk_buy != 0.0 {
        round_to_base(risk_per_trade / risk_buy, 1.0)
    } else {
        0.0
    };

    let (buy_stopgain, sell_stopgain) = if shares != 0.0 {
        (
            round_to_base(buy_entry + target_profit / shares, TICK_SIZE),
            round_to_base(sell_entry - target_profit / shares, TICK_SIZE),
        )
    } else {
        (0.0, 0.0)
    };

    LevelSet {
        buy_entry: round2(buy_entry),
        sell_entry: round2(sell_entry),
        buy_stoploss: round2(buy_stoploss),
        sell_stoploss: round2(sell_stoploss),
        buy_stopgain: round2(buy_stopgain),
        sell_stopgain: round2(sell_stopgain),
        shares: shares.trunc() as i64,
    }
}
