use rust_decimal::Decimal;

use crate::constants::trading::PERCENT;
use crate::error::{BracketError, BracketResult};
use crate::exchange::types::Direction;

use super::quantizer::quantize_down;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BracketPrices {
    pub take_profit: Decimal,
    pub stop: Decimal,
}

/// Take-profit and stop-loss triggers around `current_price`.
///
/// Both legs are floored to `tick_size` whatever the direction. For a sell
/// this lowers the stop, i.e. moves it further from protective; kept as is
/// until the rounding rule is confirmed.
pub fn compute_prices(
    direction: Direction,
    current_price: Decimal,
    tp_percent: Decimal,
    sl_percent: Decimal,
    tick_size: Decimal,
) -> BracketResult<BracketPrices> {
    if current_price <= Decimal::ZERO {
        return Err(BracketError::InvalidPrice(current_price));
    }
    if tp_percent < Decimal::ZERO {
        return Err(BracketError::InvalidPercent {
            name: "tp_percent",
            value: tp_percent,
        });
    }
    if sl_percent < Decimal::ZERO {
        return Err(BracketError::InvalidPercent {
            name: "sl_percent",
            value: sl_percent,
        });
    }

    let tp_offset = tp_percent / PERCENT;
    let sl_offset = sl_percent / PERCENT;
    let (tp_factor, sl_factor) = match direction {
        Direction::Buy => (Decimal::ONE + tp_offset, Decimal::ONE - sl_offset),
        Direction::Sell => (Decimal::ONE - tp_offset, Decimal::ONE + sl_offset),
    };

    let take_profit = current_price
        .checked_mul(tp_factor)
        .ok_or(BracketError::ArithmeticOverflow("take-profit price"))?;
    let stop = current_price
        .checked_mul(sl_factor)
        .ok_or(BracketError::ArithmeticOverflow("stop price"))?;

    Ok(BracketPrices {
        take_profit: quantize_down(take_profit, tick_size)?,
        stop: quantize_down(stop, tick_size)?,
    })
}
