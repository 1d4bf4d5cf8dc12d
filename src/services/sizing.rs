use rust_decimal::Decimal;

use crate::constants::trading::LEVERAGE_PERCENT_SCALE;
use crate::error::{BracketError, BracketResult};

use super::quantizer::quantize_down;

/// Entry quantity from available margin.
///
/// `leverage` is the caller's multiplier; it is applied as a percentage of
/// margin (`leverage * 100`), so 10 deploys 1000% of margin. The raw size is
/// floored to `step_size`. A zero result is returned as-is.
pub fn compute_size(
    available_margin: Decimal,
    leverage: Decimal,
    current_price: Decimal,
    step_size: Decimal,
) -> BracketResult<Decimal> {
    if leverage <= Decimal::ZERO {
        return Err(BracketError::InvalidLeverage(leverage));
    }
    if current_price <= Decimal::ZERO {
        return Err(BracketError::InvalidPrice(current_price));
    }

    let leverage_percent = leverage
        .checked_mul(LEVERAGE_PERCENT_SCALE)
        .ok_or(BracketError::ArithmeticOverflow("leverage percent"))?;
    let raw_size = available_margin
        .checked_mul(leverage_percent)
        .and_then(|notional| notional.checked_div(current_price))
        .ok_or(BracketError::ArithmeticOverflow("position size"))?;

    // A negative balance sizes to nothing rather than to a negative quantity.
    quantize_down(raw_size.max(Decimal::ZERO), step_size)
}
