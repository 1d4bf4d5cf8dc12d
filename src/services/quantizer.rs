use rust_decimal::Decimal;

use crate::error::{BracketError, BracketResult};

/// Largest multiple of `granularity` not exceeding `value`.
///
/// Exact: uses the decimal remainder, never a float or a rounded quotient.
/// The result carries the granularity's scale (`20` on a `0.001` step is
/// `20.000`), which is how it is rendered on the wire.
/// Shared by position sizing (step size) and trigger prices (tick size).
pub fn quantize_down(value: Decimal, granularity: Decimal) -> BracketResult<Decimal> {
    if granularity <= Decimal::ZERO {
        return Err(BracketError::InvalidGranularity(granularity));
    }
    let mut rem = value
        .checked_rem(granularity)
        .ok_or(BracketError::ArithmeticOverflow("quantization remainder"))?;
    // Remainder takes the sign of the dividend; floor needs it in [0, g).
    if rem < Decimal::ZERO {
        rem += granularity;
    }
    let mut floored = value
        .checked_sub(rem)
        .ok_or(BracketError::ArithmeticOverflow("quantized value"))?;
    // A multiple of the granularity has only zeros past its scale.
    floored.rescale(granularity.scale());
    Ok(floored)
}
