//! Crossing detection logic
//!
//! Determines when an incoming limit order's price meets the opposing best.
//! Market orders skip this check entirely: they cross whenever opposing
//! liquidity exists.

use types::numeric::Price;
use types::order::Side;

/// Check if an incoming limit price crosses the opposing best price
///
/// A buy crosses when its limit is at or above the best ask; a sell crosses
/// when its limit is at or below the best bid.
pub fn crosses(incoming_side: Side, limit_price: Price, opposing_best: Price) -> bool {
    match incoming_side {
        Side::Buy => limit_price >= opposing_best,
        Side::Sell => limit_price <= opposing_best,
    }
}
