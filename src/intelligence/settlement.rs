use rust_decimal::Decimal;

use crate::db::trade_repo::SettledTrade;
use crate::models::Side;

/// Did a trade on `trade_outcome` end up on the winning side?
///
/// A buy wins when it bought the outcome the market resolved to; a sell wins
/// when it sold any other outcome.
pub fn trade_won(side: Side, trade_outcome: &str, market_outcome: &str) -> bool {
    let matched = trade_outcome.trim().eq_ignore_ascii_case(market_outcome.trim());
    match side {
        Side::Buy => matched,
        Side::Sell => !matched,
    }
}

/// Realized return of a binary-outcome fill once the market pays out
/// 1 per winning share.
pub fn settlement_return(side: Side, shares: Decimal, cost: Decimal, won: bool) -> Decimal {
    match (side, won) {
        (Side::Buy, true) => shares - cost,
        (Side::Buy, false) => -cost,
        (Side::Sell, true) => cost,
        (Side::Sell, false) => cost - shares,
    }
}

/// Realized P&L of a trade in a resolved market. `None` when the side or
/// outcome labels are unknown.
pub fn realized_pnl(trade: &SettledTrade) -> Option<Decimal> {
    let side = Side::from_api_str(&trade.side)?;
    let trade_outcome = trade.outcome.as_deref()?;
    let won = trade_won(side, trade_outcome, &trade.market_outcome);
    Some(settlement_return(side, trade.shares, trade.token_amount, won))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settled(side: &str, outcome: Option<&str>, market_outcome: &str) -> SettledTrade {
        SettledTrade {
            side: side.into(),
            outcome: outcome.map(String::from),
            shares: dec!(1000),
            token_amount: dec!(180),
            market_outcome: market_outcome.into(),
        }
    }

    #[test]
    fn test_trade_won() {
        assert!(trade_won(Side::Buy, "Yes", "yes"));
        assert!(!trade_won(Side::Buy, "Yes", "No"));
        assert!(trade_won(Side::Sell, "Yes", "No"));
        assert!(!trade_won(Side::Sell, "No", "No"));
    }

    #[test]
    fn test_settlement_return() {
        assert_eq!(settlement_return(Side::Buy, dec!(1000), dec!(180), true), dec!(820));
        assert_eq!(settlement_return(Side::Buy, dec!(1000), dec!(180), false), dec!(-180));
        assert_eq!(settlement_return(Side::Sell, dec!(1000), dec!(700), true), dec!(700));
        assert_eq!(settlement_return(Side::Sell, dec!(1000), dec!(700), false), dec!(-300));
    }

    #[test]
    fn test_realized_pnl() {
        assert_eq!(realized_pnl(&settled("BUY", Some("Yes"), "Yes")), Some(dec!(820)));
        assert_eq!(realized_pnl(&settled("BUY", Some("No"), "Yes")), Some(dec!(-180)));
        assert_eq!(realized_pnl(&settled("BUY", None, "Yes")), None);
        assert_eq!(realized_pnl(&settled("HOLD", Some("Yes"), "Yes")), None);
    }
}
