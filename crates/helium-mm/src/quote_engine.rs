//! Quote price calculation engine.
//!
//! Fair value is the midpoint of the VWAPs needed to trade `trade_size` on
//! each side of the book. The half-spread scales the VWAP half-width by
//! `spread_factor`, and a bid is sized so that outstanding bids plus the
//! position converge to `trade_size`.

use helium_core::{Book, Price, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// Tolerance on the target-size comparison.
pub const SIZE_EPSILON: Decimal = dec!(0.00000001);

/// VWAP-based fair value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairValue {
    pub ask_vwap: Price,
    pub bid_vwap: Price,
}

impl FairValue {
    /// `0.5 * (ask_vwap + bid_vwap)`
    pub fn mid(&self) -> Price {
        Price::midpoint(self.ask_vwap, self.bid_vwap)
    }

    /// `spread_factor * 0.5 * (ask_vwap - bid_vwap)`
    pub fn half_spread(&self, spread_factor: Decimal) -> Price {
        (self.ask_vwap - self.bid_vwap) * (spread_factor / Decimal::TWO)
    }
}

/// A bid the engine wants on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidQuote {
    pub size: Size,
    pub price: Price,
}

/// Result of one quoting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub fair: FairValue,
    pub mid: Price,
    pub half_spread: Price,
    /// New bid to place, if the target size is not covered.
    pub bid: Option<BidQuote>,
}

/// Price both sides of the book for `trade_size`.
///
/// If either side cannot be priced by VWAP, both sides fall back to the
/// top of book. Returns `None` when the book is not two-sided.
pub fn fair_value<B: Book + ?Sized>(book: &B, trade_size: Size) -> Option<FairValue> {
    match (book.vwap(trade_size.inner()), book.vwap(-trade_size)) {
        (Ok(ask_vwap), Ok(bid_vwap)) => Some(FairValue { ask_vwap, bid_vwap }),
        (ask, bid) => {
            if let Some(e) = ask.err().or(bid.err()) {
                debug!(error = %e, "VWAP unavailable, falling back to best bid/ask");
            }
            Some(FairValue {
                ask_vwap: book.best_ask()?,
                bid_vwap: book.best_bid()?,
            })
        }
    }
}

/// Size of the bid needed to bring outstanding bids plus position up to
/// `trade_size`, or `None` if already covered (within [`SIZE_EPSILON`]).
pub fn bid_shortfall(trade_size: Size, outstanding_bids: Size, position: Decimal) -> Option<Size> {
    let covered = outstanding_bids.inner() + position;
    if covered < trade_size.inner() - SIZE_EPSILON {
        Some(Size::new(trade_size.inner() - covered))
    } else {
        None
    }
}

/// Run one quoting pass against the book.
pub fn compute_quote<B: Book + ?Sized>(
    book: &B,
    trade_size: Size,
    spread_factor: Decimal,
    outstanding_bids: Size,
    position: Decimal,
) -> Option<Quote> {
    let fair = fair_value(book, trade_size)?;
    let mid = fair.mid();
    let half_spread = fair.half_spread(spread_factor);
    let bid = bid_shortfall(trade_size, outstanding_bids, position).map(|size| BidQuote {
        size,
        price: mid - half_spread,
    });

    Some(Quote {
        fair,
        mid,
        half_spread,
        bid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use helium_core::BookError;
    use mockall::mock;

    mock! {
        pub TestBook {}
        impl Book for TestBook {
            fn vwap(&self, signed_size: Decimal) -> Result<Price, BookError>;
            fn best_ask(&self) -> Option<Price>;
            fn best_bid(&self) -> Option<Price>;
        }
    }

    fn vwap_book(bid: Decimal, ask: Decimal) -> MockTestBook {
        let mut book = MockTestBook::new();
        book.expect_vwap().returning(move |signed| {
            if signed > Decimal::ZERO {
                Ok(Price::new(ask))
            } else {
                Ok(Price::new(bid))
            }
        });
        book.expect_best_ask().never();
        book.expect_best_bid().never();
        book
    }

    #[test]
    fn test_reference_quote() {
        let book = vwap_book(dec!(99), dec!(101));
        let quote = compute_quote(
            &book,
            Size::new(dec!(10)),
            dec!(0.5),
            Size::ZERO,
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(quote.mid, Price::new(dec!(100)));
        assert_eq!(quote.half_spread, Price::new(dec!(0.5)));
        assert_eq!(
            quote.bid,
            Some(BidQuote {
                size: Size::new(dec!(10)),
                price: Price::new(dec!(99.5)),
            })
        );
    }

    #[test]
    fn test_mid_strictly_inside_and_spread_non_negative() {
        for (bid, ask, factor) in [
            (dec!(99), dec!(101), dec!(0.5)),
            (dec!(1.2345), dec!(1.2346), dec!(3)),
            (dec!(50000), dec!(50012.5), dec!(0)),
        ] {
            let fair = FairValue {
                ask_vwap: Price::new(ask),
                bid_vwap: Price::new(bid),
            };
            let mid = fair.mid();
            assert!(fair.bid_vwap < mid && mid < fair.ask_vwap);
            assert!(!fair.half_spread(factor).inner().is_sign_negative());
        }
    }

    #[test]
    fn test_insufficient_depth_falls_back_to_top_of_book() {
        let mut book = MockTestBook::new();
        book.expect_vwap().returning(|signed| {
            if signed > Decimal::ZERO {
                Ok(Price::new(dec!(101)))
            } else {
                Err(BookError::InsufficientDepth {
                    requested: Size::new(dec!(10)),
                    available: Size::new(dec!(3)),
                })
            }
        });
        book.expect_best_ask()
            .times(1)
            .returning(|| Some(Price::new(dec!(100.5))));
        book.expect_best_bid()
            .times(1)
            .returning(|| Some(Price::new(dec!(99.5))));

        let fair = fair_value(&book, Size::new(dec!(10))).unwrap();
        assert_eq!(fair.ask_vwap, Price::new(dec!(100.5)));
        assert_eq!(fair.bid_vwap, Price::new(dec!(99.5)));
        assert_eq!(fair.mid(), Price::new(dec!(100)));
    }

    #[test]
    fn test_one_sided_book_yields_nothing() {
        let mut book = MockTestBook::new();
        book.expect_vwap().returning(|_| Err(BookError::EmptySide));
        book.expect_best_ask().returning(|| Some(Price::new(dec!(101))));
        book.expect_best_bid().returning(|| None);

        assert!(fair_value(&book, Size::new(dec!(1))).is_none());
    }

    #[test]
    fn test_shortfall_accounts_for_bids_and_position() {
        let target = Size::new(dec!(10));
        assert_eq!(
            bid_shortfall(target, Size::new(dec!(4)), dec!(2)),
            Some(Size::new(dec!(4)))
        );
        assert_eq!(bid_shortfall(target, Size::new(dec!(4)), dec!(6)), None);
        assert_eq!(bid_shortfall(target, Size::ZERO, dec!(12)), None);
    }

    #[test]
    fn test_shortfall_tolerates_rounding() {
        let target = Size::new(dec!(10));
        assert_eq!(bid_shortfall(target, Size::new(dec!(9.999999995)), Decimal::ZERO), None);
        assert_eq!(
            bid_shortfall(target, Size::new(dec!(9.99999998)), Decimal::ZERO),
            Some(Size::new(dec!(0.00000002)))
        );
    }

    #[test]
    fn test_covered_target_places_no_bid() {
        let book = vwap_book(dec!(99), dec!(101));
        let quote = compute_quote(
            &book,
            Size::new(dec!(10)),
            dec!(0.5),
            Size::new(dec!(10)),
            Decimal::ZERO,
        )
        .unwrap();
        assert!(quote.bid.is_none());
        assert_eq!(quote.half_spread, Price::new(dec!(0.5)));
    }
}
