//! In-memory L2 book rebuilt from snapshots.
//!
//! Bids and asks are price → size ladders; VWAP walks the ladder from the
//! touch outward.

use std::collections::BTreeMap;

use helium_core::{Book, BookError, CoreError, Price, Size};
use rust_decimal::Decimal;

/// Single-market L2 book.
#[derive(Debug, Default, Clone)]
pub struct LadderBook {
    bids: BTreeMap<Price, Size>,
    asks: BTreeMap<Price, Size>,
}

impl LadderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both sides with a full snapshot.
    ///
    /// Zero-size levels are dropped. On error the book is left unchanged.
    pub fn replace(
        &mut self,
        bids: &[(Price, Size)],
        asks: &[(Price, Size)],
    ) -> helium_core::Result<()> {
        let bids = Self::ladder(bids)?;
        let asks = Self::ladder(asks)?;
        self.bids = bids;
        self.asks = asks;
        Ok(())
    }

    fn ladder(levels: &[(Price, Size)]) -> helium_core::Result<BTreeMap<Price, Size>> {
        let mut ladder = BTreeMap::new();
        for &(price, size) in levels {
            if !price.is_positive() {
                return Err(CoreError::InvalidPrice(price.to_string()));
            }
            if size.inner().is_sign_negative() {
                return Err(CoreError::InvalidSize(size.to_string()));
            }
            if !size.is_zero() {
                ladder.insert(price, size);
            }
        }
        Ok(ladder)
    }

    /// Best bid with its size.
    pub fn best_bid_level(&self) -> Option<(Price, Size)> {
        self.bids.iter().next_back().map(|(p, s)| (*p, *s))
    }

    /// Best ask with its size.
    pub fn best_ask_level(&self) -> Option<(Price, Size)> {
        self.asks.iter().next().map(|(p, s)| (*p, *s))
    }

    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    fn walk<'a>(
        levels: impl Iterator<Item = (&'a Price, &'a Size)>,
        size: Decimal,
    ) -> Result<Price, BookError> {
        let mut remaining = size;
        let mut notional = Decimal::ZERO;
        let mut touched = false;
        for (price, level) in levels {
            touched = true;
            let take = remaining.min(level.inner());
            notional += take * price.inner();
            remaining -= take;
            if remaining.is_zero() {
                break;
            }
        }
        if !touched {
            return Err(BookError::EmptySide);
        }
        if remaining > Decimal::ZERO {
            return Err(BookError::InsufficientDepth {
                requested: Size::new(size),
                available: Size::new(size - remaining),
            });
        }
        Ok(Price::new(notional / size))
    }
}

impl Book for LadderBook {
    fn vwap(&self, signed_size: Decimal) -> Result<Price, BookError> {
        if signed_size.is_zero() {
            return self.best_ask().ok_or(BookError::EmptySide);
        }
        if signed_size > Decimal::ZERO {
            Self::walk(self.asks.iter(), signed_size)
        } else {
            Self::walk(self.bids.iter().rev(), signed_size.abs())
        }
    }

    fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lvl(px: Decimal, sz: Decimal) -> (Price, Size) {
        (Price::new(px), Size::new(sz))
    }

    fn book() -> LadderBook {
        let mut book = LadderBook::new();
        book.replace(
            &[lvl(dec!(99), dec!(4)), lvl(dec!(98), dec!(6)), lvl(dec!(97), dec!(10))],
            &[lvl(dec!(101), dec!(4)), lvl(dec!(102), dec!(6)), lvl(dec!(103), dec!(10))],
        )
        .unwrap();
        book
    }

    #[test]
    fn test_top_of_book() {
        let book = book();
        assert_eq!(book.best_bid(), Some(Price::new(dec!(99))));
        assert_eq!(book.best_ask(), Some(Price::new(dec!(101))));
        assert_eq!(book.best_ask_level(), Some(lvl(dec!(101), dec!(4))));
    }

    #[test]
    fn test_vwap_walks_levels() {
        let book = book();
        // 4 @ 101 + 6 @ 102
        assert_eq!(book.vwap(dec!(10)).unwrap(), Price::new(dec!(101.6)));
        // 4 @ 99 + 6 @ 98
        assert_eq!(book.vwap(dec!(-10)).unwrap(), Price::new(dec!(98.4)));
        assert_eq!(book.vwap(dec!(2)).unwrap(), Price::new(dec!(101)));
    }

    #[test]
    fn test_vwap_insufficient_depth() {
        let book = book();
        assert_eq!(
            book.vwap(dec!(25)),
            Err(BookError::InsufficientDepth {
                requested: Size::new(dec!(25)),
                available: Size::new(dec!(20)),
            })
        );
    }

    #[test]
    fn test_vwap_empty_side() {
        let mut book = LadderBook::new();
        book.replace(&[lvl(dec!(99), dec!(1))], &[]).unwrap();
        assert_eq!(book.vwap(dec!(1)), Err(BookError::EmptySide));
        assert!(!book.is_two_sided());
    }

    #[test]
    fn test_invalid_snapshot_keeps_book() {
        let mut book = book();
        let err = book
            .replace(&[lvl(dec!(0), dec!(1))], &[lvl(dec!(101), dec!(1))])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPrice(_)));
        assert_eq!(book.best_bid(), Some(Price::new(dec!(99))));

        assert!(book
            .replace(&[lvl(dec!(99), dec!(-1))], &[])
            .is_err());
    }

    #[test]
    fn test_zero_size_levels_dropped() {
        let mut book = LadderBook::new();
        book.replace(
            &[lvl(dec!(99), dec!(0)), lvl(dec!(98), dec!(1))],
            &[lvl(dec!(101), dec!(1))],
        )
        .unwrap();
        assert_eq!(book.best_bid(), Some(Price::new(dec!(98))));
    }
}
