//! Position — per-feed signed size and average entry price.
//!
//! Mutated only by fills. A fill that crosses zero closes the existing
//! position and reopens the remainder at the fill price.

use serde::{Deserialize, Serialize};

use super::order::Side;

/// Sizes closer to zero than this are treated as flat.
pub const SIZE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Positive for long, negative for short.
    pub size: f64,
    /// Average entry price; 0 while flat.
    pub price: f64,
    /// Bar at which the current position was opened.
    pub opened_bar: usize,
    /// Entry commission not yet attributed to a closed trade.
    pub entry_commission: f64,
}

/// What a single fill did to a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    /// Signed size of new exposure opened by the fill.
    pub opened: f64,
    /// Unsigned size of existing exposure closed by the fill.
    pub closed: f64,
    /// Direction of the exposure that was closed.
    pub direction: Side,
    pub entry_price: f64,
    pub entry_bar: usize,
    /// Entry commission attributed to the closed part.
    pub entry_commission: f64,
    /// Share of this fill's commission attributed to the closed part.
    pub exit_commission: f64,
    /// The previous position was closed in full.
    pub full_close: bool,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.size.abs() <= SIZE_EPSILON
    }

    pub fn is_long(&self) -> bool {
        self.size > SIZE_EPSILON
    }

    pub fn is_short(&self) -> bool {
        self.size < -SIZE_EPSILON
    }

    pub fn market_value(&self, price: f64, mult: f64) -> f64 {
        self.size * price * mult
    }

    pub fn unrealized_pnl(&self, price: f64, mult: f64) -> f64 {
        self.size * (price - self.price) * mult
    }

    /// Apply a fill of `signed_size` at `price`.
    ///
    /// Adding uses `new_avg = (old_avg·|old| + price·|q|) / |old + q|`.
    pub fn update(&mut self, signed_size: f64, price: f64, commission: f64, bar: usize) -> PositionUpdate {
        let old = self.size;
        let qty = signed_size.abs();
        let mut update = PositionUpdate {
            opened: 0.0,
            closed: 0.0,
            direction: if old >= 0.0 { Side::Buy } else { Side::Sell },
            entry_price: self.price,
            entry_bar: self.opened_bar,
            entry_commission: 0.0,
            exit_commission: 0.0,
            full_close: false,
        };
        if qty <= SIZE_EPSILON {
            return update;
        }

        if self.is_flat() {
            self.size = signed_size;
            self.price = price;
            self.opened_bar = bar;
            self.entry_commission = commission;
            update.opened = signed_size;
            return update;
        }

        if old.signum() == signed_size.signum() {
            let new = old + signed_size;
            self.price = (self.price * old.abs() + price * qty) / new.abs();
            self.size = new;
            self.entry_commission += commission;
            update.opened = signed_size;
            return update;
        }

        // Reducing, closing or flipping.
        let held = old.abs();
        let closing = qty.min(held);
        let entry_share = self.entry_commission * closing / held;
        update.closed = closing;
        update.entry_commission = entry_share;
        update.exit_commission = commission * closing / qty;

        let remainder = qty - held;
        if remainder > SIZE_EPSILON {
            // Flip: the old position closes in full, the rest opens fresh.
            update.full_close = true;
            self.size = signed_size.signum() * remainder;
            self.price = price;
            self.opened_bar = bar;
            self.entry_commission = commission * remainder / qty;
            update.opened = self.size;
        } else if remainder >= -SIZE_EPSILON {
            update.full_close = true;
            *self = Position::default();
        } else {
            self.size = old + signed_size;
            self.entry_commission -= entry_share;
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_from_flat() {
        let mut pos = Position::default();
        let upd = pos.update(10.0, 100.0, 1.0, 3);
        assert_eq!(pos.size, 10.0);
        assert_eq!(pos.price, 100.0);
        assert_eq!(pos.opened_bar, 3);
        assert_eq!(upd.opened, 10.0);
        assert_eq!(upd.closed, 0.0);
    }

    #[test]
    fn adding_averages_price() {
        let mut pos = Position::default();
        pos.update(10.0, 100.0, 0.0, 0);
        pos.update(30.0, 120.0, 0.0, 1);
        // (100*10 + 120*30) / 40 = 115
        assert_eq!(pos.size, 40.0);
        assert!((pos.price - 115.0).abs() < 1e-12);
    }

    #[test]
    fn adding_to_short_averages_price() {
        let mut pos = Position::default();
        pos.update(-10.0, 50.0, 0.0, 0);
        pos.update(-10.0, 40.0, 0.0, 1);
        assert_eq!(pos.size, -20.0);
        assert!((pos.price - 45.0).abs() < 1e-12);
    }

    #[test]
    fn partial_close_keeps_price() {
        let mut pos = Position::default();
        pos.update(10.0, 100.0, 2.0, 0);
        let upd = pos.update(-4.0, 110.0, 0.4, 5);
        assert_eq!(pos.size, 6.0);
        assert_eq!(pos.price, 100.0);
        assert_eq!(upd.closed, 4.0);
        assert!(!upd.full_close);
        assert!((upd.entry_commission - 0.8).abs() < 1e-12);
        assert!((pos.entry_commission - 1.2).abs() < 1e-12);
        assert_eq!(upd.entry_bar, 0);
    }

    #[test]
    fn full_close_goes_flat() {
        let mut pos = Position::default();
        pos.update(10.0, 100.0, 0.0, 0);
        let upd = pos.update(-10.0, 90.0, 0.0, 2);
        assert!(pos.is_flat());
        assert_eq!(pos.price, 0.0);
        assert!(upd.full_close);
        assert_eq!(upd.direction, Side::Buy);
        assert_eq!(upd.entry_price, 100.0);
    }

    #[test]
    fn sign_flip_reopens_remainder_at_fill_price() {
        let mut pos = Position::default();
        pos.update(10.0, 100.0, 0.0, 0);
        let upd = pos.update(-15.0, 105.0, 3.0, 4);
        assert_eq!(upd.closed, 10.0);
        assert!(upd.full_close);
        assert_eq!(upd.opened, -5.0);
        assert_eq!(pos.size, -5.0);
        assert_eq!(pos.price, 105.0);
        assert_eq!(pos.opened_bar, 4);
        assert!((upd.exit_commission - 2.0).abs() < 1e-12);
        assert!((pos.entry_commission - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fractional_close_within_epsilon_is_flat() {
        let mut pos = Position::default();
        pos.update(0.1, 10.0, 0.0, 0);
        pos.update(0.2, 10.0, 0.0, 1);
        pos.update(-0.3, 10.0, 0.0, 2);
        assert!(pos.is_flat());
    }

    #[test]
    fn unrealized_pnl_signs() {
        let mut pos = Position::default();
        pos.update(-2.0, 50.0, 0.0, 0);
        assert_eq!(pos.unrealized_pnl(40.0, 1.0), 20.0);
        assert_eq!(pos.market_value(40.0, 1.0), -80.0);
    }
}
