//! Trigger checking — does a bar trigger a given order?
//!
//! Evaluates whether an order's trigger condition is met within a bar's
//! OHLC range and computes the raw fill price before slippage/commission.
//! Any NaN price on the bar means no trigger.

use serde::{Deserialize, Serialize};

use crate::domain::{BarPrices, ExecType, Order, Side};

/// Fill price when a stop gaps through its trigger at the open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fill at the open price (worse than the trigger price).
    #[default]
    FillAtOpen,
    /// Fill at the trigger level (optimistic).
    FillAtTrigger,
    /// Fill at the worst of open and trigger.
    FillAtWorst,
}

/// Result of checking whether an order triggers on a bar.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResult {
    /// Order does not trigger on this bar.
    NoTrigger,
    /// Order triggers and fills at the computed price.
    Fill { fill_price: f64, gap_through: bool },
    /// StopLimit: the stop traded but the limit was not reached on this bar.
    Armed,
}

/// Check whether an order triggers on a given bar and compute its raw fill price.
///
/// Does NOT apply slippage or commission; the cost model does.
/// Does NOT check `created_bar`: the broker never offers an order the bar
/// that created it.
pub fn check_trigger(order: &Order, bar: &BarPrices, gap_policy: GapPolicy) -> TriggerResult {
    if bar.is_void() {
        return TriggerResult::NoTrigger;
    }

    match order.exec {
        ExecType::Market => TriggerResult::Fill {
            fill_price: bar.open,
            gap_through: false,
        },
        ExecType::Close => TriggerResult::Fill {
            fill_price: bar.close,
            gap_through: false,
        },
        ExecType::Limit => match order.price {
            Some(limit) => check_limit(order.side, limit, bar),
            None => TriggerResult::NoTrigger,
        },
        ExecType::Stop => match order.price {
            Some(trigger) => check_stop(order.side, trigger, bar, gap_policy),
            None => TriggerResult::NoTrigger,
        },
        ExecType::StopLimit => match (order.price, order.limit_price) {
            (Some(trigger), Some(limit)) => {
                check_stop_limit(order.side, order.armed, trigger, limit, bar)
            }
            _ => TriggerResult::NoTrigger,
        },
    }
}

/// Check a stop order trigger.
///
/// Sell stop: triggers if bar.low <= trigger. Gap-through if open <= trigger.
/// Buy stop: triggers if bar.high >= trigger. Gap-through if open >= trigger.
fn check_stop(side: Side, trigger: f64, bar: &BarPrices, gap_policy: GapPolicy) -> TriggerResult {
    let (triggers, gap_through) = match side {
        Side::Sell => (bar.low <= trigger, bar.open <= trigger),
        Side::Buy => (bar.high >= trigger, bar.open >= trigger),
    };
    if !triggers {
        return TriggerResult::NoTrigger;
    }
    let fill_price = if gap_through {
        resolve_gap(side, bar.open, trigger, gap_policy)
    } else {
        trigger
    };
    TriggerResult::Fill {
        fill_price,
        gap_through,
    }
}

/// Check a limit order trigger.
///
/// Buy limit: triggers if bar.low <= limit. Fills at limit (or better at open if gap-through).
/// Sell limit: triggers if bar.high >= limit. Fills at limit (or better at open if gap-through).
fn check_limit(side: Side, limit: f64, bar: &BarPrices) -> TriggerResult {
    match side {
        Side::Buy => {
            if bar.low <= limit {
                let gap_through = bar.open <= limit;
                TriggerResult::Fill {
                    fill_price: if gap_through { bar.open } else { limit },
                    gap_through,
                }
            } else {
                TriggerResult::NoTrigger
            }
        }
        Side::Sell => {
            if bar.high >= limit {
                let gap_through = bar.open >= limit;
                TriggerResult::Fill {
                    fill_price: if gap_through { bar.open } else { limit },
                    gap_through,
                }
            } else {
                TriggerResult::NoTrigger
            }
        }
    }
}

/// Check a stop-limit order trigger.
///
/// Two-stage: the stop arms the order first, then the limit condition must
/// be met. Can arm and fill on the same bar if the range allows.
fn check_stop_limit(side: Side, armed: bool, trigger: f64, limit: f64, bar: &BarPrices) -> TriggerResult {
    if armed {
        return check_limit(side, limit, bar);
    }
    let triggers = match side {
        Side::Buy => bar.high >= trigger,
        Side::Sell => bar.low <= trigger,
    };
    if !triggers {
        return TriggerResult::NoTrigger;
    }
    match check_limit(side, limit, bar) {
        fill @ TriggerResult::Fill { .. } => fill,
        _ => TriggerResult::Armed,
    }
}

/// Resolve the gap-through fill price of a stop. Higher is worse for a
/// buyer, lower is worse for a seller.
fn resolve_gap(side: Side, open: f64, trigger: f64, policy: GapPolicy) -> f64 {
    match (policy, side) {
        (GapPolicy::FillAtOpen, _) => open,
        (GapPolicy::FillAtTrigger, _) => trigger,
        (GapPolicy::FillAtWorst, Side::Buy) => open.max(trigger),
        (GapPolicy::FillAtWorst, Side::Sell) => open.min(trigger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeedId, OrderId, OrderRequest};

    fn bar(open: f64, high: f64, low: f64, close: f64) -> BarPrices {
        BarPrices {
            open,
            high,
            low,
            close,
            volume: 10_000.0,
        }
    }

    fn order(request: OrderRequest) -> Order {
        Order::new(OrderId(1), request, 0)
    }

    fn fill(price: f64, gap: bool) -> TriggerResult {
        TriggerResult::Fill {
            fill_price: price,
            gap_through: gap,
        }
    }

    const FEED: FeedId = FeedId(0);

    // ── Market / Close ───────────────────────────────────────────────

    #[test]
    fn market_fills_at_open() {
        let o = order(OrderRequest::market(FEED, Side::Buy, 1.0));
        let b = bar(100.0, 105.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(100.0, false));
    }

    #[test]
    fn close_fills_at_close() {
        let o = order(OrderRequest::close(FEED, Side::Sell, 1.0));
        let b = bar(100.0, 105.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(103.0, false));
    }

    #[test]
    fn void_bar_never_triggers() {
        let o = order(OrderRequest::market(FEED, Side::Buy, 1.0));
        let b = bar(f64::NAN, 105.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), TriggerResult::NoTrigger);
    }

    // ── Stop ─────────────────────────────────────────────────────────

    #[test]
    fn sell_stop_triggers_when_low_reaches_trigger() {
        let o = order(OrderRequest::stop(FEED, Side::Sell, 1.0, 98.0));
        let b = bar(100.0, 105.0, 97.0, 99.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(98.0, false));
    }

    #[test]
    fn sell_stop_does_not_trigger_above() {
        let o = order(OrderRequest::stop(FEED, Side::Sell, 1.0, 95.0));
        let b = bar(100.0, 105.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), TriggerResult::NoTrigger);
    }

    #[test]
    fn sell_stop_gap_through_policies() {
        let o = order(OrderRequest::stop(FEED, Side::Sell, 1.0, 100.0));
        let b = bar(95.0, 97.0, 93.0, 96.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(95.0, true));
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtTrigger), fill(100.0, true));
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtWorst), fill(95.0, true));
    }

    #[test]
    fn buy_stop_triggers_when_high_reaches_trigger() {
        let o = order(OrderRequest::stop(FEED, Side::Buy, 1.0, 105.0));
        let b = bar(100.0, 106.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(105.0, false));
    }

    #[test]
    fn buy_stop_gap_through_fills_at_open() {
        let o = order(OrderRequest::stop(FEED, Side::Buy, 1.0, 100.0));
        let b = bar(105.0, 108.0, 103.0, 107.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(105.0, true));
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtWorst), fill(105.0, true));
    }

    // ── Limit ────────────────────────────────────────────────────────

    #[test]
    fn buy_limit_fills_at_limit_inside_range() {
        let o = order(OrderRequest::limit(FEED, Side::Buy, 1.0, 99.0));
        let b = bar(100.0, 101.0, 98.0, 100.5);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(99.0, false));
    }

    #[test]
    fn buy_limit_fills_at_better_open() {
        let o = order(OrderRequest::limit(FEED, Side::Buy, 1.0, 99.0));
        let b = bar(97.0, 98.0, 96.0, 97.5);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(97.0, true));
    }

    #[test]
    fn sell_limit_needs_high_at_limit() {
        let o = order(OrderRequest::limit(FEED, Side::Sell, 1.0, 110.0));
        let b = bar(100.0, 109.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), TriggerResult::NoTrigger);
        let b = bar(100.0, 111.0, 98.0, 103.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(110.0, false));
    }

    // ── StopLimit ────────────────────────────────────────────────────

    #[test]
    fn stop_limit_arms_without_fill() {
        // Buy stop 105, limit 104: high reaches the stop, low never comes back.
        let o = order(OrderRequest::stop_limit(FEED, Side::Buy, 1.0, 105.0, 104.0));
        let b = bar(104.5, 106.0, 104.5, 105.5);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), TriggerResult::Armed);
    }

    #[test]
    fn stop_limit_arms_and_fills_same_bar() {
        let o = order(OrderRequest::stop_limit(FEED, Side::Buy, 1.0, 105.0, 104.0));
        let b = bar(104.5, 106.0, 103.0, 105.5);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(104.0, false));
    }

    #[test]
    fn armed_stop_limit_behaves_as_limit() {
        let mut o = order(OrderRequest::stop_limit(FEED, Side::Sell, 1.0, 95.0, 96.0));
        o.armed = true;
        let b = bar(97.0, 98.0, 96.5, 97.0);
        assert_eq!(check_trigger(&o, &b, GapPolicy::FillAtOpen), fill(97.0, true));
    }
}
