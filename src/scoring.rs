//! Points calculation.
//!
//! Every rule is computed independently and the results are summed. The
//! scorer assumes its input already passed [`crate::validation`]; a field that
//! fails to parse here simply contributes nothing to its rule.

use crate::model::{Item, Receipt};
use crate::validation::{parse_purchase_date, parse_purchase_time};
use chrono::{Datelike, NaiveTime, Timelike};
use serde::Serialize;

pub const ROUND_DOLLAR_BONUS: i64 = 50;
pub const QUARTER_MULTIPLE_BONUS: i64 = 25;
pub const ITEM_PAIR_BONUS: i64 = 5;
pub const ODD_DAY_BONUS: i64 = 6;
pub const AFTERNOON_BONUS: i64 = 10;

const DESCRIPTION_PRICE_MULTIPLIER: f64 = 0.2;
const AFTERNOON_START_MINUTES: u32 = 14 * 60;
const AFTERNOON_END_MINUTES: u32 = 16 * 60;

/// Per-rule contributions to a receipt's points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointsBreakdown {
    pub retailer_name: i64,
    pub round_dollar_total: i64,
    pub quarter_multiple_total: i64,
    pub item_pairs: i64,
    pub item_descriptions: i64,
    pub odd_purchase_day: i64,
    pub afternoon_purchase: i64,
}

impl PointsBreakdown {
    pub fn total(&self) -> i64 {
        self.retailer_name
            + self.round_dollar_total
            + self.quarter_multiple_total
            + self.item_pairs
            + self.item_descriptions
            + self.odd_purchase_day
            + self.afternoon_purchase
    }
}

/// Computes the points awarded for a validated receipt.
pub fn score(receipt: &Receipt) -> i64 {
    breakdown(receipt).total()
}

/// Computes each rule's contribution separately.
pub fn breakdown(receipt: &Receipt) -> PointsBreakdown {
    let cents = total_cents_remainder(&receipt.total);

    PointsBreakdown {
        retailer_name: retailer_points(&receipt.retailer),
        round_dollar_total: match cents {
            Some(0) => ROUND_DOLLAR_BONUS,
            _ => 0,
        },
        quarter_multiple_total: match cents {
            Some(c) if c % 25 == 0 => QUARTER_MULTIPLE_BONUS,
            _ => 0,
        },
        item_pairs: (receipt.items.len() / 2) as i64 * ITEM_PAIR_BONUS,
        item_descriptions: receipt.items.iter().map(description_points).sum(),
        odd_purchase_day: match parse_purchase_date(&receipt.purchase_date) {
            Ok(date) if date.day() % 2 == 1 => ODD_DAY_BONUS,
            _ => 0,
        },
        afternoon_purchase: match parse_purchase_time(&receipt.purchase_time) {
            Ok(time) if is_afternoon(time) => AFTERNOON_BONUS,
            _ => 0,
        },
    }
}

/// One point per ASCII letter or digit.
pub fn retailer_points(retailer: &str) -> i64 {
    retailer.chars().filter(char::is_ascii_alphanumeric).count() as i64
}

/// `ceil(price * 0.2)` when the trimmed description length is a multiple of
/// three, otherwise zero. An unparseable price contributes zero.
pub fn description_points(item: &Item) -> i64 {
    if item.short_description.trim().len() % 3 != 0 {
        return 0;
    }

    match item.price.parse::<f64>() {
        Ok(price) => (price * DESCRIPTION_PRICE_MULTIPLIER).ceil() as i64,
        Err(_) => 0,
    }
}

/// Cents of the total modulo 100.
///
/// Divisibility of the whole cent amount by 25 or 100 depends only on its
/// last two digits, so totals of any length are handled without overflow.
fn total_cents_remainder(total: &str) -> Option<u32> {
    let (dollars, cents) = total.split_once('.')?;
    if dollars.is_empty()
        || !dollars.bytes().all(|b| b.is_ascii_digit())
        || cents.len() != 2
        || !cents.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    cents.parse().ok()
}

/// Strictly after 14:00 and strictly before 16:00.
fn is_afternoon(time: NaiveTime) -> bool {
    let minutes = time.hour() * 60 + time.minute();
    minutes > AFTERNOON_START_MINUTES && minutes < AFTERNOON_END_MINUTES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(total: &str, date: &str, time: &str, items: Vec<Item>) -> Receipt {
        Receipt {
            retailer: "Target".to_string(),
            purchase_date: date.to_string(),
            purchase_time: time.to_string(),
            items,
            total: total.to_string(),
        }
    }

    fn single_item() -> Vec<Item> {
        vec![Item::new("Mountain Dew 12PK", "6.49")]
    }

    #[test]
    fn single_item_target_receipt() {
        let r = receipt("35.35", "2022-01-01", "13:01", single_item());
        let b = breakdown(&r);
        assert_eq!(b.retailer_name, 6);
        assert_eq!(b.odd_purchase_day, 6);
        assert_eq!(b.round_dollar_total + b.quarter_multiple_total, 0);
        assert_eq!(b.item_pairs, 0);
        assert_eq!(b.item_descriptions, 0);
        assert_eq!(b.afternoon_purchase, 0);
        assert_eq!(score(&r), 12);
    }

    #[test]
    fn five_item_target_receipt() {
        let r = receipt(
            "35.35",
            "2022-01-01",
            "13:01",
            vec![
                Item::new("Mountain Dew 12PK", "6.49"),
                Item::new("Emils Cheese Pizza", "12.25"),
                Item::new("Knorr Creamy Chicken", "1.26"),
                Item::new("Doritos Nacho Cheese", "3.35"),
                Item::new("   Klarbrunn 12-PK 12 FL OZ  ", "12.00"),
            ],
        );
        // 6 retailer + 10 for two pairs + 3 + 3 descriptions + 6 odd day
        assert_eq!(score(&r), 28);
    }

    #[test]
    fn corner_market_receipt() {
        let mut r = receipt(
            "9.00",
            "2022-03-20",
            "14:33",
            vec![Item::new("Gatorade", "2.25"); 4],
        );
        r.retailer = "M&M Corner Market".to_string();
        // 14 retailer + 50 + 25 + 10 for two pairs + 10 afternoon
        assert_eq!(score(&r), 109);
    }

    #[test]
    fn total_bonuses() {
        let cases = [
            ("100.00", 50, 25),
            ("50.25", 0, 25),
            ("50.50", 0, 25),
            ("0.75", 0, 25),
            ("50.10", 0, 0),
            ("99.99", 0, 0),
            ("123456789012345678901234567890123456789012.00", 50, 25),
        ];
        for (total, round, quarter) in cases {
            let b = breakdown(&receipt(total, "2022-01-02", "10:00", single_item()));
            assert_eq!(b.round_dollar_total, round, "{total}");
            assert_eq!(b.quarter_multiple_total, quarter, "{total}");
        }
    }

    #[test]
    fn item_pairs() {
        for (count, expected) in [(1, 0), (2, 5), (3, 5), (4, 10), (7, 15)] {
            let items = vec![Item::new("Gatorade", "2.25"); count];
            let b = breakdown(&receipt("1.01", "2022-01-02", "10:00", items));
            assert_eq!(b.item_pairs, expected, "{count} items");
        }
    }

    #[test]
    fn description_length_multiple_of_three() {
        for desc in ["abc", "abcdef", "abcdefghi", "  abc  ", "a b"] {
            assert_eq!(description_points(&Item::new(desc, "10.00")), 2, "{desc:?}");
        }
        for desc in ["abcd", "abcde", "abcdefg"] {
            assert_eq!(description_points(&Item::new(desc, "10.00")), 0, "{desc:?}");
        }
    }

    #[test]
    fn description_points_round_up() {
        assert_eq!(description_points(&Item::new("Emils Cheese Pizza", "12.25")), 3);
        assert_eq!(description_points(&Item::new("abc", "0.01")), 1);
        assert_eq!(description_points(&Item::new("abc", "0.00")), 0);
        assert_eq!(description_points(&Item::new("abc", "5.00")), 1);
    }

    #[test]
    fn unparseable_price_contributes_nothing() {
        assert_eq!(description_points(&Item::new("abc", "free")), 0);
    }

    #[test]
    fn odd_day_bonus() {
        for (date, expected) in [("2022-01-01", 6), ("2022-01-31", 6), ("2022-01-02", 0), ("2022-02-28", 0)] {
            let b = breakdown(&receipt("1.01", date, "10:00", single_item()));
            assert_eq!(b.odd_purchase_day, expected, "{date}");
        }
    }

    #[test]
    fn afternoon_window_is_exclusive() {
        for (time, expected) in [
            ("14:00", 0),
            ("14:01", 10),
            ("15:00", 10),
            ("15:59", 10),
            ("16:00", 0),
            ("13:59", 0),
            ("2:30", 0),
        ] {
            let b = breakdown(&receipt("1.01", "2022-01-02", time, single_item()));
            assert_eq!(b.afternoon_purchase, expected, "{time}");
        }
    }

    #[test]
    fn retailer_counts_ascii_alphanumerics_only() {
        assert_eq!(retailer_points("M&M Corner Market"), 14);
        assert_eq!(retailer_points("  - & _ "), 0);
        assert_eq!(retailer_points("Café 24"), 5);
    }

    #[test]
    fn malformed_fields_contribute_nothing() {
        let r = receipt("12", "yesterday", "noon", vec![]);
        let b = breakdown(&r);
        assert_eq!(b.total(), b.retailer_name);
    }
}
