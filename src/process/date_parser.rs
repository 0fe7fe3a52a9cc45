use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::table::DataType;

/// Order timestamps look like `"12/30/2019 00:01"`.
pub const ORDER_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Parse `"MM/DD/YYYY HH:MM"` and truncate to the calendar date.
pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s.trim(), ORDER_DATE_FORMAT)
        .ok()
        .map(|dt| dt.date())
}

/// Unguarded date cast: null stays null, anything unparsable is an error.
pub fn cast_order_date(column: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| parse_order_date(s).ok_or_else(|| Error::cast(column, s, DataType::Date)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_date() {
        assert_eq!(
            parse_order_date("12/30/2019 00:01"),
            NaiveDate::from_ymd_opt(2019, 12, 30)
        );
        assert_eq!(
            parse_order_date("04/19/2019 23:59"),
            NaiveDate::from_ymd_opt(2019, 4, 19)
        );
    }

    #[test]
    fn rejects_other_layouts() {
        for raw in ["2019-12-30 00:01", "13/01/2019 00:00", "12/30/2019", "Order Date"] {
            assert_eq!(parse_order_date(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn cast_reports_the_column() {
        assert!(cast_order_date("Order Date", None).unwrap().is_none());
        let err = cast_order_date("Order Date", Some("yesterday")).unwrap_err();
        assert!(err.to_string().contains("Order Date"));
    }
}
