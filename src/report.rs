use chrono::{Datelike, NaiveDate};

/// Request-type flag the portal expects for a transaction listing.
pub const MINISTATEMENT: &str = "ministatement";

/// Ministatement query for one roll number over a date range.
///
/// The default range runs from 2000 to 2050 so that every transaction
/// the portal holds is returned in a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub roll_num: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
#[error("Start date ({start}) cannot be after end date ({end})")]
pub struct DateRangeError {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportQuery {
    pub fn new(roll_num: impl Into<String>) -> Self {
        Self {
            roll_num: roll_num.into(),
            start: NaiveDate::from_ymd_opt(2000, 2, 3).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2050, 2, 3).unwrap_or_default(),
        }
    }

    pub fn with_range(
        mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, DateRangeError> {
        if let Some(start) = start {
            self.start = start;
        }
        if let Some(end) = end {
            self.end = end;
        }
        if self.start > self.end {
            return Err(DateRangeError {
                start: self.start,
                end: self.end,
            });
        }
        Ok(self)
    }

    /// Name of the file the report table is written to.
    pub fn output_file_name(&self) -> String {
        format!("userdata_{}.html", self.roll_num)
    }

    pub fn form_fields(&self, csrf_token: &str) -> Vec<(&'static str, String)> {
        vec![
            ("csrfmiddlewaretoken", csrf_token.to_string()),
            ("userid", self.roll_num.clone()),
            ("choice", MINISTATEMENT.to_string()),
            ("syear", self.start.year().to_string()),
            ("smon", self.start.month().to_string()),
            ("sday", self.start.day().to_string()),
            ("eyear", self.end.year().to_string()),
            ("emon", self.end.month().to_string()),
            ("eday", self.end.day().to_string()),
            ("submit", "Get Result".to_string()),
        ]
    }
}
