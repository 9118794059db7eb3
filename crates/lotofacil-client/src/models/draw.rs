use chrono::NaiveDate;
use console::style;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Numbers drawn per Lotofácil draw
pub const DRAWN_COUNT: usize = 15;
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 25;

/// Date format published by the operator
const OPERATOR_DATE_FORMAT: &str = "%d/%m/%Y";
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of `resultados`. Rows are append-only: inserted once, never updated.
#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::models::schema::resultados)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Draw {
    #[diesel(column_name = concurso)]
    #[serde(rename = "concurso")]
    pub draw_number: i64,
    #[diesel(column_name = data)]
    #[serde(rename = "data")]
    pub draw_date: NaiveDate,
    /// Space-separated two-digit values, operator order
    #[diesel(column_name = dezenas)]
    #[serde(rename = "dezenas")]
    pub numbers: String,
}

impl Draw {
    /// Normalize an operator payload: `DD/MM/YYYY` date and the drawn numbers
    /// as published.
    pub fn new(draw_number: i64, date_str: &str, numbers: &[u8]) -> Result<Self, DrawError> {
        let draw_date = NaiveDate::parse_from_str(date_str.trim(), OPERATOR_DATE_FORMAT)
            .map_err(|_| DrawError::InvalidDateFormat(date_str.to_owned()))?;

        Self::with_date(draw_number, draw_date, numbers)
    }

    pub fn with_date(
        draw_number: i64,
        draw_date: NaiveDate,
        numbers: &[u8],
    ) -> Result<Self, DrawError> {
        let draw = Self {
            draw_number,
            draw_date,
            numbers: encode_numbers(numbers),
        };

        draw.check()?;
        Ok(draw)
    }

    /// Validate draw number and drawn numbers
    pub fn check(&self) -> Result<(), DrawError> {
        if self.draw_number <= 0 {
            return Err(DrawError::InvalidDrawNumber(self.draw_number));
        }

        let numbers = self.number_list()?;
        if numbers.len() != DRAWN_COUNT {
            return Err(DrawError::InvalidNumberCount(numbers.len()));
        }

        for &n in &numbers {
            if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
                return Err(DrawError::NumberOutOfRange(u64::from(n)));
            }
        }

        let mut sorted = numbers;
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(DrawError::DuplicateNumber(pair[0]));
        }

        Ok(())
    }

    /// Drawn numbers decoded from the stored encoding
    pub fn number_list(&self) -> Result<Vec<u8>, DrawError> {
        self.numbers
            .split_whitespace()
            .map(|s| {
                s.parse::<u8>()
                    .map_err(|_| DrawError::InvalidNumber(s.to_owned()))
            })
            .collect()
    }

    /// `YYYY-MM-DD`, the stored form of the date
    pub fn formatted_date(&self) -> String {
        self.draw_date.format(STORED_DATE_FORMAT).to_string()
    }
}

fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("Draw number must be positive, got {0}")]
    InvalidDrawNumber(i64),
    #[error("Invalid draw date '{0}', expected DD/MM/YYYY")]
    InvalidDateFormat(String),
    #[error("Invalid count of drawn numbers: expected 15, got {0}")]
    InvalidNumberCount(usize),
    #[error("Number {0} is out of range (1-25)")]
    NumberOutOfRange(u64),
    #[error("Number {0} drawn twice")]
    DuplicateNumber(u8),
    #[error("Invalid drawn number '{0}'")]
    InvalidNumber(String),
}

impl Display for Draw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            style(format!("{} {}", self.draw_number, self.formatted_date()))
                .green()
                .bold(),
            style(&self.numbers).magenta().bold()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const NUMBERS: [u8; 15] = [2, 3, 5, 6, 9, 10, 11, 13, 14, 16, 18, 20, 23, 24, 25];

    #[test]
    fn operator_date_is_stored_as_iso() -> Result<(), DrawError> {
        let draw = Draw::new(3555, "05/12/2025", &NUMBERS)?;

        assert_eq!(draw.formatted_date(), "2025-12-05");
        assert_eq!(
            draw.draw_date,
            NaiveDate::from_ymd_opt(2025, 12, 5).expect("valid date")
        );
        Ok(())
    }

    #[test]
    fn numbers_are_zero_padded_in_operator_order() -> Result<(), DrawError> {
        let mut numbers = NUMBERS;
        numbers.reverse();
        let draw = Draw::new(1, "29/09/2003", &numbers)?;

        assert_eq!(draw.numbers, "25 24 23 20 18 16 14 13 11 10 09 06 05 03 02");
        assert_eq!(draw.number_list()?, numbers.to_vec());
        Ok(())
    }

    #[test]
    fn iso_input_date_is_rejected() {
        let draw = Draw::new(1, "2025-12-05", &NUMBERS);
        assert!(matches!(draw, Err(DrawError::InvalidDateFormat(_))));
    }

    #[test]
    fn impossible_date_is_rejected() {
        let draw = Draw::new(1, "31/02/2025", &NUMBERS);
        assert!(matches!(draw, Err(DrawError::InvalidDateFormat(_))));
    }

    #[test]
    fn draw_number_must_be_positive() {
        assert_eq!(
            Draw::new(0, "05/12/2025", &NUMBERS),
            Err(DrawError::InvalidDrawNumber(0))
        );
    }

    #[test]
    fn wrong_count_range_and_duplicates_are_rejected() {
        assert_eq!(
            Draw::new(1, "05/12/2025", &NUMBERS[..14]),
            Err(DrawError::InvalidNumberCount(14))
        );

        let mut out_of_range = NUMBERS;
        out_of_range[0] = 26;
        assert_eq!(
            Draw::new(1, "05/12/2025", &out_of_range),
            Err(DrawError::NumberOutOfRange(26))
        );

        let mut duplicated = NUMBERS;
        duplicated[1] = duplicated[0];
        assert_eq!(
            Draw::new(1, "05/12/2025", &duplicated),
            Err(DrawError::DuplicateNumber(2))
        );
    }

    #[test]
    fn serializes_with_table_column_names() -> anyhow::Result<()> {
        let draw = Draw::new(10, "05/12/2025", &NUMBERS)?;
        let value = serde_json::to_value(&draw)?;

        assert_eq!(value["concurso"], 10);
        assert_eq!(value["data"], "2025-12-05");
        assert_eq!(value["dezenas"], draw.numbers);
        Ok(())
    }
}
