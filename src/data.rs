use chrono::NaiveDate;
use serde::Serialize;
use std::{collections::HashMap, fmt};
use thiserror::Error;

/// Number of leading metadata columns (province, country, lat, long) before the
/// per-date columns start.
pub const DATE_COLUMNS_START: usize = 4;

pub const COUNTRY_COLUMN: &str = "Country/Region";

/// Source header dates look like `1/22/20`.
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%y";

/// Which of the three datasets a value comes from, and therefore which counter it
/// lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Confirmed,
    Deaths,
    Recovered,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Confirmed, Kind::Deaths, Kind::Recovered];
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Confirmed => "confirmed",
            Kind::Deaths => "deaths",
            Kind::Recovered => "recovered",
        })
    }
}

/// The three counters kept for every (date, country) pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Counters {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl Counters {
    pub fn slot_mut(&mut self, kind: Kind) -> &mut u64 {
        match kind {
            Kind::Confirmed => &mut self.confirmed,
            Kind::Deaths => &mut self.deaths,
            Kind::Recovered => &mut self.recovered,
        }
    }
}

/// Accumulator key. A plain struct rather than a `date_country` string, so a
/// country name containing `_` can't collide with anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Key<'a> {
    pub date: NaiveDate,
    pub country: &'a str,
}

/// One line of the merged output file. The header is derived from the field names.
#[derive(Debug, Serialize)]
pub(crate) struct OutputRow<'a> {
    pub isodate: NaiveDate,
    pub country: &'a str,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

pub(crate) const OUTPUT_HEADER: [&str; 5] =
    ["isodate", "country", "confirmed", "deaths", "recovered"];

impl<'a> From<(Key<'a>, &Counters)> for OutputRow<'a> {
    fn from((key, counters): (Key<'a>, &Counters)) -> Self {
        Self {
            isodate: key.date,
            country: key.country,
            confirmed: counters.confirmed,
            deaths: counters.deaths,
            recovered: counters.recovered,
        }
    }
}

/// Ordered mapping from the raw header strings (`1/22/20`) to real dates, in header
/// order. Built once from the seed dataset and shared by all three passes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct DateMap {
    columns: Vec<(String, NaiveDate)>,
    index: HashMap<String, usize>,
}

impl DateMap {
    pub fn parse<S: AsRef<str>>(raw_columns: &[S]) -> Result<Self, Error> {
        let mut map = DateMap::default();
        for raw in raw_columns {
            let raw = raw.as_ref();
            let date = NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT)
                .map_err(|_| Error::BadDate(raw.to_owned()))?;
            if map.index.insert(raw.to_owned(), map.columns.len()).is_some() {
                return Err(Error::DuplicateDate(raw.to_owned()));
            }
            map.columns.push((raw.to_owned(), date));
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, raw: &str) -> Option<usize> {
        self.index.get(raw).copied()
    }

    pub fn date(&self, position: usize) -> NaiveDate {
        self.columns[position].1
    }

    pub fn raw_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(raw, _)| raw.as_str())
    }
}

/// Everything that can go wrong during a run. None of it is recoverable: the first
/// error aborts the merge and nothing gets written.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Fetching {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("Header column {0:?} is not a M/D/YY date")]
    BadDate(String),
    #[error("Header date column {0:?} appears twice")]
    DuplicateDate(String),
    #[error("Header has fewer than 4 metadata columns")]
    ShortHeader,
    #[error("Header has no \"Country/Region\" column")]
    MissingCountryColumn,
    #[error("Row at line {line} of the {kind} dataset has no region")]
    MissingRegion { kind: Kind, line: u64 },
    #[error("Row at line {line} of the {kind} dataset has {found} cells, expected {expected}")]
    RowLength {
        kind: Kind,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Date columns of the {0} dataset differ from the seed dataset")]
    HeaderMismatch(Kind),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("Value {value:?} for {country} on {date} in the {kind} dataset is not a count")]
    BadValue {
        kind: Kind,
        country: String,
        date: String,
        value: String,
    },
    #[error("Counter overflow for {country} on {date} in the {kind} dataset")]
    Overflow {
        kind: Kind,
        country: String,
        date: String,
    },
    #[error("Date {0:?} is not part of the skeleton")]
    UnknownDate(String),
    #[error("Country {country:?} on {date} is not part of the skeleton")]
    UnknownCountry { date: NaiveDate, country: String },
    #[error("No dataset to merge")]
    NoSources,
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}
