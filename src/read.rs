use crate::data::{DateMap, Error, Kind, COUNTRY_COLUMN, DATE_COLUMNS_START};
use std::collections::BTreeSet;

/// Trait for doing something with a single per-date cell read from one of the time
/// series CSV files. Used by the `Accumulator` to add values into its counters,
/// but also used for mock tests to check we read the right cells.
pub(crate) trait CellUser {
    fn use_cell(&mut self, kind: Kind, date: &str, country: &str, value: u64)
        -> Result<(), Error>;
}

/// What we need to know from a header row: where the region name lives, and the
/// raw date columns in order.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub country: usize,
    pub dates: Vec<String>,
}

fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    // flexible: a row of the wrong length is reported as `RowLength`, not as a generic CSV error
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn read_header<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> Result<Header, Error> {
    let headers = rdr.headers()?;
    if headers.len() < DATE_COLUMNS_START {
        return Err(Error::ShortHeader);
    }
    let country = headers
        .iter()
        .take(DATE_COLUMNS_START)
        .position(|h| h == COUNTRY_COLUMN)
        .ok_or(Error::MissingCountryColumn)?;
    Ok(Header {
        country,
        dates: headers
            .iter()
            .skip(DATE_COLUMNS_START)
            .map(str::to_owned)
            .collect(),
    })
}

/// Region name of a data row. The row must have exactly one cell per header column,
/// otherwise the layout is off and its values can't be trusted.
fn region<'r>(
    record: &'r csv::StringRecord,
    header: &Header,
    kind: Kind,
) -> Result<&'r str, Error> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let country = record
        .get(header.country)
        .ok_or(Error::MissingRegion { kind, line })?;
    let expected = DATE_COLUMNS_START + header.dates.len();
    if record.len() != expected {
        return Err(Error::RowLength {
            kind,
            line,
            expected,
            found: record.len(),
        });
    }
    Ok(country)
}

/// First pass over the seed dataset: raw date columns and every distinct region.
/// The `BTreeSet` gives us the ordinal sort for free.
pub(crate) fn read_seed<R: std::io::Read>(
    reader: R,
    kind: Kind,
) -> Result<(Vec<String>, BTreeSet<String>), Error> {
    let mut rdr = csv_reader(reader);
    let header = read_header(&mut rdr)?;
    let mut countries = BTreeSet::new();
    for result in rdr.records() {
        let record = result?;
        let country = region(&record, &header, kind)?;
        if !countries.contains(country) {
            countries.insert(country.to_owned());
        }
    }
    Ok((header.dates, countries))
}

/// Streams one dataset and hands every cell to `user`. The date columns must be
/// exactly the seed's, otherwise the datasets have drifted apart and we bail out
/// before touching anything.
pub(crate) fn read_dataset<R: std::io::Read, U: CellUser>(
    reader: R,
    kind: Kind,
    dates: &DateMap,
    user: &mut U,
) -> Result<(), Error> {
    let mut rdr = csv_reader(reader);
    let header = read_header(&mut rdr)?;
    if !header.dates.iter().map(String::as_str).eq(dates.raw_columns()) {
        return Err(Error::HeaderMismatch(kind));
    }
    let mut rows = 0usize;
    for result in rdr.records() {
        let record = result?;
        let country = region(&record, &header, kind)?;
        for (i, date) in header.dates.iter().enumerate() {
            let cell = &record[DATE_COLUMNS_START + i];
            let value = cell.parse::<u64>().map_err(|_| Error::BadValue {
                kind,
                country: country.to_owned(),
                date: date.clone(),
                value: cell.to_owned(),
            })?;
            user.use_cell(kind, date, country, value)?;
        }
        rows += 1;
    }
    tracing::debug!(%kind, rows, "dataset read");
    Ok(())
}
