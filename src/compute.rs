use crate::{
    data::{Counters, DateMap, Error, Key, Kind},
    fetch::Fetch,
    read::{read_dataset, read_seed, CellUser},
};
use std::collections::BTreeSet;

/// This is where the merged counters are stored. The key space (every date × every
/// country) is fixed once by `skeleton` and never grows afterwards; aggregation can
/// only bump counters of keys that are already there.
///
/// Entries are kept date-major, country-minor in a flat `Vec`, so insertion order is
/// also storage order and the slot of a key is just `date * countries + country`.
#[derive(Debug)]
pub(crate) struct Accumulator {
    dates: DateMap,
    countries: Vec<String>,
    counters: Vec<Counters>,
}

impl Accumulator {
    pub fn skeleton(dates: DateMap, countries: BTreeSet<String>) -> Self {
        let countries: Vec<String> = countries.into_iter().collect();
        let counters = vec![Counters::default(); dates.len() * countries.len()];
        Self {
            dates,
            countries,
            counters,
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn dates(&self) -> &DateMap {
        &self.dates
    }

    fn slot(&self, date: &str, country: &str) -> Result<usize, Error> {
        let d = self
            .dates
            .position(date)
            .ok_or_else(|| Error::UnknownDate(date.to_owned()))?;
        // countries come out of a BTreeSet, so they are sorted
        let c = self
            .countries
            .binary_search_by(|probe| probe.as_str().cmp(country))
            .map_err(|_| Error::UnknownCountry {
                date: self.dates.date(d),
                country: country.to_owned(),
            })?;
        Ok(d * self.countries.len() + c)
    }

    #[cfg(test)]
    pub fn get(&self, key: Key<'_>) -> Option<&Counters> {
        self.entries()
            .find(|(k, _)| *k == key)
            .map(|(_, counters)| counters)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Key<'_>, &Counters)> + '_ {
        let width = self.countries.len();
        self.counters.iter().enumerate().map(move |(i, counters)| {
            let key = Key {
                date: self.dates.date(i / width),
                country: &self.countries[i % width],
            };
            (key, counters)
        })
    }
}

impl CellUser for Accumulator {
    fn use_cell(
        &mut self,
        kind: Kind,
        date: &str,
        country: &str,
        value: u64,
    ) -> Result<(), Error> {
        let slot = self.slot(date, country)?;
        let counter = self.counters[slot].slot_mut(kind);
        *counter = counter.checked_add(value).ok_or_else(|| Error::Overflow {
            kind,
            country: country.to_owned(),
            date: date.to_owned(),
        })?;
        Ok(())
    }
}

/// Builds the zero-filled accumulator out of the seed dataset: its header gives the
/// dates, its region column gives the countries.
pub(crate) fn build_skeleton<R: std::io::Read>(seed: R, kind: Kind) -> Result<Accumulator, Error> {
    let (raw_dates, countries) = read_seed(seed, kind)?;
    let dates = DateMap::parse(&raw_dates)?;
    let accumulator = Accumulator::skeleton(dates, countries);
    tracing::info!(
        dates = accumulator.dates.len(),
        countries = accumulator.countries.len(),
        entries = accumulator.len(),
        "skeleton built"
    );
    Ok(accumulator)
}

/// Fetches every source in turn and folds it into a fresh skeleton. The first source
/// is the seed: its body is fetched once and used for both the skeleton and the
/// first aggregation pass.
pub(crate) fn aggregate<F: Fetch, S: AsRef<str>>(
    fetcher: &F,
    sources: &[(Kind, S)],
) -> Result<Accumulator, Error> {
    let ((seed_kind, seed_url), rest) = sources.split_first().ok_or(Error::NoSources)?;
    let seed = fetcher.fetch(seed_url.as_ref())?;
    let mut accumulator = build_skeleton(&seed[..], *seed_kind)?;
    let dates = accumulator.dates().clone();
    read_dataset(&seed[..], *seed_kind, &dates, &mut accumulator)?;
    tracing::info!(kind = %seed_kind, "dataset applied");
    for (kind, url) in rest {
        let body = fetcher.fetch(url.as_ref())?;
        read_dataset(&body[..], *kind, &dates, &mut accumulator)?;
        tracing::info!(%kind, "dataset applied");
    }
    Ok(accumulator)
}
