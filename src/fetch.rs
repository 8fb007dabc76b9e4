use crate::data::{Error, Kind};
use std::time::Duration;

const BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series";

const TIMEOUT: Duration = Duration::from_secs(60);

impl Kind {
    /// JHU CSSE global time series for this kind.
    pub fn url(self) -> String {
        format!("{BASE_URL}/time_series_covid19_{}_global.csv", self)
    }
}

/// The three datasets to merge, seed (confirmed) first.
pub(crate) fn default_sources() -> Vec<(Kind, String)> {
    Kind::ALL.iter().map(|&kind| (kind, kind.url())).collect()
}

/// Anything able to turn a URL into the bytes behind it. The real thing is
/// `HttpFetcher`; tests use canned CSV bodies.
pub(crate) trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error>;
}

pub(crate) struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| Error::Network {
                url: BASE_URL.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        let network = |e: reqwest::Error| Error::Network {
            url: url.to_owned(),
            reason: e.to_string(),
        };
        tracing::info!(url, "fetching");
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(network)?;
        tracing::debug!(url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::default_sources;
    use crate::data::Kind;

    #[test]
    fn sources_order() {
        let sources = default_sources();
        assert_eq!(
            sources.iter().map(|(kind, _)| *kind).collect::<Vec<_>>(),
            Kind::ALL
        );
        assert!(sources[0]
            .1
            .ends_with("/time_series_covid19_confirmed_global.csv"));
        assert!(sources[2]
            .1
            .ends_with("/time_series_covid19_recovered_global.csv"));
    }
}
