//! Named network addresses the supervisor polls to detect readiness.

use url::Url;

use crate::error::{Error, Result};

/// The endpoint set of one server instance. The HTTP management interface is
/// always present; bolt and https depend on how the server is configured.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub http: Url,
    pub bolt: Option<Url>,
    pub https: Option<Url>,
}

impl Endpoints {
    pub fn new(http: Url) -> Self {
        Self {
            http,
            bolt: None,
            https: None,
        }
    }

    pub fn with_bolt(mut self, bolt: Url) -> Self {
        self.bolt = Some(bolt);
        self
    }

    pub fn with_https(mut self, https: Url) -> Self {
        self.https = Some(https);
        self
    }

    /// Parse from string form, as carried by
    /// [`InstanceSettings`](crate::InstanceSettings).
    pub fn parse(http: &str, bolt: Option<&str>, https: Option<&str>) -> Result<Self> {
        Ok(Self {
            http: parse_one(http)?,
            bolt: bolt.map(parse_one).transpose()?,
            https: https.map(parse_one).transpose()?,
        })
    }

    /// The configured endpoints as (name, url) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Url)> + '_ {
        [
            ("http", Some(&self.http)),
            ("bolt", self.bolt.as_ref()),
            ("https", self.https.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, url)| url.map(|u| (name, u)))
    }
}

fn parse_one(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|source| Error::InvalidEndpoint {
        url: url.to_string(),
        source,
    })?;
    // Non-HTTP schemes (bolt) are probed over raw TCP, which needs a
    // concrete port; reject here instead of polling a dead address forever.
    let probeable = matches!(parsed.scheme(), "http" | "https")
        || parsed.port_or_known_default().is_some();
    if !probeable {
        return Err(Error::EndpointMissingPort {
            url: url.to_string(),
        });
    }
    Ok(parsed)
}
