use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Server/service instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geographic region an endpoint is hosted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Asia,
    Oceania,
}

/// Configured region preference (`Any` disables regional filtering)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPreference {
    #[default]
    Any,
    NorthAmerica,
    SouthAmerica,
    Europe,
    Asia,
    Oceania,
}

impl RegionPreference {
    pub fn region(&self) -> Option<Region> {
        match self {
            Self::Any => None,
            Self::NorthAmerica => Some(Region::NorthAmerica),
            Self::SouthAmerica => Some(Region::SouthAmerica),
            Self::Europe => Some(Region::Europe),
            Self::Asia => Some(Region::Asia),
            Self::Oceania => Some(Region::Oceania),
        }
    }
}

/// Reconnection target policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Profile preference, then the pre-break endpoint, then regional random
    #[default]
    StickyPreferred,
    /// Uniformly random among all qualifying endpoints
    Random,
    /// Uniformly random within the preferred region
    RegionalRandom,
    /// Best load score
    BestLoad,
    /// Lowest measured latency
    BestLatency,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StickyPreferred => "sticky_preferred",
            Self::Random => "random",
            Self::RegionalRandom => "regional_random",
            Self::BestLoad => "best_load",
            Self::BestLatency => "best_latency",
        }
    }
}

/// Endpoint a credential profile asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointPreference {
    /// A specific endpoint
    Specific(EndpointId),
    /// Any premium endpoint in the preferred region
    AnyPremium,
    /// Any free endpoint in the preferred region
    AnyFree,
}

/// Candidate returned by the endpoint directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCandidate {
    pub id: EndpointId,
    pub region: Region,
    /// Current load (connected sessions)
    pub load: u32,
    /// Measured round-trip latency, if a probe succeeded
    #[serde(default)]
    pub latency: Option<Duration>,
    /// Reachable for this account right now
    pub accessible: bool,
    /// Restricted to the premium tier
    #[serde(default)]
    pub premium: bool,
}

impl EndpointCandidate {
    pub fn new(id: u32, region: Region, load: u32) -> Self {
        Self {
            id: EndpointId(id),
            region,
            load,
            latency: None,
            accessible: true,
            premium: false,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn premium(mut self) -> Self {
        self.premium = true;
        self
    }

    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }
}

/// Filters passed to [`EndpointDirectory::query`](crate::session::EndpointDirectory::query)
///
/// The directory may pre-filter with these; the selector re-applies them
/// to whatever comes back. Region is not part of the query because the
/// regional modes fall back to every region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointQuery {
    /// Only premium endpoints
    pub premium_only: bool,
    pub avoid_low_load: bool,
    pub avoid_high_load: bool,
}
