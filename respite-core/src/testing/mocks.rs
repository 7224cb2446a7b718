//! Scripted collaborators for tests and the simulator
//!
//! Every mock is `Send + Sync` and shared through `Arc`, so a test keeps a
//! handle to steer it while the manager holds another.

use crate::core::{Activity, CredentialProfile};
use crate::endpoint::{EndpointCandidate, EndpointId, EndpointQuery, Region};
use crate::session::{ActivityProbe, EndpointDirectory, NotificationSink, SessionClient};
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// What `MockSession::connect` does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Accepts and is connected by the next status check
    Succeed,
    /// Accepts, but the session never comes up
    Hang,
    /// Returns `Ok(false)`
    NotInitiated,
    /// Returns an error
    Fail,
}

/// Session whose connection state is set by the test
#[derive(Debug)]
pub struct MockSession {
    connected: AtomicBool,
    endpoint: Mutex<Option<EndpointId>>,
    behavior: Mutex<ConnectBehavior>,
    /// Ignore disconnect commands (session keeps coming back)
    sticky: AtomicBool,
    fail_status: AtomicBool,
    disconnect_calls: AtomicU32,
    connects: Mutex<Vec<EndpointId>>,
}

impl MockSession {
    /// Connected to endpoint #1, connects succeed
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            endpoint: Mutex::new(Some(EndpointId(1))),
            behavior: Mutex::new(ConnectBehavior::Succeed),
            sticky: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            disconnect_calls: AtomicU32::new(0),
            connects: Mutex::new(Vec::new()),
        }
    }

    /// Drop the session without being asked to
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::Release);
        *self.endpoint.lock() = None;
    }

    /// Bring the session up on `endpoint` without being asked to
    pub fn restore(&self, endpoint: EndpointId) {
        *self.endpoint.lock() = Some(endpoint);
        self.connected.store(true, Ordering::Release);
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn ignore_disconnects(&self, ignore: bool) {
        self.sticky.store(ignore, Ordering::Release);
    }

    /// Make the next `is_connected` call fail
    pub fn fail_next_status(&self) {
        self.fail_status.store(true, Ordering::Release);
    }

    /// Connection flag, bypassing the scripted status failure
    pub fn is_connected_now(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls.load(Ordering::Acquire)
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.lock().len()
    }

    /// Endpoints passed to `connect`, in call order
    pub fn connect_targets(&self) -> Vec<EndpointId> {
        self.connects.lock().clone()
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClient for MockSession {
    fn is_connected(&self) -> Result<bool> {
        if self.fail_status.swap(false, Ordering::AcqRel) {
            bail!("session status unavailable");
        }
        Ok(self.connected.load(Ordering::Acquire))
    }

    fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::AcqRel);
        if !self.sticky.load(Ordering::Acquire) {
            self.drop_connection();
        }
        Ok(())
    }

    fn connect(&self, _profile: &CredentialProfile, endpoint: EndpointId) -> Result<bool> {
        self.connects.lock().push(endpoint);
        match *self.behavior.lock() {
            ConnectBehavior::Succeed => {
                self.restore(endpoint);
                Ok(true)
            }
            ConnectBehavior::Hang => Ok(true),
            ConnectBehavior::NotInitiated => Ok(false),
            ConnectBehavior::Fail => bail!("connection refused by {}", endpoint),
        }
    }

    fn current_endpoint(&self) -> Option<EndpointId> {
        *self.endpoint.lock()
    }
}

/// Directory serving a fixed candidate list
#[derive(Debug, Default)]
pub struct MockDirectory {
    candidates: Mutex<Vec<EndpointCandidate>>,
    queries: Mutex<Vec<EndpointQuery>>,
    fail_next: AtomicBool,
}

impl MockDirectory {
    pub fn new(candidates: Vec<EndpointCandidate>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            ..Self::default()
        }
    }

    /// A spread of regions, loads and tiers
    pub fn sample_pool() -> Vec<EndpointCandidate> {
        vec![
            EndpointCandidate::new(1, Region::NorthAmerica, 420)
                .with_latency(Duration::from_millis(35)),
            EndpointCandidate::new(2, Region::NorthAmerica, 950)
                .with_latency(Duration::from_millis(30)),
            EndpointCandidate::new(3, Region::Europe, 610)
                .with_latency(Duration::from_millis(90)),
            EndpointCandidate::new(4, Region::Europe, 20),
            EndpointCandidate::new(5, Region::Asia, 1900),
            EndpointCandidate::new(6, Region::Oceania, 300)
                .with_latency(Duration::from_millis(180)),
            EndpointCandidate::new(101, Region::NorthAmerica, 520)
                .with_latency(Duration::from_millis(40))
                .premium(),
            EndpointCandidate::new(102, Region::Europe, 700).premium(),
            EndpointCandidate::new(103, Region::Asia, 250).premium().inaccessible(),
        ]
    }

    pub fn set_candidates(&self, candidates: Vec<EndpointCandidate>) {
        *self.candidates.lock() = candidates;
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::Release);
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn last_query(&self) -> Option<EndpointQuery> {
        self.queries.lock().last().copied()
    }
}

impl EndpointDirectory for MockDirectory {
    fn query(&self, query: &EndpointQuery) -> Result<Vec<EndpointCandidate>> {
        self.queries.lock().push(*query);
        if self.fail_next.swap(false, Ordering::AcqRel) {
            bail!("endpoint directory unreachable");
        }
        Ok(self.candidates.lock().clone())
    }
}

/// Sink that keeps every notice
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(String, String)>>,
    fail_next: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next notice
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::Release);
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.records.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().clone()
    }

    /// Notices whose title starts with `prefix`
    pub fn count_titled(&self, prefix: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(t, _)| t.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        if self.fail_next.swap(false, Ordering::AcqRel) {
            bail!("sink rejected notice");
        }
        self.records.lock().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Activity flags set by the test; counts how often it was read
#[derive(Debug, Default)]
pub struct MockActivity {
    busy: AtomicBool,
    interacting: AtomicBool,
    reads: AtomicU32,
}

impl MockActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    pub fn set_interacting(&self, interacting: bool) {
        self.interacting.store(interacting, Ordering::Release);
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::Acquire)
    }
}

impl ActivityProbe for MockActivity {
    fn activity(&self) -> Result<Activity> {
        self.reads.fetch_add(1, Ordering::AcqRel);
        Ok(Activity {
            busy: self.busy.load(Ordering::Acquire),
            interacting: self.interacting.load(Ordering::Acquire),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_disconnect_drops() {
        let session = MockSession::new();
        assert!(session.is_connected().unwrap());

        session.disconnect().unwrap();
        assert!(!session.is_connected().unwrap());
        assert_eq!(session.current_endpoint(), None);
        assert_eq!(session.disconnect_calls(), 1);
    }

    #[test]
    fn test_sticky_session_ignores_disconnect() {
        let session = MockSession::new();
        session.ignore_disconnects(true);

        session.disconnect().unwrap();
        assert!(session.is_connected().unwrap());
    }

    #[test]
    fn test_connect_behaviors() {
        let session = MockSession::new();
        let profile = CredentialProfile::new("tester");
        session.drop_connection();

        session.set_connect_behavior(ConnectBehavior::NotInitiated);
        assert!(!session.connect(&profile, EndpointId(3)).unwrap());

        session.set_connect_behavior(ConnectBehavior::Fail);
        assert!(session.connect(&profile, EndpointId(3)).is_err());

        session.set_connect_behavior(ConnectBehavior::Hang);
        assert!(session.connect(&profile, EndpointId(3)).unwrap());
        assert!(!session.is_connected().unwrap());

        session.set_connect_behavior(ConnectBehavior::Succeed);
        assert!(session.connect(&profile, EndpointId(4)).unwrap());
        assert_eq!(session.current_endpoint(), Some(EndpointId(4)));
        assert_eq!(session.connect_calls(), 4);
    }

    #[test]
    fn test_status_failure_is_one_shot() {
        let session = MockSession::new();
        session.fail_next_status();

        assert!(session.is_connected().is_err());
        assert!(session.is_connected().is_ok());
    }

    #[test]
    fn test_directory_records_queries() {
        let directory = MockDirectory::new(MockDirectory::sample_pool());
        let query = EndpointQuery {
            premium_only: true,
            ..EndpointQuery::default()
        };

        assert_eq!(directory.query(&query).unwrap().len(), 9);
        assert_eq!(directory.last_query(), Some(query));

        directory.fail_next();
        assert!(directory.query(&query).is_err());
        assert_eq!(directory.query_count(), 2);
    }
}
