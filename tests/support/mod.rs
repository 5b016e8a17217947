//! Shared fixtures and test doubles.
#![allow(dead_code)] // each scenario crate uses its own subset

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ridepool::{
    Booking, Currency, Location, MemoryStore, Money, NewRide, OutboxMessage, RideClient,
    RideService, RideSnapshot, RpcError, Store, StoreError,
};

/// Install a fmt subscriber once so `RUST_LOG=ridepool=debug` surfaces
/// worker and compensation logs during test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn new_ride(id: &str, seats: u32, auto_confirm: bool) -> NewRide {
    NewRide {
        id: id.into(),
        driver_id: "driver-1".into(),
        origin: Location::new("Lyon", 45.76, 4.83).unwrap(),
        destination: Location::new("Paris", 48.85, 2.35).unwrap(),
        departure: SystemTime::now() + Duration::from_secs(3600),
        total_seats: seats,
        price_per_seat: Money::new(2100, Currency::new("EUR").unwrap()),
        auto_confirm,
    }
}

pub fn ride_service_with(id: &str, seats: u32, auto_confirm: bool) -> RideService {
    let service = RideService::new(MemoryStore::new());
    service
        .create_ride("driver-1", new_ride(id, seats, auto_confirm))
        .unwrap();
    service
}

/// Booking store whose commits can be made to fail on demand, to drive
/// the compensation path.
#[derive(Clone)]
pub struct FailingBookingStore {
    inner: MemoryStore<Booking>,
    fail_commits: Arc<AtomicBool>,
}

impl FailingBookingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_commits: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_next_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore<Booking> {
        &self.inner
    }
}

impl Store<Booking> for FailingBookingStore {
    fn get(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        self.inner.get(id)
    }

    fn commit_with_events(
        &self,
        aggregate: &mut Booking,
        rows: Vec<OutboxMessage>,
    ) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::LockPoisoned("injected commit failure"));
        }
        self.inner.commit_with_events(aggregate, rows)
    }
}

/// Ride client that fails a configurable number of calls before letting
/// them through to the wrapped client.
#[derive(Clone)]
pub struct FlakyRideClient<C> {
    inner: C,
    failing_reserves: Arc<AtomicU32>,
    failing_releases: Arc<AtomicU32>,
    release_calls: Arc<AtomicU32>,
}

impl<C> FlakyRideClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            failing_reserves: Arc::new(AtomicU32::new(0)),
            failing_releases: Arc::new(AtomicU32::new(0)),
            release_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The next `n` reserve calls fail with a transport error.
    pub fn fail_reserves(&self, n: u32) {
        self.failing_reserves.store(n, Ordering::SeqCst);
    }

    /// The next `n` release calls fail with a transport error.
    pub fn fail_releases(&self, n: u32) {
        self.failing_releases.store(n, Ordering::SeqCst);
    }

    pub fn release_calls(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl<C: RideClient> RideClient for FlakyRideClient<C> {
    fn get_ride_info(&self, ride_id: &str) -> Result<Option<RideSnapshot>, RpcError> {
        self.inner.get_ride_info(ride_id)
    }

    fn reserve_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError> {
        if take_one(&self.failing_reserves) {
            return Err(RpcError::Unavailable("ride service unreachable".into()));
        }
        self.inner.reserve_seats(ride_id, seats)
    }

    fn release_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.failing_releases) {
            return Err(RpcError::Timeout);
        }
        self.inner.release_seats(ride_id, seats)
    }
}

fn take_one(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Poll until `check` passes or the deadline elapses.
pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    check()
}
