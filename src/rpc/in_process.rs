use std::time::Duration;

use crate::ride::{RideService, RideSnapshot};
use crate::service::HandlerError;

use super::{RideClient, RpcError};

/// `RideClient` adapter that runs ride commands in-process.
///
/// Fills the transport slot for tests and single-process deployments;
/// a network adapter would hold a connection pool here instead. The
/// deadline is carried so call sites are written against the same
/// contract a remote transport enforces.
#[derive(Clone)]
pub struct InProcessRideClient {
    service: RideService,
    deadline: Duration,
}

impl InProcessRideClient {
    pub fn new(service: RideService) -> Self {
        Self {
            service,
            deadline: Duration::from_secs(2),
        }
    }

    /// Set the per-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl RideClient for InProcessRideClient {
    fn get_ride_info(&self, ride_id: &str) -> Result<Option<RideSnapshot>, RpcError> {
        match self.service.get(ride_id) {
            Ok(ride) => Ok(Some(ride.snapshot())),
            Err(HandlerError::NotFound(_)) => Ok(None),
            Err(err) => Err(RpcError::Remote(err.to_string())),
        }
    }

    fn reserve_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError> {
        match self.service.reserve_seats(ride_id, seats) {
            Ok(_) => Ok(true),
            // Capacity and state rejections are a negative answer, not a
            // transport failure.
            Err(HandlerError::Capacity(_) | HandlerError::Rejected(_)) => Ok(false),
            Err(HandlerError::NotFound(_)) => Ok(false),
            Err(err) => Err(RpcError::Remote(err.to_string())),
        }
    }

    fn release_seats(&self, ride_id: &str, seats: u32) -> Result<bool, RpcError> {
        match self.service.release_seats(ride_id, seats) {
            Ok(_) => Ok(true),
            Err(HandlerError::NotFound(_)) => Ok(false),
            Err(err) => Err(RpcError::Remote(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::domain::{Currency, Location, Money};
    use crate::ride::NewRide;
    use crate::store::MemoryStore;

    fn client_with_ride(seats: u32) -> InProcessRideClient {
        let service = RideService::new(MemoryStore::new());
        service
            .create_ride(
                "driver-1",
                NewRide {
                    id: "ride-1".into(),
                    driver_id: "driver-1".into(),
                    origin: Location::new("Lyon", 45.76, 4.83).unwrap(),
                    destination: Location::new("Paris", 48.85, 2.35).unwrap(),
                    departure: SystemTime::now(),
                    total_seats: seats,
                    price_per_seat: Money::new(1800, Currency::new("EUR").unwrap()),
                    auto_confirm: false,
                },
            )
            .unwrap();
        InProcessRideClient::new(service)
    }

    #[test]
    fn snapshot_for_known_ride() {
        let client = client_with_ride(3);
        let snap = client.get_ride_info("ride-1").unwrap().unwrap();
        assert_eq!(snap.available_seats, 3);
        assert!(client.get_ride_info("missing").unwrap().is_none());
    }

    #[test]
    fn reserve_answers_false_on_capacity() {
        let client = client_with_ride(2);
        assert!(client.reserve_seats("ride-1", 2).unwrap());
        assert!(!client.reserve_seats("ride-1", 1).unwrap());
    }

    #[test]
    fn release_confirms() {
        let client = client_with_ride(2);
        client.reserve_seats("ride-1", 2).unwrap();
        assert!(client.release_seats("ride-1", 2).unwrap());
        assert_eq!(
            client.get_ride_info("ride-1").unwrap().unwrap().available_seats,
            2
        );
    }

    #[test]
    fn deadline_is_configurable() {
        let client = client_with_ride(1).with_deadline(Duration::from_millis(250));
        assert_eq!(client.deadline(), Duration::from_millis(250));
    }
}
