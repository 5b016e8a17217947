//! Wiring of the command surface consumed by the thin API layer.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Deserialize;

use crate::booking::BookingService;
use crate::domain::{Currency, Location, Money};
use crate::ride::{NewRide, RideService};
use crate::rpc::RideClient;

use super::middleware::{CommandLog, RequireActor};
use super::{Dispatcher, HandlerError};

#[derive(Deserialize)]
struct LocationInput {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl LocationInput {
    fn build(self) -> Result<Location, HandlerError> {
        Location::new(self.name, self.latitude, self.longitude)
            .map_err(|e| HandlerError::BadInput(e.to_string()))
    }
}

#[derive(Deserialize)]
struct CreateRideInput {
    ride_id: String,
    origin: LocationInput,
    destination: LocationInput,
    departure_epoch_secs: u64,
    total_seats: u32,
    price_cents: u64,
    currency: String,
    #[serde(default)]
    auto_confirm: bool,
}

#[derive(Deserialize)]
struct RideIdInput {
    ride_id: String,
}

#[derive(Deserialize)]
struct CancelRideInput {
    ride_id: String,
    reason: String,
}

#[derive(Deserialize)]
struct CreateBookingInput {
    ride_id: String,
    seats: u32,
}

#[derive(Deserialize)]
struct BookingIdInput {
    booking_id: String,
}

#[derive(Deserialize)]
struct BookingReasonInput {
    booking_id: String,
    reason: String,
}

/// Build the full command surface over both services.
///
/// Every command requires an authenticated caller; the caller's identity
/// is the acting party for authorization inside the handlers.
pub fn command_surface<C>(rides: RideService, bookings: Arc<BookingService<C>>) -> Dispatcher
where
    C: RideClient + Clone + 'static,
{
    let dispatcher = Dispatcher::new().middleware(CommandLog).middleware(RequireActor);

    let svc = rides.clone();
    let dispatcher = dispatcher.command("ride.create", move |ctx| {
        let input: CreateRideInput = ctx.input()?;
        let currency =
            Currency::new(input.currency).map_err(|e| HandlerError::BadInput(e.to_string()))?;
        let new = NewRide {
            id: input.ride_id,
            driver_id: ctx.caller()?.to_string(),
            origin: input.origin.build()?,
            destination: input.destination.build()?,
            departure: SystemTime::UNIX_EPOCH + Duration::from_secs(input.departure_epoch_secs),
            total_seats: input.total_seats,
            price_per_seat: Money::new(input.price_cents, currency),
            auto_confirm: input.auto_confirm,
        };
        let ride = svc.create_ride(ctx.caller()?, new)?;
        Ok(serde_json::to_value(ride)?)
    });

    let svc = rides.clone();
    let dispatcher = dispatcher.command("ride.start", move |ctx| {
        let input: RideIdInput = ctx.input()?;
        let ride = svc.start_ride(ctx.caller()?, &input.ride_id)?;
        Ok(serde_json::to_value(ride)?)
    });

    let svc = rides.clone();
    let dispatcher = dispatcher.command("ride.complete", move |ctx| {
        let input: RideIdInput = ctx.input()?;
        let ride = svc.complete_ride(ctx.caller()?, &input.ride_id)?;
        Ok(serde_json::to_value(ride)?)
    });

    let svc = rides;
    let dispatcher = dispatcher.command("ride.cancel", move |ctx| {
        let input: CancelRideInput = ctx.input()?;
        let ride = svc.cancel_ride(ctx.caller()?, &input.ride_id, &input.reason)?;
        Ok(serde_json::to_value(ride)?)
    });

    let svc = Arc::clone(&bookings);
    let dispatcher = dispatcher.command("booking.create", move |ctx| {
        let input: CreateBookingInput = ctx.input()?;
        let booking = svc.create_booking(ctx.caller()?, &input.ride_id, input.seats)?;
        Ok(serde_json::to_value(booking)?)
    });

    let svc = Arc::clone(&bookings);
    let dispatcher = dispatcher.command("booking.confirm", move |ctx| {
        let input: BookingIdInput = ctx.input()?;
        let booking = svc.confirm_booking(ctx.caller()?, &input.booking_id)?;
        Ok(serde_json::to_value(booking)?)
    });

    let svc = Arc::clone(&bookings);
    let dispatcher = dispatcher.command("booking.reject", move |ctx| {
        let input: BookingReasonInput = ctx.input()?;
        let booking = svc.reject_booking(ctx.caller()?, &input.booking_id, &input.reason)?;
        Ok(serde_json::to_value(booking)?)
    });

    let svc = Arc::clone(&bookings);
    let dispatcher = dispatcher.command("booking.cancel", move |ctx| {
        let input: BookingReasonInput = ctx.input()?;
        let booking = svc.cancel_booking(ctx.caller()?, &input.booking_id, &input.reason)?;
        Ok(serde_json::to_value(booking)?)
    });

    let svc = bookings;
    dispatcher.command("booking.complete", move |ctx| {
        let input: BookingIdInput = ctx.input()?;
        let booking = svc.complete_booking(ctx.caller()?, &input.booking_id)?;
        Ok(serde_json::to_value(booking)?)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rpc::InProcessRideClient;
    use crate::store::MemoryStore;

    fn surface() -> Dispatcher {
        let rides = RideService::new(MemoryStore::new());
        let bookings = Arc::new(BookingService::new(
            MemoryStore::new(),
            InProcessRideClient::new(rides.clone()),
        ));
        command_surface(rides, bookings)
    }

    fn create_ride_input() -> serde_json::Value {
        json!({
            "ride_id": "ride-1",
            "origin": { "name": "Lyon", "latitude": 45.76, "longitude": 4.83 },
            "destination": { "name": "Paris", "latitude": 48.85, "longitude": 2.35 },
            "departure_epoch_secs": 4_102_444_800u64,
            "total_seats": 3,
            "price_cents": 2500,
            "currency": "EUR",
            "auto_confirm": false
        })
    }

    #[test]
    fn full_surface_is_registered() {
        let dispatcher = surface();
        let mut commands = dispatcher.commands();
        commands.sort_unstable();
        assert_eq!(
            commands,
            [
                "booking.cancel",
                "booking.complete",
                "booking.confirm",
                "booking.create",
                "booking.reject",
                "ride.cancel",
                "ride.complete",
                "ride.create",
                "ride.start"
            ]
        );
    }

    #[test]
    fn anonymous_calls_are_rejected_by_middleware() {
        let dispatcher = surface();
        let response = dispatcher.dispatch_response("ride.create", create_ride_input(), None);
        assert_eq!(response.status, 403);
    }

    #[test]
    fn create_then_book_through_the_surface() {
        let dispatcher = surface();

        let response =
            dispatcher.dispatch_response("ride.create", create_ride_input(), Some("driver-1"));
        assert_eq!(response.status, 200);

        let response = dispatcher.dispatch_response(
            "booking.create",
            json!({ "ride_id": "ride-1", "seats": 2 }),
            Some("passenger-1"),
        );
        assert_eq!(response.status, 200);
        let booking_id = response.body["id"].as_str().unwrap().to_string();

        let response = dispatcher.dispatch_response(
            "booking.confirm",
            json!({ "booking_id": booking_id }),
            Some("driver-1"),
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["status"], "Confirmed");
    }

    #[test]
    fn capacity_conflict_maps_to_409() {
        let dispatcher = surface();
        dispatcher.dispatch_response("ride.create", create_ride_input(), Some("driver-1"));
        dispatcher.dispatch_response(
            "booking.create",
            json!({ "ride_id": "ride-1", "seats": 3 }),
            Some("passenger-1"),
        );

        let response = dispatcher.dispatch_response(
            "booking.create",
            json!({ "ride_id": "ride-1", "seats": 1 }),
            Some("passenger-2"),
        );
        assert_eq!(response.status, 409);
    }

    #[test]
    fn bad_coordinates_map_to_400() {
        let dispatcher = surface();
        let mut input = create_ride_input();
        input["origin"]["latitude"] = json!(120.0);

        let response = dispatcher.dispatch_response("ride.create", input, Some("driver-1"));
        assert_eq!(response.status, 400);
    }
}
