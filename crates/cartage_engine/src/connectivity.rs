//! Admission control for multi-trip assignment.
//!
//! A driver may hold several not-yet-started trips only when each held trip
//! chains with the candidate: same route, or the held destination sits within
//! [`CONNECTIVITY_DISTANCE_THRESHOLD_KM`] of the candidate origin and the two
//! trips were created within [`CONNECTIVITY_WINDOW`] of each other. This
//! rejects fast; it does not plan routes.

use jiff::SignedDuration;

use cartage_core::{error::ExecutionError, ids::DriverId, trip::Trip};

use crate::store::StoreState;

pub const CONNECTIVITY_DISTANCE_THRESHOLD_KM: f64 = 50.0;
pub const CONNECTIVITY_WINDOW: SignedDuration = SignedDuration::from_hours(48);

/// Admit or veto assigning `candidate` to `driver_id`. Every held PLANNED
/// trip must chain with the candidate; the first that does not names itself
/// in the veto.
pub fn can_assign(
    tx: &StoreState,
    driver_id: DriverId,
    candidate: &Trip,
) -> Result<(), ExecutionError> {
    for held in tx.planned_trips_of(driver_id) {
        if !is_connected(tx, held, candidate)? {
            return Err(ExecutionError::ConnectivityVeto {
                candidate_trip_id: candidate.id,
                blocking_trip_id: held.id,
            });
        }
    }
    Ok(())
}

fn is_connected(tx: &StoreState, held: &Trip, candidate: &Trip) -> Result<bool, ExecutionError> {
    if held.route_id == candidate.route_id {
        return Ok(true);
    }

    let held_route = tx.route(held.route_id)?;
    let candidate_route = tx.route(candidate.route_id)?;

    let gap_km = held_route
        .destination
        .haversine_km(&candidate_route.origin);
    if gap_km > CONNECTIVITY_DISTANCE_THRESHOLD_KM {
        return Ok(false);
    }

    let spread = candidate.created_at.duration_since(held.created_at).abs();
    Ok(spread <= CONNECTIVITY_WINDOW)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use cartage_core::trip::TripStatus;

    use super::*;
    use crate::test_utils::{ANTWERP, fixture};

    #[test]
    fn driver_without_held_trips_is_admitted() {
        let fx = fixture();
        let candidate = fx
            .store
            .read(|state| state.trip(fx.trip_id).unwrap().clone());
        fx.store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap();
    }

    #[test]
    fn same_route_is_always_connected() {
        let fx = fixture();
        let now = Timestamp::now();
        fx.add_trip(fx.route_id, Some(fx.driver_id), TripStatus::Planned, now);
        let candidate_id = fx.add_trip(fx.route_id, None, TripStatus::Planned, now);

        let candidate = fx
            .store
            .read(|state| state.trip(candidate_id).unwrap().clone());
        fx.store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap();
    }

    #[test]
    fn chained_route_within_thresholds_is_admitted() {
        let fx = fixture();
        let now = Timestamp::now();
        // Held trip ends in Antwerp; the candidate starts ~22 km away and was
        // created one day later.
        fx.add_trip(fx.route_id, Some(fx.driver_id), TripStatus::Planned, now);
        let nearby_route = fx.add_route((51.02, 4.40), (50.0, 4.0));
        let candidate_id = fx.add_trip(
            nearby_route,
            None,
            TripStatus::Planned,
            now + SignedDuration::from_hours(24),
        );

        let candidate = fx
            .store
            .read(|state| state.trip(candidate_id).unwrap().clone());
        fx.store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap();
    }

    #[test]
    fn far_origin_vetoes_and_names_the_blocking_trip() {
        let fx = fixture();
        let now = Timestamp::now();
        let held_id = fx.add_trip(fx.route_id, Some(fx.driver_id), TripStatus::Planned, now);
        // ~80 km north of the held destination, created one day later.
        let far_route = fx.add_route((ANTWERP.0 + 0.72, ANTWERP.1), (50.0, 4.0));
        let candidate_id = fx.add_trip(
            far_route,
            None,
            TripStatus::Planned,
            now + SignedDuration::from_hours(24),
        );

        let candidate = fx
            .store
            .read(|state| state.trip(candidate_id).unwrap().clone());
        let err = fx
            .store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::ConnectivityVeto {
                candidate_trip_id: candidate_id,
                blocking_trip_id: held_id,
            }
        );
    }

    #[test]
    fn stale_creation_spread_vetoes_even_when_nearby() {
        let fx = fixture();
        let now = Timestamp::now();
        let held_id = fx.add_trip(fx.route_id, Some(fx.driver_id), TripStatus::Planned, now);
        let nearby_route = fx.add_route((51.02, 4.40), (50.0, 4.0));
        let candidate_id = fx.add_trip(
            nearby_route,
            None,
            TripStatus::Planned,
            now + SignedDuration::from_hours(72),
        );

        let candidate = fx
            .store
            .read(|state| state.trip(candidate_id).unwrap().clone());
        let err = fx
            .store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::ConnectivityVeto {
                candidate_trip_id: candidate_id,
                blocking_trip_id: held_id,
            }
        );
    }

    #[test]
    fn every_held_trip_must_chain() {
        let fx = fixture();
        let now = Timestamp::now();
        // One held trip chains (same route), a second does not.
        fx.add_trip(fx.route_id, Some(fx.driver_id), TripStatus::Planned, now);
        let far_route = fx.add_route((40.0, 4.0), (40.5, 4.0));
        let blocking_id = fx.add_trip(far_route, Some(fx.driver_id), TripStatus::Planned, now);

        let candidate_id = fx.add_trip(fx.route_id, None, TripStatus::Planned, now);
        let candidate = fx
            .store
            .read(|state| state.trip(candidate_id).unwrap().clone());
        let err = fx
            .store
            .read(|state| can_assign(state, fx.driver_id, &candidate))
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::ConnectivityVeto {
                candidate_trip_id: candidate_id,
                blocking_trip_id: blocking_id,
            }
        );
    }
}
