#[macro_export]
macro_rules! define_id_newtype {
    ($name:ident) => {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            pub const fn from_uuid(id: uuid::Uuid) -> Self {
                Self(id)
            }

            pub const fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

define_id_newtype!(TripId);
define_id_newtype!(StopId);
define_id_newtype!(VehicleId);
define_id_newtype!(DriverId);
define_id_newtype!(RouteId);
define_id_newtype!(ParcelId);
define_id_newtype!(AccountId);
define_id_newtype!(LockId);
define_id_newtype!(PricingRuleId);
define_id_newtype!(ChargeId);
define_id_newtype!(SettlementId);
define_id_newtype!(LedgerEntryId);
define_id_newtype!(LocationSampleId);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(TripId::generate(), TripId::generate());
    }

    #[test]
    fn round_trips_through_display() {
        let id = VehicleId::generate();
        let parsed = VehicleId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
