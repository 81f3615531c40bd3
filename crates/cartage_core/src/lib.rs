pub mod billing;
pub mod error;
pub mod fleet;
pub mod geopoint;
pub mod ids;
pub mod lock;
pub mod trip;
