pub mod alert;
pub mod config;
pub mod departure;
pub mod journey;
pub mod leg;
pub mod location;
pub mod route;
pub mod stop;

pub use alert::{AlertEffect, AlertSeverity, ServiceAlert};
pub use config::{ApiMode, JourneyConfig, TokenError};
pub use departure::Departure;
pub use journey::{DataSource, Journey, StatusKind};
pub use leg::{CoffeePosition, CoffeeReason, Leg};
pub use location::{AuState, Location};
pub use route::Route;
pub use stop::{ModeType, Stop};
