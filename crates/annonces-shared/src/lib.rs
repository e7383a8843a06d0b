// Domain types shared by the store and the HTTP surface.

pub mod attributes;
pub mod constants;
pub mod criteria;
pub mod error;
pub mod format;
pub mod types;
pub mod validation;

pub use attributes::{
    CategoryAttributes, ComputingAttributes, RealEstateAttributes, VehicleAttributes,
};
pub use criteria::ListingCriteria;
pub use error::{ParseEnumError, ValidationError};
pub use format::{format_price, format_thousands};
pub use types::{Category, EventKind, ListingStatus, ListingType, Role, StaffRole};
