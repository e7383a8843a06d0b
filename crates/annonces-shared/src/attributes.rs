//! Category-specific attribute sets.
//!
//! A listing carries exactly one of these, chosen by its [`Category`].  The
//! store never looks inside: it persists [`CategoryAttributes::to_structured_map`]
//! as an opaque JSON object next to the base record, and callers decode it
//! back with [`CategoryAttributes::from_structured_map`].
//!
//! Every field has a default so that rows written before a field existed
//! still decode.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Category;

// ---------------------------------------------------------------------------
// Real estate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealEstateAttributes {
    /// House, apartment, land, office, ...
    pub property_type: String,
    /// Surface in square metres.
    pub surface: Option<f64>,
    pub rooms: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub floor: Option<i32>,
    pub elevator: bool,
    pub parking: bool,
    pub garden: bool,
    pub pool: bool,
    pub air_conditioning: bool,
    pub furnished: bool,
    pub charges_included: bool,
    pub deposit: Option<f64>,
    pub agency_fees: Option<f64>,
    pub available_from: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleAttributes {
    pub make: String,
    pub model: String,
    pub year: Option<u32>,
    /// Odometer reading in kilometres.
    pub mileage_km: Option<u32>,
    /// petrol, diesel, hybrid, electric
    pub fuel: String,
    /// manual, automatic
    pub transmission: String,
    pub color: String,
    pub doors: Option<u32>,
    pub seats: Option<u32>,
    pub horsepower: Option<u32>,
    /// Engine displacement in litres.
    pub displacement_l: Option<f64>,
    /// new, very_good, good, fair, needs_repair
    pub condition: String,
    pub first_owner: bool,
    pub maintenance_log: bool,
    pub inspection_valid: bool,
    pub insurance_valid: bool,
    pub papers_in_order: bool,
    pub accident_history: bool,
}

// ---------------------------------------------------------------------------
// Computing equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputingAttributes {
    /// laptop, desktop, smartphone, tablet, accessory
    pub equipment_type: String,
    pub make: String,
    pub model: String,
    pub processor: String,
    pub ram_gb: Option<u32>,
    pub storage_gb: Option<u32>,
    /// HDD, SSD, eMMC
    pub storage_type: String,
    pub gpu: String,
    /// Diagonal in inches.
    pub screen_size_in: Option<f64>,
    pub screen_resolution: String,
    pub operating_system: String,
    /// new, like_new, very_good, good, fair
    pub condition: String,
    pub warranty: bool,
    pub warranty_months: Option<u32>,
    pub accessories: Vec<String>,
    pub original_box: bool,
    pub invoice_available: bool,
}

// ---------------------------------------------------------------------------
// Variant union
// ---------------------------------------------------------------------------

/// One attribute set per category.  The variant determines the category;
/// there is no way to build a vehicle payload tagged as real estate.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryAttributes {
    RealEstate(RealEstateAttributes),
    Vehicle(VehicleAttributes),
    Computing(ComputingAttributes),
}

impl CategoryAttributes {
    /// Empty attribute set for `category`.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::RealEstate => Self::RealEstate(RealEstateAttributes::default()),
            Category::Vehicle => Self::Vehicle(VehicleAttributes::default()),
            Category::Computing => Self::Computing(ComputingAttributes::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::RealEstate(_) => Category::RealEstate,
            Self::Vehicle(_) => Category::Vehicle,
            Self::Computing(_) => Category::Computing,
        }
    }

    /// Flat key -> value map persisted as the listing's category payload.
    pub fn to_structured_map(&self) -> Map<String, Value> {
        let value = match self {
            Self::RealEstate(a) => serde_json::to_value(a),
            Self::Vehicle(a) => serde_json::to_value(a),
            Self::Computing(a) => serde_json::to_value(a),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Decode a stored payload as the variant belonging to `category`.
    /// Unknown keys are ignored and missing keys take their defaults.
    pub fn from_structured_map(
        category: Category,
        map: &Map<String, Value>,
    ) -> Result<Self, serde_json::Error> {
        let value = Value::Object(map.clone());
        Ok(match category {
            Category::RealEstate => Self::RealEstate(serde_json::from_value(value)?),
            Category::Vehicle => Self::Vehicle(serde_json::from_value(value)?),
            Category::Computing => Self::Computing(serde_json::from_value(value)?),
        })
    }

    /// Forms use zero to mean "not filled in"; turn those into `None` before
    /// the payload is handed to the store.
    pub fn normalized(self) -> Self {
        match self {
            Self::RealEstate(mut a) => {
                a.surface = nonzero_f64(a.surface);
                a.rooms = nonzero(a.rooms);
                a.bedrooms = nonzero(a.bedrooms);
                a.bathrooms = nonzero(a.bathrooms);
                a.deposit = nonzero_f64(a.deposit);
                a.agency_fees = nonzero_f64(a.agency_fees);
                Self::RealEstate(a)
            }
            Self::Vehicle(mut a) => {
                a.year = nonzero(a.year);
                a.mileage_km = nonzero(a.mileage_km);
                a.doors = nonzero(a.doors);
                a.seats = nonzero(a.seats);
                a.horsepower = nonzero(a.horsepower);
                a.displacement_l = nonzero_f64(a.displacement_l);
                Self::Vehicle(a)
            }
            Self::Computing(mut a) => {
                a.ram_gb = nonzero(a.ram_gb);
                a.storage_gb = nonzero(a.storage_gb);
                a.screen_size_in = nonzero_f64(a.screen_size_in);
                a.warranty_months = nonzero(a.warranty_months);
                Self::Computing(a)
            }
        }
    }
}

impl From<RealEstateAttributes> for CategoryAttributes {
    fn from(a: RealEstateAttributes) -> Self {
        Self::RealEstate(a)
    }
}

impl From<VehicleAttributes> for CategoryAttributes {
    fn from(a: VehicleAttributes) -> Self {
        Self::Vehicle(a)
    }
}

impl From<ComputingAttributes> for CategoryAttributes {
    fn from(a: ComputingAttributes) -> Self {
        Self::Computing(a)
    }
}

fn nonzero(v: Option<u32>) -> Option<u32> {
    v.filter(|n| *n != 0)
}

fn nonzero_f64(v: Option<f64>) -> Option<f64> {
    v.filter(|n| *n != 0.0)
}
