use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Listing category.  Fixes which attribute variant the listing carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    RealEstate,
    Vehicle,
    Computing,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::RealEstate, Category::Vehicle, Category::Computing];

    /// Storage / wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealEstate => "real_estate",
            Self::Vehicle => "vehicle",
            Self::Computing => "computing",
        }
    }

    /// Label shown to visitors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RealEstate => "Immobilier",
            Self::Vehicle => "Véhicules",
            Self::Computing => "Informatique",
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real_estate" => Ok(Self::RealEstate),
            "vehicle" => Ok(Self::Vehicle),
            "computing" => Ok(Self::Computing),
            other => Err(ParseEnumError::new("category", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Listing type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rental,
}

impl ListingType {
    pub const ALL: [ListingType; 2] = [ListingType::Sale, ListingType::Rental];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rental => "rental",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sale => "Vente",
            Self::Rental => "Location",
        }
    }
}

impl FromStr for ListingType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(Self::Sale),
            "rental" => Ok(Self::Rental),
            other => Err(ParseEnumError::new("listing type", other)),
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Listing status
// ---------------------------------------------------------------------------

/// Lifecycle state.  Only `Published` listings are visible to the public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Draft,
    Published,
    Expired,
    Archived,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::Draft,
        ListingStatus::Published,
        ListingStatus::Expired,
        ListingStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Expired => "expired",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "expired" => Ok(Self::Expired),
            "archived" => Ok(Self::Archived),
            other => Err(ParseEnumError::new("listing status", other)),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Engagement event kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    View,
    ContactClick,
    Share,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::View, EventKind::ContactClick, EventKind::Share];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::ContactClick => "contact_click",
            Self::Share => "share",
        }
    }
}

impl FromStr for EventKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "contact_click" => Ok(Self::ContactClick),
            "share" => Ok(Self::Share),
            other => Err(ParseEnumError::new("event kind", other)),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Role of the current actor, as supplied by the authentication layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Analyst,
    PublicUser,
    Guest,
    #[default]
    #[serde(rename = "none")]
    Unauthenticated,
}

impl Role {
    /// Admins manage the listing lifecycle and may see every status.
    pub fn can_manage_listings(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_view_analytics(&self) -> bool {
        matches!(self, Self::Admin | Self::Analyst)
    }
}

/// Back-office account role persisted in `staff_users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Analyst,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Analyst => "analyst",
        }
    }
}

impl FromStr for StaffRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "analyst" => Ok(Self::Analyst),
            other => Err(ParseEnumError::new("staff role", other)),
        }
    }
}

impl From<StaffRole> for Role {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Admin => Role::Admin,
            StaffRole::Analyst => Role::Analyst,
        }
    }
}
