//! Search criteria for the listing catalog.
//!
//! The store turns a [`ListingCriteria`] into a parametrised SQL predicate;
//! the presentation layer turns the same value into "active filter" chips.

use serde::{Deserialize, Serialize};

use crate::format::format_thousands;
use crate::types::{Category, ListingStatus, ListingType};

/// Optional filters.  `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingCriteria {
    pub id: Option<i64>,
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    /// Case-insensitive substring of the city name.
    pub city: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<f64>,
    /// Inclusive upper price bound, ignored when below `price_min`.
    pub price_max: Option<f64>,
    pub status: Option<ListingStatus>,
    /// Back-office listing of every status.  Suppresses the implicit
    /// `published` constraint without pinning a status.
    pub any_status: bool,
}

impl ListingCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_listing_type(mut self, listing_type: ListingType) -> Self {
        self.listing_type = Some(listing_type);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_any_status(mut self) -> Self {
        self.any_status = true;
        self
    }

    /// City filter with surrounding whitespace removed, `None` when blank.
    pub fn city_filter(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Upper bound that actually applies.  When the max is below the min
    /// only the min is kept.
    pub fn effective_price_max(&self) -> Option<f64> {
        match (self.price_min, self.price_max) {
            (Some(min), Some(max)) if max < min => None,
            (_, max) => max,
        }
    }

    /// Status constraint that applies: the explicit one, or `published` when
    /// neither an id nor the all-statuses override is given.
    pub fn effective_status(&self) -> Option<ListingStatus> {
        match self.status {
            Some(status) => Some(status),
            None if self.id.is_none() && !self.any_status => Some(ListingStatus::Published),
            None => None,
        }
    }

    /// Search forms send 0 for an empty budget and "" for any city.
    pub fn normalized(mut self) -> Self {
        self.price_min = self.price_min.filter(|p| *p > 0.0);
        self.price_max = self.price_max.filter(|p| *p > 0.0);
        self.city = self.city_filter().map(str::to_string);
        self
    }

    /// Labels for the filters in effect, in display order.
    pub fn active_filter_chips(&self) -> Vec<String> {
        let mut chips = Vec::new();

        if let Some(category) = self.category {
            chips.push(category.label().to_string());
        }
        if let Some(listing_type) = self.listing_type {
            chips.push(listing_type.label().to_string());
        }
        if let Some(city) = self.city_filter() {
            chips.push(city.to_string());
        }

        match (self.price_min, self.effective_price_max()) {
            (Some(min), Some(max)) => chips.push(format!(
                "Budget {} - {} FCFA",
                format_thousands(min),
                format_thousands(max)
            )),
            (Some(min), None) => chips.push(format!("Budget ≥ {} FCFA", format_thousands(min))),
            (None, Some(max)) => chips.push(format!("Budget ≤ {} FCFA", format_thousands(max))),
            (None, None) => {}
        }

        chips
    }
}
