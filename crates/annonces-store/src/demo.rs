//! Sample catalog for local development.
//!
//! Seven published listings across the three categories plus a month of
//! engagement per listing.  The engagement figures derive from the listing's
//! position so every seeded database looks the same.

use annonces_shared::{
    CategoryAttributes, ComputingAttributes, EventKind, ListingCriteria, ListingStatus,
    ListingType, RealEstateAttributes, VehicleAttributes,
};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;
use crate::models::{NewEvent, NewListing};

const CONTACT_SOURCES: [&str; 3] = ["whatsapp", "phone", "email"];
const SHARE_SOURCES: [&str; 3] = ["whatsapp", "facebook", "instagram"];

/// What [`Database::seed_demo_catalog`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemoSummary {
    pub listings: usize,
    pub events: usize,
}

struct DemoListing {
    title: &'static str,
    description: &'static str,
    listing_type: ListingType,
    price: f64,
    city: &'static str,
    neighborhood: Option<&'static str>,
    contact_name: &'static str,
    contact_phone: &'static str,
    contact_whatsapp: Option<&'static str>,
    attributes: CategoryAttributes,
}

impl DemoListing {
    fn into_new_listing(self) -> NewListing {
        let category = self.attributes.category();
        let mut listing = NewListing::new(
            self.title,
            self.description,
            category,
            self.listing_type,
            self.price,
            self.city,
            self.contact_name,
            self.contact_phone,
        )
        .with_attributes(self.attributes)
        .with_status(ListingStatus::Published);
        listing.neighborhood = self.neighborhood.map(str::to_string);
        listing.contact_whatsapp = self.contact_whatsapp.map(str::to_string);
        listing
    }
}

fn demo_listings() -> Vec<DemoListing> {
    vec![
        DemoListing {
            title: "Villa moderne 4 chambres avec piscine",
            description: "Villa dans un quartier résidentiel calme, cuisine équipée, piscine et jardin.",
            listing_type: ListingType::Sale,
            price: 85_000_000.0,
            city: "Libreville",
            neighborhood: Some("Batterie IV"),
            contact_name: "Marie Nguema",
            contact_phone: "+241-06-12-34-56",
            contact_whatsapp: Some("+24106123456"),
            attributes: RealEstateAttributes {
                property_type: "Villa".into(),
                surface: Some(250.0),
                rooms: Some(8),
                bedrooms: Some(4),
                bathrooms: Some(3),
                parking: true,
                garden: true,
                pool: true,
                air_conditioning: true,
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "Appartement 2 pièces centre-ville",
            description: "Proche des services, transports et commerces.",
            listing_type: ListingType::Rental,
            price: 350_000.0,
            city: "Libreville",
            neighborhood: Some("Centre-ville"),
            contact_name: "Jean Obame",
            contact_phone: "+241-07-98-76-54",
            contact_whatsapp: Some("+24107987654"),
            attributes: RealEstateAttributes {
                property_type: "Appartement".into(),
                surface: Some(65.0),
                rooms: Some(2),
                bedrooms: Some(1),
                bathrooms: Some(1),
                air_conditioning: true,
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "Terrain constructible 1000m² Owendo",
            description: "Terrain plat, accès facile, proche des commodités.",
            listing_type: ListingType::Sale,
            price: 15_000_000.0,
            city: "Libreville",
            neighborhood: Some("Owendo"),
            contact_name: "Paul Mba",
            contact_phone: "+241-05-11-22-33",
            contact_whatsapp: None,
            attributes: RealEstateAttributes {
                property_type: "Terrain".into(),
                surface: Some(1000.0),
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "Toyota Camry 2018 - Excellent état",
            description: "Entretien régulier, carnet à jour, première main, non accidentée.",
            listing_type: ListingType::Sale,
            price: 12_500_000.0,
            city: "Port-Gentil",
            neighborhood: None,
            contact_name: "Sylvie Moussavou",
            contact_phone: "+241-06-55-44-33",
            contact_whatsapp: Some("+24106554433"),
            attributes: VehicleAttributes {
                make: "Toyota".into(),
                model: "Camry".into(),
                year: Some(2018),
                mileage_km: Some(45_000),
                fuel: "petrol".into(),
                transmission: "automatic".into(),
                color: "Blanc".into(),
                doors: Some(4),
                seats: Some(5),
                condition: "very_good".into(),
                first_owner: true,
                maintenance_log: true,
                inspection_valid: true,
                papers_in_order: true,
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "Nissan Patrol 4x4",
            description: "Robuste et fiable, moteur diesel, climatisation.",
            listing_type: ListingType::Sale,
            price: 8_500_000.0,
            city: "Franceville",
            neighborhood: Some("Potos"),
            contact_name: "Michel Ndong",
            contact_phone: "+241-07-33-22-11",
            contact_whatsapp: None,
            attributes: VehicleAttributes {
                make: "Nissan".into(),
                model: "Patrol".into(),
                year: Some(2015),
                mileage_km: Some(120_000),
                fuel: "diesel".into(),
                transmission: "manual".into(),
                color: "Vert".into(),
                doors: Some(5),
                seats: Some(7),
                condition: "good".into(),
                papers_in_order: true,
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "MacBook Pro 13\" 2021 - Comme neuf",
            description: "Puce M1, utilisé six mois, boîte et accessoires inclus.",
            listing_type: ListingType::Sale,
            price: 950_000.0,
            city: "Libreville",
            neighborhood: Some("Akanda"),
            contact_name: "David Koumba",
            contact_phone: "+241-06-77-88-99",
            contact_whatsapp: None,
            attributes: ComputingAttributes {
                equipment_type: "laptop".into(),
                make: "Apple".into(),
                model: "MacBook Pro 13\"".into(),
                processor: "Apple M1".into(),
                ram_gb: Some(8),
                storage_gb: Some(256),
                storage_type: "SSD".into(),
                screen_size_in: Some(13.3),
                operating_system: "macOS".into(),
                condition: "like_new".into(),
                warranty: true,
                warranty_months: Some(18),
                accessories: vec!["Chargeur MagSafe".into(), "Câble USB-C".into()],
                original_box: true,
                invoice_available: true,
                ..Default::default()
            }
            .into(),
        },
        DemoListing {
            title: "Samsung Galaxy S22 Ultra",
            description: "256 Go, écran sans rayure, S Pen inclus.",
            listing_type: ListingType::Sale,
            price: 485_000.0,
            city: "Libreville",
            neighborhood: Some("Glass"),
            contact_name: "Fatou Diallo",
            contact_phone: "+241-05-99-88-77",
            contact_whatsapp: Some("+24105998877"),
            attributes: ComputingAttributes {
                equipment_type: "smartphone".into(),
                make: "Samsung".into(),
                model: "Galaxy S22 Ultra".into(),
                ram_gb: Some(12),
                storage_gb: Some(256),
                screen_size_in: Some(6.8),
                operating_system: "Android 12".into(),
                condition: "very_good".into(),
                original_box: true,
                accessories: vec!["Chargeur rapide".into(), "S Pen".into()],
                ..Default::default()
            }
            .into(),
        },
    ]
}

impl Database {
    /// Fill an empty catalog with sample listings and engagement.
    ///
    /// Does nothing when any listing already exists, whatever its status.
    pub fn seed_demo_catalog(&self) -> Result<DemoSummary> {
        let existing = self.count_listings(&ListingCriteria::new().with_any_status())?;
        if existing > 0 {
            tracing::info!(existing, "catalog not empty, demo seeding skipped");
            return Ok(DemoSummary::default());
        }

        let now = Utc::now();
        let mut summary = DemoSummary::default();

        for (index, demo) in demo_listings().into_iter().enumerate() {
            let step = index as i64;
            let mut listing = demo.into_new_listing();
            listing.expires_at = Some(now + Duration::days(30 + (step * 13) % 61));

            let id = self.create_listing(&listing)?;
            summary.listings += 1;

            let views = 5 + (step * 7) % 46;
            for n in 0..views {
                let at = now - Duration::days((n * 3 + step) % 31);
                let ip = format!("192.168.1.{}", 1 + (n * 37 + step) % 255);
                self.record_event(
                    &NewEvent::new(id, EventKind::View)
                        .with_requester(Some(ip), None)
                        .at(at),
                )?;
                // Keep the lifetime counter in step with the logged views.
                self.increment_views(id)?;
            }

            let clicks = views / 10;
            for n in 0..clicks {
                let source = CONTACT_SOURCES[((n + step) % 3) as usize];
                let at = now - Duration::days((n * 5 + step) % 31);
                self.record_event(
                    &NewEvent::new(id, EventKind::ContactClick)
                        .with_source(source)
                        .at(at),
                )?;
            }

            let shares = views / 20;
            for n in 0..shares {
                let source = SHARE_SOURCES[((n + step) % 3) as usize];
                let at = now - Duration::days((n * 7 + step) % 31);
                self.record_event(&NewEvent::new(id, EventKind::Share).with_source(source).at(at))?;
            }

            summary.events += (views + clicks + shares) as usize;
        }

        tracing::info!(
            listings = summary.listings,
            events = summary.events,
            "demo catalog seeded"
        );
        Ok(summary)
    }
}
