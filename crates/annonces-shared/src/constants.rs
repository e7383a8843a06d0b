/// Currency applied when a listing does not name one.
pub const DEFAULT_CURRENCY: &str = "FCFA";

/// Company name shown when the `company_name` setting is unset or blank.
pub const DEFAULT_COMPANY_NAME: &str = "AUTO-IMMO";

/// Settings keys for the site identity.
pub const SETTING_COMPANY_NAME: &str = "company_name";
pub const SETTING_LOGO_PATH: &str = "logo_path";

/// Listings per page on the public catalog.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Number of rows in the "most viewed" dashboard table.
pub const DEFAULT_TOP_LISTINGS: u32 = 10;

/// Cities offered by the search form.
pub const CITIES: &[&str] = &[
    "Libreville",
    "Port-Gentil",
    "Franceville",
    "Oyem",
    "Moanda",
    "Mouila",
    "Lambaréné",
    "Tchibanga",
    "Koulamoutou",
    "Makokou",
    "Bitam",
    "Gamba",
    "Mayumba",
    "Mitzic",
    "Ndjolé",
];

/// Property types offered by the real-estate form.
pub const PROPERTY_TYPES: &[&str] = &[
    "Maison",
    "Appartement",
    "Studio",
    "Terrain",
    "Bureau",
    "Commerce",
    "Entrepôt",
    "Villa",
    "Duplex",
];

/// Vehicle makes offered by the vehicle form.
pub const VEHICLE_MAKES: &[&str] = &[
    "Toyota",
    "Nissan",
    "Honda",
    "Hyundai",
    "Kia",
    "Ford",
    "Chevrolet",
    "Peugeot",
    "Renault",
    "Volkswagen",
    "BMW",
    "Mercedes-Benz",
    "Audi",
    "Mitsubishi",
    "Mazda",
    "Suzuki",
];

/// Brands offered by the computing form.
pub const COMPUTING_BRANDS: &[&str] = &[
    "Apple", "Samsung", "Huawei", "Xiaomi", "HP", "Dell", "Lenovo", "Asus", "Acer", "MSI",
    "Sony", "LG", "Canon", "Epson",
];
