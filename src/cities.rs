//! Supported Indian cities with coordinates and recommended panel tilt.

use serde::Serialize;

/// A city the system collects weather for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Recommended fixed panel tilt (degrees), roughly the latitude.
    pub tilt: u8,
    pub state: &'static str,
}

const fn city(name: &'static str, lat: f64, lon: f64, tilt: u8, state: &'static str) -> City {
    City {
        name,
        lat,
        lon,
        tilt,
        state,
    }
}

/// All cities, in data-collection order.
pub static CATALOG: [City; 33] = [
    city("Delhi", 28.70, 77.10, 28, "Delhi"),
    city("Mumbai", 19.07, 72.87, 19, "Maharashtra"),
    city("Kolkata", 22.57, 88.36, 22, "West Bengal"),
    city("Chennai", 13.08, 80.27, 13, "Tamil Nadu"),
    city("Bengaluru", 12.97, 77.59, 13, "Karnataka"),
    city("Hyderabad", 17.38, 78.48, 17, "Telangana"),
    city("Ahmedabad", 23.02, 72.57, 23, "Gujarat"),
    city("Pune", 18.52, 73.85, 18, "Maharashtra"),
    city("Jaipur", 26.91, 75.78, 27, "Rajasthan"),
    city("Lucknow", 26.84, 80.94, 27, "Uttar Pradesh"),
    city("Kanpur", 26.44, 80.33, 26, "Uttar Pradesh"),
    city("Nagpur", 21.14, 79.08, 21, "Maharashtra"),
    city("Indore", 22.71, 75.85, 23, "Madhya Pradesh"),
    city("Thane", 19.21, 72.97, 19, "Maharashtra"),
    city("Bhopal", 23.25, 77.41, 23, "Madhya Pradesh"),
    city("Visakhapatnam", 17.68, 83.21, 18, "Andhra Pradesh"),
    city("Patna", 25.59, 85.13, 26, "Bihar"),
    city("Vadodara", 22.30, 73.18, 22, "Gujarat"),
    city("Ludhiana", 30.90, 75.85, 31, "Punjab"),
    city("Agra", 27.17, 78.00, 27, "Uttar Pradesh"),
    city("Nashik", 19.99, 73.78, 20, "Maharashtra"),
    city("Srinagar", 34.08, 74.79, 34, "Jammu & Kashmir"),
    city("Amritsar", 31.63, 74.87, 32, "Punjab"),
    city("Allahabad", 25.43, 81.84, 25, "Uttar Pradesh"),
    city("Guwahati", 26.14, 91.73, 26, "Assam"),
    city("Coimbatore", 11.01, 76.95, 11, "Tamil Nadu"),
    city("Jabalpur", 23.18, 79.98, 23, "Madhya Pradesh"),
    city("Madurai", 9.92, 78.11, 10, "Tamil Nadu"),
    city("Raipur", 21.25, 81.62, 21, "Chhattisgarh"),
    city("Kota", 25.21, 75.86, 25, "Rajasthan"),
    city("Chandigarh", 30.73, 76.77, 31, "Chandigarh"),
    city("Leh", 34.15, 77.57, 34, "Ladakh"),
    city("Bhubaneswar", 20.29, 85.82, 20, "Odisha"),
];

/// Looks a city up by exact name.
pub fn find(name: &str) -> Option<&'static City> {
    CATALOG.iter().find(|c| c.name == name)
}

/// Closest catalog city by straight-line distance in degrees.
///
/// Good enough to snap a GPS fix to a trained city; not a geodesic.
pub fn nearest(lat: f64, lon: f64) -> &'static City {
    let dist = |c: &City| (lat - c.lat).powi(2) + (lon - c.lon).powi(2);
    let mut best = &CATALOG[0];
    for c in &CATALOG[1..] {
        if dist(c) < dist(best) {
            best = c;
        }
    }
    best
}
