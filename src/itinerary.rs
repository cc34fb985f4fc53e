//! Themed itinerary catalog
//!
//! Six hand-curated themes of six stops each. The catalog is built once and
//! never mutated.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::models::{ItineraryStop, StopKind};
use crate::{GuideError, Result};

pub const THEME_COUNT: usize = 6;
pub const STOPS_PER_THEME: usize = 6;

/// One curated route
#[derive(Debug, Clone)]
pub struct Theme {
    /// URL-safe identifier
    pub key: &'static str,
    pub title: &'static str,
    pub stops: Vec<ItineraryStop>,
}

type StopRow = (&'static str, f64, f64, StopKind, &'static str);

fn theme(key: &'static str, title: &'static str, rows: [StopRow; STOPS_PER_THEME]) -> Theme {
    let stops = rows
        .into_iter()
        .zip(1u8..)
        .map(|((name, lat, lng, kind, description), ordinal)| ItineraryStop {
            ordinal,
            name: name.to_string(),
            lat,
            lng,
            kind,
            description: description.to_string(),
        })
        .collect();
    Theme { key, title, stops }
}

static CATALOG: LazyLock<Vec<Theme>> = LazyLock::new(|| {
    use StopKind::{Food, View, Walk};
    vec![
        theme(
            "tiergarten",
            "🌳 Theme 1: Forest & Healing (Tiergarten)",
            [
                ("Victory Column (Siegessäule)", 52.5145, 13.3501, View, "The golden angel with a view over all of Berlin"),
                ("Tiergarten Walk", 52.5135, 13.3575, Walk, "Fresh air in the huge green lung of the city"),
                ("Cafe am Neuen See", 52.5076, 13.3448, Food, "Lakeside beer garden known for pizza and beer"),
                ("Berlin Zoo & Aquarium", 52.5079, 13.3377, View, "Historic zoo with one of the largest species collections in the world"),
                ("Monkey Bar", 52.5049, 13.3353, Food, "Rooftop cocktails overlooking the zoo's monkeys (25hours Hotel)"),
                ("Kaiser Wilhelm Memorial Church", 52.5048, 13.3350, View, "Church kept in its bombed state as a reminder of the war"),
            ],
        ),
        theme(
            "museum-island",
            "🎨 Theme 2: Art & Classics (Museum Island)",
            [
                ("Berlin Cathedral", 52.5190, 13.4010, View, "City views from the top of the grand dome"),
                ("Alte Nationalgalerie", 52.5208, 13.3982, View, "Temple-like building full of 19th century paintings"),
                ("James-Simon-Park", 52.5213, 13.4005, Walk, "Locals' favourite spot on the banks of the Spree"),
                ("Hackesche Höfe", 52.5246, 13.4020, View, "Eight beautiful Art Nouveau courtyards"),
                ("Monsieur Vuong", 52.5244, 13.4085, Food, "Legendary Vietnamese pho with a queue out the door"),
                ("Zeit für Brot", 52.5265, 13.4090, Food, "Bakery whose cinnamon Schnecke melts in your mouth"),
            ],
        ),
        theme(
            "berlin-wall",
            "🏰 Theme 3: A Divided City (Wall Tour)",
            [
                ("Berlin Wall Memorial", 52.5352, 13.3903, View, "Open-air museum with the wall preserved as it stood"),
                ("Mauerpark", 52.5404, 13.4048, Walk, "Huge Sunday flea market and open-air karaoke"),
                ("Prater Beer Garden", 52.5399, 13.4101, Food, "Berlin's oldest beer garden"),
                ("Checkpoint Charlie", 52.5074, 13.3904, View, "Where US and Soviet troops stood face to face"),
                ("Topography of Terror", 52.5065, 13.3835, View, "Free documentation centre on the former Gestapo headquarters site"),
                ("Mall of Berlin", 52.5106, 13.3807, Food, "Shopping and food after the history tour"),
            ],
        ),
        theme(
            "kreuzberg",
            "🕶️ Theme 4: Hipster Haunts (Kreuzberg)",
            [
                ("Oberbaum Bridge", 52.5015, 13.4455, View, "Red-brick bridge between east and west, the best photo spot"),
                ("East Side Gallery", 52.5050, 13.4397, Walk, "World's longest open-air gallery, home of the Fraternal Kiss"),
                ("Burgermeister", 52.5005, 13.4420, Food, "Burger joint in a converted public toilet under the tracks"),
                ("Markthalle Neun", 52.5020, 13.4310, Food, "Market hall with Street Food Thursday"),
                ("Voo Store", 52.5005, 13.4215, View, "Hidden concept store for the fashion crowd"),
                ("Landwehr Canal", 52.4960, 13.4150, Walk, "Canal walk with swans and boats"),
            ],
        ),
        theme(
            "kurfuerstendamm",
            "🛍️ Theme 5: Luxury & Shopping (Ku'damm)",
            [
                ("KaDeWe", 52.5015, 13.3414, View, "Largest department store on the continent, don't miss the 6th floor food hall"),
                ("Kurfürstendamm", 52.5028, 13.3323, Walk, "Berlin's Champs-Élysées, lined with luxury brands"),
                ("Bikini Berlin", 52.5055, 13.3370, View, "Concept mall with a view into the zoo"),
                ("C/O Berlin", 52.5065, 13.3325, View, "Museum dedicated to photography"),
                ("Schwarzes Café", 52.5060, 13.3250, Food, "Artists' hangout open around the clock"),
                ("Savignyplatz", 52.5060, 13.3220, Walk, "Square full of old bookshops and restaurants"),
            ],
        ),
        theme(
            "mitte-nights",
            "🌙 Theme 6: Glittering Nights (Mitte)",
            [
                ("TV Tower at Alexanderplatz", 52.5208, 13.4094, View, "Night views from the highest point in Berlin"),
                ("Rosenthaler Straße", 52.5270, 13.4020, Walk, "Street of trendy shops and galleries"),
                ("Clärchens Ballhaus", 52.5265, 13.3965, Food, "Dinner in a ballroom over a hundred years old"),
                ("House of Small Wonder", 52.5240, 13.3920, Food, "Famous brunch and dinner among greenhouse decor"),
                ("Friedrichstadt-Palast", 52.5235, 13.3885, View, "Las Vegas style revue theatre"),
                ("Brandenburg Gate by Night", 52.5163, 13.3777, Walk, "The landmark is even grander once the lights come on"),
            ],
        ),
    ]
});

/// All themes in catalog order
#[must_use]
pub fn themes() -> &'static [Theme] {
    &CATALOG
}

/// Theme keys in catalog order
#[must_use]
pub fn list_themes() -> Vec<&'static str> {
    CATALOG.iter().map(|theme| theme.key).collect()
}

pub fn theme_by_key(key: &str) -> Result<&'static Theme> {
    CATALOG
        .iter()
        .find(|theme| theme.key == key)
        .ok_or_else(|| GuideError::not_found(format!("theme '{key}'")))
}

/// Ordered stops of a theme
pub fn get_stops(key: &str) -> Result<&'static [ItineraryStop]> {
    theme_by_key(key).map(|theme| theme.stops.as_slice())
}

/// Every stop name across the catalog, deduplicated and sorted
#[must_use]
pub fn place_names() -> Vec<String> {
    CATALOG
        .iter()
        .flat_map(|theme| theme.stops.iter().map(|stop| stop.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Outbound web search link for a stop
#[must_use]
pub fn search_link(stop: &ItineraryStop, city: &str) -> String {
    let query = format!("{} {}", stop.name, city)
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");
    format!("https://www.google.com/search?q={query}")
}
