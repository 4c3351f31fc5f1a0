use shared::domain::{Coords, Place};

use crate::Category;

fn place(name: &str, summary: &str, lat: f64, lon: f64, url: Option<&str>) -> Place {
    Place {
        name: name.to_string(),
        summary: summary.to_string(),
        coords: Coords::new(lat, lon),
        url: url.map(str::to_string),
    }
}

pub(crate) fn categories() -> Vec<Category> {
    vec![
        Category {
            label: "🌌 Ancient".to_string(),
            places: vec![
                place(
                    "Giza Pyramids",
                    "The Great Pyramids at the Giza Plateau, Egypt",
                    29.9792,
                    31.1342,
                    Some("https://en.wikipedia.org/wiki/Great_Pyramid_of_Giza"),
                ),
                place(
                    "Stonehenge",
                    "Prehistoric monument in England",
                    51.1789,
                    -1.8262,
                    Some("https://en.wikipedia.org/wiki/Stonehenge"),
                ),
                place(
                    "Göbekli Tepe",
                    "Ancient human construction.",
                    37.2231,
                    38.9226,
                    Some("https://en.wikipedia.org/wiki/G%C3%B6bekli_Tepe"),
                ),
            ],
        },
        Category {
            label: "🧿 Esoteric".to_string(),
            places: vec![
                place(
                    "Mount Shasta",
                    "Sacred and legendary mountain.",
                    41.4091,
                    -122.1946,
                    Some("https://en.wikipedia.org/wiki/Mount_Shasta"),
                ),
                place(
                    "Easter Island",
                    "Famous for its moai statues",
                    -27.1127,
                    -109.3497,
                    Some("https://en.wikipedia.org/wiki/Easter_Island"),
                ),
                place(
                    "Bermuda Triangle",
                    "Region with mysterious disappearances",
                    25.0,
                    -71.0,
                    Some("https://en.wikipedia.org/wiki/Bermuda_Triangle"),
                ),
            ],
        },
        Category {
            label: "🔮 Surreal".to_string(),
            places: vec![
                place(
                    "Socotra Island",
                    "Mysterious and forgotten ancient hub of trade.",
                    12.4634,
                    54.0046,
                    Some("https://en.wikipedia.org/wiki/Socotra_island"),
                ),
                place(
                    "Salar de Uyuni",
                    "World's largest salt flat.",
                    -20.1338,
                    -67.4891,
                    Some("https://en.wikipedia.org/wiki/Salar_de_Uyuni"),
                ),
                place(
                    "Coral Castle",
                    "Mysterious, near-megalithic, stone structure. Built by one man. Twice.",
                    25.5003,
                    -80.445,
                    Some("https://en.wikipedia.org/wiki/Coral_Castle"),
                ),
                place(
                    "Ringing Rocks",
                    "Rocks that resonate like a bell when struck.",
                    40.5652,
                    -75.0997,
                    Some("https://en.wikipedia.org/wiki/Ringing_Rocks"),
                ),
                place(
                    "McMurdo Dry Valleys",
                    "A 1,500sq/mi section of Antarctica that remains snow and ice-free year round.",
                    77.4666,
                    162.5166,
                    Some("https://en.wikipedia.org/wiki/McMurdo_Dry_Valleys"),
                ),
                place(
                    "Mt. Erebus",
                    "Second tallest volcano in Antarctica; Also an active volcano home to a lavalake that is present year-round.",
                    -77.5291,
                    167.1522,
                    Some("https://en.wikipedia.org/wiki/Mount_Erebus"),
                ),
            ],
        },
        Category {
            label: "💫 The Veil Thins..".to_string(),
            places: vec![
                place(
                    "Area 51",
                    "Mysterious US Air Force facility",
                    37.235,
                    -115.8111,
                    Some("https://en.wikipedia.org/wiki/Area_51"),
                ),
                place(
                    "Sedona Vortices",
                    "Rumored Energetic vortices that exist throughout Sedona.",
                    34.8697,
                    -111.761,
                    None,
                ),
                place(
                    "Sedona Airport",
                    "Small airport with stunning views",
                    34.8516,
                    -111.79,
                    Some("https://en.wikipedia.org/wiki/Sedona_Airport"),
                ),
                place(
                    "Denver International Airport",
                    "Largest, and by far the strangest, airport in North America",
                    39.8617,
                    -104.6731,
                    Some("https://en.wikipedia.org/wiki/Denver_International_Airport"),
                ),
                place(
                    "Roswell UFO Incident",
                    "Site of famous UFO incident.",
                    33.9504,
                    -105.3145,
                    Some("https://en.wikipedia.org/wiki/Roswell_UFO_incident"),
                ),
                place(
                    "The Tunguska Event",
                    "Pre-nuclear explosion measuring between 3 and 50 megatons.",
                    60.903,
                    101.9097,
                    Some("https://en.wikipedia.org/wiki/Tunguska_event"),
                ),
            ],
        },
    ]
}
