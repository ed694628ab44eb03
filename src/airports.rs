//! Read-only ICAO -> airport name lookup.
//!
//! Decoders use this to enrich origin/destination codes with a display
//! name. The table covers the airports that show up in live traffic; a
//! missing entry simply leaves the name field unset.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static AIRPORTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("CYUL", "Montreal-Trudeau"),
        ("CYVR", "Vancouver International"),
        ("CYYZ", "Toronto Pearson"),
        ("EDDF", "Frankfurt am Main"),
        ("EDDM", "Munich"),
        ("EFHK", "Helsinki-Vantaa"),
        ("EGKK", "London Gatwick"),
        ("EGLL", "London Heathrow"),
        ("EHAM", "Amsterdam Schiphol"),
        ("EIDW", "Dublin"),
        ("EKCH", "Copenhagen Kastrup"),
        ("ENGM", "Oslo Gardermoen"),
        ("ESSA", "Stockholm Arlanda"),
        ("FAOR", "Johannesburg O.R. Tambo"),
        ("FSIA", "Seychelles International"),
        ("KATL", "Atlanta Hartsfield-Jackson"),
        ("KBOS", "Boston Logan"),
        ("KDEN", "Denver International"),
        ("KDFW", "Dallas/Fort Worth"),
        ("KEWR", "Newark Liberty"),
        ("KIAD", "Washington Dulles"),
        ("KJFK", "New York JFK"),
        ("KLAS", "Las Vegas Harry Reid"),
        ("KLAX", "Los Angeles International"),
        ("KMIA", "Miami International"),
        ("KORD", "Chicago O'Hare"),
        ("KSEA", "Seattle-Tacoma"),
        ("KSFO", "San Francisco International"),
        ("KSJC", "San Jose Mineta"),
        ("KSLC", "Salt Lake City"),
        ("LEBL", "Barcelona El Prat"),
        ("LEMD", "Madrid Barajas"),
        ("LFPG", "Paris Charles de Gaulle"),
        ("LGAV", "Athens Eleftherios Venizelos"),
        ("LIRF", "Rome Fiumicino"),
        ("LOWW", "Vienna Schwechat"),
        ("LSZH", "Zurich"),
        ("LTFM", "Istanbul"),
        ("MMMX", "Mexico City Benito Juarez"),
        ("MMUN", "Cancun International"),
        ("OBBI", "Bahrain International"),
        ("OMDB", "Dubai International"),
        ("OTHH", "Doha Hamad"),
        ("RJTT", "Tokyo Haneda"),
        ("RKSI", "Seoul Incheon"),
        ("SBGR", "Sao Paulo Guarulhos"),
        ("UDYZ", "Yerevan Zvartnots"),
        ("ULLI", "St Petersburg Pulkovo"),
        ("UNNT", "Novosibirsk Tolmachevo"),
        ("UUDD", "Moscow Domodedovo"),
        ("UUEE", "Moscow Sheremetyevo"),
        ("UWKD", "Kazan International"),
        ("VABB", "Mumbai Chhatrapati Shivaji"),
        ("VHHH", "Hong Kong International"),
        ("VIDP", "Delhi Indira Gandhi"),
        ("VTBS", "Bangkok Suvarnabhumi"),
        ("VTSP", "Phuket International"),
        ("WIII", "Jakarta Soekarno-Hatta"),
        ("WMKK", "Kuala Lumpur International"),
        ("WSSS", "Singapore Changi"),
        ("YMML", "Melbourne Tullamarine"),
        ("YSSY", "Sydney Kingsford Smith"),
        ("ZBAA", "Beijing Capital"),
        ("ZSPD", "Shanghai Pudong"),
    ])
});

/// Display name for an ICAO airport code, if known.
pub fn name_of(icao: &str) -> Option<&'static str> {
    AIRPORTS.get(icao).copied()
}
