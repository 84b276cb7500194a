//! Country names the correction pipeline treats specially.

use hashbrown::HashSet;
use once_cell::sync::Lazy;

pub const ENGLAND: &str = "England";
pub const SCOTLAND: &str = "Scotland";
pub const WALES: &str = "Wales";
pub const NORTHERN_IRELAND: &str = "Northern Ireland";
pub const UNITED_KINGDOM: &str = "United Kingdom";
pub const ISLE_OF_MAN: &str = "Isle of Man";
pub const CHANNEL_ISLANDS: &str = "Channel Islands";
pub const IRELAND: &str = "Ireland";
pub const UNITED_STATES: &str = "United States";
pub const CANADA: &str = "Canada";
pub const AUSTRALIA: &str = "Australia";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Constituent countries that may follow a "UK"/"GB" country field
const UK_EXPANSIONS: &[&str] = &[ENGLAND, SCOTLAND, WALES];

const UNITED_KINGDOM_PARTS: &[&str] = &[
    ENGLAND,
    SCOTLAND,
    WALES,
    NORTHERN_IRELAND,
    UNITED_KINGDOM,
    ISLE_OF_MAN,
    CHANNEL_ISLANDS,
];

/// Countries with census coverage in their own right
const CENSUS_COUNTRIES: &[&str] = &[IRELAND, UNITED_STATES, CANADA];

/// Countries a census search recognises. Anything else is "unknown" and may
/// be matched against any census when the caller allows it.
const KNOWN_COUNTRIES: &[&str] = &[
    ENGLAND, SCOTLAND, WALES, NORTHERN_IRELAND, UNITED_KINGDOM, ISLE_OF_MAN,
    CHANNEL_ISLANDS, "Jersey", "Guernsey", "Alderney", "Sark",
    "Afghanistan", "Albania", "Algeria", "Andorra", "Angola", "Antigua and Barbuda",
    "Argentina", "Armenia", AUSTRALIA, "Austria", "Azerbaijan", "Bahamas", "Bahrain",
    "Bangladesh", "Barbados", "Belarus", "Belgium", "Belize", "Benin", "Bermuda",
    "Bhutan", "Bolivia", "Bosnia and Herzegovina", "Botswana", "Brazil", "Brunei",
    "Bulgaria", "Burkina Faso", "Burma", "Burundi", "Cambodia", "Cameroon", CANADA,
    "Cape Verde", "Central African Republic", "Chad", "Chile", "China", "Colombia",
    "Comoros", "Congo", "Costa Rica", "Croatia", "Cuba", "Cyprus", "Czech Republic",
    "Czechoslovakia", "Denmark", "Djibouti", "Dominica", "Dominican Republic",
    "East Timor", "Ecuador", "Egypt", "El Salvador", "Equatorial Guinea", "Eritrea",
    "Estonia", "Ethiopia", "Falkland Islands", "Fiji", "Finland", "France", "Gabon",
    "Gambia", "Georgia", "Germany", "Ghana", "Gibraltar", "Greece", "Greenland",
    "Grenada", "Guatemala", "Guinea", "Guinea-Bissau", "Guyana", "Haiti", "Honduras",
    "Hong Kong", "Hungary", "Iceland", "India", "Indonesia", "Iran", "Iraq", IRELAND,
    "Israel", "Italy", "Ivory Coast", "Jamaica", "Japan", "Jordan", "Kazakhstan",
    "Kenya", "Kiribati", "Korea", "Kosovo", "Kuwait", "Kyrgyzstan", "Laos", "Latvia",
    "Lebanon", "Lesotho", "Liberia", "Libya", "Liechtenstein", "Lithuania",
    "Luxembourg", "Macedonia", "Madagascar", "Malawi", "Malaysia", "Maldives", "Mali",
    "Malta", "Marshall Islands", "Mauritania", "Mauritius", "Mexico", "Micronesia",
    "Moldova", "Monaco", "Mongolia", "Montenegro", "Morocco", "Mozambique", "Namibia",
    "Nauru", "Nepal", "Netherlands", "New Zealand", "Nicaragua", "Niger", "Nigeria",
    "North Korea", "Norway", "Oman", "Pakistan", "Palau", "Palestine", "Panama",
    "Papua New Guinea", "Paraguay", "Peru", "Philippines", "Poland", "Portugal",
    "Prussia", "Puerto Rico", "Qatar", "Romania", "Russia", "Rwanda",
    "Saint Helena", "Saint Kitts and Nevis", "Saint Lucia",
    "Saint Vincent and the Grenadines", "Samoa", "San Marino",
    "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Serbia", "Seychelles",
    "Sierra Leone", "Singapore", "Slovakia", "Slovenia", "Solomon Islands",
    "Somalia", "South Africa", "South Korea", "South Sudan", "Spain", "Sri Lanka",
    "Sudan", "Suriname", "Swaziland", "Sweden", "Switzerland", "Syria", "Taiwan",
    "Tajikistan", "Tanzania", "Thailand", "Togo", "Tonga", "Trinidad and Tobago",
    "Tunisia", "Turkey", "Turkmenistan", "Tuvalu", "Uganda", "Ukraine",
    "United Arab Emirates", UNITED_STATES, "Uruguay", "USSR", "Uzbekistan",
    "Vanuatu", "Vatican City", "Venezuela", "Vietnam", "West Indies", "Yemen",
    "Yugoslavia", "Zambia", "Zimbabwe",
];

static KNOWN: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KNOWN_COUNTRIES.iter().copied().collect());

pub fn is_known_country(country: &str) -> bool {
    KNOWN.contains(country)
}

pub fn is_uk_abbreviation(country: &str) -> bool {
    country == "UK" || country == "GB"
}

pub fn is_uk_expansion(region: &str) -> bool {
    UK_EXPANSIONS.contains(&region)
}

pub fn is_united_kingdom(country: &str) -> bool {
    UNITED_KINGDOM_PARTS.contains(&country)
}

pub fn is_england_wales(country: &str) -> bool {
    country == ENGLAND || country == WALES
}

pub fn is_census_country(country: &str) -> bool {
    is_united_kingdom(country) || CENSUS_COUNTRIES.contains(&country)
}

/// Census system a country belongs to
pub fn census_country(country: &str) -> &str {
    if is_united_kingdom(country) {
        UNITED_KINGDOM
    } else if CENSUS_COUNTRIES.contains(&country) {
        country
    } else {
        UNKNOWN_COUNTRY
    }
}

/// Whether a record in `country` can be matched to a census taken in `census`.
///
/// The UK census covers all its parts, and England and Wales share one.
/// Scotland only matches itself. With `include_unknown` a country outside the
/// known list matches any census.
pub fn census_country_matches(country: &str, census: &str, include_unknown: bool) -> bool {
    if country == census {
        return true;
    }
    if include_unknown && !is_known_country(country) {
        return true;
    }
    if country == UNITED_KINGDOM && is_united_kingdom(census) {
        return true;
    }
    if census == UNITED_KINGDOM && is_united_kingdom(country) {
        return true;
    }
    if country == SCOTLAND || census == SCOTLAND {
        return false;
    }
    if is_england_wales(country) && is_england_wales(census) {
        return true;
    }
    is_united_kingdom(country) && is_united_kingdom(census)
}
