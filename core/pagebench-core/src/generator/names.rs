//! 합성 이름 생성기 (회사명, 도시명, 도로명 주소)
//!
//! Fixed word lists drawn with a caller-supplied RNG, so the same seed always
//! yields the same names.

use rand::Rng;
use rand::seq::SliceRandom;

const LAST_NAMES: &[&str] = &[
    "Abbott", "Adams", "Bailey", "Baker", "Barton", "Becker", "Bernier", "Boyle", "Brown",
    "Carroll", "Carter", "Cole", "Collins", "Cormier", "Cronin", "Daniel", "Davis", "Dickens",
    "Douglas", "Durgan", "Ebert", "Emmerich", "Feeney", "Fisher", "Gibson", "Gleason", "Grant",
    "Hahn", "Harris", "Hayes", "Hill", "Howell", "Jacobs", "Jenkins", "Johns", "Johnson",
    "Johnston", "Jones", "Keller", "Kemmer", "Kirlin", "Koch", "Kuhn", "Larson", "Lemke",
    "Lowe", "Marks", "Mayer", "Miller", "Moore", "Morris", "Nolan", "Olson", "Parker",
    "Pollich", "Price", "Quigley", "Reilly", "Ritchie", "Robel", "Rogers", "Runolfsson",
    "Schmidt", "Smith", "Stark", "Thompson", "Torp", "Turner", "Walker", "Ward", "Weber",
    "White", "Williamson", "Wolf", "Young", "Zieme",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Inc", "and Sons", "LLC", "Group", "Corp", "Corporation", "Holdings", "Partners",
];

const FIRST_NAMES: &[&str] = &[
    "Alden", "Ashton", "Bridge", "Camden", "Clare", "Dale", "Eden", "Elm", "Fair", "Glen",
    "Green", "Hamp", "Harbor", "Kings", "Lake", "Linden", "Maple", "Mill", "New", "Oak",
    "Pine", "Ridge", "River", "Rock", "Spring", "Stone", "Sun", "Water", "West", "Wood",
];

const CITY_PREFIXES: &[&str] = &["North", "East", "West", "South", "New", "Lake", "Port"];

const CITY_SUFFIXES: &[&str] = &[
    "town", "ton", "land", "ville", "berg", "burgh", "borough", "bury", "view", "port",
    "mouth", "stad", "furt", "chester", "fort", "haven", "side", "shire",
];

const STREET_SUFFIXES: &[&str] = &[
    "Street", "Avenue", "Road", "Lane", "Drive", "Court", "Place", "Way", "Boulevard",
    "Parkway", "Terrace", "Square",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    // word lists are non-empty constants
    words.choose(rng).copied().unwrap_or_default()
}

/// Company-style customer name, e.g. `Johnson LLC`, `Koch - Turner`,
/// `Hayes, Lowe and Price`.
pub fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.gen_range(0..3) {
        0 => format!("{} {}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES)),
        1 => format!("{} - {}", pick(rng, LAST_NAMES), pick(rng, LAST_NAMES)),
        _ => format!(
            "{}, {} and {}",
            pick(rng, LAST_NAMES),
            pick(rng, LAST_NAMES),
            pick(rng, LAST_NAMES)
        ),
    }
}

/// City name, e.g. `North Oakville`, `Stonehaven`.
pub fn city_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let stem = if rng.gen_bool(0.5) {
        pick(rng, FIRST_NAMES)
    } else {
        pick(rng, LAST_NAMES)
    };
    let suffix = pick(rng, CITY_SUFFIXES);
    if rng.gen_ratio(1, 4) {
        format!("{} {stem}{suffix}", pick(rng, CITY_PREFIXES))
    } else {
        format!("{stem}{suffix}")
    }
}

/// Street address, e.g. `4821 Gleason Lane`.
pub fn street_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number: u32 = rng.gen_range(1..10_000);
    format!(
        "{number} {} {}",
        pick(rng, LAST_NAMES),
        pick(rng, STREET_SUFFIXES)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn same_seed_same_names() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(company_name(&mut a), company_name(&mut b));
            assert_eq!(city_name(&mut a), city_name(&mut b));
            assert_eq!(street_address(&mut a), street_address(&mut b));
        }
    }

    #[test]
    fn company_names_hit_common_filters() {
        let mut rng = StdRng::seed_from_u64(1);
        let names: Vec<String> = (0..2_000).map(|_| company_name(&mut rng)).collect();
        assert!(names.iter().any(|n| n.to_lowercase().contains("corp")));
        assert!(names.iter().any(|n| n.to_lowercase().contains("john")));
        assert!(names.iter().all(|n| !n.is_empty() && n.is_ascii()));
    }

    #[test]
    fn street_starts_with_number() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let street = street_address(&mut rng);
            let number = street.split(' ').next().unwrap();
            assert!(number.parse::<u32>().is_ok(), "{street}");
        }
    }
}
