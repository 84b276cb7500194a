//! Depth-bounded ordering and equality of places.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::models::{Level, Place};
use crate::normalize::text::NumericKey;

/// Order `a` and `b` level by level, stopping below `depth`.
///
/// Country, region and sub-region compare ordinally. Address and place name
/// compare with any leading house number taken out and compared numerically
/// after the remaining text.
pub fn compare(a: &Place, b: &Place, depth: Level) -> Ordering {
    let (ha, hb) = (a.hierarchy(), b.hierarchy());
    let mut ord = ha.country.cmp(&hb.country);
    if depth > Level::Country {
        ord = ord.then_with(|| ha.region.cmp(&hb.region));
    }
    if depth > Level::Region {
        ord = ord.then_with(|| ha.sub_region.cmp(&hb.sub_region));
    }
    if depth > Level::SubRegion {
        ord = ord.then_with(|| NumericKey::new(&ha.address).cmp(&NumericKey::new(&hb.address)));
    }
    if depth > Level::Address {
        ord = ord.then_with(|| {
            NumericKey::new(&ha.place_name).cmp(&NumericKey::new(&hb.place_name))
        });
    }
    ord
}

pub fn equals(a: &Place, b: &Place, depth: Level) -> bool {
    compare(a, b, depth) == Ordering::Equal
}

impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        equals(self, other, Level::Place)
    }
}

impl Eq for Place {}

impl Ord for Place {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other, Level::Place)
    }
}

impl PartialOrd for Place {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Place {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let h = self.hierarchy();
        h.country.hash(state);
        h.region.hash(state);
        h.sub_region.hash(state);
        NumericKey::new(&h.address).hash(state);
        NumericKey::new(&h.place_name).hash(state);
    }
}
