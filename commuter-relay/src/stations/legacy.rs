//! Fixed station name table used by older device firmware.
//!
//! Firmware that predates configurable favorites sends display names
//! instead of iRail ids. Only these five stations were ever selectable.

const LEGACY_STATIONS: [(&str, &str); 5] = [
    ("Brussels-Central", "BE.NMBS.008813003"),
    ("Antwerp-Central", "BE.NMBS.008821006"),
    ("Ghent-Sint-Pieters", "BE.NMBS.008892007"),
    ("Liège-Guillemins", "BE.NMBS.008841004"),
    ("Leuven", "BE.NMBS.008833001"),
];

/// Resolve a legacy display name to its iRail id. Matching is exact.
pub fn legacy_station_id(name: &str) -> Option<&'static str> {
    LEGACY_STATIONS
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names() {
        assert_eq!(legacy_station_id("Brussels-Central"), Some("BE.NMBS.008813003"));
        assert_eq!(legacy_station_id("Liège-Guillemins"), Some("BE.NMBS.008841004"));
        assert_eq!(legacy_station_id("Leuven"), Some("BE.NMBS.008833001"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(legacy_station_id("Namur"), None);
        assert_eq!(legacy_station_id("leuven"), None);
        assert_eq!(legacy_station_id(""), None);
    }
}
