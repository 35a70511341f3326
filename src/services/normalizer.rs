//! Maps geocoder address components onto the fixed output schema

use crate::types::{AddressComponent, NormalizedAddress};

/// Normalize a component list.
///
/// Each component is assigned to the first field whose tag it carries, in the
/// order below. Unrecognized components are skipped and absent tags leave
/// their field empty.
pub fn normalize(components: &[AddressComponent]) -> NormalizedAddress {
    let mut out = NormalizedAddress::default();

    for component in components {
        if component.has_type("street_number") {
            out.street_number = component.long_name.clone();
        } else if component.has_type("route") {
            out.street_name = component.short_name.to_uppercase();
        } else if component.has_type("locality") {
            out.city = component.long_name.to_uppercase();
        } else if component.has_type("postal_code") {
            out.zipcode = component.long_name.clone();
        } else if component.has_type("administrative_area_level_2") {
            out.county = component.short_name.to_uppercase();
        } else if component.has_type("administrative_area_level_1") {
            out.state = component.short_name.to_uppercase();
        } else if component.has_type("country") {
            out.country = component.short_name.to_uppercase();
        } else if component.has_type("subpremise") {
            out.subpremise = format!("#{}", component.long_name.to_uppercase());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(long_name: &str, short_name: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: long_name.into(),
            short_name: short_name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn maps_every_recognized_tag() {
        let components = vec![
            component("1600", "1600", &["street_number"]),
            component("Amphitheatre Parkway", "Amphitheatre Pkwy", &["route"]),
            component("Mountain View", "Mountain View", &["locality", "political"]),
            component("Santa Clara County", "Santa Clara County", &["administrative_area_level_2", "political"]),
            component("California", "CA", &["administrative_area_level_1", "political"]),
            component("United States", "US", &["country", "political"]),
            component("94043", "94043", &["postal_code"]),
            component("4b", "4b", &["subpremise"]),
        ];

        let out = normalize(&components);

        assert_eq!(out.street_number, "1600");
        assert_eq!(out.street_name, "AMPHITHEATRE PKWY");
        assert_eq!(out.city, "MOUNTAIN VIEW");
        assert_eq!(out.county, "SANTA CLARA COUNTY");
        assert_eq!(out.state, "CA");
        assert_eq!(out.country, "US");
        assert_eq!(out.zipcode, "94043");
        assert_eq!(out.subpremise, "#4B");
    }

    #[test]
    fn unknown_types_are_ignored() {
        let components = vec![
            component("Downtown", "Downtown", &["neighborhood", "political"]),
            component("Midtown", "Midtown", &["sublocality", "political"]),
            component("Main St", "Main St", &["route"]),
        ];

        let out = normalize(&components);

        assert_eq!(
            out,
            NormalizedAddress {
                street_name: "MAIN ST".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn missing_types_leave_fields_empty() {
        let out = normalize(&[]);
        assert_eq!(out, NormalizedAddress::default());
        assert_eq!(out.address_line_1(), "");
    }

    #[test]
    fn street_number_is_not_upper_cased() {
        let out = normalize(&[component("12a", "12a", &["street_number"])]);
        assert_eq!(out.street_number, "12a");
    }

    #[test]
    fn first_matching_tag_wins_within_a_component() {
        // A component tagged both locality and postal_code is treated as locality
        let out = normalize(&[component("Lakeside", "Lakeside", &["postal_code", "locality"])]);
        assert_eq!(out.city, "LAKESIDE");
        assert_eq!(out.zipcode, "");
    }

    #[test]
    fn later_component_of_same_type_overwrites_earlier() {
        let out = normalize(&[
            component("Lakeside", "Lakeside", &["locality", "political"]),
            component("Riverton", "Riverton", &["locality", "political"]),
        ]);
        assert_eq!(out.city, "RIVERTON");
    }
}
