//! GPS coordinate side channel collected while walking a GPS IFD.

use serde::Serialize;

/// Raw GPS fields as found in the GPS directory, before signing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsCoordinate {
    pub latitude: Option<f64>,
    pub latitude_ref: Option<char>,
    pub longitude: Option<f64>,
    pub longitude_ref: Option<char>,
}

/// Signed decimal degrees, north and east positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinate {
    /// Signed coordinates, or `None` unless both latitude and longitude exist.
    pub fn signed(&self) -> Option<Coordinates> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        let latitude = if self.latitude_ref == Some('S') { -lat } else { lat };
        let longitude = if self.longitude_ref == Some('W') { -lon } else { lon };
        Some(Coordinates { latitude, longitude })
    }

    /// Overlay the fields present in `other` onto `self`.
    pub fn merge(&mut self, other: GpsCoordinate) {
        if other.latitude.is_some() {
            self.latitude = other.latitude;
        }
        if other.latitude_ref.is_some() {
            self.latitude_ref = other.latitude_ref;
        }
        if other.longitude.is_some() {
            self.longitude = other.longitude;
        }
        if other.longitude_ref.is_some() {
            self.longitude_ref = other.longitude_ref;
        }
    }
}

/// Convert degrees/minutes/seconds rationals to decimal degrees.
/// A zero denominator counts as 0 for that component.
pub fn dms_to_decimal(dms: [(u32, u32); 3]) -> f64 {
    let part = |(num, den): (u32, u32)| {
        if den == 0 { 0.0 } else { num as f64 / den as f64 }
    };
    part(dms[0]) + part(dms[1]) / 60.0 + part(dms[2]) / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn dms_conversion() {
        let lat = dms_to_decimal([(40, 1), (26, 1), (468, 10)]);
        assert!(close(lat, 40.446_333_333_333_33));
        let lon = dms_to_decimal([(79, 1), (58, 1), (36, 1)]);
        assert!(close(lon, 79.976_666_666_666_67));
    }

    #[test]
    fn zero_denominator_counts_as_zero() {
        assert!(close(dms_to_decimal([(10, 1), (30, 0), (0, 0)]), 10.0));
    }

    #[test]
    fn dms_stable_for_equivalent_rationals() {
        let a = dms_to_decimal([(51, 1), (30, 1), (2673, 100)]);
        let b = dms_to_decimal([(102, 2), (300, 10), (26730, 1000)]);
        assert!(close(a, b));
    }

    #[test]
    fn south_and_west_are_negative() {
        let gps = GpsCoordinate {
            latitude: Some(33.5),
            latitude_ref: Some('S'),
            longitude: Some(70.25),
            longitude_ref: Some('W'),
        };
        let c = gps.signed().unwrap();
        assert_eq!(c.latitude, -33.5);
        assert_eq!(c.longitude, -70.25);
    }

    #[test]
    fn north_east_or_missing_ref_unchanged() {
        let gps = GpsCoordinate {
            latitude: Some(10.0),
            latitude_ref: Some('N'),
            longitude: Some(20.0),
            longitude_ref: None,
        };
        assert_eq!(
            gps.signed(),
            Some(Coordinates { latitude: 10.0, longitude: 20.0 })
        );
    }

    #[test]
    fn partial_record_yields_nothing() {
        let gps = GpsCoordinate {
            latitude: Some(10.0),
            latitude_ref: Some('N'),
            ..Default::default()
        };
        assert_eq!(gps.signed(), None);
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let mut gps = GpsCoordinate {
            latitude: Some(1.0),
            ..Default::default()
        };
        gps.merge(GpsCoordinate {
            longitude: Some(2.0),
            longitude_ref: Some('E'),
            ..Default::default()
        });
        assert_eq!(gps.latitude, Some(1.0));
        assert_eq!(gps.longitude, Some(2.0));
        assert_eq!(gps.longitude_ref, Some('E'));
    }
}
