//! Decimal-degree to degrees-minutes-seconds conversion and map place links

use crate::record::Coordinates;
use std::fmt;

const MAP_PLACE_BASE: &str = "https://www.google.com/maps/place/";

/// One coordinate in degrees, minutes, seconds with its hemisphere letter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    /// Truncated to hundredths
    pub seconds: f64,
    /// N, S, E or W
    pub direction: char,
}

impl Dms {
    /// Convert a decimal-degree value
    ///
    /// Minutes and seconds are truncated, not rounded. A tiny epsilon is
    /// added before splitting so values like 10.5 yield 30' rather than 29'59.99".
    pub fn from_decimal(value: f64, is_longitude: bool) -> Self {
        let direction = match (value < 0.0, is_longitude) {
            (true, true) => 'W',
            (true, false) => 'S',
            (false, true) => 'E',
            (false, false) => 'N',
        };

        let abs = value.abs();
        let degrees = abs.trunc() as u32;
        let shifted = abs + 1e-9;
        let minutes = (shifted.fract() * 60.0).trunc() as u32;
        let seconds = ((shifted * 60.0).fract() * 6000.0).trunc() / 100.0;

        Self {
            degrees,
            minutes,
            seconds,
            direction,
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}°{}'{}\"{}",
            self.degrees, self.minutes, self.seconds, self.direction
        )
    }
}

/// Map place link for a position
///
/// # Examples
///
/// ```
/// use zgal_gallery::geo::map_link;
/// use zgal_gallery::record::Coordinates;
///
/// let link = map_link(Coordinates { latitude: 37.737415, longitude: -7.8236673 });
/// assert_eq!(
///     link,
///     "https://www.google.com/maps/place/37°44'14.69\"N+7°49'25.2\"W/@37.737415,-7.8236673,1000m",
/// );
/// ```
pub fn map_link(position: Coordinates) -> String {
    let lat = Dms::from_decimal(position.latitude, false);
    let lon = Dms::from_decimal(position.longitude, true);
    format!(
        "{}{}+{}/@{},{},1000m",
        MAP_PLACE_BASE, lat, lon, position.latitude, position.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_southern_and_eastern_hemispheres() {
        let lat = Dms::from_decimal(-33.8688, false);
        assert_eq!((lat.degrees, lat.minutes, lat.seconds, lat.direction), (33, 52, 7.68, 'S'));

        let lon = Dms::from_decimal(151.2093, true);
        assert_eq!((lon.degrees, lon.minutes, lon.seconds, lon.direction), (151, 12, 33.48, 'E'));
    }

    #[test]
    fn test_half_degree_does_not_underflow_minutes() {
        let dms = Dms::from_decimal(10.5, true);
        assert_eq!(dms.minutes, 30);
        assert_eq!(dms.to_string(), "10°30'0\"E");
    }

    #[test]
    fn test_link_contains_decimal_anchor() {
        let link = map_link(Coordinates {
            latitude: -33.8688,
            longitude: 151.2093,
        });
        assert!(link.starts_with(MAP_PLACE_BASE));
        assert!(link.ends_with("/@-33.8688,151.2093,1000m"));
        assert!(link.contains("33°52'7.68\"S+151°12'33.48\"E"));
    }
}
