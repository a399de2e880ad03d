use std::io::Cursor;

use log::debug;
use serde::{Deserialize, Serialize};

/// Where an analysed photo came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceContext {
    pub origin: Option<String>,
    pub captured_at: Option<String>,
    pub camera: Option<String>,
    pub gps_coordinates: Option<(f64, f64)>,
}

impl SourceContext {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::default()
        }
    }
}

pub struct ExifExtractor;

impl ExifExtractor {
    /// Never fails: images without readable EXIF yield an empty context.
    pub fn extract(bytes: &[u8], origin: Option<String>) -> SourceContext {
        let mut cursor = Cursor::new(bytes);

        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif_data) => Self::parse_exif(&exif_data, origin),
            Err(err) => {
                debug!("no EXIF data: {}", err);
                SourceContext {
                    origin,
                    ..SourceContext::default()
                }
            }
        }
    }

    fn parse_exif(exif: &exif::Exif, origin: Option<String>) -> SourceContext {
        let text = |tag| {
            exif.get_field(tag, exif::In::PRIMARY)
                .map(|f| f.display_value().to_string())
        };

        let camera = match (text(exif::Tag::Make), text(exif::Tag::Model)) {
            (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
            (make, model) => model.or(make),
        };

        SourceContext {
            origin,
            captured_at: text(exif::Tag::DateTimeOriginal).or_else(|| text(exif::Tag::DateTime)),
            camera,
            gps_coordinates: Self::extract_gps(exif),
        }
    }

    fn extract_gps(exif: &exif::Exif) -> Option<(f64, f64)> {
        let lat = exif.get_field(exif::Tag::GPSLatitude, exif::In::PRIMARY)?;
        let lat_ref = exif.get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY)?;
        let lon = exif.get_field(exif::Tag::GPSLongitude, exif::In::PRIMARY)?;
        let lon_ref = exif.get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY)?;

        let lat_val = Self::parse_gps_coordinate(&lat.display_value().to_string())?;
        let lon_val = Self::parse_gps_coordinate(&lon.display_value().to_string())?;

        let lat_sign = if lat_ref.display_value().to_string().contains('S') { -1.0 } else { 1.0 };
        let lon_sign = if lon_ref.display_value().to_string().contains('W') { -1.0 } else { 1.0 };

        Some((lat_val * lat_sign, lon_val * lon_sign))
    }

    // "51 deg 30 min 26.4 sec" style output from kamadak-exif
    fn parse_gps_coordinate(s: &str) -> Option<f64> {
        let numbers = s
            .split_whitespace()
            .filter_map(|part| part.trim_end_matches(['\'', '"']).parse::<f64>().ok())
            .collect::<Vec<_>>();

        match numbers.as_slice() {
            [degrees, minutes, seconds, ..] => Some(degrees + minutes / 60.0 + seconds / 3600.0),
            [degrees, minutes] => Some(degrees + minutes / 60.0),
            [degrees] => Some(*degrees),
            [] => None,
        }
    }
}
