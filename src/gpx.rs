//! GPX file generation from saved rides.
//!
//! Generates GPX 1.1 XML: one track named after the ride, one segment, one
//! point per recorded coordinate with its index-aligned elevation.

use crate::ride::Ride;

/// MIME type for exported files.
pub const GPX_MIME_TYPE: &str = "application/gpx+xml";

/// An exported ride ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct GpxFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl GpxFile {
    pub fn from_ride(ride: &Ride) -> Self {
        Self {
            filename: gpx_filename(ride),
            mime_type: GPX_MIME_TYPE,
            contents: to_gpx(ride),
        }
    }
}

/// Download name for a ride: `ride-<id>.gpx`.
pub fn gpx_filename(ride: &Ride) -> String {
    format!("ride-{}.gpx", ride.id)
}

/// Serialize a ride as a GPX 1.1 document.
///
/// Coordinates and elevations use shortest round-trip formatting, so parsing
/// the output recovers the exact values. Missing elevations are written as 0.
pub fn to_gpx(ride: &Ride) -> String {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(
        r#"<gpx version="1.1" creator="CycleTrack" xmlns="http://www.topografix.com/GPX/1/1">"#,
    );
    gpx.push('\n');

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>Ride {}</name>\n", ride.id));
    gpx.push_str("    <trkseg>\n");

    for (i, coord) in ride.coords.iter().enumerate() {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{}" lon="{}"><ele>{}</ele></trkpt>"#,
            coord.latitude,
            coord.longitude,
            ride.elevation_at(i)
        ));
        gpx.push('\n');
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx
}
