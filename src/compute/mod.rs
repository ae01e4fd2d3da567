//! Pure numeric helpers: projection, radii and labeling agreement.

pub mod labels;
pub mod projection;

pub use labels::{adjusted_rand_index, rand_index};
pub use projection::{ZoomRadii, lat_y, lng_x, project, unproject, x_lng, y_lat, zoom_radius};
