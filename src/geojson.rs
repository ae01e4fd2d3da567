//! GeoJSON rendering of cluster records.
//!
//! Each record becomes a `Point` feature whose properties mirror what map
//! clients expect from a cluster source: `cluster`, `cluster_id` and
//! `point_count`.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "geojson")]
//! # {
//! use geocluster::geojson::to_feature_collection;
//! use geocluster_types::{ClusterRecord, PointCount};
//!
//! let records = vec![ClusterRecord::new(69, 2.35, 48.85, PointCount::Aggregated(3))];
//! let json = to_feature_collection(&records).to_string();
//! assert!(json.contains("\"point_count\":3"));
//! # }
//! ```

use geocluster_types::ClusterRecord;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// One `Point` feature per record, keyed by the record id.
pub fn to_feature(record: &ClusterRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("cluster".to_string(), record.is_cluster().into());
    properties.insert("cluster_id".to_string(), record.id.into());
    properties.insert("point_count".to_string(), record.weight().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![record.x, record.y]))),
        id: Some(Id::Number(record.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn to_feature_collection(records: &[ClusterRecord]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: records.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}
