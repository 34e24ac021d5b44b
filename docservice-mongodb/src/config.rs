//! Connection settings for the MongoDB backend.

use serde::Deserialize;

/// Settings needed to open a [`MongoDbStore`](crate::MongoDbStore).
///
/// Deserializes from camelCase keys, so it can be read straight out of an
/// application settings file:
///
/// ```json
/// { "connectionString": "mongodb://localhost:27017", "database": "helpdesk" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoDbConfig {
    pub connection_string: String,
    pub database: String,
}
