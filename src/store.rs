// SPDX-License-Identifier: MIT OR Apache-2.0

//! Qdrant-backed vector store
//!
//! Owns one named collection: ensures it exists with the configured shape,
//! upserts vector records, and answers similarity queries. Ensuring is
//! non-destructive; the explicit recreate path is the only operation that
//! drops data.

use std::collections::HashMap;

use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config as VectorsConfigKind, Condition,
    CreateCollectionBuilder, Distance, Filter, ListValue, PointId, PointStruct, ScoredPoint,
    SearchPointsBuilder, Struct, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, error, info};

/// Default number of hits returned by a similarity search.
pub const DEFAULT_TOP_K: usize = 5;

/// Vector store failure. Collection mismatches get their own variant so a
/// wrong VECTOR_SIZE is distinguishable from a server being down.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid qdrant endpoint {url}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: QdrantError,
    },
    #[error(
        "collection '{name}' already exists with vector size {found_size} and distance \
         {found_distance}, but size {expected_size} and distance {expected_distance} are \
         configured; re-run with recreation enabled to drop and rebuild it"
    )]
    CollectionMismatch {
        name: String,
        expected_size: u64,
        found_size: u64,
        expected_distance: String,
        found_distance: String,
    },
    #[error("collection '{0}' reported no usable vector parameters")]
    MissingVectorParams(String),
    #[error(transparent)]
    Qdrant(#[from] QdrantError),
}

/// One record to upsert: numeric id, vector, and a JSON payload.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: serde_json::Map<String, JsonValue>,
}

/// One similarity-search result, best first.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: serde_json::Map<String, JsonValue>,
}

/// Shape and size of the connected collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStatus {
    pub name: String,
    pub points_count: u64,
    pub vector_size: u64,
    pub distance: String,
}

/// Client for one named Qdrant collection.
pub struct VectorStore {
    client: Qdrant,
    collection_name: String,
    vector_size: u64,
}

impl VectorStore {
    /// Build a client for the given endpoint URL. The gRPC channel is
    /// lazy, so transport problems surface on the first request rather
    /// than here.
    pub fn connect(
        url: impl Into<String>,
        collection_name: impl Into<String>,
        vector_size: u64,
    ) -> Result<Self, StoreError> {
        let url = url.into();
        let client = Qdrant::from_url(&url).build().map_err(|source| {
            error!(%url, %source, "failed to build qdrant client");
            StoreError::InvalidEndpoint { url, source }
        })?;

        Ok(Self {
            client,
            collection_name: collection_name.into(),
            vector_size,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn vector_size(&self) -> u64 {
        self.vector_size
    }

    /// Whether the collection currently exists.
    pub async fn collection_exists(&self) -> Result<bool, StoreError> {
        Ok(self.client.collection_exists(&self.collection_name).await?)
    }

    /// Ensure the collection exists with the configured shape. Returns true
    /// when it had to be created.
    ///
    /// An existing collection is validated, never replaced: a vector size or
    /// distance mismatch is an error. A transport failure during the
    /// existence check propagates instead of being read as "absent".
    pub async fn ensure_collection(&self) -> Result<bool, StoreError> {
        if self.collection_exists().await? {
            let (size, distance, points) = self.collection_shape().await?;
            if size != self.vector_size || distance != Distance::Cosine {
                error!(
                    collection = %self.collection_name,
                    expected_size = self.vector_size,
                    found_size = size,
                    found_distance = ?distance,
                    "existing collection does not match the configured shape"
                );
                return Err(StoreError::CollectionMismatch {
                    name: self.collection_name.clone(),
                    expected_size: self.vector_size,
                    found_size: size,
                    expected_distance: format!("{:?}", Distance::Cosine),
                    found_distance: format!("{distance:?}"),
                });
            }
            info!(collection = %self.collection_name, points, "reusing existing collection");
            return Ok(false);
        }

        self.create_collection().await?;
        Ok(true)
    }

    /// Drop the collection if present and create it fresh. Destroys all
    /// stored points; callers are expected to gate this behind an explicit
    /// flag.
    pub async fn recreate_collection(&self) -> Result<(), StoreError> {
        if self.collection_exists().await? {
            self.client.delete_collection(&self.collection_name).await?;
            info!(collection = %self.collection_name, "dropped existing collection");
        }
        self.create_collection().await
    }

    async fn create_collection(&self) -> Result<(), StoreError> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name)
                    .vectors_config(VectorParamsBuilder::new(self.vector_size, Distance::Cosine)),
            )
            .await
            .map_err(|source| {
                error!(collection = %self.collection_name, %source, "failed to create collection");
                StoreError::Qdrant(source)
            })?;
        info!(collection = %self.collection_name, size = self.vector_size, "collection created");
        Ok(())
    }

    /// Upsert records into the collection, waiting for them to be applied.
    pub async fn upsert_points(&self, records: Vec<VectorRecord>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let count = records.len();
        let points: Vec<PointStruct> = records.into_iter().map(point_from_record).collect();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .map_err(|source| {
                error!(collection = %self.collection_name, count, %source, "failed to upsert points");
                StoreError::Qdrant(source)
            })?;
        debug!(collection = %self.collection_name, count, "upserted points");
        Ok(count)
    }

    /// Similarity search, best hits first. The filter restricts candidates
    /// by payload; pass None for an unfiltered search.
    pub async fn search_vectors(
        &self,
        query_vector: Vec<f32>,
        top_k: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let mut request =
            SearchPointsBuilder::new(&self.collection_name, query_vector, top_k as u64)
                .with_payload(true);
        if let Some(filter) = filter {
            request = request.filter(filter);
        }

        let response = self.client.search_points(request).await.map_err(|source| {
            error!(collection = %self.collection_name, %source, "vector search failed");
            StoreError::Qdrant(source)
        })?;
        debug!(
            collection = %self.collection_name,
            hits = response.result.len(),
            "search complete"
        );

        Ok(response.result.into_iter().map(hit_from_scored).collect())
    }

    /// Report the collection's point count and vector shape.
    pub async fn collection_status(&self) -> Result<CollectionStatus, StoreError> {
        let (vector_size, distance, points_count) = self.collection_shape().await?;
        Ok(CollectionStatus {
            name: self.collection_name.clone(),
            points_count,
            vector_size,
            distance: format!("{distance:?}"),
        })
    }

    async fn collection_shape(&self) -> Result<(u64, Distance, u64), StoreError> {
        let info = self.client.collection_info(&self.collection_name).await?;
        let result = info
            .result
            .ok_or_else(|| StoreError::MissingVectorParams(self.collection_name.clone()))?;
        let points = result.points_count.unwrap_or(0);
        let params = result
            .config
            .as_ref()
            .and_then(|config| config.params.as_ref())
            .and_then(|params| params.vectors_config.as_ref())
            .and_then(|vectors| vectors.config.as_ref());
        match params {
            Some(VectorsConfigKind::Params(params)) => Ok((params.size, params.distance(), points)),
            _ => Err(StoreError::MissingVectorParams(self.collection_name.clone())),
        }
    }
}

/// Build an all-of filter from (field, value) pairs, matching each field as
/// a keyword.
pub fn keyword_filter<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Filter> {
    let conditions: Vec<Condition> = pairs
        .into_iter()
        .map(|(field, value)| Condition::matches(field, value.to_string()))
        .collect();
    if conditions.is_empty() {
        None
    } else {
        Some(Filter::must(conditions))
    }
}

fn point_from_record(record: VectorRecord) -> PointStruct {
    PointStruct {
        id: Some(record.id.into()),
        vectors: Some(record.vector.into()),
        payload: json_map_to_payload(record.payload),
    }
}

fn hit_from_scored(point: ScoredPoint) -> SearchHit {
    SearchHit {
        id: point.id.map(point_id_to_string).unwrap_or_default(),
        score: point.score,
        payload: payload_to_json(point.payload),
    }
}

fn point_id_to_string(id: PointId) -> String {
    match id.point_id_options {
        Some(PointIdOptions::Num(num)) => num.to_string(),
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        None => String::new(),
    }
}

fn json_map_to_payload(map: serde_json::Map<String, JsonValue>) -> HashMap<String, QdrantValue> {
    map.into_iter()
        .map(|(key, value)| (key, json_to_qdrant(value)))
        .collect()
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> serde_json::Map<String, JsonValue> {
    payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_to_json(value)))
        .collect()
}

fn json_to_qdrant(value: JsonValue) -> QdrantValue {
    let kind = match value {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(flag) => Kind::BoolValue(flag),
        JsonValue::Number(num) => match num.as_i64() {
            Some(int) => Kind::IntegerValue(int),
            None => Kind::DoubleValue(num.as_f64().unwrap_or(0.0)),
        },
        JsonValue::String(text) => Kind::StringValue(text),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        JsonValue::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant(value)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: QdrantValue) -> JsonValue {
    match value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(flag)) => JsonValue::Bool(flag),
        Some(Kind::IntegerValue(int)) => JsonValue::from(int),
        Some(Kind::DoubleValue(num)) => serde_json::Number::from_f64(num)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(text)) => JsonValue::String(text),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => JsonValue::Object(
            fields
                .fields
                .into_iter()
                .map(|(key, value)| (key, qdrant_to_json(value)))
                .collect(),
        ),
    }
}
