//! passage-vector
//!
//! Dense side of retrieval: a LanceDB-backed `VectorStore` (cosine distance)
//! and the `VectorRetriever` that embeds a query, asks the store for nearest
//! neighbours and turns distances into similarities.

pub mod retriever;
pub mod schema;
pub mod store;
pub mod table;

pub use retriever::VectorRetriever;
pub use store::LanceVectorStore;
