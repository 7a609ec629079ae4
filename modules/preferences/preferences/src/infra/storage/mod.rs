pub mod entity;
pub mod graph;
pub mod mapper;
pub mod memory;
pub mod migrations;
pub mod repository;
pub mod retry;
pub mod sea_orm_graph;


pub use graph::{GraphStore, StoreError};
pub use memory::MemoryGraphStore;
pub use repository::GraphPreferenceRepository;
pub use retry::RetryPolicy;
pub use sea_orm_graph::SeaOrmGraphStore;
