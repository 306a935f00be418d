pub mod api;
pub mod csv_export;
pub mod csv_import;
pub mod db;
pub mod error;
pub mod models;
pub mod sets;
pub mod stats;
pub mod store;
pub mod undo;

// Re-export commonly used items
pub use api::{PokeApiClient, PokemonLookup};
pub use csv_import::ImportReport;
pub use error::{AppError, AppResult};
pub use models::{Card, Sale, SaleRecord};
pub use stats::CollectionStats;
pub use undo::{Operation, UndoRedoLog};
