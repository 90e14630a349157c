pub mod ids;
pub mod model;
pub mod query;
pub mod snapshot;

pub use ids::*;
pub use model::*;
pub use query::*;
pub use snapshot::*;
