pub mod fetcher;
pub mod generator;
pub mod util;

pub use fetcher::*;
pub use generator::*;
pub use util::*;

pub use tokio_util::sync::CancellationToken;
