//! Price data: provider trait, alignment, caching, CSV import, synthetic doubles.

pub mod align;
pub mod cache;
pub mod csv_dir;
pub mod provider;
pub mod synthetic;

pub use align::{align_closes, AlignedCloses};
pub use cache::CachedProvider;
pub use csv_dir::CsvDirProvider;
pub use provider::{DataError, InMemoryProvider, PriceProvider};
