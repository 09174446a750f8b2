pub mod types;
pub mod matcher;
pub mod structured;
pub mod lexicon;
pub mod registry;
pub mod scan;
pub mod dedupe;

pub use types::*;
pub use matcher::*;
pub use structured::*;
pub use lexicon::*;
pub use registry::*;
pub use scan::*;
pub use dedupe::*;
