pub mod dimen;
pub mod dsc;
pub mod engine;
pub mod nup;
pub mod paper;
pub mod procset;
pub mod select;
pub mod spec;
mod types;
mod writer;

pub use engine::{rearrange, RearrangeOptions, RearrangeStats};
pub use nup::{nup, GridLayout, NupOptions};
pub use spec::{parse_specs, PageSpec, ParsedSpecs};
pub use types::{Dims, ImposeError, Result};
