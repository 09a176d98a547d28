//! Domain types shared by every pipeline stage.

pub mod headline;
pub mod observation;
pub mod price;
pub mod ticker;

pub use headline::{DailySentiment, DatedHeadline, HeadlineRecord};
pub use observation::AlignedObservation;
pub use price::{PriceReading, PriceRow};
pub use ticker::Ticker;
