//! Pure aggregation over performance records. Functions here hold no state and do
//! no I/O: callers fetch a snapshot of records and pass it in.

pub mod percentage;
pub mod period;
pub mod summarize;
