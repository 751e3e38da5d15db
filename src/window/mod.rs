pub mod partition;

pub use partition::{parse_date, partition, DateWindow, PartitionError, DATE_FORMAT};
