pub mod analysis;
pub mod config;
pub mod correction;
pub mod critical;
pub mod sample_size;
pub mod significance;
pub mod special;
pub mod srm;
