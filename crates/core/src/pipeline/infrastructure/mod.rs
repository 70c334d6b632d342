pub mod analysis_worker;
pub mod snapshot_cell;
