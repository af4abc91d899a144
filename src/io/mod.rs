pub mod export;
pub mod meter_csv;
