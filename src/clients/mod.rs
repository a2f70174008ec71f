pub mod currency_catalog;
pub mod hr_directory;
