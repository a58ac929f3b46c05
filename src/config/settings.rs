//! Catalog seed configuration loading from config.toml
//!
//! This module loads the initial product catalog from a TOML configuration file.
//! Products listed there are created on startup when their SKU is missing, and an
//! optional opening stock is booked as an ENTRY movement so the stock counter and
//! the movement history agree from the first run.

use crate::entities::ProductType;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// User id recorded as the actor of seed movements
    #[serde(default = "default_system_user")]
    pub system_user_id: i64,
    /// Products to seed into the catalog
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

const fn default_system_user() -> i64 {
    1
}

/// Configuration for a single catalog product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Unique SKU
    pub sku: String,
    pub description: String,
    /// `RAW_MATERIAL` or `FINISHED_PRODUCT`
    pub product_type: ProductType,
    pub unit: String,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub min_stock: Decimal,
    /// Quantity booked as an opening ENTRY when the product is first created
    #[serde(default)]
    pub opening_stock: Decimal,
}

/// Loads configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
