use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::HouseFeatures;
use crate::error::ModelError;

const BUNDLED_CSV: &str = include_str!("../../data/house_prices.csv");

#[derive(Debug, Deserialize)]
struct SaleRecord {
    square_feet: f64,
    bedrooms: u32,
    bathrooms: f64,
    age_years: u32,
    garage_spaces: u32,
    location_score: u32,
    price: f64,
}

/// Historical sales the regression is fit against.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub samples: Vec<(HouseFeatures, f64)>,
}

impl TrainingData {
    /// Dataset compiled into the binary.
    pub fn bundled() -> Result<Self, ModelError> {
        Self::from_reader(BUNDLED_CSV.as_bytes())
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ModelError::Dataset(format!("cannot open {}: {}", path.display(), e)))?;
        let data = Self::from_reader(file)?;
        info!("Loaded {} training samples from {}", data.len(), path.display());
        Ok(data)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut samples = Vec::new();

        for (i, row) in rdr.deserialize::<SaleRecord>().enumerate() {
            let rec = row.map_err(|e| ModelError::Dataset(format!("row {}: {}", i + 1, e)))?;
            let features = HouseFeatures {
                square_feet: rec.square_feet,
                bedrooms: rec.bedrooms,
                bathrooms: rec.bathrooms,
                age_years: rec.age_years,
                garage_spaces: rec.garage_spaces,
                location_score: rec.location_score,
            };

            if !rec.price.is_finite() || features.to_array().iter().any(|v| !v.is_finite()) {
                return Err(ModelError::Dataset(format!("row {}: non-finite value", i + 1)));
            }
            samples.push((features, rec.price));
        }

        if samples.is_empty() {
            return Err(ModelError::Dataset("no training samples".to_string()));
        }

        let outside = samples.iter().filter(|(f, _)| f.out_of_range().is_some()).count();
        if outside > 0 {
            debug!("{} of {} training samples fall outside the accepted input ranges",
                outside, samples.len());
        }

        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
