use serde::{Deserialize, Serialize};

/// Closed range a single input field must fall in, with the message shown
/// to the user when it does not.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    /// Whole-number field; string input must parse as an integer
    pub integer: bool,
    pub message: &'static str,
}

impl FeatureRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Accepted ranges, in the order inputs are checked.
pub static FEATURE_RANGES: [FeatureRange; HouseFeatures::NUM_FEATURES] = [
    FeatureRange {
        name: "square_feet",
        min: 500.0,
        max: 10000.0,
        integer: false,
        message: "Square footage must be between 500 and 10,000",
    },
    FeatureRange {
        name: "bedrooms",
        min: 1.0,
        max: 10.0,
        integer: true,
        message: "Bedrooms must be between 1 and 10",
    },
    FeatureRange {
        name: "bathrooms",
        min: 1.0,
        max: 8.0,
        integer: false,
        message: "Bathrooms must be between 1 and 8",
    },
    FeatureRange {
        name: "age_years",
        min: 0.0,
        max: 100.0,
        integer: true,
        message: "Age must be between 0 and 100 years",
    },
    FeatureRange {
        name: "garage_spaces",
        min: 0.0,
        max: 4.0,
        integer: true,
        message: "Garage spaces must be between 0 and 4",
    },
    FeatureRange {
        name: "location_score",
        min: 1.0,
        max: 10.0,
        integer: true,
        message: "Location score must be between 1 and 10",
    },
];

/// Fixed-size feature vector describing one house
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseFeatures {
    pub square_feet: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub age_years: u32,
    pub garage_spaces: u32,
    pub location_score: u32,
}

impl HouseFeatures {
    pub const NUM_FEATURES: usize = 6;

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.square_feet,
            self.bedrooms as f64,
            self.bathrooms,
            self.age_years as f64,
            self.garage_spaces as f64,
            self.location_score as f64,
        ]
    }

    /// Build from already range-checked values in `FEATURE_RANGES` order.
    /// Integer fields are truncated toward zero.
    pub fn from_values(values: [f64; Self::NUM_FEATURES]) -> Self {
        Self {
            square_feet: values[0],
            bedrooms: values[1].trunc() as u32,
            bathrooms: values[2],
            age_years: values[3].trunc() as u32,
            garage_spaces: values[4].trunc() as u32,
            location_score: values[5].trunc() as u32,
        }
    }

    /// First range violation, if any.
    pub fn out_of_range(&self) -> Option<&'static FeatureRange> {
        self.to_array()
            .iter()
            .zip(FEATURE_RANGES.iter())
            .find(|(value, range)| !range.contains(**value))
            .map(|(_, range)| range)
    }
}
