use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarInput {
    pub manufacturer: String,
    pub model: String,
    pub fuel_type: String,
    pub engine_size: f64,
    #[serde(deserialize_with = "integral")]
    pub year_of_manufacture: i64,
    pub mileage: f64,
}

/// Integer field that also accepts whole-number floats (`2015.0`).
fn integral<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        Int(i64),
        Float(f64),
    }

    // 2^63 is the first float past i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    match Num::deserialize(d) {
        Ok(Num::Int(v)) => Ok(v),
        Ok(Num::Float(f)) if f.fract() == 0.0 && f >= -LIMIT && f < LIMIT => Ok(f as i64),
        Ok(Num::Float(f)) => Err(de::Error::custom(format!(
            "invalid value: {f}, expected a whole number"
        ))),
        Err(_) => Err(de::Error::custom("invalid type: expected an integer")),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PredictionOut {
    pub predicted_price_gbp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub status: String,
}

// FastAPI-style error envelope: {"detail": "..."}
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
