use serde::Deserialize;

use crate::error::ModelError;
use crate::features::FeatureRow;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

/// Column transformer: one-hot blocks for the categorical columns (in
/// order), followed by the numeric columns passed through as-is. Categories
/// not seen at fit time encode to an all-zero block.
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderSpec {
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub numeric: Vec<String>,
}

impl EncoderSpec {
    pub fn width(&self) -> usize {
        self.categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.numeric.len()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.width() == 0 {
            return Err(ModelError::Shape("encoder produces no features".into()));
        }
        let mut seen = std::collections::HashSet::new();
        let names = self
            .categorical
            .iter()
            .map(|c| c.column.as_str())
            .chain(self.numeric.iter().map(String::as_str));
        for name in names {
            if !seen.insert(name) {
                return Err(ModelError::Shape(format!("column '{name}' listed twice")));
            }
        }
        Ok(())
    }

    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.width());

        for cat in &self.categorical {
            let cell = row
                .get(&cat.column)
                .ok_or_else(|| ModelError::MissingColumn(cat.column.clone()))?;
            let value = cell.as_text().ok_or_else(|| ModelError::ColumnType {
                column: cat.column.clone(),
                expected: "text",
                got: cell.kind(),
            })?;
            out.extend(
                cat.categories
                    .iter()
                    .map(|c| if c == value { 1.0 } else { 0.0 }),
            );
        }

        for name in &self.numeric {
            let cell = row
                .get(name)
                .ok_or_else(|| ModelError::MissingColumn(name.clone()))?;
            let value = cell.as_f64().ok_or_else(|| ModelError::ColumnType {
                column: name.clone(),
                expected: "number",
                got: cell.kind(),
            })?;
            out.push(value);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Cell;

    fn spec() -> EncoderSpec {
        serde_json::from_str(
            r#"{
                "categorical": [
                    {"column": "Manufacturer", "categories": ["BMW", "Ford", "VW"]},
                    {"column": "Fuel type", "categories": ["Diesel", "Petrol"]}
                ],
                "numeric": ["Engine size", "age"]
            }"#,
        )
        .unwrap()
    }

    fn row(maker: &str) -> FeatureRow {
        FeatureRow::from_cells([
            ("Manufacturer", Cell::Text(maker.into())),
            ("Fuel type", Cell::Text("Petrol".into())),
            ("Engine size", Cell::Float(1.6)),
            ("age", Cell::Int(10)),
        ])
    }

    #[test]
    fn one_hot_then_numeric() {
        let s = spec();
        assert_eq!(s.width(), 7);
        let x = s.encode(&row("Ford")).unwrap();
        assert_eq!(x, vec![0.0, 1.0, 0.0, 0.0, 1.0, 1.6, 10.0]);
    }

    #[test]
    fn unknown_category_is_all_zero() {
        let x = spec().encode(&row("Porsche")).unwrap();
        assert_eq!(&x[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_column_errors() {
        let r = FeatureRow::from_cells([("Manufacturer", Cell::Text("Ford".into()))]);
        let err = spec().encode(&r).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(c) if c == "Fuel type"));
    }

    #[test]
    fn wrong_cell_type_errors() {
        let r = FeatureRow::from_cells([
            ("Manufacturer", Cell::Int(3)),
            ("Fuel type", Cell::Text("Petrol".into())),
            ("Engine size", Cell::Float(1.6)),
            ("age", Cell::Int(10)),
        ]);
        let err = spec().encode(&r).unwrap_err();
        assert!(matches!(err, ModelError::ColumnType { expected: "text", .. }));
    }

    #[test]
    fn duplicate_column_rejected() {
        let s: EncoderSpec =
            serde_json::from_str(r#"{"numeric": ["age", "age"]}"#).unwrap();
        assert!(s.validate().is_err());
        let empty: EncoderSpec = serde_json::from_str("{}").unwrap();
        assert!(empty.validate().is_err());
    }
}
