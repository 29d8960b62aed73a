use crate::{shape::Shape, storage::TensorStorage, Real, Tensor};

use serde::ser::SerializeStruct;
use serde::Deserialize;

impl serde::Serialize for Tensor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Tensor", 4)?;
        state.serialize_field("data", self.as_slice())?;
        state.serialize_field("rows", &self.rows())?;
        state.serialize_field("cols", &self.cols())?;
        state.serialize_field("is1d", &self.is_1d())?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for Tensor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData {
            data: Vec<Real>,
            rows: usize,
            cols: usize,
            #[serde(default)]
            is1d: bool,
        }

        let TensorData {
            data,
            rows,
            cols,
            is1d,
        } = TensorData::deserialize(deserializer)?;

        let shape = Shape::new(rows, cols, is1d).map_err(serde::de::Error::custom)?;
        if data.len() != shape.numel() {
            return Err(serde::de::Error::custom(format!(
                "Invalid data length {} for shape {rows}x{cols}",
                data.len()
            )));
        }

        Tensor::from_owned(shape, data.into()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde() -> Result<(), Box<dyn std::error::Error>> {
        let tensor = Tensor::from_shape_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?.flatten();
        let serialized = serde_json::to_string(&tensor)?;
        let deserialized: Tensor = serde_json::from_str(&serialized)?;
        assert_eq!(tensor.as_slice(), deserialized.as_slice());
        assert_eq!(tensor.shape(), deserialized.shape());
        Ok(())
    }

    #[test]
    fn test_serde_rejects_bad_length() {
        let res: Result<Tensor, _> =
            serde_json::from_str(r#"{"data":[1.0,2.0,3.0],"rows":2,"cols":2}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_storage_not_shared_after_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let tensor = Tensor::ones(1, 2)?;
        let back: Tensor = serde_json::from_str(&serde_json::to_string(&tensor)?)?;
        let storage: &TensorStorage = back.storage();
        assert!(storage.is_unique());
        Ok(())
    }
}
