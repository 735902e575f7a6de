//! Byte layout for persisted feature vectors
//!
//! ```text
//! magic "FIFV" | codec u8 | reserved u8 | oracle u16 LE | len u32 LE | len * f32 LE
//! ```

use super::{FeatureError, FeatureVector};

const MAGIC: &[u8; 4] = b"FIFV";
const CODEC_VERSION: u8 = 1;
const HEADER_LEN: usize = 12;

impl FeatureVector {
    /// Serialize to an opaque blob. Decoding the blob yields a bit-identical vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let values = self.values();
        let mut out = Vec::with_capacity(HEADER_LEN + values.len() * 4);
        out.extend_from_slice(MAGIC);
        out.push(CODEC_VERSION);
        out.push(0);
        out.extend_from_slice(&self.oracle_version().to_le_bytes());
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode a blob written by [`FeatureVector::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FeatureError> {
        if bytes.len() < HEADER_LEN {
            return Err(FeatureError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if &bytes[0..4] != MAGIC {
            return Err(FeatureError::BadMagic);
        }
        if bytes[4] != CODEC_VERSION {
            return Err(FeatureError::UnsupportedCodecVersion(bytes[4]));
        }

        let oracle_version = u16::from_le_bytes([bytes[6], bytes[7]]);
        let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;

        let expected = HEADER_LEN + len * 4;
        if bytes.len() < expected {
            return Err(FeatureError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(FeatureError::TrailingBytes(bytes.len() - expected));
        }

        let values = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        FeatureVector::new(oracle_version, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DistanceMetric;

    #[test]
    fn blob_preserves_bits_and_distances() {
        let a = FeatureVector::new(7, vec![0.1, -3.25, 1e-7, 42.0]).unwrap();
        let b = FeatureVector::new(7, vec![0.2, -3.0, 0.0, 41.5]).unwrap();

        let a2 = FeatureVector::from_bytes(&a.to_bytes()).unwrap();
        let b2 = FeatureVector::from_bytes(&b.to_bytes()).unwrap();

        assert_eq!(a2.oracle_version(), 7);
        for (x, y) in a.values().iter().zip(a2.values()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        let before = DistanceMetric::Euclidean.distance(&a, &b).unwrap();
        let after = DistanceMetric::Euclidean.distance(&a2, &b2).unwrap();
        assert_eq!(before.to_bits(), after.to_bits());
    }

    #[test]
    fn rejects_corrupt_blobs() {
        let blob = FeatureVector::new(1, vec![1.0, 2.0]).unwrap().to_bytes();

        assert!(matches!(
            FeatureVector::from_bytes(&blob[..5]),
            Err(FeatureError::Truncated { .. })
        ));
        assert!(matches!(
            FeatureVector::from_bytes(&blob[..blob.len() - 1]),
            Err(FeatureError::Truncated { .. })
        ));

        let mut bad_magic = blob.clone();
        bad_magic[0] = b'X';
        assert_eq!(FeatureVector::from_bytes(&bad_magic), Err(FeatureError::BadMagic));

        let mut bad_version = blob.clone();
        bad_version[4] = 9;
        assert_eq!(
            FeatureVector::from_bytes(&bad_version),
            Err(FeatureError::UnsupportedCodecVersion(9))
        );

        let mut trailing = blob;
        trailing.push(0);
        assert_eq!(FeatureVector::from_bytes(&trailing), Err(FeatureError::TrailingBytes(1)));
    }
}
