//! Exhaustive nearest-neighbour index over squared Euclidean distance.
//!
//! Row *i* of the index always corresponds to passage *i* of the snapshot it
//! was built from. The index is append-only while building and read-only
//! once loaded.

use std::cmp::Ordering;

use crate::domain::errors::{DomainError, DomainResult};

const MAGIC: &[u8; 4] = b"HMIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Flat (brute-force) L2 index
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

/// Squared Euclidean distance between two equal-length vectors
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl FlatL2Index {
    /// Create an empty index for vectors of `dimension` components
    pub fn new(dimension: usize) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::InvalidArgument(
                "index dimension must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    /// Build an index from vectors, preserving their order
    pub fn from_vectors(dimension: usize, vectors: &[Vec<f32>]) -> DomainResult<Self> {
        let mut index = Self::new(dimension)?;
        index.data.reserve(dimension * vectors.len());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append one vector
    pub fn add(&mut self, vector: &[f32]) -> DomainResult<()> {
        if vector.len() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the vector stored at row `id`
    pub fn row(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Find the `k` nearest rows to `query`
    ///
    /// Returns `(row, squared distance)` pairs ascending by distance, ties
    /// broken by ascending row. Returns every row when the index holds
    /// fewer than `k`.
    pub fn search(&self, query: &[f32], k: usize) -> DomainResult<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(DomainError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }
        if query.len() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| (id, squared_l2(query, row)))
            .collect();

        let by_distance = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
        };

        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance);

        Ok(scored)
    }

    /// Serialize to the on-disk binary layout
    ///
    /// `HMIX` magic, u32 format version, u32 dimension, u64 row count, then
    /// row-major little-endian f32 data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        bytes.extend(self.data.iter().flat_map(|f| f.to_le_bytes()));
        bytes
    }

    /// Deserialize from the on-disk binary layout
    ///
    /// The error string describes what is wrong with the bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file too short ({} bytes)", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("bad magic".to_string());
        }

        let read_u32 = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let version = read_u32(4);
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {version}"));
        }
        let dimension = read_u32(8) as usize;
        if dimension == 0 {
            return Err("dimension is zero".to_string());
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[12..20]);
        let count = usize::try_from(u64::from_le_bytes(count_bytes))
            .map_err(|_| "row count overflows usize".to_string())?;

        let payload = &bytes[HEADER_LEN..];
        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| "row count overflows usize".to_string())?;
        if payload.len() != expected {
            return Err(format!(
                "expected {expected} payload bytes for {count} rows of dimension {dimension}, found {}",
                payload.len()
            ));
        }

        let data = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { dimension, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatL2Index {
        FlatL2Index::from_vectors(
            2,
            &[
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 2.0],
                vec![3.0, 3.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_squared_l2() {
        assert!((squared_l2(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < f32::EPSILON);
        assert!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();
        let hits = index.search(&[0.9, 0.1], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![1, 0, 2]);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_search_ties_break_by_id() {
        let index =
            FlatL2Index::from_vectors(1, &[vec![2.0], vec![0.0], vec![2.0], vec![0.0]]).unwrap();
        let hits = index.search(&[1.0], 4).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_search_k_larger_than_index_returns_all() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0], (0, 0.0));
    }

    #[test]
    fn test_search_rejects_zero_k_and_wrong_dimension() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[0.0, 0.0], 0),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 1),
            Err(DomainError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut index = FlatL2Index::new(3).unwrap();
        assert!(index.add(&[1.0, 2.0]).is_err());
        assert!(index.is_empty());
        index.add(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.row(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(index.row(1), None);
    }

    #[test]
    fn test_bytes_round_trip() {
        let index = sample_index();
        let restored = FlatL2Index::from_bytes(&index.to_bytes()).unwrap();
        assert_eq!(restored, index);
    }

    #[test]
    fn test_from_bytes_rejects_damage() {
        let bytes = sample_index().to_bytes();

        assert!(FlatL2Index::from_bytes(&bytes[..10]).is_err());
        assert!(FlatL2Index::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert_eq!(FlatL2Index::from_bytes(&bad_magic).unwrap_err(), "bad magic");

        let mut bad_version = bytes;
        bad_version[4] = 9;
        assert!(FlatL2Index::from_bytes(&bad_version)
            .unwrap_err()
            .contains("version"));
    }

    #[test]
    fn test_empty_index_search() {
        let index = FlatL2Index::new(4).unwrap();
        assert!(index.search(&[0.0; 4], 3).unwrap().is_empty());
    }
}
