use crate::traits::Abundance;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Recorded state vectors of one simulation, generation by generation.
///
/// Backed by a `generations x replicates` matrix: row `t` is the state vector
/// at generation `t`, column `r` is the time series of replicate `r`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<T: Abundance> {
    data: DMatrix<T>,
}

/// Serialisable form of a [`Trajectory`] with values stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord<T> {
    pub generations: usize,
    pub replicates: usize,
    pub values: Vec<T>,
}

impl<T> TrajectoryRecord<T> {
    pub fn generation(&self, t: usize) -> Option<&[T]> {
        if t >= self.generations {
            return None;
        }
        let start = t * self.replicates;
        self.values.get(start..start + self.replicates)
    }
}

impl<T: Abundance> Trajectory<T> {
    pub(crate) fn from_matrix(data: DMatrix<T>) -> Self {
        Self { data }
    }

    pub fn generations(&self) -> usize {
        self.data.nrows()
    }

    pub fn replicates(&self) -> usize {
        self.data.ncols()
    }

    /// State vector at generation `t`.
    pub fn generation(&self, t: usize) -> Option<Vec<T>> {
        (t < self.generations()).then(|| self.data.row(t).iter().copied().collect())
    }

    /// Time series of replicate `r` across all generations.
    pub fn replicate(&self, r: usize) -> Option<Vec<T>> {
        (r < self.replicates()).then(|| self.data.column(r).iter().copied().collect())
    }

    pub fn initial(&self) -> Vec<T> {
        self.data.row(0).iter().copied().collect()
    }

    pub fn last(&self) -> Vec<T> {
        self.data
            .row(self.generations() - 1)
            .iter()
            .copied()
            .collect()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.data
    }

    pub fn into_matrix(self) -> DMatrix<T> {
        self.data
    }

    /// Mean across replicates for every generation. NaN when there are no
    /// replicates.
    pub fn mean_by_generation(&self) -> Vec<f64> {
        let count = self.replicates() as f64;
        self.data
            .row_iter()
            .map(|row| row.iter().map(|v| v.as_f64()).sum::<f64>() / count)
            .collect()
    }

    /// Population variance across replicates for every generation.
    pub fn variance_by_generation(&self) -> Vec<f64> {
        let count = self.replicates() as f64;
        self.data
            .row_iter()
            .zip(self.mean_by_generation())
            .map(|(row, mean)| {
                row.iter()
                    .map(|v| {
                        let d = v.as_f64() - mean;
                        d * d
                    })
                    .sum::<f64>()
                    / count
            })
            .collect()
    }

    /// Share of replicates whose population is zero, per generation.
    pub fn extinct_fraction_by_generation(&self) -> Vec<f64> {
        let count = self.replicates() as f64;
        self.data
            .row_iter()
            .map(|row| row.iter().filter(|v| v.is_zero()).count() as f64 / count)
            .collect()
    }

    pub fn to_f64(&self) -> Trajectory<f64> {
        Trajectory {
            data: self.data.map(|v| v.as_f64()),
        }
    }

    pub fn to_record(&self) -> TrajectoryRecord<T> {
        TrajectoryRecord {
            generations: self.generations(),
            replicates: self.replicates(),
            // column-major storage of the transpose is row-major storage of the original
            values: self.data.transpose().as_slice().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Trajectory;
    use nalgebra::DMatrix;

    fn sample() -> Trajectory<u64> {
        // 3 generations, 2 replicates
        Trajectory::from_matrix(DMatrix::from_row_slice(3, 2, &[4, 4, 2, 6, 0, 8]))
    }

    #[test]
    fn rows_are_generations_and_columns_are_replicates() {
        let trajectory = sample();
        assert_eq!(trajectory.generations(), 3);
        assert_eq!(trajectory.replicates(), 2);
        assert_eq!(trajectory.initial(), vec![4, 4]);
        assert_eq!(trajectory.generation(1), Some(vec![2, 6]));
        assert_eq!(trajectory.last(), vec![0, 8]);
        assert_eq!(trajectory.replicate(1), Some(vec![4, 6, 8]));
        assert_eq!(trajectory.generation(3), None);
        assert_eq!(trajectory.replicate(2), None);
    }

    #[test]
    fn matrix_view_matches_accessors() {
        let trajectory = sample();
        let matrix = trajectory.as_matrix();
        assert_eq!(matrix.shape(), (3, 2));
        assert_eq!(matrix[(1, 1)], 6);
        assert_eq!(matrix.column(0).iter().copied().collect::<Vec<_>>(), vec![4, 2, 0]);

        let owned = trajectory.into_matrix();
        assert_eq!(owned.row(2).iter().copied().collect::<Vec<_>>(), vec![0, 8]);
    }

    #[test]
    fn summaries_are_taken_across_replicates() {
        let trajectory = sample();
        assert_eq!(trajectory.mean_by_generation(), vec![4.0, 4.0, 4.0]);
        assert_eq!(trajectory.variance_by_generation(), vec![0.0, 4.0, 16.0]);
        assert_eq!(
            trajectory.extinct_fraction_by_generation(),
            vec![0.0, 0.0, 0.5]
        );
    }

    #[test]
    fn record_is_row_major() {
        let record = sample().to_record();
        assert_eq!(record.generations, 3);
        assert_eq!(record.replicates, 2);
        assert_eq!(record.values, vec![4, 4, 2, 6, 0, 8]);
        assert_eq!(record.generation(2), Some(&[0, 8][..]));
        assert_eq!(record.generation(3), None);
    }

    #[test]
    fn to_f64_preserves_shape_and_values() {
        let converted = sample().to_f64();
        assert_eq!(converted.replicate(0), Some(vec![4.0, 2.0, 0.0]));
    }
}
