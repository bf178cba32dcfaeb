use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::data::batch::{Batch, BatchSource, GlyphDims};
use crate::data::dataset::GlyphDataset;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Shuffling mini-batch loader over an in-memory `GlyphDataset`.
///
/// One epoch is `ceil(samples / batch_size)` batches; the final batch of a
/// pass may be smaller. The sample order is reshuffled from a seeded RNG
/// every time a pass completes, so a loader built with the same seed yields
/// the same sequence.
pub struct GlyphLoader {
    dataset: GlyphDataset,
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl GlyphLoader {
    pub fn new(dataset: GlyphDataset, batch_size: usize, seed: u64) -> Result<GlyphLoader> {
        if batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if dataset.is_empty() {
            return Err(Error::data_contract("dataset has no samples"));
        }
        dataset.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(&mut rng);

        Ok(GlyphLoader { dataset, batch_size, order, cursor: 0, rng })
    }

    pub fn dims(&self) -> GlyphDims {
        self.dataset.dims()
    }

    pub fn num_styles(&self) -> usize {
        self.dataset.num_styles
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Converts the selected samples to working precision: pixels scaled to
    /// `[0, 1]`, styles one-hot encoded.
    fn assemble(&self, indices: &[usize]) -> Batch {
        let to_unit = |px: &[u8]| px.iter().map(|&p| p as f64 / 255.0).collect::<Vec<f64>>();
        let mut content = Vec::with_capacity(indices.len());
        let mut target = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());

        for &idx in indices {
            let sample = &self.dataset.samples[idx];
            content.push(to_unit(&sample.content));
            target.push(to_unit(&sample.target));
            let mut one_hot = vec![0.0; self.dataset.num_styles];
            one_hot[sample.style] = 1.0;
            labels.push(one_hot);
        }

        Batch {
            content: Matrix::from_data(content),
            target: Matrix::from_data(target),
            labels: Matrix::from_data(labels),
        }
    }
}

impl BatchSource for GlyphLoader {
    fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    fn next_batch(&mut self) -> Result<Batch> {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.assemble(&self.order[self.cursor..end]);
        self.cursor = end;
        Ok(batch)
    }

    fn sample(&mut self, size: usize) -> Result<Batch> {
        if size == 0 || size > self.dataset.len() {
            return Err(Error::data_contract(format!(
                "cannot draw {size} distinct samples from a dataset of {}",
                self.dataset.len()
            )));
        }
        let picked: Vec<usize> = (0..self.dataset.len())
            .collect::<Vec<_>>()
            .choose_multiple(&mut self.rng, size)
            .copied()
            .collect();
        Ok(self.assemble(&picked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::GlyphSample;

    fn dataset(n: usize) -> GlyphDataset {
        GlyphDataset {
            width: 1,
            height: 2,
            num_styles: 3,
            samples: (0..n)
                .map(|i| GlyphSample {
                    content: vec![i as u8, 0],
                    target: vec![0, 255],
                    style: i % 3,
                })
                .collect(),
        }
    }

    #[test]
    fn epoch_length_rounds_up() {
        let loader = GlyphLoader::new(dataset(10), 4, 0).unwrap();
        assert_eq!(loader.len(), 3);
    }

    #[test]
    fn one_pass_visits_every_sample_once() {
        let mut loader = GlyphLoader::new(dataset(10), 4, 5).unwrap();
        let mut seen: Vec<u8> = Vec::new();
        let mut sizes = Vec::new();
        for _ in 0..loader.len() {
            let batch = loader.next_batch().unwrap();
            sizes.push(batch.len());
            seen.extend(batch.content.data.iter().map(|row| (row[0] * 255.0).round() as u8));
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<u8>>());
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn batches_are_normalized_and_one_hot() {
        let mut loader = GlyphLoader::new(dataset(3), 3, 1).unwrap();
        let batch = loader.next_batch().unwrap();
        batch.validate().unwrap();
        assert!(batch.target.data.iter().all(|row| row == &vec![0.0, 1.0]));
        assert!(batch.labels.data.iter().all(|row| row.iter().sum::<f64>() == 1.0));
    }

    #[test]
    fn sample_draws_distinct_examples() {
        let mut loader = GlyphLoader::new(dataset(30), 8, 2).unwrap();
        let batch = loader.sample(25).unwrap();
        assert_eq!(batch.len(), 25);
        let mut firsts: Vec<u8> = batch.content.data.iter().map(|r| (r[0] * 255.0).round() as u8).collect();
        firsts.sort_unstable();
        firsts.dedup();
        assert_eq!(firsts.len(), 25);
    }

    #[test]
    fn sample_larger_than_dataset_is_a_contract_violation() {
        let mut loader = GlyphLoader::new(dataset(5), 2, 0).unwrap();
        assert!(matches!(loader.sample(25), Err(Error::DataContract(_))));
    }

    #[test]
    fn same_seed_gives_same_stream() {
        let mut a = GlyphLoader::new(dataset(9), 2, 42).unwrap();
        let mut b = GlyphLoader::new(dataset(9), 2, 42).unwrap();
        for _ in 0..12 {
            assert_eq!(a.next_batch().unwrap(), b.next_batch().unwrap());
        }
    }
}
