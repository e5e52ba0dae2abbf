//! Seeded selection of few-shot examples.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::dataset::DialogueExample;
use crate::error::StartupError;

/// Number of examples rendered into the system primer.
pub const NUM_EXAMPLES: usize = 100;

/// Seed that keeps the primer identical across runs.
pub const SAMPLE_SEED: u64 = 42;

/// Examples chosen by [`sample`], in the order they were drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledSet {
    examples: Vec<DialogueExample>,
}

impl SampledSet {
    pub fn examples(&self) -> &[DialogueExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DialogueExample> {
        self.examples.iter()
    }
}

impl<'a> IntoIterator for &'a SampledSet {
    type Item = &'a DialogueExample;
    type IntoIter = std::slice::Iter<'a, DialogueExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draw `n` distinct rows uniformly at random, keyed by `seed`.
///
/// The same dataset, `n` and `seed` always produce the same ordered set.
pub fn sample(
    dataset: &[DialogueExample],
    n: usize,
    seed: u64,
) -> Result<SampledSet, StartupError> {
    if dataset.len() < n {
        return Err(StartupError::SampleSize {
            available: dataset.len(),
            requested: n,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let examples = index::sample(&mut rng, dataset.len(), n)
        .into_iter()
        .map(|i| dataset[i].clone())
        .collect();

    Ok(SampledSet { examples })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: usize) -> Vec<DialogueExample> {
        (0..rows)
            .map(|i| DialogueExample::new(format!("dialogue {i}"), format!("label {i}")))
            .collect()
    }

    #[test]
    fn same_inputs_give_same_order() {
        let rows = dataset(500);
        let first = sample(&rows, NUM_EXAMPLES, SAMPLE_SEED).unwrap();
        let second = sample(&rows, NUM_EXAMPLES, SAMPLE_SEED).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), NUM_EXAMPLES);
    }

    #[test]
    fn samples_without_replacement() {
        let rows = dataset(150);
        let set = sample(&rows, NUM_EXAMPLES, SAMPLE_SEED).unwrap();

        let mut dialogues: Vec<_> = set.iter().map(|e| e.dialogue.clone()).collect();
        dialogues.sort();
        dialogues.dedup();
        assert_eq!(dialogues.len(), NUM_EXAMPLES);
    }

    #[test]
    fn exact_size_dataset_selects_every_row() {
        let rows = dataset(NUM_EXAMPLES);
        let set = sample(&rows, NUM_EXAMPLES, SAMPLE_SEED).unwrap();

        let mut picked: Vec<_> = set.examples().to_vec();
        picked.sort_by(|a, b| a.dialogue.cmp(&b.dialogue));
        let mut expected = rows.clone();
        expected.sort_by(|a, b| a.dialogue.cmp(&b.dialogue));
        assert_eq!(picked, expected);
    }

    #[test]
    fn small_dataset_is_a_sample_size_error() {
        let rows = dataset(50);
        let err = sample(&rows, NUM_EXAMPLES, SAMPLE_SEED).unwrap_err();
        assert!(matches!(
            err,
            StartupError::SampleSize {
                available: 50,
                requested: 100
            }
        ));
    }
}
