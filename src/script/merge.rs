use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::script::engine::EvaluationResult;
use crate::script::model::{
    BoxElement, HLineElement, LabelElement, LineElement, MarkerElement, ShadeElement,
    VLineElement,
};

/// Flat, id-deduplicated element lists across all active scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedElements {
    pub lines: Vec<LineElement>,
    pub hlines: Vec<HLineElement>,
    pub vlines: Vec<VLineElement>,
    pub boxes: Vec<BoxElement>,
    /// Sorted by time, ties in merge order.
    pub markers: Vec<MarkerElement>,
    pub labels: Vec<LabelElement>,
    pub shades: Vec<ShadeElement>,
}

impl MergedElements {
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
            + self.hlines.len()
            + self.vlines.len()
            + self.boxes.len()
            + self.markers.len()
            + self.labels.len()
            + self.shades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Bucket<T>(IndexMap<String, T>);

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed_by_id {
    ($($element:ty),* $(,)?) => {
        $(
            impl Keyed for $element {
                fn key(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

keyed_by_id!(
    LineElement,
    HLineElement,
    VLineElement,
    BoxElement,
    MarkerElement,
    LabelElement,
    ShadeElement,
);

impl<T: Keyed + Clone> Bucket<T> {
    /// Later writes replace the value and keep the first insertion slot.
    fn absorb(&mut self, elements: &[T]) {
        for element in elements {
            self.0.insert(element.key().to_owned(), element.clone());
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.0.into_values().collect()
    }
}

/// Merges evaluation results in order with last-write-wins per element id.
#[must_use]
pub fn merge_results<'a>(results: impl IntoIterator<Item = &'a EvaluationResult>) -> MergedElements {
    let mut lines: Bucket<LineElement> = Bucket::default();
    let mut hlines: Bucket<HLineElement> = Bucket::default();
    let mut vlines: Bucket<VLineElement> = Bucket::default();
    let mut boxes: Bucket<BoxElement> = Bucket::default();
    let mut markers: Bucket<MarkerElement> = Bucket::default();
    let mut labels: Bucket<LabelElement> = Bucket::default();
    let mut shades: Bucket<ShadeElement> = Bucket::default();

    for result in results {
        lines.absorb(&result.lines);
        hlines.absorb(&result.hlines);
        vlines.absorb(&result.vlines);
        boxes.absorb(&result.boxes);
        markers.absorb(&result.markers);
        labels.absorb(&result.labels);
        shades.absorb(&result.shades);
    }

    let mut markers = markers.into_vec();
    markers.sort_by_key(|marker| marker.time);

    MergedElements {
        lines: lines.into_vec(),
        hlines: hlines.into_vec(),
        vlines: vlines.into_vec(),
        boxes: boxes.into_vec(),
        markers,
        labels: labels.into_vec(),
        shades: shades.into_vec(),
    }
}
