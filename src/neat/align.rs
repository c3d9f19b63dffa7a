use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::common::FxIndexMap;
use super::genome::{GeneKey, GeneValue};

/// One step of walking two innovation-sorted gene maps in lockstep.
pub enum AlignedPair<'a> {
    Both((&'a GeneKey, &'a GeneValue), (&'a GeneKey, &'a GeneValue)),
    Left((&'a GeneKey, &'a GeneValue)),
    Right((&'a GeneKey, &'a GeneValue)),
}

fn innovation_of(entry: (&GeneKey, &GeneValue)) -> usize {
    entry.1.innovation.0
}

/// Walks both maps in ascending innovation order, calling `visit` once per
/// position. Both maps must already be sorted by innovation number, which is
/// a `Genome` invariant.
pub fn align_iter<F>(
    left: &FxIndexMap<GeneKey, GeneValue>,
    right: &FxIndexMap<GeneKey, GeneValue>,
    visit: &mut F,
) where
    F: FnMut(AlignedPair),
{
    let n_left = left.len();
    let n_right = right.len();
    let mut i_left = 0;
    let mut i_right = 0;

    while i_left < n_left || i_right < n_right {
        if i_left >= n_left {
            visit(AlignedPair::Right(right.get_index(i_right).unwrap()));
            i_right += 1;
        } else if i_right >= n_right {
            visit(AlignedPair::Left(left.get_index(i_left).unwrap()));
            i_left += 1;
        } else {
            let x_left = left.get_index(i_left).unwrap();
            let x_right = right.get_index(i_right).unwrap();
            let id_left = innovation_of(x_left);
            let id_right = innovation_of(x_right);
            if id_left == id_right {
                visit(AlignedPair::Both(x_left, x_right));
                i_left += 1;
                i_right += 1;
            } else if id_left < id_right {
                visit(AlignedPair::Left(x_left));
                i_left += 1;
            } else {
                visit(AlignedPair::Right(x_right));
                i_right += 1;
            }
        }
    }
}

/// As `align_iter`, but collects the genes `choose` keeps into a new map.
/// The result preserves ascending innovation order.
pub fn align_map<F>(
    left: &FxIndexMap<GeneKey, GeneValue>,
    right: &FxIndexMap<GeneKey, GeneValue>,
    choose: &mut F,
) -> FxIndexMap<GeneKey, GeneValue>
where
    F: FnMut(AlignedPair) -> Option<(GeneKey, GeneValue)>,
{
    let capacity = std::cmp::max(left.len(), right.len());
    let mut result: FxIndexMap<GeneKey, GeneValue> =
        IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher);
    align_iter(left, right, &mut |pair| {
        if let Some((key, value)) = choose(pair) {
            result.insert(key, value);
        }
    });
    result
}
