//! In-place quicksort with a fallible comparison.
//!
//! The first comparison error aborts the sort and is returned; the slice is
//! then left in an unspecified permutation. The algorithm is not stable on
//! its own. Callers that need stability make the comparison total by breaking
//! ties on the original position.

use crate::consts::INSERTION_SORT_THRESHOLD;
use core::cmp::Ordering;

pub(crate) fn try_sort_by<T, E, F>(v: &mut [T], cmp: &mut F) -> Result<(), E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    let mut v = v;
    loop {
        if v.len() <= INSERTION_SORT_THRESHOLD {
            return insertion_sort(v, cmp);
        }
        let p = partition(v, cmp)?;
        let (left, right) = std::mem::take(&mut v).split_at_mut(p);
        let right = &mut right[1..];
        // Recurse into the smaller half to bound stack depth
        if left.len() < right.len() {
            try_sort_by(left, cmp)?;
            v = right;
        } else {
            try_sort_by(right, cmp)?;
            v = left;
        }
    }
}

fn insertion_sort<T, E, F>(v: &mut [T], cmp: &mut F) -> Result<(), E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && cmp(&v[j], &v[j - 1])? == Ordering::Less {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
    Ok(())
}

// Median-of-three pivot parked at the end, then a Lomuto partition.
// Returns the final pivot index.
fn partition<T, E, F>(v: &mut [T], cmp: &mut F) -> Result<usize, E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    let last = v.len() - 1;
    let mid = v.len() / 2;
    if cmp(&v[mid], &v[0])?.is_lt() {
        v.swap(mid, 0);
    }
    if cmp(&v[last], &v[0])?.is_lt() {
        v.swap(last, 0);
    }
    if cmp(&v[last], &v[mid])?.is_lt() {
        v.swap(last, mid);
    }
    v.swap(mid, last);

    let mut store = 0;
    for i in 0..last {
        if cmp(&v[i], &v[last])?.is_lt() {
            v.swap(i, store);
            store += 1;
        }
    }
    v.swap(store, last);
    Ok(store)
}
