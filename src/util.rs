//! Small iterator helpers shared by the search driver.

/// Zip two iterators, panicking if they don't have the same length.
///
/// The Search Driver relies on batch order staying aligned between the
/// descents collected by the Selector and the evaluations returned by the
/// Oracle (§5: "priors come back aligned to the batch order"); a silent
/// `zip` would instead truncate to the shorter side and misattribute a
/// prior to the wrong leaf.
pub fn zip_eq_exact<A: IntoIterator, B: IntoIterator>(
    a: A,
    b: B,
) -> impl Iterator<Item = (A::Item, B::Item)>
where
    A::IntoIter: ExactSizeIterator,
    B::IntoIter: ExactSizeIterator,
{
    let a = a.into_iter();
    let b = b.into_iter();
    assert_eq!(a.len(), b.len(), "zip_eq_exact: length mismatch");
    a.zip(b)
}
