//! Identity contract for states and observations.
//!
//! The decoder never hashes or compares caller values. Everything it needs is
//! the integer returned by [`Identified::id`], which keys the model's tables.
//!
//! Implementations must be stable: the same value returns the same identity
//! for as long as it is registered in a [`Model`](crate::Model). Two distinct
//! states sharing an identity are treated as the same state.

/// A value carrying a stable integer identity.
///
/// ```
/// use hmm_viterbi::Identified;
///
/// #[derive(Clone, Debug)]
/// struct RoadPoint {
///     name: &'static str,
///     id: u64,
/// }
///
/// impl Identified for RoadPoint {
///     fn id(&self) -> u64 {
///         self.id
///     }
/// }
///
/// let p = RoadPoint { name: "rp11", id: 1 };
/// assert_eq!(p.id(), 1);
/// ```
pub trait Identified {
    /// Process-unique identity used as table key.
    fn id(&self) -> u64;
}

impl<T: Identified + ?Sized> Identified for &T {
    #[inline]
    fn id(&self) -> u64 {
        (**self).id()
    }
}

macro_rules! identity_for_ints {
    ($($t:ty),*) => {
        $(
            impl Identified for $t {
                #[inline]
                fn id(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

identity_for_ints!(u8, u16, u32, u64, usize);
