/// Iterates over a collection, in parallel when the `parallel` feature is enabled.
macro_rules! iter_if_parallel {
    ($collection:expr) => {{
        #[cfg(feature = "parallel")]
        let iter = rayon::prelude::IntoParallelIterator::into_par_iter($collection);
        #[cfg(not(feature = "parallel"))]
        let iter = ::std::iter::IntoIterator::into_iter($collection);
        iter
    }};
}
