//! Method-chaining helpers

/// Passes `self` by value into a closure: `x.apply(f)` is `f(x)`.
pub trait Apply: Sized {
    /// apply `f` to self
    #[inline]
    fn apply<R>(self, f: impl FnOnce(Self) -> R) -> R {
        f(self)
    }
}

/// Mutates `self` in place inside a closure, then hands it back.
pub trait Also: Sized {
    /// run `f` on `&mut self` and return self
    #[inline]
    fn also(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T: Sized> Apply for T {}
impl<T: Sized> Also for T {}
