/// Helper trait which can be used to display symbols, observations and such.
/// This is mainly used for rendering tables and for diagnostics, `Debug` often
/// carries too much noise for that.
pub trait Show {
    /// Returns a human readable representation of `self`. For a membership
    /// observation this is `+` or `-`, for a symbol it is the symbol itself.
    fn show(&self) -> String;
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for u8 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
