use itertools::Itertools;

use crate::Void;

/// Helper trait which can be used to display symbols, words, outputs and such.
pub trait Show {
    /// Returns a human readable representation of `self`. For a symbol this should simply be
    /// the symbol itself, for a word the concatenation of its symbols.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of symbols this should be a word, for
    /// other things something like `{q0, q1, q2}`.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
    {
        let out: String = iter.into_iter().collect();
        if out.is_empty() {
            "ε".to_string()
        } else {
            out
        }
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+".to_string(),
            false => "-".to_string(),
        }
    }
}

macro_rules! impl_show_for_integers {
    ($($ty:ty),*) => {
        $(
            impl Show for $ty {
                fn show(&self) -> String {
                    self.to_string()
                }

                fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
                where
                    Self: 'a,
                {
                    format!("[{}]", iter.into_iter().map(|x| x.to_string()).join(" "))
                }
            }
        )*
    };
}
impl_show_for_integers!(u8, u16, u32, u64, usize, i32, i64);

impl Show for Void {
    fn show(&self) -> String {
        "#".to_string()
    }
}

impl Show for &str {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        S::show_collection(self)
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self)
    }
}

impl<S: Show> Show for Option<S> {
    fn show(&self) -> String {
        match self {
            Some(x) => x.show(),
            None => "⊥".to_string(),
        }
    }
}
