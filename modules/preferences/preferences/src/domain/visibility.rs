//! Ownership/visibility rule shared by every read path.

use preferences_sdk::{FormPreference, GridPreference, NamedPreference, Preference};

/// A preference is visible to `viewer` when it is public or owned by them.
#[must_use]
pub fn is_visible(owner: &str, publica: bool, viewer: &str) -> bool {
    publica || owner == viewer
}

/// Anything carrying an owner and a public flag.
pub trait Visible {
    fn owner(&self) -> &str;
    fn publica(&self) -> bool;

    fn is_visible_to(&self, viewer: &str) -> bool {
        is_visible(self.owner(), self.publica(), viewer)
    }
}

macro_rules! impl_visible {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Visible for $ty {
                fn owner(&self) -> &str {
                    &self.owner
                }

                fn publica(&self) -> bool {
                    self.publica
                }
            }
        )+
    };
}

impl_visible!(Preference, NamedPreference, GridPreference, FormPreference);

/// Keep the entries visible to `viewer`, optionally restricted to one owner.
pub fn retain_visible<T: Visible>(entries: Vec<T>, viewer: &str, owner: Option<&str>) -> Vec<T> {
    entries
        .into_iter()
        .filter(|e| owner.is_none_or(|o| e.owner() == o))
        .filter(|e| e.is_visible_to(viewer))
        .collect()
}
