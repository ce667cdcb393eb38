/// A field value that may be left out of the encoded output entirely.
///
/// Unlike `Option<T>`, whose `None` encodes as `null`, an [`Omittable::Omitted`]
/// record field produces no key at all. Decoding a map that lacks the key yields
/// `Omitted` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Omittable<T> {
    #[default]
    Omitted,
    Present(T),
}

impl<T> Omittable<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Omittable::Omitted)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Omittable::Present(_))
    }

    pub fn as_ref(&self) -> Omittable<&T> {
        match self {
            Omittable::Omitted => Omittable::Omitted,
            Omittable::Present(value) => Omittable::Present(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Omittable::Omitted => None,
            Omittable::Present(value) => Some(value),
        }
    }
}

impl<T> From<T> for Omittable<T> {
    fn from(value: T) -> Self {
        Omittable::Present(value)
    }
}

impl<T> From<Omittable<T>> for Option<T> {
    fn from(value: Omittable<T>) -> Self {
        value.into_option()
    }
}
