use std::fmt;

/// The name of a declaration or macro.
///
/// Anonymous declarations (e.g. unnamed namespaces) carry no `Ident` at
/// all, so an `Ident` is always a non-empty, user-visible name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident {
    pub id: String,
}

impl Ident {
    pub fn from_string(id: &str) -> Self {
        Ident { id: id.to_owned() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<&str> for Ident {
    fn from(id: &str) -> Self {
        Ident::from_string(id)
    }
}
