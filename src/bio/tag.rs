/*!
Parsing of a single BIO tag (`O`, `B-PER`, `I-LOC`, ...) into its prefix and entity type.
*/
/// The prefixes the decoder acts upon. Any other prefix (`E`, `S`, `U`, `L`, ...) leaves the
/// entity accumulator untouched.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub(crate) enum Prefix {
    B,
    I,
    O,
}

/// A tag split into its prefix and its raw entity type (e.g. `B-PER` -> (`B`, `PER`)). The entity
/// type is kept as written in the file; case normalization happens against the label set.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct InnerTag<'a> {
    pub(crate) prefix: Prefix,
    pub(crate) entity_type: &'a str,
}

impl<'a> InnerTag<'a> {
    /// Returns `None` for tags outside of the `O`, `B-*`, `I-*` family.
    pub(crate) fn parse(tag: &'a str) -> Option<Self> {
        if let Some(entity_type) = tag.strip_prefix("B-") {
            Some(Self {
                prefix: Prefix::B,
                entity_type,
            })
        } else if let Some(entity_type) = tag.strip_prefix("I-") {
            Some(Self {
                prefix: Prefix::I,
                entity_type,
            })
        } else if tag == "O" {
            Some(Self {
                prefix: Prefix::O,
                entity_type: "",
            })
        } else {
            None
        }
    }
}
