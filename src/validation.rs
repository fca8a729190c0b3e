/// Controls how the slice-header tag-chain parser reacts to malformed tag
/// data (§4.4 "Error conditions").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationStringency {
    /// Abort on the first error.
    #[default]
    Strict,
    /// Skip the offending tag and continue parsing.
    Lenient,
    /// Skip the offending tag without reporting anything.
    Silent,
}
