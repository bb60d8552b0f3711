//! Tag validation.
//!
//! The host application stores a note's tags as one space-separated string,
//! so a tag containing whitespace would silently split into several tags on
//! import. Any Unicode whitespace is rejected; everything else is accepted.

/// Validates a single tag.
///
/// # Examples
/// ```
/// use deckpack::tags::validation::validate_tag;
///
/// assert!(validate_tag("geography").is_ok());
/// assert!(validate_tag("Capitals::South_America").is_ok());
///
/// assert!(validate_tag("b ar").is_err());
/// assert!(validate_tag(" baz").is_err());
/// assert!(validate_tag("tab\tbed").is_err());
/// ```
pub fn validate_tag(tag: &str) -> Result<(), TagValidationError> {
    match tag.chars().find(|ch| ch.is_whitespace()) {
        Some(ch) => Err(TagValidationError::ContainsWhitespace {
            tag: tag.to_string(),
            found: ch,
        }),
        None => Ok(()),
    }
}

/// Validates every tag, stopping at the first invalid one.
pub fn validate_tags<'a, I>(tags: I) -> Result<(), TagValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter().try_for_each(validate_tag)
}

/// Error type for tag validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag contains a whitespace character
    ContainsWhitespace { tag: String, found: char },
    /// Position past the end of the tag list
    OutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::ContainsWhitespace { tag, found } => {
                write!(
                    f,
                    "tag {:?} contains whitespace ({:?}); tags are space-separated in the collection",
                    tag, found
                )
            }
            TagValidationError::OutOfRange { index, len } => {
                write!(f, "index {} is out of range for {} tags", index, len)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}
