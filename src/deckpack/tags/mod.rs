//! Note tags.
//!
//! [`Tags`] is the tag list of a note. Every way of changing it (construction,
//! whole-list assignment, single-slot replacement, appending, inserting and
//! splicing) runs the new values through [`validate_tag`] first, so a `Tags`
//! value can never hold a tag that would split apart when written to the
//! collection.
//!
//! Mutations that take several tags are all-or-nothing: if any of them is
//! invalid the list is left untouched. Positions outside the list are
//! reported as [`TagValidationError::OutOfRange`] instead of panicking.

pub mod validation;

use std::ops::{Bound, Deref, Range, RangeBounds};

use serde::{Deserialize, Serialize};

pub use validation::{validate_tag, validate_tags, TagValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

/// Collects and validates a batch before it touches the list.
fn checked<I, S>(tags: I) -> Result<Vec<String>, TagValidationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    validate_tags(tags.iter().map(String::as_str))?;
    Ok(tags)
}

impl Tags {
    pub fn new<I, S>(tags: I) -> Result<Self, TagValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self(checked(tags)?))
    }

    /// Replaces the whole list.
    pub fn assign<I, S>(&mut self, tags: I) -> Result<(), TagValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0 = checked(tags)?;
        Ok(())
    }

    /// Replaces the tag at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, tag: impl Into<String>) -> Result<String, TagValidationError> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(index)
            .ok_or(TagValidationError::OutOfRange { index, len })?;
        let tag = tag.into();
        validate_tag(&tag)?;
        Ok(std::mem::replace(slot, tag))
    }

    pub fn push(&mut self, tag: impl Into<String>) -> Result<(), TagValidationError> {
        let tag = tag.into();
        validate_tag(&tag)?;
        self.0.push(tag);
        Ok(())
    }

    pub fn extend<I, S>(&mut self, tags: I) -> Result<(), TagValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(checked(tags)?);
        Ok(())
    }

    /// Inserts before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, tag: impl Into<String>) -> Result<(), TagValidationError> {
        self.check_position(index)?;
        let tag = tag.into();
        validate_tag(&tag)?;
        self.0.insert(index, tag);
        Ok(())
    }

    /// Replaces `range` with `replacement`, returning the removed tags.
    pub fn splice<R, I, S>(&mut self, range: R, replacement: I) -> Result<Vec<String>, TagValidationError>
    where
        R: RangeBounds<usize>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let range = self.checked_range(range)?;
        let replacement = checked(replacement)?;
        Ok(self.0.splice(range, replacement).collect())
    }

    pub fn remove(&mut self, index: usize) -> Result<String, TagValidationError> {
        if index >= self.0.len() {
            return Err(TagValidationError::OutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0.remove(index))
    }

    fn check_position(&self, index: usize) -> Result<(), TagValidationError> {
        if index > self.0.len() {
            return Err(TagValidationError::OutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(())
    }

    fn checked_range<R: RangeBounds<usize>>(&self, range: R) -> Result<Range<usize>, TagValidationError> {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => self.0.len(),
        };
        self.check_position(end)?;
        if start > end {
            return Err(TagValidationError::OutOfRange {
                index: start,
                len: self.0.len(),
            });
        }
        Ok(start..end)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The collection's tag column: space-separated with a space on each side.
    pub fn to_field_string(&self) -> String {
        format!(" {} ", self.0.join(" "))
    }
}

impl Deref for Tags {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TryFrom<Vec<String>> for Tags {
    type Error = TagValidationError;

    fn try_from(tags: Vec<String>) -> Result<Self, Self::Error> {
        validate_tags(tags.iter().map(String::as_str))?;
        Ok(Self(tags))
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Tags {
        Tags::new(values.iter().copied()).unwrap()
    }

    #[test]
    fn test_new() {
        assert_eq!(tags(&["foo", "bar"]).as_slice(), ["foo", "bar"]);
        assert!(Tags::new(["foo", "b ar"]).is_err());
    }

    #[test]
    fn test_assign_is_all_or_nothing() {
        let mut list = tags(&["foo"]);
        assert!(list.assign(["ok", " baz"]).is_err());
        assert_eq!(list.as_slice(), ["foo"]);

        list.assign(["a", "b"]).unwrap();
        assert_eq!(list.as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_set() {
        let mut list = tags(&["foo", "bar"]);
        assert!(list.set(1, "dankey kang").is_err());
        assert_eq!(list[1], "bar");

        assert_eq!(list.set(1, "baz").unwrap(), "bar");
        assert_eq!(list.as_slice(), ["foo", "baz"]);
    }

    #[test]
    fn test_push() {
        let mut list = Tags::default();
        assert!(list.push("princess peach").is_err());
        assert!(list.is_empty());
        list.push("peach").unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut list = tags(&["foo"]);
        assert!(list.extend(["ok", "king dedede"]).is_err());
        assert_eq!(list.as_slice(), ["foo"]);

        list.extend(vec!["bar".to_string()]).unwrap();
        assert_eq!(list.as_slice(), ["foo", "bar"]);
    }

    #[test]
    fn test_insert() {
        let mut list = tags(&["foo", "bar"]);
        assert!(list.insert(0, "dat fox doe").is_err());
        list.insert(1, "mid").unwrap();
        assert_eq!(list.as_slice(), ["foo", "mid", "bar"]);
    }

    #[test]
    fn test_splice_is_all_or_nothing() {
        let mut list = tags(&["a", "b", "c"]);
        assert!(list.splice(0..2, ["x", "nerf joker pls"]).is_err());
        assert_eq!(list.as_slice(), ["a", "b", "c"]);

        let removed = list.splice(0..2, ["x"]).unwrap();
        assert_eq!(removed, vec!["a", "b"]);
        assert_eq!(list.as_slice(), ["x", "c"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut list = tags(&["a", "b"]);
        assert_eq!(list.remove(0).unwrap(), "a");
        assert_eq!(list.as_slice(), ["b"]);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_positions_outside_the_list_are_errors() {
        let mut list = tags(&["a", "b"]);
        let out_of_range = |index| TagValidationError::OutOfRange { index, len: 2 };

        assert_eq!(list.set(2, "c"), Err(out_of_range(2)));
        assert_eq!(list.insert(3, "c"), Err(out_of_range(3)));
        assert_eq!(list.splice(1..5, ["c"]), Err(out_of_range(5)));
        assert_eq!(list.splice(2..1, ["c"]), Err(out_of_range(2)));
        assert_eq!(list.remove(2), Err(out_of_range(2)));
        assert_eq!(list.as_slice(), ["a", "b"]);

        list.insert(2, "end").unwrap();
        assert_eq!(list.splice(3.., ["tail"]).unwrap(), Vec::<String>::new());
        assert_eq!(list.as_slice(), ["a", "b", "end", "tail"]);
    }

    #[test]
    fn test_field_string() {
        assert_eq!(tags(&["foo", "bar"]).to_field_string(), " foo bar ");
        assert_eq!(Tags::default().to_field_string(), "  ");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Tags = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(ok.as_slice(), ["a", "b"]);
        assert!(serde_json::from_str::<Tags>(r#"["a b"]"#).is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"["a","b"]"#);
    }
}
