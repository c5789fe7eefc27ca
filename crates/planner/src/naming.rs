use crate::error::{PlannerError, Result};
use regex::Regex;

/// Base name and extension of the container being split (`Foo` + `.cs`)
#[derive(Debug, Clone)]
pub struct OutputNaming {
    base: String,
    extension: String,
    numbered: Regex,
}

impl OutputNaming {
    /// Split a file name at its last dot; the extension keeps the dot
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let (base, extension) = match file_name.rfind('.') {
            Some(0) | None => (file_name, ""),
            Some(dot) => file_name.split_at(dot),
        };
        if base.is_empty() {
            return Err(PlannerError::invalid_name(format!(
                "cannot derive a base name from {file_name:?}"
            )));
        }
        let pattern = format!(
            "^{}([0-9]+){}$",
            regex::escape(base),
            regex::escape(extension)
        );
        let numbered = Regex::new(&pattern)
            .map_err(|err| PlannerError::invalid_name(format!("{file_name:?}: {err}")))?;
        Ok(Self {
            base: base.to_string(),
            extension: extension.to_string(),
            numbered,
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Name of the container the aggregate came from
    #[must_use]
    pub fn original_name(&self) -> String {
        format!("{}{}", self.base, self.extension)
    }

    /// `{base}{suffix}{ext}`
    #[must_use]
    pub fn with_suffix(&self, suffix: u32) -> String {
        format!("{}{suffix}{}", self.base, self.extension)
    }

    /// Numeric suffixes already taken by `{base}{N}{ext}` entries
    pub fn used_suffixes<'a, I>(&self, existing: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        existing
            .into_iter()
            .filter_map(|name| self.numbered.captures(name))
            .filter_map(|captures| captures.get(1)?.as_str().parse::<u32>().ok())
            .collect()
    }
}

/// First suffix for a new batch of containers.
///
/// New containers always go after every numbered sibling already present, so
/// the result is one past the largest used suffix and never below 2.
pub fn next_available_suffix<'a, I>(existing: I, naming: &OutputNaming) -> Result<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    match naming.used_suffixes(existing).into_iter().max() {
        None => Ok(2),
        Some(largest) => largest
            .checked_add(1)
            .map(|next| next.max(2))
            .ok_or_else(|| suffix_exhausted(naming)),
    }
}

/// Names for `count` new containers, in plan order
pub fn allocate_names<'a, I>(existing: I, naming: &OutputNaming, count: usize) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    let first = next_available_suffix(existing, naming)?;
    (0..count)
        .map(|offset| {
            u32::try_from(offset)
                .ok()
                .and_then(|offset| first.checked_add(offset))
                .map(|suffix| naming.with_suffix(suffix))
                .ok_or_else(|| suffix_exhausted(naming))
        })
        .collect()
}

fn suffix_exhausted(naming: &OutputNaming) -> PlannerError {
    PlannerError::invalid_name(format!(
        "no numeric suffix left for {}",
        naming.original_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn naming(name: &str) -> OutputNaming {
        OutputNaming::from_file_name(name).unwrap()
    }

    #[test]
    fn test_from_file_name() {
        let foo = naming("Foo.cs");
        assert_eq!(foo.base(), "Foo");
        assert_eq!(foo.extension(), ".cs");
        assert_eq!(foo.original_name(), "Foo.cs");
        assert_eq!(foo.with_suffix(3), "Foo3.cs");

        let dotted = naming("Foo.Designer.cs");
        assert_eq!(dotted.base(), "Foo.Designer");

        let bare = naming("Makefile");
        assert_eq!(bare.extension(), "");
        assert_eq!(bare.with_suffix(2), "Makefile2");

        assert!(OutputNaming::from_file_name("").is_err());
    }

    #[test]
    fn test_first_suffix_is_two() {
        assert_eq!(next_available_suffix(["Foo.cs", "Bar2.cs"], &naming("Foo.cs")).unwrap(), 2);
        assert_eq!(next_available_suffix([], &naming("Foo.cs")).unwrap(), 2);
    }

    #[test]
    fn test_suffix_goes_past_existing_siblings() {
        let existing = ["Foo.cs", "Foo2.cs", "Foo5.cs"];
        let names = allocate_names(existing, &naming("Foo.cs"), 2).unwrap();
        assert_eq!(names, vec!["Foo6.cs".to_string(), "Foo7.cs".to_string()]);
    }

    #[test]
    fn test_unrelated_names_are_ignored() {
        let existing = ["Foo2.txt", "FooBar3.cs", "Foo.cs.bak", "foo9.cs", "Foo3.cs"];
        assert_eq!(next_available_suffix(existing, &naming("Foo.cs")).unwrap(), 4);
    }

    #[test]
    fn test_base_with_regex_characters() {
        let existing = ["A+B2.cs", "AAB7.cs"];
        assert_eq!(next_available_suffix(existing, &naming("A+B.cs")).unwrap(), 3);
    }

    #[test]
    fn test_zero_and_one_suffixes_still_start_at_two() {
        assert_eq!(next_available_suffix(["Foo1.cs"], &naming("Foo.cs")).unwrap(), 2);
        assert_eq!(next_available_suffix(["Foo0.cs"], &naming("Foo.cs")).unwrap(), 2);
    }

    #[test]
    fn test_exhausted_suffixes_are_rejected() {
        let foo = naming("Foo.cs");
        let last = ["Foo4294967295.cs"];
        assert!(matches!(
            next_available_suffix(last, &foo),
            Err(PlannerError::InvalidName(_))
        ));
        assert!(allocate_names(last, &foo, 1).is_err());

        let near_end = ["Foo4294967294.cs"];
        assert_eq!(
            allocate_names(near_end, &foo, 1).unwrap(),
            vec!["Foo4294967295.cs".to_string()]
        );
        assert!(matches!(
            allocate_names(near_end, &foo, 2),
            Err(PlannerError::InvalidName(_))
        ));
        assert!(allocate_names(last, &foo, 0).unwrap().is_empty());
    }
}
