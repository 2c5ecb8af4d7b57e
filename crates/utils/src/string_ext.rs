/// Extends string types with useful functions
pub trait StringExt {
    /// Everything before the first occurrence of a comment marker, trimmed
    ///
    /// ```rust
    /// # use geokit_utils::StringExt;
    /// assert_eq!("10 20 30 ! cell counts".strip_comment('!'), "10 20 30");
    /// assert_eq!("! only a comment".strip_comment('!'), "");
    /// ```
    fn strip_comment(&self, marker: char) -> &str;

    /// Replace any whitespace with underscores
    ///
    /// Array names become file names for UBC model files this way.
    ///
    /// ```rust
    /// # use geokit_utils::StringExt;
    /// assert_eq!("Random Data".underscored(), "Random_Data".to_string());
    /// ```
    fn underscored(&self) -> String;
}

impl<T: AsRef<str>> StringExt for T {
    fn strip_comment(&self, marker: char) -> &str {
        let s = self.as_ref();
        match s.find(marker) {
            Some(idx) => s[..idx].trim(),
            None => s.trim(),
        }
    }

    fn underscored(&self) -> String {
        self.as_ref()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect()
    }
}
