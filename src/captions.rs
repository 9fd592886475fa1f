/// Caption lines in display order, top line first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionSet {
    lines: Vec<String>,
}

impl CaptionSet {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Blurb lines followed by one hashtags line.
    ///
    /// Trailing blank lines of the blurb are dropped; interior blank lines
    /// are kept and render as empty bars. The hashtags text is collapsed onto
    /// a single line and omitted when empty.
    pub fn from_texts(blurb: &str, hashtags: &str) -> Self {
        let mut lines: Vec<String> = blurb.trim_end().lines().map(str::to_string).collect();
        if lines.len() == 1 && lines[0].is_empty() {
            lines.clear();
        }

        let tags = hashtags.split_whitespace().collect::<Vec<_>>().join(" ");
        if !tags.is_empty() {
            lines.push(tags);
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
