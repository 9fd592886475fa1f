use std::path::{Path, PathBuf};

/// Background frame for one platform target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub filename: &'static str,
}

pub const RESOLUTIONS: [Template; 4] = [
    Template {
        label: "landscape",
        width: 1920,
        height: 1080,
        filename: "1920x1080.png",
    },
    Template {
        label: "square",
        width: 1080,
        height: 1080,
        filename: "1080x1080.png",
    },
    Template {
        label: "portrait",
        width: 1080,
        height: 1350,
        filename: "1080x1350.png",
    },
    Template {
        label: "reel",
        width: 720,
        height: 1280,
        filename: "720x1280.png",
    },
];

impl Template {
    pub fn by_label(label: &str) -> Option<&'static Template> {
        RESOLUTIONS.iter().find(|t| t.label.eq_ignore_ascii_case(label))
    }

    pub fn path(&self, templates_dir: &Path) -> PathBuf {
        templates_dir.join(self.filename)
    }
}
