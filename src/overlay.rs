//! Caption overlay as an ffmpeg `drawtext` filter chain.
//!
//! Each caption line becomes one `drawtext=` filter, stacked downward from
//! a starting offset, and the filters are joined with `,` into a single
//! expression suitable for `-vf`.
//!
//! ffmpeg unescapes a `-vf` string twice: once when splitting the filter
//! graph and once when splitting a filter's `key=value` options. Option
//! values are escaped for the option level first, then each filter's whole
//! argument string is escaped for the graph level.

use crate::captions::CaptionSet;
use crate::config::OverlayStyle;

/// Special inside a `key=value:key=value` option list.
const OPTION_SPECIAL: [char; 3] = ['\\', '\'', ':'];

/// Special inside a filter's arguments within a filter graph.
const GRAPH_SPECIAL: [char; 6] = ['\\', '\'', ',', ';', '[', ']'];

fn backslash_escape(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escapes `\`, `'` and `:` so an option value cannot end early or open a
/// quote.
pub fn escape_option_value(text: &str) -> String {
    backslash_escape(text, &OPTION_SPECIAL)
}

/// Escapes a filter's argument string for embedding in a filter graph.
pub fn escape_filter_args(args: &str) -> String {
    backslash_escape(args, &GRAPH_SPECIAL)
}

/// Vertical position of line `index` on a frame `frame_height` pixels tall.
pub fn line_y(index: usize, frame_height: u32, style: &OverlayStyle) -> u32 {
    let start = (f64::from(frame_height) * style.start_fraction).floor() as u32;
    start + index as u32 * style.line_spacing
}

pub fn drawtext(line: &str, index: usize, frame_height: u32, style: &OverlayStyle) -> String {
    let params = [
        format!("fontfile={}", escape_option_value(&style.font_file)),
        format!("text={}", escape_option_value(line)),
        "expansion=none".to_string(),
        format!("fontsize={}", style.font_size),
        format!("fontcolor={}", style.font_color),
        "x=(w-text_w)/2".to_string(),
        format!("y={}", line_y(index, frame_height, style)),
        "box=1".to_string(),
        format!("boxcolor={}", style.box_color),
        format!("boxborderw={}", style.box_padding),
    ];
    format!("drawtext={}", escape_filter_args(&params.join(":")))
}

/// Full `-vf` expression, or `None` when there is nothing to draw.
pub fn build_filter(captions: &CaptionSet, frame_height: u32, style: &OverlayStyle) -> Option<String> {
    if captions.is_empty() {
        return None;
    }

    let chain = captions
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| drawtext(line, i, frame_height, style))
        .collect::<Vec<_>>()
        .join(",");
    Some(chain)
}
