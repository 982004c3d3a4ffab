//! Presentation sink: chart views in, report files out.

pub mod html;

pub use html::{render_html_report, render_json_report};
