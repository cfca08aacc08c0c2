use std::fmt::Write as _;

use mashup_engine::{AppView, OutputPanel, SlotView};

const PREVIEW_CHARS: usize = 48;

pub fn render_view(view: &AppView) -> String {
    let mut out = String::new();
    for slot in [&view.character, &view.product] {
        let _ = writeln!(out, "{}", render_slot(slot));
    }
    let button = if view.can_generate {
        format!("[{}]", view.button_label)
    } else {
        format!("[{}] (disabled)", view.button_label)
    };
    let _ = writeln!(out, "  {button}");
    let _ = writeln!(out, "{}", render_panel(&view.panel));
    out
}

fn render_slot(slot: &SlotView) -> String {
    match slot {
        SlotView::Empty { title, hint, .. } => format!("  {title}: ({hint})"),
        SlotView::Populated {
            title,
            preview_data_url,
            mime_type,
            byte_len,
            remove_label,
            ..
        } => {
            let mime = if mime_type.is_empty() {
                "unknown type"
            } else {
                mime_type.as_str()
            };
            format!(
                "  {title}: {} ({mime}, {byte_len} bytes) [{remove_label}: /remove {}]",
                preview(preview_data_url),
                slot.role()
            )
        }
    }
}

fn render_panel(panel: &OutputPanel) -> String {
    match panel {
        OutputPanel::Placeholder { text } | OutputPanel::Loading { text } => format!("  > {text}"),
        OutputPanel::Failed { title, message } => format!("  > {title}\n    {message}"),
        OutputPanel::Image {
            data_url,
            download_name,
        } => format!(
            "  > {} [Download {download_name}: /download]",
            preview(data_url)
        ),
    }
}

fn preview(data_url: &str) -> String {
    if data_url.chars().count() <= PREVIEW_CHARS {
        return data_url.to_string();
    }
    data_url.chars().take(PREVIEW_CHARS).collect::<String>() + "…"
}
