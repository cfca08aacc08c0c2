use mashup_contracts::assets::{SlotRole, DOWNLOAD_FILE_NAME};

pub const UPLOAD_HINT: &str = "Click to upload";
pub const PLACEHOLDER_TEXT: &str = "Your generated image will appear here.";
pub const LOADING_TEXT: &str = "The model is thinking...";
pub const FAILURE_TITLE: &str = "Generation Failed";
pub const GENERATE_LABEL: &str = "Generate Mashup";
pub const GENERATING_LABEL: &str = "Generating...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotView {
    Empty {
        role: SlotRole,
        title: &'static str,
        hint: &'static str,
    },
    Populated {
        role: SlotRole,
        title: &'static str,
        preview_data_url: String,
        mime_type: String,
        byte_len: usize,
        remove_label: String,
    },
}

impl SlotView {
    pub fn role(&self) -> SlotRole {
        match self {
            SlotView::Empty { role, .. } | SlotView::Populated { role, .. } => *role,
        }
    }
}

/// The right-hand output area; always exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPanel {
    Placeholder { text: &'static str },
    Loading { text: &'static str },
    Failed {
        title: &'static str,
        message: String,
    },
    Image {
        data_url: String,
        download_name: &'static str,
    },
}

impl OutputPanel {
    pub fn image(data_url: impl Into<String>) -> Self {
        OutputPanel::Image {
            data_url: data_url.into(),
            download_name: DOWNLOAD_FILE_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppView {
    pub character: SlotView,
    pub product: SlotView,
    pub can_generate: bool,
    pub button_label: &'static str,
    pub panel: OutputPanel,
}
