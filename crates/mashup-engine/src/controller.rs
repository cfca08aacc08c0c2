use std::fs;
use std::path::{Path, PathBuf};

use mashup_contracts::assets::{GenerationResult, ImageAsset, SlotRole, DOWNLOAD_FILE_NAME};
use tracing::{debug, info, warn};

use crate::error::{DownloadError, GenerationError};
use crate::ingest::SelectedFile;
use crate::requester::GenerationRequester;
use crate::slot::{SlotChange, UploadSlot};
use crate::view::{
    AppView, OutputPanel, FAILURE_TITLE, GENERATE_LABEL, GENERATING_LABEL, LOADING_TEXT,
    PLACEHOLDER_TEXT,
};

/// What the output area shows. Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Empty,
    Loading,
    Error(String),
    Result(GenerationResult),
}

impl DisplayState {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayState::Empty => "empty",
            DisplayState::Loading => "loading",
            DisplayState::Error(_) => "error",
            DisplayState::Result(_) => "result",
        }
    }
}

/// A generation the controller has committed to. The assets are snapshots
/// taken when the job was issued.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub ticket: u64,
    pub character: ImageAsset,
    pub product: ImageAsset,
}

impl GenerationJob {
    pub fn run(
        &self,
        requester: &dyn GenerationRequester,
    ) -> Result<GenerationResult, GenerationError> {
        requester.generate(&self.character, &self.product)
    }
}

/// Coordinates the two upload slots and the single outstanding generation.
///
/// `in_flight` is the busy guard: it is `Some` exactly while the display is
/// `Loading`, and only `begin_generate` / `complete_generate` touch it.
#[derive(Debug, Clone)]
pub struct AppController {
    character: UploadSlot,
    product: UploadSlot,
    display: DisplayState,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}

impl AppController {
    pub fn new() -> Self {
        Self {
            character: UploadSlot::new(SlotRole::Character),
            product: UploadSlot::new(SlotRole::Product),
            display: DisplayState::Empty,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn slot(&self, role: SlotRole) -> &UploadSlot {
        match role {
            SlotRole::Character => &self.character,
            SlotRole::Product => &self.product,
        }
    }

    fn slot_mut(&mut self, role: SlotRole) -> &mut UploadSlot {
        match role {
            SlotRole::Character => &mut self.character,
            SlotRole::Product => &mut self.product,
        }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_ticket(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn can_generate(&self) -> bool {
        self.character.is_populated() && self.product.is_populated() && !self.is_busy()
    }

    pub fn select(&mut self, role: SlotRole, file: &SelectedFile) -> SlotChange {
        let change = self.slot_mut(role).select(file);
        self.inputs_changed(change);
        change
    }

    pub fn remove(&mut self, role: SlotRole) -> SlotChange {
        let change = self.slot_mut(role).remove();
        self.inputs_changed(change);
        change
    }

    /// A finished result or error stays visible while both inputs remain
    /// populated; it gives way to the placeholder once either is empty.
    fn inputs_changed(&mut self, change: SlotChange) {
        if change == SlotChange::Unchanged || self.is_busy() {
            return;
        }
        if !(self.character.is_populated() && self.product.is_populated()) {
            self.display = DisplayState::Empty;
        }
    }

    /// Enters `Loading` and hands out the job to run, or returns `None` and
    /// changes nothing when a slot is empty or a job is already in flight.
    pub fn begin_generate(&mut self) -> Option<GenerationJob> {
        if !self.can_generate() {
            debug!(busy = self.is_busy(), "generate ignored");
            return None;
        }
        let (Some(character), Some(product)) = (self.character.asset(), self.product.asset())
        else {
            return None;
        };
        let job = GenerationJob {
            ticket: self.next_ticket,
            character: character.clone(),
            product: product.clone(),
        };
        self.next_ticket += 1;
        self.in_flight = Some(job.ticket);
        self.display = DisplayState::Loading;
        info!(ticket = job.ticket, "generation started");
        Some(job)
    }

    /// Leaves `Loading` with the outcome of the in-flight job. Outcomes for
    /// any other ticket are dropped; returns whether the outcome was applied.
    pub fn complete_generate(
        &mut self,
        ticket: u64,
        outcome: Result<GenerationResult, GenerationError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            warn!(ticket, in_flight = ?self.in_flight, "dropping stale generation outcome");
            return false;
        }
        self.in_flight = None;
        self.display = match outcome {
            Ok(result) => {
                info!(ticket, "generation succeeded");
                DisplayState::Result(result)
            }
            Err(err) => {
                warn!(ticket, error = %err, "generation failed");
                DisplayState::Error(err.display_message().to_string())
            }
        };
        true
    }

    /// Runs a whole generation on the calling thread. Returns whether a
    /// request was issued.
    pub fn generate(&mut self, requester: &dyn GenerationRequester) -> bool {
        let Some(job) = self.begin_generate() else {
            return false;
        };
        let outcome = job.run(requester);
        self.complete_generate(job.ticket, outcome)
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.display {
            DisplayState::Result(result) => Some(result),
            _ => None,
        }
    }

    pub fn view(&self) -> AppView {
        let panel = match &self.display {
            DisplayState::Empty => OutputPanel::Placeholder {
                text: PLACEHOLDER_TEXT,
            },
            DisplayState::Loading => OutputPanel::Loading { text: LOADING_TEXT },
            DisplayState::Error(message) => OutputPanel::Failed {
                title: FAILURE_TITLE,
                message: message.clone(),
            },
            DisplayState::Result(result) => OutputPanel::image(result.data_url()),
        };
        AppView {
            character: self.character.render(),
            product: self.product.render(),
            can_generate: self.can_generate(),
            button_label: if self.is_busy() {
                GENERATING_LABEL
            } else {
                GENERATE_LABEL
            },
            panel,
        }
    }

    /// Writes the displayed result to `dir/character-product-mashup.png`.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, DownloadError> {
        let result = self.result().ok_or(DownloadError::NothingToDownload)?;
        let bytes = result
            .decode()
            .map_err(|err| DownloadError::CorruptPayload(format!("{err:#}")))?;
        let path = dir.join(DOWNLOAD_FILE_NAME);
        fs::create_dir_all(dir)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|source| DownloadError::Io {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "download written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use mashup_contracts::assets::{GenerationResult, ImageAsset, SlotRole};

    use super::{AppController, DisplayState};
    use crate::error::{DownloadError, GenerationError};
    use crate::ingest::SelectedFile;
    use crate::requester::GenerationRequester;
    use crate::slot::SlotChange;
    use crate::view::OutputPanel;

    struct ScriptedRequester {
        outcomes: Mutex<Vec<Result<GenerationResult, GenerationError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedRequester {
        fn new(outcomes: Vec<Result<GenerationResult, GenerationError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
        }
    }

    impl GenerationRequester for ScriptedRequester {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(
            &self,
            character: &ImageAsset,
            product: &ImageAsset,
        ) -> Result<GenerationResult, GenerationError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((character.base64().to_string(), product.base64().to_string()));
            let mut outcomes = self.outcomes.lock().expect("outcomes lock");
            if outcomes.is_empty() {
                return Err(GenerationError::new("no scripted outcome left"));
            }
            outcomes.remove(0)
        }
    }

    fn write_image(dir: &Path, name: &str, bytes: &[u8]) -> anyhow::Result<SelectedFile> {
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(SelectedFile::from_path(path))
    }

    fn loaded_controller(dir: &Path) -> anyhow::Result<AppController> {
        let mut controller = AppController::new();
        controller.select(
            SlotRole::Character,
            &write_image(dir, "character.png", b"character-bytes")?,
        );
        controller.select(
            SlotRole::Product,
            &write_image(dir, "product.png", b"product-bytes")?,
        );
        Ok(controller)
    }

    fn assert_one_display_state(controller: &AppController) {
        let view = controller.view();
        let active = [
            matches!(view.panel, OutputPanel::Placeholder { .. }),
            matches!(view.panel, OutputPanel::Loading { .. }),
            matches!(view.panel, OutputPanel::Failed { .. }),
            matches!(view.panel, OutputPanel::Image { .. }),
        ];
        assert_eq!(active.iter().filter(|flag| **flag).count(), 1);
        assert_eq!(
            controller.is_busy(),
            matches!(controller.display(), DisplayState::Loading)
        );
    }

    #[test]
    fn successful_generation_shows_exact_payload() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let payload = GenerationResult::from_inline(Some("image/png"), "WFhYWA==");
        let requester = ScriptedRequester::new(vec![Ok(payload.clone())]);

        assert!(controller.can_generate());
        assert!(controller.generate(&requester));
        assert_eq!(controller.display(), &DisplayState::Result(payload.clone()));
        assert_one_display_state(&controller);

        let calls = requester.calls.lock().expect("calls lock").clone();
        let character = controller.slot(SlotRole::Character).asset().cloned();
        let product = controller.slot(SlotRole::Product).asset().cloned();
        assert_eq!(
            calls,
            vec![(
                character.map(|asset| asset.base64().to_string()).unwrap_or_default(),
                product.map(|asset| asset.base64().to_string()).unwrap_or_default(),
            )]
        );

        let view = controller.view();
        assert_eq!(
            view.panel,
            OutputPanel::Image {
                data_url: payload.data_url().to_string(),
                download_name: "character-product-mashup.png",
            }
        );

        let out = temp.path().join("downloads");
        let written = controller.download(&out)?;
        assert_eq!(written, out.join("character-product-mashup.png"));
        assert_eq!(fs::read(written)?, b"XXXX".to_vec());
        Ok(())
    }

    #[test]
    fn transport_failure_shows_error_and_allows_retry() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let payload = GenerationResult::from_inline(None, "b2s=");
        let requester = ScriptedRequester::new(vec![
            Err(GenerationError::new(
                "Gemini request failed: error sending request",
            )),
            Ok(payload.clone()),
        ]);

        assert!(controller.generate(&requester));
        match controller.display() {
            DisplayState::Error(message) => assert!(!message.is_empty()),
            other => panic!("expected error state, got {other:?}"),
        }
        assert!(matches!(
            controller.download(temp.path()),
            Err(DownloadError::NothingToDownload)
        ));
        assert!(controller.can_generate());

        assert!(controller.generate(&requester));
        assert_eq!(requester.call_count(), 2);
        assert_eq!(controller.display(), &DisplayState::Result(payload));
        Ok(())
    }

    #[test]
    fn blank_failure_uses_generic_message() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let requester = ScriptedRequester::new(vec![Err(GenerationError::new(""))]);

        controller.generate(&requester);
        assert_eq!(
            controller.display(),
            &DisplayState::Error("An unexpected error occurred.".to_string())
        );
        Ok(())
    }

    #[test]
    fn generate_with_one_slot_is_a_no_op() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = AppController::new();
        controller.select(
            SlotRole::Character,
            &write_image(temp.path(), "character.png", b"c")?,
        );
        let requester = ScriptedRequester::new(Vec::new());

        assert!(!controller.can_generate());
        assert!(!controller.generate(&requester));
        assert_eq!(requester.call_count(), 0);
        assert_eq!(controller.display(), &DisplayState::Empty);
        assert!(!controller.view().can_generate);
        Ok(())
    }

    #[test]
    fn generate_while_busy_is_a_no_op() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;

        let job = controller.begin_generate().expect("first job");
        assert_eq!(controller.display(), &DisplayState::Loading);
        assert_eq!(controller.view().button_label, "Generating...");
        assert_one_display_state(&controller);

        let before = controller.clone();
        assert!(controller.begin_generate().is_none());
        let requester = ScriptedRequester::new(Vec::new());
        assert!(!controller.generate(&requester));
        assert_eq!(requester.call_count(), 0);
        assert_eq!(controller.display(), before.display());
        assert_eq!(controller.in_flight_ticket(), Some(job.ticket));

        let payload = GenerationResult::from_inline(None, "ZG9uZQ==");
        assert!(controller.complete_generate(job.ticket, Ok(payload.clone())));
        assert_eq!(controller.display(), &DisplayState::Result(payload));
        assert!(!controller.is_busy());
        Ok(())
    }

    #[test]
    fn stale_completion_is_ignored() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let job = controller.begin_generate().expect("job");

        let late = GenerationResult::from_inline(None, "bGF0ZQ==");
        assert!(!controller.complete_generate(job.ticket + 7, Ok(late)));
        assert_eq!(controller.display(), &DisplayState::Loading);
        assert!(controller.is_busy());
        Ok(())
    }

    #[test]
    fn entering_loading_clears_previous_result() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let requester = ScriptedRequester::new(vec![Ok(GenerationResult::from_inline(
            None, "b25l",
        ))]);
        controller.generate(&requester);
        assert!(controller.result().is_some());

        controller.begin_generate().expect("second job");
        assert!(controller.result().is_none());
        assert_eq!(controller.display(), &DisplayState::Loading);
        Ok(())
    }

    #[test]
    fn input_changes_keep_result_until_a_slot_empties() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let requester = ScriptedRequester::new(vec![Ok(GenerationResult::from_inline(
            None, "b25l",
        ))]);
        controller.generate(&requester);

        let other = write_image(temp.path(), "other.png", b"other-product")?;
        assert_eq!(
            controller.select(SlotRole::Product, &other),
            SlotChange::Populated
        );
        assert!(matches!(controller.display(), DisplayState::Result(_)));

        controller.remove(SlotRole::Character);
        assert_eq!(controller.display(), &DisplayState::Empty);
        assert_one_display_state(&controller);
        Ok(())
    }

    #[test]
    fn slot_changes_during_loading_keep_loading() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = loaded_controller(temp.path())?;
        let job = controller.begin_generate().expect("job");

        controller.remove(SlotRole::Product);
        assert_eq!(controller.display(), &DisplayState::Loading);
        assert!(!controller.can_generate());

        let failure = GenerationError::new("boom");
        controller.complete_generate(job.ticket, Err(failure));
        assert_eq!(controller.display(), &DisplayState::Error("boom".to_string()));
        Ok(())
    }

    #[test]
    fn removed_file_can_be_selected_again() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = AppController::new();
        let file = write_image(temp.path(), "character.png", b"c")?;

        assert_eq!(controller.select(SlotRole::Character, &file), SlotChange::Populated);
        assert_eq!(controller.remove(SlotRole::Character), SlotChange::Cleared);
        assert!(!controller.slot(SlotRole::Character).is_populated());
        assert_eq!(controller.select(SlotRole::Character, &file), SlotChange::Populated);
        Ok(())
    }

    #[test]
    fn every_transition_keeps_one_display_state() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut controller = AppController::new();
        assert_one_display_state(&controller);

        controller.select(SlotRole::Character, &write_image(temp.path(), "a.png", b"a")?);
        assert_one_display_state(&controller);
        controller.select(SlotRole::Product, &write_image(temp.path(), "b.png", b"b")?);
        assert_one_display_state(&controller);

        let job = controller.begin_generate().expect("first job");
        assert_one_display_state(&controller);
        controller.complete_generate(job.ticket, Err(GenerationError::new("nope")));
        assert_one_display_state(&controller);

        let job = controller.begin_generate().expect("retry job");
        assert_one_display_state(&controller);
        let result = GenerationResult::from_inline(None, "eQ==");
        controller.complete_generate(job.ticket, Ok(result));
        assert_one_display_state(&controller);

        controller.remove(SlotRole::Product);
        assert_one_display_state(&controller);
        assert_eq!(controller.display(), &DisplayState::Empty);
        Ok(())
    }
}
