use crate::state::ResultState;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drives `operation` to completion while a spinner mirrors the busy flag.
    ///
    /// The spinner appears when a published state turns busy and is cleared
    /// as soon as one turns idle, so a rejected dispatch never shows it.
    pub async fn track_busy<F, T>(
        &self,
        mut states: watch::Receiver<ResultState>,
        message: &str,
        operation: F,
    ) -> T
    where
        F: Future<Output = T>,
    {
        tokio::pin!(operation);
        let mut spinner: Option<ProgressBar> = None;

        loop {
            tokio::select! {
                output = &mut operation => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    return output;
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        // Sender gone; nothing more to mirror.
                        let output = (&mut operation).await;
                        if let Some(pb) = spinner.take() {
                            pb.finish_and_clear();
                        }
                        return output;
                    }

                    let busy = states.borrow_and_update().is_busy();
                    match (busy, spinner.is_some()) {
                        (true, false) => spinner = Some(self.create_spinner(message)),
                        (false, true) => {
                            if let Some(pb) = spinner.take() {
                                pb.finish_and_clear();
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}
