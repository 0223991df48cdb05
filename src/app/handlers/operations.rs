// SPDX-License-Identifier: GPL-3.0-only

//! Operation handlers
//!
//! Routes sidebar buttons to an immediate run, a numeric prompt, an
//! interactive tool or a slider preview. Operations run on a blocking worker
//! against a copy of the original; only one runs at a time.

use crate::app::state::{AppModel, Message, PromptOutcome, PromptState, ResultsView};
use crate::constants::preview;
use crate::errors::{AppResult, OperationError};
use crate::media::presentation::image_handle;
use crate::ops::{Operation, OperationKind, OperationOutput, Requirement};
use cosmic::Task;
use tracing::{debug, info};

impl AppModel {
    pub(crate) fn handle_run_operation(
        &mut self,
        kind: OperationKind,
    ) -> Task<cosmic::Action<Message>> {
        if self.busy.is_some() {
            debug!(operation = kind.id(), "Operation ignored, another one is running");
            return Task::none();
        }
        if let Err(err) = self.session.operation_input() {
            self.report_error("Operation unavailable", err);
            return Task::none();
        }
        self.results = None;

        match kind.requirement() {
            Requirement::None => match Operation::with_defaults(kind) {
                Some(operation) => self.run_operation(operation),
                None => Task::none(),
            },
            Requirement::Prompt(fields) => {
                self.prompt = Some(PromptState::new(kind, fields));
                Task::none()
            }
            Requirement::Tool(tool_kind) => {
                if let Err(err) = self.session.begin_tool(tool_kind) {
                    self.report_error("Tool unavailable", err);
                }
                self.refresh_tool();
                Task::none()
            }
            Requirement::Preview(preview_kind) => {
                if let Err(err) = self.session.begin_preview(preview_kind) {
                    self.report_error("Preview unavailable", err);
                }
                self.refresh_tool();
                Task::none()
            }
        }
    }

    /// Run `operation` on a worker and report back with `OperationFinished`
    pub(crate) fn run_operation(&mut self, operation: Operation) -> Task<cosmic::Action<Message>> {
        let input = match self.session.operation_input() {
            Ok(input) => input,
            Err(err) => {
                self.report_error("Operation unavailable", err);
                return Task::none();
            }
        };
        let kind = operation.kind();
        let ctx = self.session.op_context();
        let generation = self.session.generation();
        self.busy = Some(kind);
        info!(operation = kind.id(), "Operation started");

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || operation.run(&input, &ctx))
                    .await
                    .map_err(|e| OperationError::Interrupted(e.to_string()))?
            },
            move |result| cosmic::Action::App(Message::OperationFinished(kind, generation, result)),
        )
    }

    pub(crate) fn handle_operation_finished(
        &mut self,
        kind: OperationKind,
        generation: u64,
        result: AppResult<OperationOutput>,
    ) -> Task<cosmic::Action<Message>> {
        self.busy = None;
        match result {
            Ok(output) => {
                // Another image or the camera replaced the input meanwhile
                if !self.session.accept_from(generation, &output) {
                    debug!(operation = kind.id(), "Operation result dropped");
                    return Task::none();
                }
                if let OperationOutput::Panels { panels, note } = &output {
                    self.results = Some(ResultsView {
                        title: kind.label().to_string(),
                        panels: panels
                            .iter()
                            .map(|p| (p.title.clone(), image_handle(&p.frame, preview::PANEL_MAX)))
                            .collect(),
                        note: note.clone(),
                    });
                }
                self.refresh_panes();
                info!(operation = kind.id(), "Operation finished");
            }
            Err(err) if generation == self.session.generation() => {
                self.report_error("Operation failed", err)
            }
            Err(err) => debug!(operation = kind.id(), error = %err, "Stale operation error dropped"),
        }
        Task::none()
    }

    pub(crate) fn handle_prompt_input(
        &mut self,
        index: usize,
        text: String,
    ) -> Task<cosmic::Action<Message>> {
        if let Some(prompt) = self.prompt.as_mut()
            && let Some(input) = prompt.inputs.get_mut(index)
        {
            *input = text;
            prompt.error = None;
        }
        Task::none()
    }

    pub(crate) fn handle_prompt_submit(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Task::none();
        };
        match prompt.submit() {
            PromptOutcome::Run(operation) => {
                self.prompt = None;
                self.run_operation(operation)
            }
            PromptOutcome::Invalid => Task::none(),
            PromptOutcome::Failed(err) => {
                self.prompt = None;
                self.report_error("Invalid parameters", err);
                Task::none()
            }
        }
    }

    pub(crate) fn handle_prompt_cancel(&mut self) -> Task<cosmic::Action<Message>> {
        if let Some(prompt) = self.prompt.take() {
            self.report_error("Prompt closed", prompt.cancel());
        }
        Task::none()
    }
}
